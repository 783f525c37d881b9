//! Captured copies of store state.

use crate::state::State;
use serde::{Deserialize, Serialize};

/// A captured copy of a store's state.
///
/// Taken with [`Store::snapshot`](crate::Store::snapshot) and fed back with
/// [`StoreBuilder::preload`](crate::StoreBuilder::preload). Serializes as
/// plain JSON, so it can be kept wherever the application keeps its data:
///
/// ```text
/// {
///   "store": "app",
///   "state": { "counter": { "count": 3 }, "user": { "name": "ann" } }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct Snapshot {
    /// Name of the store the state was taken from.
    pub store: String,

    /// One slice per module id.
    pub state: State,
}

impl Snapshot {
    /// Create a snapshot of `state` taken from the store named `store`.
    pub fn new(store: String, state: State) -> Self {
        Snapshot { store, state }
    }

    /// Take the captured slices, dropping the store name.
    pub fn into_state(self) -> State {
        self.state
    }
}

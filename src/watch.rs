//! Selectors and change-tracking reads.

use crate::state::State;
use crate::store::{Store, Subscription};
use parking_lot::Mutex;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Picks a value out of the root state.
///
/// Implemented for dot-separated paths (`"user.name"`, yielding
/// `Value::Null` when missing) and for closures taking `&State`.
pub trait Selector {
    type Output;

    fn select(&self, state: &State) -> Self::Output;
}

impl Selector for &str {
    type Output = Value;

    fn select(&self, state: &State) -> Value {
        state.get_path(self).cloned().unwrap_or(Value::Null)
    }
}

impl Selector for String {
    type Output = Value;

    fn select(&self, state: &State) -> Value {
        self.as_str().select(state)
    }
}

impl<F, T> Selector for F
where
    F: Fn(&State) -> T,
{
    type Output = T;

    fn select(&self, state: &State) -> T {
        self(state)
    }
}

struct Shared<T> {
    value: Mutex<T>,
    changed: AtomicBool,
    changes: AtomicU64,
}

/// A selected value that follows the store.
///
/// Updated after every state change, but only marked changed when the
/// selected value itself differs, so consumers re-render only for data they
/// read. Dropping the watch stops tracking.
///
/// # Examples
///
/// ```
/// use easystore::{Action, Module, Store};
/// use serde_json::json;
///
/// let store = Store::builder()
///     .module(
///         Module::new("app", json!({"title": "a", "clicks": 0}))
///             .action("click", Action::sync(|state, _| {
///                 state["clicks"] = json!(state["clicks"].as_i64().unwrap_or(0) + 1);
///                 Ok(())
///             }))
///             .action("rename", Action::sync(|state, args| {
///                 state["title"] = args[0].clone();
///                 Ok(())
///             })),
///     )
///     .build()
///     .unwrap();
///
/// let title = store.use_data("app.title");
/// let _ = store.call("app/click", vec![]).unwrap();
/// assert!(!title.take_changed());
///
/// let _ = store.call("app/rename", vec![json!("b")]).unwrap();
/// assert!(title.take_changed());
/// assert_eq!(title.get(), json!("b"));
/// ```
pub struct Watch<T> {
    shared: Arc<Shared<T>>,
    _subscription: Subscription,
}

impl<T> Watch<T>
where
    T: Clone + PartialEq + Send + 'static,
{
    pub(crate) fn new<S>(store: &Store, selector: S) -> Self
    where
        S: Selector<Output = T> + Send + Sync + 'static,
    {
        let shared = Arc::new(Shared {
            value: Mutex::new(selector.select(&store.state())),
            changed: AtomicBool::new(false),
            changes: AtomicU64::new(0),
        });

        let tracked = Arc::clone(&shared);
        let subscription = store.subscribe(move |state| {
            let next = selector.select(state);
            let mut value = tracked.value.lock();
            if *value != next {
                *value = next;
                tracked.changed.store(true, Ordering::Release);
                tracked.changes.fetch_add(1, Ordering::AcqRel);
            }
        });

        Watch {
            shared,
            _subscription: subscription,
        }
    }

    /// The most recently selected value.
    pub fn get(&self) -> T {
        self.shared.value.lock().clone()
    }

    /// Whether the value changed since the last call, clearing the flag.
    pub fn take_changed(&self) -> bool {
        self.shared.changed.swap(false, Ordering::AcqRel)
    }

    /// How many times the selected value has changed.
    pub fn changes(&self) -> u64 {
        self.shared.changes.load(Ordering::Acquire)
    }
}

impl<T: fmt::Debug> fmt::Debug for Watch<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Watch")
            .field("value", &*self.shared.value.lock())
            .finish()
    }
}

use crate::path;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

/// The root state of a store: one slice per registered module.
///
/// Slices are reference counted. A reducer pass replaces only the slice it
/// touched, so every other slice is shared with the previous `State`:
///
/// ```
/// use easystore::{Action, Module, Store};
/// use serde_json::json;
///
/// let store = Store::builder()
///     .module(Module::new("a", json!({"n": 0})).action(
///         "bump",
///         Action::sync(|state, _args| {
///             state["n"] = json!(1);
///             Ok(())
///         }),
///     ))
///     .module(Module::new("b", json!({"n": 0})))
///     .build()
///     .unwrap();
///
/// let before = store.state();
/// let _ = store.call("a/bump", vec![]).unwrap();
/// let after = store.state();
///
/// assert!(std::sync::Arc::ptr_eq(before.slice("b").unwrap(), after.slice("b").unwrap()));
/// assert!(!std::sync::Arc::ptr_eq(before.slice("a").unwrap(), after.slice("a").unwrap()));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct State {
    slices: BTreeMap<String, Arc<Value>>,
}

impl State {
    /// The shared slice of module `id`.
    pub fn slice(&self, id: &str) -> Option<&Arc<Value>> {
        self.slices.get(id)
    }

    /// The state of module `id`.
    pub fn get(&self, id: &str) -> Option<&Value> {
        self.slices.get(id).map(|slice| slice.as_ref())
    }

    /// Resolve a dot-separated path whose first segment is a module id.
    ///
    /// ```
    /// use easystore::{Module, Store};
    /// use serde_json::json;
    ///
    /// let store = Store::builder()
    ///     .module(Module::new("counter", json!({"count": 3})))
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(store.state().get_path("counter.count"), Some(&json!(3)));
    /// assert_eq!(store.state().get_path("counter.missing"), None);
    /// ```
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let (id, rest) = path::split_head(path);
        path::get(self.get(id)?, rest)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.slices.contains_key(id)
    }

    /// Module ids in sorted order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.slices.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.slices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }

    /// Copy the whole state into one JSON object keyed by module id.
    pub fn to_value(&self) -> Value {
        let map: Map<String, Value> = self
            .slices
            .iter()
            .map(|(id, slice)| (id.clone(), Value::clone(slice)))
            .collect();
        Value::Object(map)
    }

    pub(crate) fn with_slice(&self, id: &str, value: Value) -> State {
        let mut next = self.clone();
        next.slices.insert(id.to_string(), Arc::new(value));
        next
    }

    pub(crate) fn insert(&mut self, id: String, value: Value) {
        self.slices.insert(id, Arc::new(value));
    }

    /// Take every slice of `other`, replacing slices with the same id.
    pub(crate) fn merge(&mut self, other: State) {
        self.slices.extend(other.slices);
    }
}

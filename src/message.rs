//! Messages routed through the root reducer, and the action-path naming
//! convention.

use serde_json::Value;
use std::fmt;

/// Marker carried by infrastructure-internal message types. Unmatched
/// actions containing it are ignored without a warning.
pub(crate) const INTERNAL_MARKER: &str = "@@";

/// Build the path of an action: `"<module id>/<action name>"`.
///
/// # Examples
///
/// ```
/// assert_eq!(easystore::action_path("counter", "increment"), "counter/increment");
/// ```
pub fn action_path(module_id: &str, action: &str) -> String {
    format!("{module_id}/{action}")
}

/// The module id of an action path: everything before the first `/`.
///
/// # Examples
///
/// ```
/// assert_eq!(easystore::module_id("counter/increment"), Some("counter"));
/// assert_eq!(easystore::module_id("increment"), None);
/// ```
pub fn module_id(path: &str) -> Option<&str> {
    path.split_once('/').map(|(id, _)| id)
}

/// A state mutation carried by [`Message::Mutate`].
///
/// Applied at most once: the reducer takes the closure out when it runs it.
pub struct Mutator(Option<Box<dyn FnOnce(&mut Value) + Send>>);

impl Mutator {
    /// Wrap a closure that edits a module's state draft.
    pub fn new(f: impl FnOnce(&mut Value) + Send + 'static) -> Self {
        Mutator(Some(Box::new(f)))
    }

    pub(crate) fn take(&mut self) -> Option<Box<dyn FnOnce(&mut Value) + Send>> {
        self.0.take()
    }
}

impl fmt::Debug for Mutator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.0.is_some() { "pending" } else { "applied" };
        f.debug_tuple("Mutator").field(&state).finish()
    }
}

/// The unit dispatched to the root reducer.
#[derive(Debug)]
#[non_exhaustive]
pub enum Message {
    /// Run the sync handler registered under `path` with `args`.
    Action { path: String, args: Vec<Value> },

    /// An async action under `path` has started. Observable marker only; the
    /// reducer does not change state for it.
    Start { path: String },

    /// One incremental state change produced by the async action at `path`.
    Mutate { path: String, mutator: Mutator },

    /// Add a module's initial state slice to live state.
    Register { id: String, state: Value },
}

impl Message {
    /// Run the sync action at `path`.
    pub fn action(path: impl Into<String>, args: Vec<Value>) -> Self {
        Message::Action {
            path: path.into(),
            args,
        }
    }

    /// Mark the async action at `path` as started.
    pub fn start(path: impl Into<String>) -> Self {
        Message::Start { path: path.into() }
    }

    /// Apply `f` to the state of the module `path` belongs to.
    pub fn mutate(path: impl Into<String>, f: impl FnOnce(&mut Value) + Send + 'static) -> Self {
        Message::Mutate {
            path: path.into(),
            mutator: Mutator::new(f),
        }
    }

    /// Add the slice of module `id` unless the state already has one.
    pub fn register(id: impl Into<String>, state: Value) -> Self {
        Message::Register {
            id: id.into(),
            state,
        }
    }

    /// The action path this message targets, if any.
    pub fn path(&self) -> Option<&str> {
        match self {
            Message::Action { path, .. }
            | Message::Start { path }
            | Message::Mutate { path, .. } => Some(path),
            Message::Register { .. } => None,
        }
    }

    /// A human-readable type string, as it appears in logs.
    ///
    /// `store_name` is only used for registration messages, which are typed
    /// `@@<store name>/MODULE_REGISTER`.
    ///
    /// # Examples
    ///
    /// ```
    /// use easystore::Message;
    ///
    /// assert_eq!(Message::start("user/login").type_name("app"), "user/login async START");
    /// assert_eq!(
    ///     Message::register("user", serde_json::Value::Null).type_name("app"),
    ///     "@@app/MODULE_REGISTER"
    /// );
    /// ```
    pub fn type_name(&self, store_name: &str) -> String {
        match self {
            Message::Action { path, .. } => path.clone(),
            Message::Start { path } => format!("{path} async START"),
            Message::Mutate { path, .. } => format!("{path} async PRODUCE"),
            Message::Register { .. } => format!("{INTERNAL_MARKER}{store_name}/MODULE_REGISTER"),
        }
    }
}

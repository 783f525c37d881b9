use crate::dispatch::{Actions, Produce};
use crate::error::{HandlerResult, StoreError};
use futures::FutureExt;
use futures::future::BoxFuture;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// A sync handler: mutates the module's state draft in place.
pub type SyncFn = Arc<dyn Fn(&mut Value, &[Value]) -> HandlerResult + Send + Sync>;

/// An async handler: receives a [`Produce`] bound to its path, the call
/// arguments, and the module's sibling [`Actions`].
pub type AsyncFn = Arc<
    dyn Fn(Produce, Vec<Value>, Actions) -> BoxFuture<'static, HandlerResult<Value>>
        + Send
        + Sync,
>;

/// Whether an action runs as a single reducer pass or as a future that
/// produces any number of incremental mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Sync,
    Async,
}

/// An action handler, tagged with how it executes.
///
/// # Examples
///
/// ```
/// use easystore::{Action, ActionKind};
/// use serde_json::json;
///
/// let increment = Action::sync(|state, args| {
///     let by = args.first().and_then(|v| v.as_i64()).unwrap_or(1);
///     let count = state["count"].as_i64().unwrap_or(0);
///     state["count"] = json!(count + by);
///     Ok(())
/// });
/// assert_eq!(increment.kind(), ActionKind::Sync);
///
/// let load = Action::asynchronous(|produce, _args, _actions| async move {
///     produce.produce(|state| state["loading"] = json!(true));
///     Ok(json!("done"))
/// });
/// assert_eq!(load.kind(), ActionKind::Async);
/// ```
#[derive(Clone)]
pub enum Action {
    Sync(SyncFn),
    Async(AsyncFn),
}

impl Action {
    /// Tag `f` as a sync handler: one reducer pass over the module's draft.
    pub fn sync<F>(f: F) -> Self
    where
        F: Fn(&mut Value, &[Value]) -> HandlerResult + Send + Sync + 'static,
    {
        Action::Sync(Arc::new(f))
    }

    /// Tag `f` as an async handler, boxing the future it returns.
    pub fn asynchronous<F, Fut>(f: F) -> Self
    where
        F: Fn(Produce, Vec<Value>, Actions) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult<Value>> + Send + 'static,
    {
        Action::Async(Arc::new(move |produce, args, actions| {
            f(produce, args, actions).boxed()
        }))
    }

    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Sync(_) => ActionKind::Sync,
            Action::Async(_) => ActionKind::Async,
        }
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Action").field(&self.kind()).finish()
    }
}

/// A named unit of state and the actions that change it.
///
/// The id must be unique within a store. Actions are addressed as
/// `"<id>/<name>"`.
#[derive(Debug, Clone)]
pub struct Module {
    id: String,
    state: Value,
    actions: BTreeMap<String, Action>,
}

impl Module {
    /// Create a module with no actions.
    pub fn new(id: impl Into<String>, state: Value) -> Self {
        Module {
            id: id.into(),
            state,
            actions: BTreeMap::new(),
        }
    }

    /// Create a module whose initial state is serialized from `state`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Decode`] if `state` cannot be represented as JSON.
    pub fn from_state<S: Serialize>(id: impl Into<String>, state: &S) -> Result<Self, StoreError> {
        let id = id.into();
        let value = serde_json::to_value(state).map_err(|source| StoreError::Decode {
            path: id.clone(),
            source,
        })?;
        Ok(Module::new(id, value))
    }

    /// Add an action. A later action with the same name replaces the earlier one.
    pub fn action(mut self, name: impl Into<String>, action: Action) -> Self {
        self.actions.insert(name.into(), action);
        self
    }

    /// The module id, the first segment of its action and data paths.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The initial state slice.
    pub fn state(&self) -> &Value {
        &self.state
    }

    pub fn actions(&self) -> impl Iterator<Item = (&str, &Action)> {
        self.actions.iter().map(|(name, action)| (name.as_str(), action))
    }

    pub(crate) fn into_parts(self) -> (String, Value, BTreeMap<String, Action>) {
        (self.id, self.state, self.actions)
    }
}

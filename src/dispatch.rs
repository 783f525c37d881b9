//! Callables handed to async actions, and the result of calling an action.

use crate::error::StoreError;
use crate::message::{Message, action_path};
use crate::store::{Shared, Store};
use futures::FutureExt;
use futures::future::{self, BoxFuture};
use serde_json::Value;
use std::fmt;
use std::future::IntoFuture;
use std::sync::{Arc, Weak};

/// Applies incremental state changes on behalf of an async action.
///
/// Every call to [`Produce::produce`] is dispatched as its own message and
/// applied as one reducer pass against the module's current state, so
/// subscribers observe each intermediate state in order.
#[derive(Clone)]
pub struct Produce {
    path: String,
    store: Weak<Shared>,
}

impl Produce {
    pub(crate) fn new(path: String, store: &Arc<Shared>) -> Self {
        Produce {
            path,
            store: Arc::downgrade(store),
        }
    }

    /// Mutate the module's state through `f`.
    ///
    /// Does nothing but log a warning if the store has been dropped.
    pub fn produce(&self, f: impl FnOnce(&mut Value) + Send + 'static) {
        match self.store.upgrade() {
            Some(shared) => {
                // mutate passes run no handler, so they never fail
                let _ = Store::from_shared(shared).dispatch(Message::mutate(self.path.clone(), f));
            }
            None => log::warn!("produce for {} after its store was dropped", self.path),
        }
    }

    /// The action path this producer is bound to.
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl fmt::Debug for Produce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Produce").field("path", &self.path).finish()
    }
}

/// The actions of one module, callable by bare name.
///
/// Passed to every async handler so it can trigger its siblings without
/// spelling out its own module id.
#[derive(Clone)]
pub struct Actions {
    module_id: String,
    store: Weak<Shared>,
}

impl Actions {
    pub(crate) fn new(module_id: String, store: &Arc<Shared>) -> Self {
        Actions {
            module_id,
            store: Arc::downgrade(store),
        }
    }

    /// Call the sibling action `name` with `args`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::StoreDropped`] if the store no longer exists, or
    /// the handler error of a sync sibling. An async sibling only runs once
    /// the returned outcome is awaited.
    pub fn call(&self, name: &str, args: Vec<Value>) -> Result<Outcome, StoreError> {
        let shared = self.store.upgrade().ok_or(StoreError::StoreDropped)?;
        Store::from_shared(shared).call(&action_path(&self.module_id, name), args)
    }

    /// The id of the module these actions belong to.
    pub fn module_id(&self) -> &str {
        &self.module_id
    }
}

impl fmt::Debug for Actions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Actions")
            .field("module_id", &self.module_id)
            .finish()
    }
}

/// The result of calling an action by path.
///
/// Await it to drive an async action to completion and get its value; sync
/// actions and unknown paths resolve to `None` immediately. An async action
/// does nothing until its outcome is awaited (or spawned): the start marker
/// and the handler both run on the first poll.
///
/// # Examples
///
/// ```
/// # use std::future::IntoFuture;
/// use easystore::{Action, Module, Outcome, Store};
/// use serde_json::json;
///
/// let store = Store::builder()
///     .module(Module::new("greeter", json!({})).action(
///         "hello",
///         Action::asynchronous(|_produce, args, _actions| async move {
///             Ok(json!(format!("hello {}", args[0].as_str().unwrap_or("?"))))
///         }),
///     ))
///     .build()
///     .unwrap();
///
/// let outcome = store.call("greeter/hello", vec![json!("bob")]).unwrap();
/// assert!(matches!(outcome, Outcome::Started(_)));
/// let value = futures::executor::block_on(outcome.into_future()).unwrap();
/// assert_eq!(value, Some(json!("hello bob")));
///
/// let missing = store.call("greeter/nope", vec![]).unwrap();
/// assert!(matches!(missing, Outcome::NotFound));
/// ```
#[must_use = "async actions run only when the outcome is awaited or spawned"]
pub enum Outcome {
    /// A sync action ran; its state change is already visible.
    Applied,
    /// An async action started; the future runs its handler.
    Started(BoxFuture<'static, Result<Value, StoreError>>),
    /// No action is registered under the path.
    NotFound,
}

impl Outcome {
    /// Whether an action was registered under the called path.
    pub fn is_found(&self) -> bool {
        !matches!(self, Outcome::NotFound)
    }
}

impl fmt::Debug for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Applied => f.write_str("Applied"),
            Outcome::Started(_) => f.write_str("Started(..)"),
            Outcome::NotFound => f.write_str("NotFound"),
        }
    }
}

impl IntoFuture for Outcome {
    type Output = Result<Option<Value>, StoreError>;
    type IntoFuture = BoxFuture<'static, Self::Output>;

    fn into_future(self) -> Self::IntoFuture {
        match self {
            Outcome::Started(fut) => fut.map(|result| result.map(Some)).boxed(),
            Outcome::Applied | Outcome::NotFound => future::ready(Ok(None)).boxed(),
        }
    }
}

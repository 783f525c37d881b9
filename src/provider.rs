//! Scoped store context for component trees.
//!
//! [`Store::with_store`] wraps a component so that, while it renders, the
//! store is the current context of the thread. Code inside the component
//! reaches the store through [`use_store`], [`use_data`], [`get_data`] and
//! [`call`] without having it passed down explicitly. Providers nest; the
//! innermost one wins.

use crate::dispatch::Outcome;
use crate::error::StoreError;
use crate::store::Store;
use crate::watch::{Selector, Watch};
use serde_json::Value;
use std::cell::RefCell;

thread_local! {
    static CONTEXT: RefCell<Vec<Store>> = const { RefCell::new(Vec::new()) };
}

/// Pops the provided store when the render ends, even by unwinding.
struct Scope;

impl Scope {
    fn enter(store: Store) -> Self {
        CONTEXT.with(|stack| stack.borrow_mut().push(store));
        Scope
    }
}

impl Drop for Scope {
    fn drop(&mut self) {
        CONTEXT.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

/// A component rendered inside a store's context.
///
/// # Examples
///
/// ```
/// use easystore::{Module, Store, provider};
/// use serde_json::json;
///
/// let store = Store::builder()
///     .module(Module::new("user", json!({"name": "ann"})))
///     .build()
///     .unwrap();
///
/// let greeting = |prefix: &str| -> String {
///     let name = provider::get_data("user.name").unwrap();
///     format!("{prefix} {}", name.as_str().unwrap_or("?"))
/// };
///
/// let app = store.with_store(greeting);
/// assert_eq!(app.render("hi"), "hi ann");
///
/// // outside the provider there is no store to read from
/// assert!(provider::get_data("user.name").is_err());
/// ```
#[derive(Debug, Clone)]
pub struct Provided<C> {
    store: Store,
    component: C,
}

impl<C> Provided<C> {
    pub(crate) fn new(store: Store, component: C) -> Self {
        Provided { store, component }
    }

    /// Render the wrapped component with `props`.
    pub fn render<P, R>(&self, props: P) -> R
    where
        C: Fn(P) -> R,
    {
        let _scope = Scope::enter(self.store.clone());
        (self.component)(props)
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn into_inner(self) -> C {
        self.component
    }
}

/// The store of the innermost enclosing provider.
///
/// # Errors
///
/// Returns [`StoreError::NoStore`] when called outside any provider.
pub fn use_store() -> Result<Store, StoreError> {
    CONTEXT.with(|stack| stack.borrow().last().cloned().ok_or(StoreError::NoStore))
}

/// Read data from the provided store. See [`Store::get_data`].
///
/// # Errors
///
/// Returns [`StoreError::NoStore`] when called outside any provider.
pub fn get_data<S: Selector>(selector: S) -> Result<S::Output, StoreError> {
    Ok(use_store()?.get_data(selector))
}

/// Watch data in the provided store. See [`Store::use_data`].
///
/// # Errors
///
/// Returns [`StoreError::NoStore`] when called outside any provider.
pub fn use_data<S>(selector: S) -> Result<Watch<S::Output>, StoreError>
where
    S: Selector + Send + Sync + 'static,
    S::Output: Clone + PartialEq + Send + 'static,
{
    Ok(use_store()?.use_data(selector))
}

/// Call an action on the provided store. See [`Store::call`].
///
/// # Errors
///
/// Returns [`StoreError::NoStore`] when called outside any provider, or the
/// error of a failing sync handler.
pub fn call(path: &str, args: Vec<Value>) -> Result<Outcome, StoreError> {
    use_store()?.call(path, args)
}

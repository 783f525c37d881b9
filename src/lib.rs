//! Module-based state store.
//!
//! A [`Module`] bundles an id, an initial state slice and named [`Action`]s.
//! Register modules with a [`Store`] (up front through [`StoreBuilder`] or
//! later through [`Store::register`]) and call their actions by path,
//! `"<module id>/<action>"`. Read state with paths like `"counter.count"` or
//! with selector closures.
//!
//! Sync actions mutate a draft of their module's state in one reducer pass.
//! Async actions get a [`Produce`] handle and may apply any number of
//! ordered, individually observable mutations while they run.

mod dispatch;
mod error;
mod message;
mod middleware;
mod module;
pub mod path;
pub mod provider;
mod reducer;
mod registry;
mod snapshot;
mod state;
mod store;
mod watch;

pub use dispatch::{Actions, Outcome, Produce};
pub use error::{BoxError, HandlerResult, StoreError};
pub use message::{Message, Mutator, action_path, module_id};
pub use middleware::{LoggingMiddleware, Middleware};
pub use module::{Action, ActionKind, AsyncFn, Module, SyncFn};
pub use snapshot::Snapshot;
pub use state::State;
pub use store::{Options, Store, StoreBuilder, Subscription};
pub use watch::{Selector, Watch};

use crate::dispatch::{Actions, Outcome, Produce};
use crate::error::StoreError;
use crate::message::Message;
use crate::middleware::{LoggingMiddleware, Middleware};
use crate::module::{Action, Module};
use crate::provider::Provided;
use crate::reducer::RootReducer;
use crate::registry::Registry;
use crate::snapshot::Snapshot;
use crate::state::State;
use crate::watch::{Selector, Watch};
use futures::FutureExt;
use parking_lot::{Mutex, ReentrantMutex, RwLock};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

const DEFAULT_NAME: &str = "easystore";

static UNNAMED_STORES: AtomicUsize = AtomicUsize::new(0);

/// `easystore`, then `easystore1`, `easystore2`, ... for each unnamed store
/// in the process.
fn default_name() -> String {
    match UNNAMED_STORES.fetch_add(1, Ordering::Relaxed) {
        0 => DEFAULT_NAME.to_string(),
        n => format!("{DEFAULT_NAME}{n}"),
    }
}

type Listener = Arc<dyn Fn(&State) + Send + Sync>;

#[derive(Default)]
struct Listeners {
    next_id: u64,
    entries: Vec<(u64, Listener)>,
}

pub(crate) struct Shared {
    name: String,
    debug: bool,
    reducer: RootReducer,
    middlewares: Vec<Arc<dyn Middleware>>,
    registry: RwLock<Registry>,
    state: RwLock<Arc<State>>,
    /// Serializes reducer passes. Reentrant so a listener may dispatch.
    dispatching: ReentrantMutex<()>,
    listeners: Mutex<Listeners>,
}

/// Store configuration that can be loaded from a config file.
///
/// ```
/// use easystore::{Options, Store};
///
/// let options: Options = serde_json::from_str(r#"{"name": "app", "debug": true}"#).unwrap();
/// let store = Store::builder().options(options).build().unwrap();
/// assert_eq!(store.name(), "app");
/// assert!(store.is_debug());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Prefix for internal message types and log lines. Unique default if unset.
    pub name: Option<String>,
    /// Log every message with its before/after state.
    pub debug: bool,
}

/// Builder for a [`Store`].
///
/// Modules added here are registered in insertion order when the store is
/// built; their initial states form the store's starting state.
#[must_use]
pub struct StoreBuilder {
    options: Options,
    middlewares: Vec<Arc<dyn Middleware>>,
    modules: Vec<Module>,
    preload: Option<Snapshot>,
}

impl StoreBuilder {
    fn new() -> Self {
        StoreBuilder {
            options: Options::default(),
            middlewares: Vec::new(),
            modules: Vec::new(),
            preload: None,
        }
    }

    /// Set the store name used in log lines and internal message types.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.options.name = Some(name.into());
        self
    }

    /// Log every message with its before and after state.
    pub fn debug(mut self, debug: bool) -> Self {
        self.options.debug = debug;
        self
    }

    /// Replace name and debug flag with `options`.
    pub fn options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    /// Append a middleware to the chain.
    pub fn middleware(mut self, middleware: impl Middleware + 'static) -> Self {
        self.middlewares.push(Arc::new(middleware));
        self
    }

    /// Add a module to register when the store is built.
    pub fn module(mut self, module: Module) -> Self {
        self.modules.push(module);
        self
    }

    /// Add several modules, registered in iteration order.
    pub fn modules(mut self, modules: impl IntoIterator<Item = Module>) -> Self {
        self.modules.extend(modules);
        self
    }

    /// Start from previously saved state.
    ///
    /// Slices in the snapshot take precedence over module initial state,
    /// including modules registered after the store is built.
    pub fn preload(mut self, snapshot: Snapshot) -> Self {
        self.preload = Some(snapshot);
        self
    }

    /// Register all modules and create the store.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateModule`] or
    /// [`StoreError::InvalidModuleId`] if a module cannot be registered.
    pub fn build(self) -> Result<Store, StoreError> {
        let Options { name, debug } = self.options;
        let name = name.unwrap_or_else(default_name);

        let mut middlewares = self.middlewares;
        if debug {
            middlewares.insert(0, Arc::new(LoggingMiddleware::new(name.clone())));
        }

        let mut registry = Registry::default();
        let mut initial = State::default();
        for module in self.modules {
            let (id, state) = registry.add(module)?;
            initial.insert(id, state);
        }
        if let Some(snapshot) = self.preload {
            initial.merge(snapshot.into_state());
        }

        log::debug!("[{name}] store created with {} modules", initial.len());
        Ok(Store::assemble(name, debug, middlewares, registry, initial))
    }
}

/// A state store holding the modules registered with it.
///
/// Cloning is cheap and every clone refers to the same store.
///
/// # Examples
///
/// ```
/// use easystore::{Action, Module, Outcome, Store};
/// use serde_json::json;
///
/// let counter = Module::new("counter", json!({"count": 0})).action(
///     "increment",
///     Action::sync(|state, args| {
///         let by = args.first().and_then(|v| v.as_i64()).unwrap_or(1);
///         state["count"] = json!(state["count"].as_i64().unwrap_or(0) + by);
///         Ok(())
///     }),
/// );
///
/// let store = Store::builder().module(counter).build().unwrap();
/// let outcome = store.call("counter/increment", vec![json!(3)]).unwrap();
/// assert!(matches!(outcome, Outcome::Applied));
/// assert_eq!(store.get_data("counter.count"), json!(3));
/// ```
#[derive(Clone)]
pub struct Store {
    shared: Arc<Shared>,
}

impl Store {
    /// Start configuring a new store.
    pub fn builder() -> StoreBuilder {
        StoreBuilder::new()
    }

    /// An empty store with a default name. Modules can be added with
    /// [`Store::register`].
    pub fn new() -> Self {
        Store::assemble(
            default_name(),
            false,
            Vec::new(),
            Registry::default(),
            State::default(),
        )
    }

    fn assemble(
        name: String,
        debug: bool,
        middlewares: Vec<Arc<dyn Middleware>>,
        registry: Registry,
        initial: State,
    ) -> Self {
        Store {
            shared: Arc::new(Shared {
                reducer: RootReducer::new(name.clone(), debug),
                name,
                debug,
                middlewares,
                registry: RwLock::new(registry),
                state: RwLock::new(Arc::new(initial)),
                dispatching: ReentrantMutex::new(()),
                listeners: Mutex::new(Listeners::default()),
            }),
        }
    }

    pub(crate) fn from_shared(shared: Arc<Shared>) -> Self {
        Store { shared }
    }

    /// The store name, explicit or generated.
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    pub fn is_debug(&self) -> bool {
        self.shared.debug
    }

    /// The current root state.
    pub fn state(&self) -> Arc<State> {
        self.shared.state.read().clone()
    }

    /// Read data with a path or a selector closure.
    ///
    /// A path yields the value found there, or `Value::Null` if any segment
    /// is missing.
    ///
    /// ```
    /// use easystore::{Module, State, Store};
    /// use serde_json::json;
    ///
    /// let store = Store::builder()
    ///     .module(Module::new("user", json!({"name": "ann", "age": 30})))
    ///     .build()
    ///     .unwrap();
    ///
    /// assert_eq!(store.get_data("user.name"), json!("ann"));
    /// assert_eq!(store.get_data("user.email"), serde_json::Value::Null);
    /// let age = store.get_data(|state: &State| {
    ///     state.get_path("user.age").and_then(|v| v.as_u64())
    /// });
    /// assert_eq!(age, Some(30));
    /// ```
    pub fn get_data<S: Selector>(&self, selector: S) -> S::Output {
        selector.select(&self.state())
    }

    /// Read and deserialize the value at `path`, `None` if it is absent.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Decode`] if the value does not match `T`.
    pub fn get_as<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, StoreError> {
        let state = self.state();
        let Some(value) = state.get_path(path) else {
            return Ok(None);
        };
        T::deserialize(value)
            .map(Some)
            .map_err(|source| StoreError::Decode {
                path: path.to_string(),
                source,
            })
    }

    /// Watch the data picked by `selector`; the watch is only marked changed
    /// when the selected value differs from the last one seen.
    pub fn use_data<S>(&self, selector: S) -> Watch<S::Output>
    where
        S: Selector + Send + Sync + 'static,
        S::Output: Clone + PartialEq + Send + 'static,
    {
        Watch::new(self, selector)
    }

    /// Register a module on the live store.
    ///
    /// Its actions become callable immediately and its initial state is
    /// visible on the next read. No reducer pass can run between the two, so
    /// a concurrent call never finds the action without its state.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateModule`] if the id is taken, or
    /// [`StoreError::InvalidModuleId`] if it is empty or contains `/` or `.`.
    pub fn register(&self, module: Module) -> Result<(), StoreError> {
        let _pass = self.shared.dispatching.lock();
        let (id, state) = self.shared.registry.write().add(module)?;
        self.dispatch(Message::register(id, state))
    }

    /// Call the action registered under `path` (`"<module id>/<action>"`).
    ///
    /// A sync action is applied before this returns. An async action returns
    /// [`Outcome::Started`]: awaiting it dispatches the start marker and runs
    /// the handler, dropping it runs nothing. An unknown path is logged and
    /// yields [`Outcome::NotFound`].
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Handler`] if a sync handler fails; state is left
    /// unchanged in that case.
    pub fn call(&self, path: &str, args: Vec<Value>) -> Result<Outcome, StoreError> {
        let entry = self.shared.registry.read().entry(path).cloned();
        let Some(entry) = entry else {
            log::warn!("[{}] wrong action called: {path}", self.shared.name);
            return Ok(Outcome::NotFound);
        };

        match entry.action {
            Action::Sync(_) => {
                self.dispatch(Message::action(path, args))?;
                Ok(Outcome::Applied)
            }
            Action::Async(handler) => {
                let store = Arc::downgrade(&self.shared);
                let module_id = entry.module_id;
                let path = path.to_string();
                Ok(Outcome::Started(
                    async move {
                        let shared = store.upgrade().ok_or(StoreError::StoreDropped)?;
                        Store::from_shared(Arc::clone(&shared))
                            .dispatch(Message::start(path.as_str()))?;
                        let produce = Produce::new(path.clone(), &shared);
                        let actions = Actions::new(module_id, &shared);
                        drop(shared);

                        handler(produce, args, actions)
                            .await
                            .map_err(|source| StoreError::Handler { path, source })
                    }
                    .boxed(),
                ))
            }
        }
    }

    /// Run one reducer pass for `message`, wrapped by the middleware chain.
    ///
    /// Listeners are notified if the state changed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Handler`] if the message ran a sync handler that
    /// failed.
    pub fn dispatch(&self, mut message: Message) -> Result<(), StoreError> {
        let shared = &self.shared;
        let _pass = shared.dispatching.lock();

        let prev = self.state();
        for middleware in &shared.middlewares {
            middleware.before(&message, &prev);
        }

        let reduced = shared.reducer.reduce(&prev, &mut message, |path| {
            shared.registry.read().handler(path)
        });

        let (current, changed, result) = match reduced {
            Ok(Some(next)) => {
                let next = Arc::new(next);
                *shared.state.write() = Arc::clone(&next);
                (next, true, Ok(()))
            }
            Ok(None) => (prev, false, Ok(())),
            Err(err) => (prev, false, Err(err)),
        };

        for middleware in &shared.middlewares {
            middleware.after(&message, &current);
        }
        if changed {
            self.notify(&current);
        }
        result
    }

    /// Call `listener` with the new state after every pass that changes it.
    ///
    /// The listener stays registered until the returned [`Subscription`] is
    /// dropped.
    pub fn subscribe(&self, listener: impl Fn(&State) + Send + Sync + 'static) -> Subscription {
        let mut listeners = self.shared.listeners.lock();
        let id = listeners.next_id;
        listeners.next_id += 1;
        listeners.entries.push((id, Arc::new(listener)));
        Subscription {
            id,
            store: Arc::downgrade(&self.shared),
        }
    }

    /// Wrap `component` so it renders with this store as the current context.
    pub fn with_store<C>(&self, component: C) -> Provided<C> {
        Provided::new(self.clone(), component)
    }

    /// Capture the current state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::new(self.shared.name.clone(), State::clone(&self.state()))
    }

    /// Whether a module with this id is registered.
    pub fn contains_module(&self, id: &str) -> bool {
        self.shared.registry.read().contains(id)
    }

    /// Paths of every registered action, sorted.
    pub fn action_paths(&self) -> Vec<String> {
        self.shared
            .registry
            .read()
            .paths()
            .map(str::to_string)
            .collect()
    }

    fn notify(&self, state: &State) {
        let listeners: Vec<Listener> = self
            .shared
            .listeners
            .lock()
            .entries
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in listeners {
            listener(state);
        }
    }
}

impl Default for Store {
    fn default() -> Self {
        Store::new()
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("name", &self.shared.name)
            .field("debug", &self.shared.debug)
            .finish_non_exhaustive()
    }
}

/// Keeps a listener registered; dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    id: u64,
    store: Weak<Shared>,
}

impl Subscription {
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(shared) = self.store.upgrade() {
            shared
                .listeners
                .lock()
                .entries
                .retain(|(id, _)| *id != self.id);
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

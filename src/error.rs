/// Boxed error returned by action handlers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// What an action handler returns.
///
/// Sync handlers return `HandlerResult<()>`, async handlers resolve to
/// `HandlerResult<Value>`.
pub type HandlerResult<T = ()> = Result<T, BoxError>;

/// Errors surfaced by store operations.
///
/// Usage mistakes (duplicate ids, reading without a store) and handler
/// failures end up here. Soft routing failures such as an unknown action
/// path are only logged and never become a `StoreError`.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum StoreError {
    /// A module with this id is already registered.
    #[error("module id={id} already exist!")]
    DuplicateModule { id: String },

    /// The module id cannot be used to build action paths.
    #[error("invalid module id {id:?}: {reason}")]
    InvalidModuleId { id: String, reason: &'static str },

    /// No store is available in the current context.
    #[error("no store available: create a store and render inside `with_store` first")]
    NoStore,

    /// The store backing a `Produce` or `Actions` handle has been dropped.
    #[error("store has been dropped")]
    StoreDropped,

    /// An action handler returned an error.
    #[error("action {path} failed: {source}")]
    Handler {
        path: String,
        #[source]
        source: BoxError,
    },

    /// A value read from the store did not deserialize into the requested type.
    #[error("cannot decode data at {path:?}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

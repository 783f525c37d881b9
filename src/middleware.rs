//! Hooks that observe every reducer pass.

use crate::message::Message;
use crate::state::State;

/// Observes messages around each reducer pass.
///
/// Middlewares run in chain order: every `before` sees the state the message
/// is applied to, every `after` sees the state it produced (unchanged if the
/// message was a no-op or its handler failed).
///
/// Hooks only observe: they cannot block a message, replace it, or change
/// what the reducer receives. They must not dispatch to the store they
/// observe, since the enclosing pass would overwrite the nested result.
pub trait Middleware: Send + Sync {
    fn before(&self, _message: &Message, _state: &State) {}

    fn after(&self, _message: &Message, _state: &State) {}
}

/// Logs each message with the state before and after it, at debug level.
///
/// Prepended to the chain when a store is built in debug mode.
#[derive(Debug, Clone)]
pub struct LoggingMiddleware {
    name: String,
}

impl LoggingMiddleware {
    /// Create a logger whose lines are prefixed with `[name]`.
    pub fn new(name: impl Into<String>) -> Self {
        LoggingMiddleware { name: name.into() }
    }
}

impl Middleware for LoggingMiddleware {
    fn before(&self, message: &Message, state: &State) {
        log::debug!(
            "[{}] action {} prev state: {}",
            self.name,
            message.type_name(&self.name),
            state.to_value()
        );
    }

    fn after(&self, message: &Message, state: &State) {
        log::debug!(
            "[{}] action {} next state: {}",
            self.name,
            message.type_name(&self.name),
            state.to_value()
        );
    }
}

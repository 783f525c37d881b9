//! The root reducer: routes every dispatched message to the slice it touches.

use crate::error::StoreError;
use crate::message::{INTERNAL_MARKER, Message, module_id};
use crate::module::SyncFn;
use crate::state::State;
use serde_json::Value;

/// Routes messages for one store.
///
/// Holds only the store's name (log prefix) and debug flag; handlers are
/// resolved through the lookup passed to [`RootReducer::reduce`].
#[derive(Debug, Clone)]
pub(crate) struct RootReducer {
    name: String,
    debug: bool,
}

impl RootReducer {
    pub(crate) fn new(name: String, debug: bool) -> Self {
        RootReducer { name, debug }
    }

    /// Apply `message` to `state`.
    ///
    /// Returns `Ok(None)` when the message leaves state unchanged, and
    /// `Ok(Some(next))` with a new root that shares every untouched slice
    /// with `state`. A handler error discards its draft.
    pub(crate) fn reduce(
        &self,
        state: &State,
        message: &mut Message,
        lookup: impl Fn(&str) -> Option<SyncFn>,
    ) -> Result<Option<State>, StoreError> {
        match message {
            Message::Register { id, state: initial } => {
                if state.contains(id) {
                    log::debug!(
                        "[{}] module registered: {id} (keeping preloaded state)",
                        self.name
                    );
                    return Ok(None);
                }
                log::debug!("[{}] module registered: {id}", self.name);
                Ok(Some(state.with_slice(id, initial.clone())))
            }
            Message::Start { path } => {
                if self.debug {
                    log::debug!("[{}] {path} async START", self.name);
                }
                Ok(None)
            }
            Message::Action { path, args } => {
                let Some(handler) = lookup(path) else {
                    if !path.contains(INTERNAL_MARKER) {
                        log::warn!("[{}] no reducer for action: {path}", self.name);
                    }
                    return Ok(None);
                };
                let Some((id, mut draft)) = self.draft(state, path) else {
                    return Ok(None);
                };
                handler(&mut draft, args).map_err(|source| StoreError::Handler {
                    path: path.clone(),
                    source,
                })?;
                Ok(Some(state.with_slice(id, draft)))
            }
            Message::Mutate { path, mutator } => {
                let Some((id, mut draft)) = self.draft(state, path) else {
                    return Ok(None);
                };
                let Some(apply) = mutator.take() else {
                    log::warn!("[{}] {path} async PRODUCE already applied", self.name);
                    return Ok(None);
                };
                apply(&mut draft);
                Ok(Some(state.with_slice(id, draft)))
            }
        }
    }

    /// Copy the slice addressed by `path` into a mutable draft.
    fn draft<'p>(&self, state: &State, path: &'p str) -> Option<(&'p str, Value)> {
        let Some(id) = module_id(path) else {
            log::error!("[{}] action must have a module id: {path}", self.name);
            return None;
        };
        match state.get(id) {
            Some(slice) => Some((id, slice.clone())),
            None => {
                log::warn!("[{}] no state for module {id}: {path}", self.name);
                None
            }
        }
    }
}

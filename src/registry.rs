use crate::error::StoreError;
use crate::message::action_path;
use crate::module::{Action, Module, SyncFn};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Every module and action known to a store.
///
/// Entries are only ever added; there is no unregister.
#[derive(Debug, Default)]
pub(crate) struct Registry {
    modules: BTreeSet<String>,
    actions: BTreeMap<String, Entry>,
}

/// One registered action, keyed by its path.
#[derive(Debug, Clone)]
pub(crate) struct Entry {
    pub(crate) module_id: String,
    pub(crate) action: Action,
}

impl Registry {
    /// Record `module` and all of its actions, returning the id and initial
    /// state for the caller to install.
    ///
    /// Nothing is recorded if the id is rejected.
    pub(crate) fn add(&mut self, module: Module) -> Result<(String, Value), StoreError> {
        validate_id(module.id())?;
        if self.modules.contains(module.id()) {
            return Err(StoreError::DuplicateModule {
                id: module.id().to_string(),
            });
        }

        let (id, state, actions) = module.into_parts();
        for (name, action) in actions {
            self.actions.insert(
                action_path(&id, &name),
                Entry {
                    module_id: id.clone(),
                    action,
                },
            );
        }
        self.modules.insert(id.clone());
        Ok((id, state))
    }

    pub(crate) fn entry(&self, path: &str) -> Option<&Entry> {
        self.actions.get(path)
    }

    /// The sync handler registered under `path`, for the reducer.
    pub(crate) fn handler(&self, path: &str) -> Option<SyncFn> {
        match &self.actions.get(path)?.action {
            Action::Sync(f) => Some(f.clone()),
            Action::Async(_) => None,
        }
    }

    pub(crate) fn contains(&self, id: &str) -> bool {
        self.modules.contains(id)
    }

    pub(crate) fn paths(&self) -> impl Iterator<Item = &str> {
        self.actions.keys().map(String::as_str)
    }
}

fn validate_id(id: &str) -> Result<(), StoreError> {
    let reason = if id.is_empty() {
        "must not be empty"
    } else if id.contains('/') {
        "must not contain '/'"
    } else if id.contains('.') {
        "must not contain '.'"
    } else {
        return Ok(());
    };
    Err(StoreError::InvalidModuleId {
        id: id.to_string(),
        reason,
    })
}

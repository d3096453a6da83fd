//! Locally hidden providers, scoped per category.
//!
//! Hiding is a soft, reversible suppression of a provider row. It never deletes anything in the
//! quote store.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::provider::ProviderId;
use crate::errors::{RemoteOperation, RemoteOperationError};

pub const HIDDEN_PROVIDERS_KEY_PREFIX: &str = "quotedesk.hiddenProviders";

pub fn hidden_providers_key(category: &str) -> String {
    let category = category.trim();
    let category = if category.is_empty() { "unknown" } else { category };
    format!("{HIDDEN_PROVIDERS_KEY_PREFIX}.{category}")
}

/// Key to list-of-ids store behind the hidden provider set.
#[async_trait]
pub trait HiddenProviderStore: Send + Sync {
    async fn load(&self, key: &str) -> Result<Vec<ProviderId>, RemoteOperationError>;
    async fn save(&self, key: &str, ids: &[ProviderId]) -> Result<(), RemoteOperationError>;
}

#[derive(Default)]
pub struct InMemoryHiddenProviderStore {
    entries: Mutex<HashMap<String, Vec<ProviderId>>>,
    fail_writes: bool,
}

impl InMemoryHiddenProviderStore {
    pub fn failing_writes() -> Self {
        Self { entries: Mutex::default(), fail_writes: true }
    }

    pub fn snapshot(&self, key: &str) -> Vec<ProviderId> {
        match self.entries.lock() {
            Ok(entries) => entries.get(key).cloned().unwrap_or_default(),
            Err(poisoned) => poisoned.into_inner().get(key).cloned().unwrap_or_default(),
        }
    }
}

#[async_trait]
impl HiddenProviderStore for InMemoryHiddenProviderStore {
    async fn load(&self, key: &str) -> Result<Vec<ProviderId>, RemoteOperationError> {
        Ok(self.snapshot(key))
    }

    async fn save(&self, key: &str, ids: &[ProviderId]) -> Result<(), RemoteOperationError> {
        if self.fail_writes {
            return Err(RemoteOperationError::failed(
                RemoteOperation::SaveHiddenProviders,
                "hidden provider storage is read-only",
            ));
        }
        match self.entries.lock() {
            Ok(mut entries) => entries.insert(key.to_string(), ids.to_vec()),
            Err(poisoned) => poisoned.into_inner().insert(key.to_string(), ids.to_vec()),
        };
        Ok(())
    }
}

/// In-session set of hidden provider ids for one category.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HiddenProviders {
    ids: Vec<ProviderId>,
}

impl HiddenProviders {
    pub fn from_ids(ids: Vec<ProviderId>) -> Self {
        let mut hidden = Self::default();
        for id in ids {
            hidden.hide(id);
        }
        hidden
    }

    /// Returns `true` when the id was not hidden before.
    pub fn hide(&mut self, id: ProviderId) -> bool {
        if self.ids.contains(&id) {
            return false;
        }
        self.ids.push(id);
        true
    }

    pub fn unhide(&mut self, id: &ProviderId) -> bool {
        let before = self.ids.len();
        self.ids.retain(|hidden| hidden != id);
        before != self.ids.len()
    }

    pub fn contains(&self, id: &ProviderId) -> bool {
        self.ids.contains(id)
    }

    pub fn ids(&self) -> &[ProviderId] {
        &self.ids
    }
}

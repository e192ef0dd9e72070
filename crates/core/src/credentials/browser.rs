//! Browser `localStorage` credential store

use super::CredentialStore;
use crate::{CoreError, CoreResult};
use gloo::storage::{LocalStorage, Storage};

/// Credential store backed by the browser's `localStorage`
///
/// Values are stored as raw strings, not JSON, so they stay readable by
/// other scripts on the same origin that use the same keys.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStorageCredentialStore;

impl LocalStorageCredentialStore {
    pub fn new() -> Self {
        Self
    }
}

fn js_error(op: &str, err: impl std::fmt::Debug) -> CoreError {
    CoreError::storage_error(format!("localStorage {op} failed: {err:?}"))
}

impl CredentialStore for LocalStorageCredentialStore {
    fn get(&self, key: &str) -> CoreResult<Option<String>> {
        LocalStorage::raw()
            .get_item(key)
            .map_err(|e| js_error("read", e))
    }

    fn set(&self, key: &str, value: &str) -> CoreResult<()> {
        LocalStorage::raw()
            .set_item(key, value)
            .map_err(|e| js_error("write", e))
    }

    fn remove(&self, key: &str) -> CoreResult<()> {
        LocalStorage::raw()
            .remove_item(key)
            .map_err(|e| js_error("remove", e))
    }
}

//! Credential storage
//!
//! The access and refresh credentials live in a key/value store behind the
//! [`CredentialStore`] trait. Nothing above this layer caches them: every
//! read goes back to the store.

mod memory;

#[cfg(target_arch = "wasm32")]
mod browser;
#[cfg(not(target_arch = "wasm32"))]
mod file;

pub use memory::MemoryCredentialStore;

#[cfg(target_arch = "wasm32")]
pub use browser::LocalStorageCredentialStore;
#[cfg(not(target_arch = "wasm32"))]
pub use file::FileCredentialStore;

use crate::CoreResult;

/// Storage key of the short-lived access credential
pub const ACCESS_TOKEN_KEY: &str = "token";

/// Storage key of the long-lived refresh credential
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";

/// Key/value store holding credentials
pub trait CredentialStore: Send + Sync {
    /// Read the value stored under `key`
    fn get(&self, key: &str) -> CoreResult<Option<String>>;

    /// Write `value` under `key`, replacing any previous value
    fn set(&self, key: &str, value: &str) -> CoreResult<()>;

    /// Delete the value under `key`. Deleting a missing key is not an error.
    fn remove(&self, key: &str) -> CoreResult<()>;
}

/// Persist both credentials of a freshly opened session
pub fn store_session(
    store: &dyn CredentialStore,
    token: &str,
    refresh_token: &str,
) -> CoreResult<()> {
    store.set(ACCESS_TOKEN_KEY, token)?;
    store.set(REFRESH_TOKEN_KEY, refresh_token)
}

/// Remove both credentials
pub fn clear_session(store: &dyn CredentialStore) -> CoreResult<()> {
    store.remove(ACCESS_TOKEN_KEY)?;
    store.remove(REFRESH_TOKEN_KEY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_and_clear_session() {
        let store = MemoryCredentialStore::new();

        store_session(&store, "access", "refresh").unwrap();
        assert_eq!(
            store.get(ACCESS_TOKEN_KEY).unwrap().as_deref(),
            Some("access")
        );
        assert_eq!(
            store.get(REFRESH_TOKEN_KEY).unwrap().as_deref(),
            Some("refresh")
        );

        clear_session(&store).unwrap();
        assert!(store.get(ACCESS_TOKEN_KEY).unwrap().is_none());
        assert!(store.get(REFRESH_TOKEN_KEY).unwrap().is_none());
    }

    #[test]
    fn test_clear_empty_session_is_ok() {
        let store = MemoryCredentialStore::new();
        assert!(clear_session(&store).is_ok());
    }
}

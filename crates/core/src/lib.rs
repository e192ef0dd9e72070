//! examkit core types and utilities

pub mod config;
pub mod credentials;
pub mod error;
#[cfg(not(target_arch = "wasm32"))]
pub mod state_dir;
pub mod tracing;

pub use config::ClientConfig;
pub use credentials::{
    ACCESS_TOKEN_KEY, CredentialStore, MemoryCredentialStore, REFRESH_TOKEN_KEY, clear_session,
    store_session,
};
pub use error::{CoreError, CoreResult};

#[cfg(not(target_arch = "wasm32"))]
pub use credentials::FileCredentialStore;
#[cfg(target_arch = "wasm32")]
pub use credentials::LocalStorageCredentialStore;
#[cfg(not(target_arch = "wasm32"))]
pub use state_dir::StateDir;

//! examkit HTTP client
//!
//! A typed client for the examkit REST API: authentication, master-data
//! lookups, exam generation and document upload. Credentials live in an
//! injected [`CredentialStore`](examkit_core::CredentialStore); an expired
//! access credential is renewed from the stored refresh credential.

pub mod client;
pub mod types;

pub use client::cache::{QueryCache, QueryKey};
pub use client::error::ClientError;
pub use client::refresh::refresh_access_token;
pub use client::resource::Resource;
pub use client::{ApiClient, ApiClientBuilder};
pub use examkit_core::config::Routes;

//! Client configuration
//!
//! Settings are layered with the `config` crate: built-in defaults, then an
//! optional file, then `EXAMKIT_*` environment variables (nested keys use a
//! double underscore, e.g. `EXAMKIT_API__BASE_URL`).

use crate::CoreResult;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "EXAMKIT";

/// Main client configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// API endpoint settings
    pub api: ApiConfig,

    /// Authentication behaviour and route table
    pub auth: AuthConfig,

    /// Query cache settings
    pub cache: CacheConfig,

    /// Where credentials are persisted
    pub credentials: CredentialsConfig,
}

/// API endpoint settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL every route is appended to
    pub base_url: String,

    /// Request timeout in seconds (0 disables the timeout)
    pub timeout_secs: u64,

    /// User agent sent with every request
    pub user_agent: String,
}

/// Authentication settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Coalesce overlapping token refreshes into a single request
    pub coalesce_refresh: bool,

    /// Endpoint paths
    pub routes: Routes,
}

/// Query cache settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Seconds a cached query result stays fresh (0 disables caching)
    pub stale_secs: u64,
}

/// Credential persistence settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialsConfig {
    /// Credential file path; defaults to `credentials.json` in the data directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// Endpoint paths, relative to the API base URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Routes {
    pub login: String,
    pub register: String,
    pub logout: String,
    pub me: String,
    pub refresh_token: String,
    pub grades: String,
    pub subjects: String,
    pub chapters: String,
    pub lessons: String,
    pub exam_generate: String,
    pub exams: String,
    pub upload_document: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api".to_string(),
            timeout_secs: 30,
            user_agent: concat!("examkit/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            coalesce_refresh: true,
            routes: Routes::default(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { stale_secs: 300 }
    }
}

impl Default for Routes {
    fn default() -> Self {
        Self {
            login: "/auth/login".to_string(),
            register: "/auth/register".to_string(),
            logout: "/auth/logout".to_string(),
            me: "/auth/me".to_string(),
            refresh_token: "/auth/refresh-token".to_string(),
            grades: "/master/grades".to_string(),
            subjects: "/master/subjects".to_string(),
            chapters: "/master/chapters".to_string(),
            lessons: "/master/lessons".to_string(),
            exam_generate: "/exam/generate".to_string(),
            exams: "/exam".to_string(),
            upload_document: "/upload/document".to_string(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from an optional file plus environment overrides
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or a value cannot be parsed
    pub fn load(path: Option<&Path>) -> CoreResult<Self> {
        Self::load_with_environment(path, Self::environment())
    }

    /// `EXAMKIT_*` variables, with `__` separating nested keys
    fn environment() -> config::Environment {
        config::Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
    }

    fn load_with_environment(
        path: Option<&Path>,
        environment: config::Environment,
    ) -> CoreResult<Self> {
        let mut builder = config::Config::builder()
            .add_source(config::Config::try_from(&Self::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }

        let settings = builder.add_source(environment).build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Request timeout, if one is configured
    pub fn timeout(&self) -> Option<std::time::Duration> {
        (self.api.timeout_secs > 0).then(|| std::time::Duration::from_secs(self.api.timeout_secs))
    }

    /// How long cached query results stay fresh
    pub fn stale_time(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.cache.stale_secs)
    }
}

//! examkit API client

pub mod auth;
pub mod cache;
pub mod error;
pub mod exam;
pub mod refresh;
pub mod resource;
pub mod upload;

use cache::QueryCache;
use error::ClientError;
use examkit_core::config::Routes;
use examkit_core::{ACCESS_TOKEN_KEY, ClientConfig, CredentialStore, MemoryCredentialStore};
use refresh::SingleFlight;
use reqwest::{Client, ClientBuilder, Response, header};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// examkit API client
///
/// Cloning is cheap: clones share the connection pool, credential store,
/// query cache and refresh gate.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    routes: Arc<Routes>,
    store: Arc<dyn CredentialStore>,
    cache: Arc<QueryCache>,
    refresh_gate: Option<Arc<SingleFlight>>,
}

impl ApiClient {
    /// Create a new client with default configuration and an in-memory credential store
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::builder().base_url(base_url).build()
    }

    /// Create a new client builder
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    /// Create a client from loaded configuration
    pub fn from_config(
        config: &ClientConfig,
        store: Arc<dyn CredentialStore>,
    ) -> Result<Self, ClientError> {
        let mut builder = Self::builder()
            .base_url(&config.api.base_url)
            .user_agent(&config.api.user_agent)
            .routes(config.auth.routes.clone())
            .coalesce_refresh(config.auth.coalesce_refresh)
            .stale_time(config.stale_time())
            .credential_store(store);

        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }

        builder.build()
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Endpoint paths used by this client
    pub fn routes(&self) -> &Routes {
        &self.routes
    }

    /// The credential store requests are authorized from
    pub fn store(&self) -> &dyn CredentialStore {
        self.store.as_ref()
    }

    /// The query cache shared by this client's resources
    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// Create a request builder without authentication
    pub fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        self.client.request(method, url)
    }

    /// Create a request builder carrying the stored access credential
    ///
    /// The credential is read from the store on every call. Without one the
    /// request goes out unauthenticated and the server decides.
    pub fn authorized(
        &self,
        method: reqwest::Method,
        path: &str,
    ) -> Result<reqwest::RequestBuilder, ClientError> {
        let mut request = self.request(method, path);

        if let Some(token) = self.store.get(ACCESS_TOKEN_KEY)? {
            request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        Ok(request)
    }

    /// Execute a request and handle common errors
    pub async fn execute<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ClientError> {
        let response = Self::check(request.send().await?).await?;
        decode(response).await
    }

    /// Execute an authorized request, refreshing the access credential once on 401
    ///
    /// `build` is called again for the retry so the new credential is picked up.
    pub async fn execute_authorized<T, F>(&self, build: F) -> Result<T, ClientError>
    where
        T: serde::de::DeserializeOwned,
        F: Fn() -> Result<reqwest::RequestBuilder, ClientError>,
    {
        let response = self.send_authorized(build).await?;
        decode(response).await
    }

    /// Like [`execute_authorized`](Self::execute_authorized) but discards the response body
    pub async fn execute_authorized_unit<F>(&self, build: F) -> Result<(), ClientError>
    where
        F: Fn() -> Result<reqwest::RequestBuilder, ClientError>,
    {
        self.send_authorized(build).await.map(drop)
    }

    /// Obtain a fresh access credential from the stored refresh credential
    ///
    /// When refresh coalescing is enabled, callers that overlap with an
    /// in-flight refresh reuse its result instead of issuing their own request.
    pub async fn refresh_token(&self) -> Result<String, ClientError> {
        match &self.refresh_gate {
            Some(gate) => gate.refresh(self).await,
            None => refresh::refresh_access_token(self).await,
        }
    }

    async fn send_authorized<F>(&self, build: F) -> Result<Response, ClientError>
    where
        F: Fn() -> Result<reqwest::RequestBuilder, ClientError>,
    {
        match Self::check(build()?.send().await?).await {
            Err(error) if error.is_auth_expired() => {
                debug!("Access token rejected, refreshing before retry");
                self.refresh_token().await?;
                Self::check(build()?.send().await?).await
            }
            other => other,
        }
    }

    async fn check(response: Response) -> Result<Response, ClientError> {
        let status = response.status();

        if status.is_success() {
            Ok(response)
        } else {
            debug!(path = %response.url().path(), %status, "Request rejected");
            let message = response.text().await.unwrap_or_else(|_| status.to_string());
            Err(ClientError::from_status(status, message))
        }
    }
}

async fn decode<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let body = response.bytes().await?;
    Ok(serde_json::from_slice(&body)?)
}

/// Builder for ApiClient
pub struct ApiClientBuilder {
    base_url: Option<String>,
    timeout: Option<Duration>,
    user_agent: Option<String>,
    routes: Routes,
    store: Option<Arc<dyn CredentialStore>>,
    stale_time: Duration,
    coalesce_refresh: bool,
}

impl Default for ApiClientBuilder {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout: None,
            user_agent: None,
            routes: Routes::default(),
            store: None,
            stale_time: cache::DEFAULT_STALE_TIME,
            coalesce_refresh: true,
        }
    }
}

impl ApiClientBuilder {
    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the request timeout (ignored on wasm32)
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Replace the endpoint table
    pub fn routes(mut self, routes: Routes) -> Self {
        self.routes = routes;
        self
    }

    /// Set the store credentials are read from and written to
    pub fn credential_store(mut self, store: Arc<dyn CredentialStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// How long cached query results stay fresh; zero disables caching
    pub fn stale_time(mut self, stale_time: Duration) -> Self {
        self.stale_time = stale_time;
        self
    }

    /// Coalesce overlapping token refreshes (enabled by default)
    pub fn coalesce_refresh(mut self, enabled: bool) -> Self {
        self.coalesce_refresh = enabled;
        self
    }

    /// Build the client
    pub fn build(self) -> Result<ApiClient, ClientError> {
        let base_url = self
            .base_url
            .ok_or_else(|| ClientError::Configuration("base_url is required".into()))?;

        url::Url::parse(&base_url)
            .map_err(|e| ClientError::Configuration(format!("invalid base_url {base_url:?}: {e}")))?;

        // Ensure base_url ends without a trailing slash
        let base_url = base_url.trim_end_matches('/').to_string();

        let mut client_builder = ClientBuilder::new();

        #[cfg(not(target_arch = "wasm32"))]
        if let Some(timeout) = self.timeout {
            client_builder = client_builder.timeout(timeout);
        }

        #[cfg(target_arch = "wasm32")]
        let _ = self.timeout; // Timeouts not supported on WASM

        if let Some(user_agent) = self.user_agent {
            client_builder = client_builder.user_agent(user_agent);
        } else {
            client_builder =
                client_builder.user_agent(concat!("examkit/", env!("CARGO_PKG_VERSION")));
        }

        let client = client_builder.build()?;

        Ok(ApiClient {
            client,
            base_url,
            routes: Arc::new(self.routes),
            store: self
                .store
                .unwrap_or_else(|| Arc::new(MemoryCredentialStore::new())),
            cache: Arc::new(QueryCache::new(self.stale_time)),
            refresh_gate: self
                .coalesce_refresh
                .then(|| Arc::new(SingleFlight::default())),
        })
    }
}

//! Access credential refresh
//!
//! [`refresh_access_token`] is the bare exchange: one request, no locking,
//! concurrent callers race and the last write wins. [`SingleFlight`] sits in
//! front of it so that callers overlapping an in-flight refresh wait for it
//! and reuse its result.

use super::{ApiClient, ClientError};
use crate::types::{ApiEnvelope, RefreshTokenRequest, RefreshTokenResponse};
use examkit_core::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Exchange the stored refresh credential for a new access credential
///
/// Sends exactly one request to the refresh route. On success the new access
/// credential is written under `token` and returned; nothing else in the
/// store is touched. Fails with [`ClientError::MissingCredential`] before any
/// network activity when no refresh credential is stored. Transport and
/// response errors are returned as they come, without retry.
pub async fn refresh_access_token(client: &ApiClient) -> Result<String, ClientError> {
    let refresh_token = client
        .store()
        .get(REFRESH_TOKEN_KEY)?
        .ok_or(ClientError::MissingCredential(REFRESH_TOKEN_KEY))?;

    let route = &client.routes().refresh_token;
    debug!(route = %route, "Refreshing access token");

    let request = client
        .request(reqwest::Method::POST, route)
        .json(&RefreshTokenRequest { refresh_token });

    let response: ApiEnvelope<RefreshTokenResponse> =
        client.execute(request).await.inspect_err(|e| {
            warn!("Access token refresh failed: {e}");
        })?;

    let token = response.data.token;
    client.store().set(ACCESS_TOKEN_KEY, &token)?;
    info!("Access token refreshed");

    Ok(token)
}

/// Coalesces overlapping refreshes for one client
///
/// Callers queue on an async mutex. A caller that gets the lock after some
/// other caller's refresh succeeded returns the stored access credential
/// without another request. A failed refresh is not shared: the next caller
/// in line tries on its own and every caller sees its own error.
#[derive(Debug, Default)]
pub struct SingleFlight {
    gate: Mutex<()>,
    completed: AtomicU64,
}

impl SingleFlight {
    /// Refresh through the gate
    pub async fn refresh(&self, client: &ApiClient) -> Result<String, ClientError> {
        let observed = self.completed.load(Ordering::Acquire);
        let _guard = self.gate.lock().await;

        if self.completed.load(Ordering::Acquire) != observed {
            if let Some(token) = client.store().get(ACCESS_TOKEN_KEY)? {
                debug!("Reusing access token from a concurrent refresh");
                return Ok(token);
            }
        }

        let token = refresh_access_token(client).await?;
        self.completed.fetch_add(1, Ordering::AcqRel);
        Ok(token)
    }

    /// Number of refreshes that completed through this gate
    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use examkit_core::{CoreResult, CredentialStore};
    use mockall::mock;
    use mockall::predicate::eq;
    use serde_json::json;
    use std::sync::Arc;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    mock! {
        pub Store {}

        impl CredentialStore for Store {
            fn get(&self, key: &str) -> CoreResult<Option<String>>;
            fn set(&self, key: &str, value: &str) -> CoreResult<()>;
            fn remove(&self, key: &str) -> CoreResult<()>;
        }
    }

    #[tokio::test]
    async fn test_refresh_never_reads_access_token() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/auth/refresh-token"))
            .and(body_json(json!({ "refreshToken": "R1" })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "data": { "token": "A2" } })),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let mut store = MockStore::new();
        store
            .expect_get()
            .with(eq(REFRESH_TOKEN_KEY))
            .times(1)
            .returning(|_| Ok(Some("R1".to_string())));
        store
            .expect_get()
            .with(eq(ACCESS_TOKEN_KEY))
            .never();
        store
            .expect_set()
            .with(eq(ACCESS_TOKEN_KEY), eq("A2"))
            .times(1)
            .returning(|_, _| Ok(()));
        store.expect_remove().never();

        let client = ApiClient::builder()
            .base_url(mock_server.uri())
            .credential_store(Arc::new(store))
            .build()
            .unwrap();

        let token = refresh_access_token(&client).await.unwrap();
        assert_eq!(token, "A2");
    }

    #[tokio::test]
    async fn test_store_read_failure_skips_network() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let mut store = MockStore::new();
        store
            .expect_get()
            .returning(|_| Err(examkit_core::CoreError::storage_error("disk gone")));

        let client = ApiClient::builder()
            .base_url(mock_server.uri())
            .credential_store(Arc::new(store))
            .build()
            .unwrap();

        let result = refresh_access_token(&client).await;
        assert!(matches!(result, Err(ClientError::Store(_))));
    }

    #[test]
    fn test_single_flight_starts_idle() {
        let gate = SingleFlight::default();
        assert_eq!(gate.completed(), 0);
    }
}

//! Authentication API client methods

use super::{ApiClient, ClientError};
use crate::types::{ApiEnvelope, LoginRequest, RegisterRequest, Session};
use examkit_core::{clear_session, store_session};
use reqwest::Method;
use serde::de::DeserializeOwned;
use tracing::{info, warn};

impl ApiClient {
    /// Log in with email and password, persisting both credentials
    pub async fn login(
        &self,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Session, ClientError> {
        let request = self
            .request(Method::POST, &self.routes().login)
            .json(&LoginRequest {
                email: email.into(),
                password: password.into(),
            });
        let session = self.open_session(request).await?;
        info!("Logged in");
        Ok(session)
    }

    /// Create an account, persisting the credentials it comes with
    pub async fn register(&self, registration: &RegisterRequest) -> Result<Session, ClientError> {
        let request = self
            .request(Method::POST, &self.routes().register)
            .json(registration);
        let session = self.open_session(request).await?;
        info!("Registered new account");
        Ok(session)
    }

    /// Log out
    ///
    /// The server is told on a best-effort basis. Local credentials and the
    /// query cache are cleared whatever the server says.
    pub async fn logout(&self) -> Result<(), ClientError> {
        if let Err(e) = self
            .execute_authorized_unit(|| self.authorized(Method::POST, &self.routes().logout))
            .await
        {
            warn!("Logout request failed, clearing local session anyway: {e}");
        }

        clear_session(self.store())?;
        self.cache().clear();
        info!("Logged out");
        Ok(())
    }

    /// Current user profile
    pub async fn me<T: DeserializeOwned>(&self) -> Result<T, ClientError> {
        let response: ApiEnvelope<T> = self
            .execute_authorized(|| self.authorized(Method::GET, &self.routes().me))
            .await?;
        Ok(response.data)
    }

    async fn open_session(&self, request: reqwest::RequestBuilder) -> Result<Session, ClientError> {
        let response: ApiEnvelope<Session> = self.execute(request).await?;
        let session = response.data;
        store_session(self.store(), &session.token, &session.refresh_token)?;
        self.cache().clear();
        Ok(session)
    }
}

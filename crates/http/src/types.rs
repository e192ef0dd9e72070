//! Wire types shared by the client operations

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Success envelope wrapping every response payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub data: T,
}

/// Login request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Registration request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    /// Any additional profile fields the server accepts
    #[serde(flatten)]
    pub extra: serde_json::Map<String, JsonValue>,
}

/// Credentials returned by login and registration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Access credential
    pub token: String,
    /// Refresh credential
    pub refresh_token: String,
    /// Remaining response fields (user profile and the like)
    #[serde(flatten)]
    pub extra: serde_json::Map<String, JsonValue>,
}

/// Refresh request body; carries only the refresh credential
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

/// Refresh response payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshTokenResponse {
    /// The new access credential
    pub token: String,
}

/// Result of a document upload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadedDocument {
    /// Where the stored document can be fetched from
    pub url: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, JsonValue>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_refresh_request_field_name() {
        let body = serde_json::to_value(RefreshTokenRequest {
            refresh_token: "R1".into(),
        })
        .unwrap();
        assert_eq!(body, json!({ "refreshToken": "R1" }));
    }

    #[test]
    fn test_session_keeps_extra_fields() {
        let session: Session = serde_json::from_value(json!({
            "token": "A1",
            "refreshToken": "R1",
            "user": { "id": 7 }
        }))
        .unwrap();
        assert_eq!(session.token, "A1");
        assert_eq!(session.refresh_token, "R1");
        assert_eq!(session.extra["user"]["id"], 7);
    }

    #[test]
    fn test_refresh_response_requires_token() {
        let parsed: Result<ApiEnvelope<RefreshTokenResponse>, _> =
            serde_json::from_value(json!({ "data": {} }));
        assert!(parsed.is_err());
    }
}

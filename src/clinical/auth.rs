//! Bearer token acquisition via the OAuth client-credentials flow.

use super::ClinicalClient;
use crate::error::{Result, TolkError};
use serde::Deserialize;
use tracing::{debug, instrument};

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

impl ClinicalClient {
    /// Exchange the configured client credentials for a short-lived bearer
    /// token. Tokens are not cached; every workflow run calls this again.
    #[instrument(skip(self))]
    pub async fn acquire_token(&self) -> Result<String> {
        debug!("Requesting bearer token from {}", self.auth_url);

        let response = self
            .http
            .post(&self.auth_url)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("grant_type", "client_credentials"),
                ("scope", "openid"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(TolkError::Auth { status, body });
        }

        let token: TokenResponse = response.json().await?;
        if token.access_token.is_empty() {
            return Err(TolkError::Auth {
                status: 200,
                body: "identity provider returned an empty access_token".to_string(),
            });
        }

        Ok(token.access_token)
    }
}

#[cfg(test)]
mod tests {
    use crate::clinical::testing::{spawn_stub, stub_client};
    use axum::routing::post;
    use axum::{Form, Json, Router};
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct TokenForm {
        client_id: String,
        grant_type: String,
        scope: String,
    }

    #[tokio::test]
    async fn test_acquire_token_returns_access_token() {
        let router = Router::new().route(
            "/realms/base/protocol/openid-connect/token",
            post(|Form(form): Form<TokenForm>| async move {
                assert_eq!(form.client_id, "test-client");
                assert_eq!(form.grant_type, "client_credentials");
                assert_eq!(form.scope, "openid");
                Json(serde_json::json!({
                    "access_token": "tok-123",
                    "expires_in": 300,
                    "token_type": "Bearer"
                }))
            }),
        );
        let base = spawn_stub(router).await;
        let client = stub_client(&base);

        let token = client.acquire_token().await.unwrap();
        assert_eq!(token, "tok-123");
        assert!(!token.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_credentials_surface_as_auth_error() {
        let router = Router::new().route(
            "/realms/base/protocol/openid-connect/token",
            post(|| async {
                (
                    axum::http::StatusCode::UNAUTHORIZED,
                    Json(serde_json::json!({"error": "invalid_client"})),
                )
            }),
        );
        let base = spawn_stub(router).await;
        let client = stub_client(&base);

        let err = client.acquire_token().await.unwrap_err();
        match err {
            crate::TolkError::Auth { status, body } => {
                assert_eq!(status, 401);
                assert!(body.contains("invalid_client"));
            }
            other => panic!("expected Auth error, got {:?}", other),
        }
    }
}

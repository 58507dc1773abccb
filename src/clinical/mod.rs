//! Client for the clinical transcription service.
//!
//! The service models a dictation workflow as an *interaction* (one clinical
//! encounter) that owns uploaded *recordings* and requested *transcripts*.
//! The full chain is: acquire bearer token, create interaction, upload the
//! audio bytes, request a transcript for the recording.
//!
//! Every call re-authenticates; tokens are short-lived and never cached.

mod auth;
mod recording;
mod session;
mod transcript;

pub use transcript::{join_segments, TranscriptSegment, TranscriptStatus};

use crate::config::ClinicalSettings;
use crate::error::{Result, TolkError};
use std::time::Duration;

/// Client for the clinical transcription API.
///
/// Holds the resolved endpoints and credentials; all operations take the
/// bearer token explicitly so one token can drive a whole workflow run.
pub struct ClinicalClient {
    http: reqwest::Client,
    auth_url: String,
    api_url: String,
    tenant: String,
    client_id: String,
    client_secret: String,
    language: String,
    model_name: String,
    diarize: bool,
}

impl ClinicalClient {
    /// Create a client from settings, resolving credentials from the
    /// environment where configured.
    pub fn from_settings(settings: &ClinicalSettings) -> Result<Self> {
        let (client_id, client_secret) = settings.credentials()?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            auth_url: settings.auth_url.clone(),
            api_url: settings.api_url.trim_end_matches('/').to_string(),
            tenant: settings.tenant.clone(),
            client_id,
            client_secret,
            language: settings.language.clone(),
            model_name: settings.model_name.clone(),
            diarize: settings.diarize,
        })
    }

    /// Convert a non-2xx response into a typed clinical API error.
    async fn ensure_success(
        operation: &'static str,
        response: reqwest::Response,
    ) -> Result<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Err(TolkError::Clinical {
            operation,
            status,
            body,
        })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::config::ClinicalSettings;
    use super::ClinicalClient;

    /// Bind a stub provider on an ephemeral port and return its base URL.
    pub(crate) async fn spawn_stub(router: axum::Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    /// Build a client pointed at a stub base URL.
    ///
    /// Constructed directly rather than via `from_settings` so environment
    /// overrides cannot shadow the stub credentials.
    pub(crate) fn stub_client(base: &str) -> ClinicalClient {
        let defaults = ClinicalSettings::default();
        ClinicalClient {
            http: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(5))
                .build()
                .unwrap(),
            auth_url: format!("{}/realms/base/protocol/openid-connect/token", base),
            api_url: format!("{}/v2", base),
            tenant: defaults.tenant,
            client_id: "test-client".to_string(),
            client_secret: "test-secret".to_string(),
            language: defaults.language,
            model_name: defaults.model_name,
            diarize: defaults.diarize,
        }
    }
}

//! Recording upload for an existing interaction.

use super::ClinicalClient;
use crate::error::{Result, TolkError};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info, instrument};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecordingCreated {
    recording_id: String,
}

impl ClinicalClient {
    /// Upload a local audio file's raw bytes to an interaction. The file must
    /// exist; a missing path fails before any network traffic.
    #[instrument(skip(self, token), fields(audio_path = %audio_path.display()))]
    pub async fn upload_recording(
        &self,
        token: &str,
        interaction_id: &str,
        audio_path: &Path,
    ) -> Result<String> {
        if !audio_path.exists() {
            return Err(TolkError::InvalidInput(format!(
                "audio file not found: {}",
                audio_path.display()
            )));
        }

        let bytes = tokio::fs::read(audio_path).await?;
        debug!(
            "Uploading {} bytes to interaction {}",
            bytes.len(),
            interaction_id
        );

        let response = self
            .http
            .post(format!(
                "{}/interactions/{}/recordings",
                self.api_url, interaction_id
            ))
            .bearer_auth(token)
            .header("Tenant-Name", &self.tenant)
            .header("Content-Type", "application/octet-stream")
            .body(bytes)
            .send()
            .await?;

        let response = Self::ensure_success("upload_recording", response).await?;
        let created: RecordingCreated = response.json().await?;

        info!("Uploaded recording {}", created.recording_id);
        Ok(created.recording_id)
    }
}

#[cfg(test)]
mod tests {
    use crate::clinical::testing::{spawn_stub, stub_client};
    use axum::routing::post;
    use axum::{Json, Router};
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_missing_file_skips_network_call() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let router = Router::new().route(
            "/v2/interactions/{id}/recordings",
            post(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Json(serde_json::json!({"recordingId": "rec-1"})) }
            }),
        );
        let base = spawn_stub(router).await;
        let client = stub_client(&base);

        let err = client
            .upload_recording("tok", "int-1", std::path::Path::new("/nonexistent/audio.wav"))
            .await
            .unwrap_err();

        assert!(matches!(err, crate::TolkError::InvalidInput(_)));
        assert_eq!(hits.load(Ordering::SeqCst), 0, "no request may be sent");
    }

    #[tokio::test]
    async fn test_upload_streams_raw_bytes() {
        let router = Router::new().route(
            "/v2/interactions/{id}/recordings",
            post(
                |headers: axum::http::HeaderMap, body: axum::body::Bytes| async move {
                    assert_eq!(headers.get("content-type").unwrap(), "application/octet-stream");
                    assert_eq!(&body[..], b"RIFFfake-wav");
                    Json(serde_json::json!({"recordingId": "rec-9"}))
                },
            ),
        );
        let base = spawn_stub(router).await;
        let client = stub_client(&base);

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"RIFFfake-wav").unwrap();

        let id = client
            .upload_recording("tok", "int-1", file.path())
            .await
            .unwrap();
        assert_eq!(id, "rec-9");
    }
}

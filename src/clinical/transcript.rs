//! Transcript requests for an uploaded recording.
//!
//! The service answers either with finished segments or with an empty body
//! meaning the transcript is still being produced. There is no polling here;
//! a pending transcript is reported as [`TranscriptStatus::Pending`] and the
//! recording is never re-requested.

use super::ClinicalClient;
use crate::error::Result;
use serde::Deserialize;
use tracing::{info, instrument, warn};

/// One finished transcript segment.
#[derive(Debug, Clone, Deserialize)]
pub struct TranscriptSegment {
    pub text: String,
}

/// Outcome of a transcript request.
#[derive(Debug, Clone, PartialEq)]
pub enum TranscriptStatus {
    /// The service returned finished segments, joined into one text.
    Ready(String),
    /// The service accepted the request but has no segments yet.
    Pending,
}

#[derive(Debug, Deserialize)]
struct TranscriptResponse {
    #[serde(default)]
    transcripts: Vec<TranscriptSegment>,
}

/// Join finished segments into a single text, in order, single-space
/// separated.
pub fn join_segments(segments: &[TranscriptSegment]) -> String {
    segments
        .iter()
        .map(|s| s.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

impl ClinicalClient {
    /// Request a transcript for a previously uploaded recording.
    #[instrument(skip(self, token))]
    pub async fn request_transcript(
        &self,
        token: &str,
        interaction_id: &str,
        recording_id: &str,
    ) -> Result<TranscriptStatus> {
        let payload = serde_json::json!({
            "recordingId": recording_id,
            "primaryLanguage": self.language,
            "modelName": self.model_name,
            "diarize": self.diarize,
        });

        let response = self
            .http
            .post(format!(
                "{}/interactions/{}/transcripts",
                self.api_url, interaction_id
            ))
            .bearer_auth(token)
            .header("Tenant-Name", &self.tenant)
            .json(&payload)
            .send()
            .await?;

        let response = Self::ensure_success("request_transcript", response).await?;
        let parsed: TranscriptResponse = response.json().await?;

        if parsed.transcripts.is_empty() {
            warn!(
                "Transcript for recording {} not ready; no polling is performed",
                recording_id
            );
            return Ok(TranscriptStatus::Pending);
        }

        let text = join_segments(&parsed.transcripts);
        info!(
            "Transcript ready: {} segments, {} chars",
            parsed.transcripts.len(),
            text.len()
        );
        Ok(TranscriptStatus::Ready(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clinical::testing::{spawn_stub, stub_client};
    use axum::routing::post;
    use axum::{Json, Router};

    fn seg(text: &str) -> TranscriptSegment {
        TranscriptSegment {
            text: text.to_string(),
        }
    }

    #[test]
    fn test_join_preserves_order_and_spacing() {
        let segments = vec![seg("Patienten"), seg("har"), seg("feber.")];
        assert_eq!(join_segments(&segments), "Patienten har feber.");
    }

    #[test]
    fn test_join_single_segment() {
        assert_eq!(join_segments(&[seg("Hej")]), "Hej");
    }

    #[tokio::test]
    async fn test_finished_segments_are_joined() {
        let router = Router::new().route(
            "/v2/interactions/{id}/transcripts",
            post(|Json(body): Json<serde_json::Value>| async move {
                assert_eq!(body["recordingId"], "rec-1");
                assert_eq!(body["primaryLanguage"], "da");
                assert_eq!(body["modelName"], "Base");
                assert_eq!(body["diarize"], false);
                Json(serde_json::json!({
                    "transcripts": [
                        {"text": "Det", "speaker": 0},
                        {"text": "går", "speaker": 0},
                        {"text": "godt.", "speaker": 0}
                    ]
                }))
            }),
        );
        let base = spawn_stub(router).await;
        let client = stub_client(&base);

        let status = client
            .request_transcript("tok", "int-1", "rec-1")
            .await
            .unwrap();
        assert_eq!(status, TranscriptStatus::Ready("Det går godt.".to_string()));
    }

    #[tokio::test]
    async fn test_empty_body_means_pending() {
        let router = Router::new().route(
            "/v2/interactions/{id}/transcripts",
            post(|| async { Json(serde_json::json!({})) }),
        );
        let base = spawn_stub(router).await;
        let client = stub_client(&base);

        let status = client
            .request_transcript("tok", "int-1", "rec-1")
            .await
            .unwrap();
        assert_eq!(status, TranscriptStatus::Pending);
    }
}

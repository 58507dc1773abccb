//! Dual-transcription workflow coordination.
//!
//! One run takes a local audio file through both providers: the generic
//! transcriber gets the file directly, while the clinical side walks the
//! token -> interaction -> recording -> transcript chain. The two halves run
//! concurrently; neither is ordered with respect to the other.

use crate::clinical::{ClinicalClient, TranscriptStatus};
use crate::config::Settings;
use crate::error::Result;
use crate::store::JobStatus;
use crate::transcription::{SpeechToText, WhisperTranscriber};
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Outcome of one workflow run, one result per provider.
///
/// Callers decide what a partial result means; nothing is swallowed into
/// placeholder strings.
pub struct PipelineReport {
    pub whisper: Result<String>,
    pub clinical: Result<TranscriptStatus>,
}

impl PipelineReport {
    /// The whisper transcript, when the generic side succeeded.
    pub fn whisper_text(&self) -> Option<&str> {
        self.whisper.as_deref().ok()
    }

    /// The clinical transcript, when the chain succeeded and the service had
    /// finished segments to return.
    pub fn clinical_text(&self) -> Option<&str> {
        match &self.clinical {
            Ok(TranscriptStatus::Ready(text)) => Some(text),
            _ => None,
        }
    }

    /// Terminal job status for this run: `Failed` only when neither provider
    /// produced a transcript, `Completed` otherwise.
    pub fn job_status(&self) -> JobStatus {
        if self.whisper_text().is_none() && self.clinical_text().is_none() {
            JobStatus::Failed
        } else {
            JobStatus::Completed
        }
    }

    /// Human-readable account of whatever went short on this run, also kept
    /// on completed jobs whose clinical or whisper side fell through.
    pub fn failure_reason(&self) -> Option<String> {
        let mut notes = Vec::new();
        if let Err(e) = &self.whisper {
            notes.push(format!("whisper: {}", e));
        }
        match &self.clinical {
            Err(e) => notes.push(format!("clinical: {}", e)),
            Ok(TranscriptStatus::Pending) => {
                notes.push("clinical: transcript not ready (no polling is performed)".to_string())
            }
            Ok(TranscriptStatus::Ready(_)) => {}
        }
        if notes.is_empty() {
            None
        } else {
            Some(notes.join("; "))
        }
    }
}

/// Trait for transcription workflows, seam for the server's worker pool.
#[async_trait]
pub trait Pipeline: Send + Sync {
    /// Run both providers over one audio file.
    async fn run(&self, audio_path: &Path, language: Option<&str>) -> PipelineReport;
}

/// Production pipeline: Whisper plus the clinical service chain.
pub struct TranscriptionPipeline {
    whisper: Arc<dyn SpeechToText>,
    clinical: ClinicalClient,
    default_language: String,
}

impl TranscriptionPipeline {
    /// Build the pipeline from settings.
    pub fn new(settings: &Settings) -> Result<Self> {
        Ok(Self {
            whisper: Arc::new(WhisperTranscriber::new(
                &settings.transcription.model,
                settings.transcription.timeout_secs,
            )),
            clinical: ClinicalClient::from_settings(&settings.clinical)?,
            default_language: settings.transcription.language.clone(),
        })
    }

    /// The clinical half: token, interaction, upload, transcript request.
    /// Every run re-acquires a token; ids are never reused across runs.
    async fn clinical_chain(&self, audio_path: &Path) -> Result<TranscriptStatus> {
        let token = self.clinical.acquire_token().await?;
        let interaction_id = self.clinical.create_interaction(&token).await?;
        let recording_id = self
            .clinical
            .upload_recording(&token, &interaction_id, audio_path)
            .await?;
        self.clinical
            .request_transcript(&token, &interaction_id, &recording_id)
            .await
    }
}

#[async_trait]
impl Pipeline for TranscriptionPipeline {
    #[instrument(skip(self), fields(audio_path = %audio_path.display()))]
    async fn run(&self, audio_path: &Path, language: Option<&str>) -> PipelineReport {
        let lang = language.or(if self.default_language.is_empty() {
            None
        } else {
            Some(self.default_language.as_str())
        });

        info!("Starting dual transcription");

        let (whisper, clinical) = tokio::join!(
            self.whisper.transcribe(audio_path, lang),
            self.clinical_chain(audio_path),
        );

        if let Err(e) = &whisper {
            warn!("Whisper transcription failed: {}", e);
        }
        if let Err(e) = &clinical {
            warn!("Clinical transcription failed: {}", e);
        }

        PipelineReport { whisper, clinical }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TolkError;

    fn report(
        whisper: Result<String>,
        clinical: Result<TranscriptStatus>,
    ) -> PipelineReport {
        PipelineReport { whisper, clinical }
    }

    #[test]
    fn test_both_ready_is_completed_without_reason() {
        let r = report(
            Ok("W".to_string()),
            Ok(TranscriptStatus::Ready("C".to_string())),
        );
        assert_eq!(r.job_status(), JobStatus::Completed);
        assert_eq!(r.whisper_text(), Some("W"));
        assert_eq!(r.clinical_text(), Some("C"));
        assert!(r.failure_reason().is_none());
    }

    #[test]
    fn test_one_side_failing_still_completes_but_keeps_reason() {
        let r = report(
            Ok("W".to_string()),
            Err(TolkError::Clinical {
                operation: "upload_recording",
                status: 503,
                body: "unavailable".to_string(),
            }),
        );
        assert_eq!(r.job_status(), JobStatus::Completed);
        assert_eq!(r.clinical_text(), None);
        let reason = r.failure_reason().unwrap();
        assert!(reason.starts_with("clinical:"));
        assert!(reason.contains("503"));
    }

    #[test]
    fn test_pending_clinical_completes_with_note() {
        let r = report(Ok("W".to_string()), Ok(TranscriptStatus::Pending));
        assert_eq!(r.job_status(), JobStatus::Completed);
        assert_eq!(r.clinical_text(), None);
        assert!(r.failure_reason().unwrap().contains("not ready"));
    }

    #[test]
    fn test_both_sides_failing_is_failed() {
        let r = report(
            Err(TolkError::Transcription("timeout".to_string())),
            Err(TolkError::Auth {
                status: 401,
                body: "invalid_client".to_string(),
            }),
        );
        assert_eq!(r.job_status(), JobStatus::Failed);
        let reason = r.failure_reason().unwrap();
        assert!(reason.contains("whisper: "));
        assert!(reason.contains("clinical: "));
    }

    #[test]
    fn test_whisper_failed_with_pending_clinical_is_failed() {
        let r = report(
            Err(TolkError::Transcription("timeout".to_string())),
            Ok(TranscriptStatus::Pending),
        );
        assert_eq!(r.job_status(), JobStatus::Failed);
    }
}

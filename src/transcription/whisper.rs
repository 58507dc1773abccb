//! OpenAI Whisper transcription implementation.

use super::SpeechToText;
use crate::error::{Result, TolkError};
use crate::openai::create_client;
use async_openai::types::{AudioResponseFormat, CreateTranscriptionRequestArgs};
use async_trait::async_trait;
use std::path::Path;
use tracing::{debug, instrument};

/// OpenAI Whisper-based transcriber.
pub struct WhisperTranscriber {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
}

impl WhisperTranscriber {
    /// Create a new Whisper transcriber for the given model and request
    /// timeout.
    pub fn new(model: &str, timeout_secs: u64) -> Self {
        Self {
            client: create_client(timeout_secs),
            model: model.to_string(),
        }
    }
}

/// Check if the OpenAI API key is configured.
pub fn is_api_key_configured() -> bool {
    std::env::var("OPENAI_API_KEY")
        .map(|key| !key.is_empty())
        .unwrap_or(false)
}

#[async_trait]
impl SpeechToText for WhisperTranscriber {
    #[instrument(skip(self), fields(audio_path = %audio_path.display()))]
    async fn transcribe(&self, audio_path: &Path, language: Option<&str>) -> Result<String> {
        if !audio_path.exists() {
            return Err(TolkError::InvalidInput(format!(
                "audio file not found: {}",
                audio_path.display()
            )));
        }

        debug!("Transcribing audio with {}", self.model);

        let file_bytes = tokio::fs::read(audio_path).await?;

        let mut request_builder = CreateTranscriptionRequestArgs::default();
        request_builder
            .file(async_openai::types::AudioInput::from_vec_u8(
                audio_path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("audio.wav")
                    .to_string(),
                file_bytes,
            ))
            .model(&self.model)
            .response_format(AudioResponseFormat::Json);

        if let Some(lang) = language {
            request_builder.language(lang);
        }

        let request = request_builder
            .build()
            .map_err(|e| TolkError::Transcription(format!("Failed to build request: {}", e)))?;

        let response = self
            .client
            .audio()
            .transcribe(request)
            .await
            .map_err(|e| TolkError::OpenAI(format!("{} API error: {}", self.model, e)))?;

        Ok(response.text.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_keeps_model() {
        // Just verify it creates without panicking (no API call)
        let transcriber = WhisperTranscriber::new("test-model", 30);
        assert_eq!(transcriber.model, "test-model");
    }

    #[tokio::test]
    async fn test_missing_file_is_invalid_input() {
        let transcriber = WhisperTranscriber::new("whisper-1", 30);
        let err = transcriber
            .transcribe(Path::new("/nonexistent/audio.wav"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, TolkError::InvalidInput(_)));
    }
}

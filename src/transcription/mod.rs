//! Generic speech-to-text transcription.
//!
//! The generic side of the dual-transcription workflow: the whole audio file
//! goes to a hosted model (OpenAI Whisper) and comes back as plain text.

mod whisper;

pub use whisper::{is_api_key_configured, WhisperTranscriber};

use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// Trait for generic speech-to-text services.
#[async_trait]
pub trait SpeechToText: Send + Sync {
    /// Transcribe an audio file to plain text, with an optional language hint.
    async fn transcribe(&self, audio_path: &Path, language: Option<&str>) -> Result<String>;
}

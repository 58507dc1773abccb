//! One-shot dual transcription of a local audio file.

use crate::cli::Output;
use crate::clinical::TranscriptStatus;
use crate::config::Settings;
use crate::error::{Result, TolkError};
use crate::pipeline::{Pipeline, TranscriptionPipeline};
use crate::transcription::is_api_key_configured;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;

/// Run both providers over one file and print the transcripts.
pub async fn run_transcribe(
    file: &str,
    language: Option<&str>,
    settings: Settings,
) -> Result<()> {
    let audio_path = Path::new(file);
    if !audio_path.exists() {
        return Err(TolkError::InvalidInput(format!(
            "audio file not found: {}",
            file
        )));
    }

    if !is_api_key_configured() {
        Output::warning("OPENAI_API_KEY is not set; the Whisper side will fail");
    }

    let pipeline = TranscriptionPipeline::new(&settings)?;

    Output::header("Dual Transcription");
    Output::kv("File", file);

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("  {spinner:.green} Transcribing with both providers...")
            .expect("static template"),
    );
    pb.enable_steady_tick(Duration::from_millis(100));

    let report = pipeline.run(audio_path, language).await;
    pb.finish_and_clear();

    match &report.whisper {
        Ok(text) => Output::transcript("Whisper", text),
        Err(e) => Output::error(&format!("Whisper failed: {}", e)),
    }

    match &report.clinical {
        Ok(TranscriptStatus::Ready(text)) => Output::transcript("Clinical service", text),
        Ok(TranscriptStatus::Pending) => {
            Output::warning("Clinical transcript not ready yet; the service has no finished segments")
        }
        Err(e) => Output::error(&format!("Clinical service failed: {}", e)),
    }

    Ok(())
}

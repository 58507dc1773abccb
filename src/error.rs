//! Error types for Tolk.

use thiserror::Error;

/// Library-level error type for Tolk operations.
#[derive(Error, Debug)]
pub enum TolkError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication failed ({status}): {body}")]
    Auth { status: u16, body: String },

    #[error("Clinical API error during {operation} ({status}): {body}")]
    Clinical {
        operation: &'static str,
        status: u16,
        body: String,
    },

    #[error("Transcription failed: {0}")]
    Transcription(String),

    #[error("Transcript merge failed: {0}")]
    Merge(String),

    #[error("Manuscript generation failed: {0}")]
    Manuscript(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("Job not found: {0}")]
    JobNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for Tolk operations.
pub type Result<T> = std::result::Result<T, TolkError>;

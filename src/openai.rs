//! Shared OpenAI client construction.

use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Build an OpenAI client with the given request timeout.
///
/// Both the transcriber and the reconciler construct their clients here, so
/// the operator-facing `timeout_secs` settings are the single knob for how
/// long an audio upload or a reconciliation call may run.
pub fn create_client(timeout_secs: u64) -> Client<OpenAIConfig> {
    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .expect("Failed to create HTTP client");

    Client::with_config(OpenAIConfig::default()).with_http_client(http_client)
}

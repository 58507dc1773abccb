//! Interaction (encounter session) creation.

use super::ClinicalClient;
use crate::error::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use tracing::{debug, info, instrument};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InteractionCreated {
    interaction_id: String,
}

/// Build the interaction payload for one workflow run.
///
/// The encounter identifier, title, and patient identifier all carry the run
/// UUID so concurrent runs never trip the server's duplicate-key check.
pub(super) fn interaction_payload(run_id: Uuid, started_at: DateTime<Utc>) -> serde_json::Value {
    let ended_at = started_at + chrono::Duration::hours(1);
    serde_json::json!({
        "encounter": {
            "type": "emergency",
            "status": "in-progress",
            "identifier": format!("tolk-encounter-{}", run_id),
            "period": {
                "startedAt": started_at.to_rfc3339_opts(SecondsFormat::Secs, true),
                "endedAt": ended_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            },
            "title": format!("tolk-dictation-{}", run_id),
        },
        "patient": {
            "identifier": format!("tolk-patient-{}", run_id),
        },
    })
}

impl ClinicalClient {
    /// Create a new interaction and return its server-issued id.
    #[instrument(skip(self, token))]
    pub async fn create_interaction(&self, token: &str) -> Result<String> {
        let run_id = Uuid::new_v4();
        let payload = interaction_payload(run_id, Utc::now());
        debug!("Creating interaction (run {})", run_id);

        let response = self
            .http
            .post(format!("{}/interactions", self.api_url))
            .bearer_auth(token)
            .header("Tenant-Name", &self.tenant)
            .json(&payload)
            .send()
            .await?;

        let response = Self::ensure_success("create_interaction", response).await?;
        let created: InteractionCreated = response.json().await?;

        info!("Created interaction {}", created.interaction_id);
        Ok(created.interaction_id)
    }
}

//! Job record persistence.
//!
//! One transcription job per uploaded audio file. A job starts `processing`,
//! and the background workflow moves it to a terminal `completed` or
//! `failed` state exactly once; a user-edited merge may later be saved onto
//! it. There is no deletion path.

mod sqlite;

pub use sqlite::SqliteJobStore;

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle state of a transcription job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Upload accepted, background workflow not finished.
    Processing,
    /// Workflow finished with at least one usable transcript.
    Completed,
    /// Workflow finished with no usable transcript; see `failure_reason`.
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "processing" => Some(JobStatus::Processing),
            "completed" => Some(JobStatus::Completed),
            "failed" => Some(JobStatus::Failed),
            _ => None,
        }
    }
}

/// A persisted transcription job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub original_filename: String,
    pub status: JobStatus,
    /// Why the job failed, or which side of a completed job fell through.
    pub failure_reason: Option<String>,
    pub whisper_transcript: Option<String>,
    pub clinical_transcript: Option<String>,
    /// User-edited merged transcript, stored verbatim without validation.
    pub edited_transcript: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl Job {
    /// Create a fresh job in the `processing` state.
    pub fn new(original_filename: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            original_filename: original_filename.to_string(),
            status: JobStatus::Processing,
            failure_reason: None,
            whisper_transcript: None,
            clinical_transcript: None,
            edited_transcript: None,
            created_at: Utc::now(),
        }
    }
}

/// Trait for job record stores.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Persist a fresh job.
    async fn insert(&self, job: &Job) -> Result<()>;

    /// Fetch a job by id.
    async fn get(&self, id: Uuid) -> Result<Option<Job>>;

    /// All jobs, newest first.
    async fn list(&self) -> Result<Vec<Job>>;

    /// Write the workflow outcome onto a job. Called exactly once per job.
    async fn record_results(
        &self,
        id: Uuid,
        whisper: Option<&str>,
        clinical: Option<&str>,
        status: JobStatus,
        failure_reason: Option<&str>,
    ) -> Result<()>;

    /// Persist a user-edited merged transcript. Returns false when the job
    /// does not exist.
    async fn save_edited(&self, id: Uuid, document: &serde_json::Value) -> Result<bool>;
}

//! SQLite-based job store implementation.
//!
//! Single `jobs` table, created at startup if missing. Connections are
//! serialized behind a mutex; the workload is a handful of writes per job.

use super::{Job, JobStatus, JobStore};
use crate::error::{Result, TolkError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info, instrument};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS jobs (
    id TEXT PRIMARY KEY,
    original_filename TEXT NOT NULL,
    status TEXT NOT NULL,
    failure_reason TEXT,
    whisper_transcript TEXT,
    clinical_transcript TEXT,
    edited_transcript TEXT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_jobs_created_at ON jobs(created_at);
"#;

/// SQLite-based job store.
pub struct SqliteJobStore {
    conn: Mutex<Connection>,
}

impl SqliteJobStore {
    /// Open (or create) the job database at the given path.
    #[instrument(skip_all)]
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        // WAL keeps the HTTP handlers readable while a worker writes
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Initialized job store at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory job store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| TolkError::Config(format!("Failed to acquire store lock: {}", e)))
    }

    fn row_to_job(row: &Row<'_>) -> rusqlite::Result<Job> {
        let id_str: String = row.get(0)?;
        let status_str: String = row.get(2)?;
        let edited_str: Option<String> = row.get(6)?;
        let created_str: String = row.get(7)?;

        // A row this code did not write is corrupt; surface it instead of
        // fabricating values.
        let id = uuid::Uuid::parse_str(&id_str)
            .map_err(|e| Self::corrupt_column(0, Box::new(e)))?;
        let status = JobStatus::parse(&status_str).ok_or_else(|| {
            Self::corrupt_column(
                2,
                format!("unknown job status: {}", status_str).into(),
            )
        })?;
        let created_at = DateTime::parse_from_rfc3339(&created_str)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| Self::corrupt_column(7, Box::new(e)))?;

        Ok(Job {
            id,
            original_filename: row.get(1)?,
            status,
            failure_reason: row.get(3)?,
            whisper_transcript: row.get(4)?,
            clinical_transcript: row.get(5)?,
            edited_transcript: edited_str.and_then(|s| serde_json::from_str(&s).ok()),
            created_at,
        })
    }

    fn corrupt_column(
        index: usize,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> rusqlite::Error {
        rusqlite::Error::FromSqlConversionFailure(index, rusqlite::types::Type::Text, source)
    }
}

const JOB_COLUMNS: &str = "id, original_filename, status, failure_reason, \
                           whisper_transcript, clinical_transcript, edited_transcript, created_at";

#[async_trait]
impl JobStore for SqliteJobStore {
    #[instrument(skip(self, job), fields(job_id = %job.id))]
    async fn insert(&self, job: &Job) -> Result<()> {
        let conn = self.lock()?;

        conn.execute(
            r#"
            INSERT INTO jobs
            (id, original_filename, status, failure_reason,
             whisper_transcript, clinical_transcript, edited_transcript, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                job.id.to_string(),
                job.original_filename,
                job.status.as_str(),
                job.failure_reason,
                job.whisper_transcript,
                job.clinical_transcript,
                job.edited_transcript
                    .as_ref()
                    .map(|v| v.to_string()),
                job.created_at.to_rfc3339(),
            ],
        )?;

        debug!("Inserted job {}", job.id);
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get(&self, id: uuid::Uuid) -> Result<Option<Job>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(&format!("SELECT {} FROM jobs WHERE id = ?1", JOB_COLUMNS))?;
        let mut rows = stmt.query_map(params![id.to_string()], Self::row_to_job)?;

        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self))]
    async fn list(&self) -> Result<Vec<Job>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM jobs ORDER BY created_at DESC",
            JOB_COLUMNS
        ))?;
        let jobs = stmt
            .query_map([], Self::row_to_job)?
            .collect::<rusqlite::Result<Vec<Job>>>()?;

        Ok(jobs)
    }

    #[instrument(skip(self, whisper, clinical))]
    async fn record_results(
        &self,
        id: uuid::Uuid,
        whisper: Option<&str>,
        clinical: Option<&str>,
        status: JobStatus,
        failure_reason: Option<&str>,
    ) -> Result<()> {
        let conn = self.lock()?;

        let updated = conn.execute(
            r#"
            UPDATE jobs
            SET whisper_transcript = ?2,
                clinical_transcript = ?3,
                status = ?4,
                failure_reason = ?5
            WHERE id = ?1
            "#,
            params![
                id.to_string(),
                whisper,
                clinical,
                status.as_str(),
                failure_reason,
            ],
        )?;

        if updated == 0 {
            return Err(TolkError::JobNotFound(id.to_string()));
        }

        info!("Job {} -> {}", id, status.as_str());
        Ok(())
    }

    #[instrument(skip(self, document))]
    async fn save_edited(&self, id: uuid::Uuid, document: &serde_json::Value) -> Result<bool> {
        let conn = self.lock()?;

        let updated = conn.execute(
            "UPDATE jobs SET edited_transcript = ?2 WHERE id = ?1",
            params![id.to_string(), document.to_string()],
        )?;

        Ok(updated > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_and_get() {
        let store = SqliteJobStore::in_memory().unwrap();
        let job = Job::new("consult.wav");

        store.insert(&job).await.unwrap();
        let fetched = store.get(job.id).await.unwrap().unwrap();

        assert_eq!(fetched.id, job.id);
        assert_eq!(fetched.original_filename, "consult.wav");
        assert_eq!(fetched.status, JobStatus::Processing);
        assert!(fetched.whisper_transcript.is_none());
    }

    #[tokio::test]
    async fn test_get_missing_is_none() {
        let store = SqliteJobStore::in_memory().unwrap();
        assert!(store.get(uuid::Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_is_newest_first() {
        let store = SqliteJobStore::in_memory().unwrap();

        let mut older = Job::new("first.wav");
        older.created_at = Utc::now() - chrono::Duration::minutes(5);
        let newer = Job::new("second.wav");

        store.insert(&older).await.unwrap();
        store.insert(&newer).await.unwrap();

        let jobs = store.list().await.unwrap();
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].original_filename, "second.wav");
        assert_eq!(jobs[1].original_filename, "first.wav");
    }

    #[tokio::test]
    async fn test_record_results_completes_job() {
        let store = SqliteJobStore::in_memory().unwrap();
        let job = Job::new("consult.wav");
        store.insert(&job).await.unwrap();

        store
            .record_results(job.id, Some("W"), Some("C"), JobStatus::Completed, None)
            .await
            .unwrap();

        let fetched = store.get(job.id).await.unwrap().unwrap();
        assert_eq!(fetched.status, JobStatus::Completed);
        assert_eq!(fetched.whisper_transcript.as_deref(), Some("W"));
        assert_eq!(fetched.clinical_transcript.as_deref(), Some("C"));
        assert!(fetched.failure_reason.is_none());
    }

    #[tokio::test]
    async fn test_record_results_preserves_failure_reason() {
        let store = SqliteJobStore::in_memory().unwrap();
        let job = Job::new("consult.wav");
        store.insert(&job).await.unwrap();

        store
            .record_results(
                job.id,
                None,
                None,
                JobStatus::Failed,
                Some("whisper: timeout; clinical: 503"),
            )
            .await
            .unwrap();

        let fetched = store.get(job.id).await.unwrap().unwrap();
        assert_eq!(fetched.status, JobStatus::Failed);
        assert_eq!(
            fetched.failure_reason.as_deref(),
            Some("whisper: timeout; clinical: 503")
        );
    }

    #[tokio::test]
    async fn test_record_results_on_missing_job_errors() {
        let store = SqliteJobStore::in_memory().unwrap();
        let err = store
            .record_results(uuid::Uuid::new_v4(), None, None, JobStatus::Completed, None)
            .await
            .unwrap_err();
        assert!(matches!(err, TolkError::JobNotFound(_)));
    }

    #[tokio::test]
    async fn test_save_edited_round_trips_json() {
        let store = SqliteJobStore::in_memory().unwrap();
        let job = Job::new("consult.wav");
        store.insert(&job).await.unwrap();

        let doc = serde_json::json!({"sentences": [{"text": "Hej", "is_uncertain": false}]});
        assert!(store.save_edited(job.id, &doc).await.unwrap());

        let fetched = store.get(job.id).await.unwrap().unwrap();
        assert_eq!(fetched.edited_transcript, Some(doc));
    }

    #[tokio::test]
    async fn test_corrupt_timestamp_is_a_database_error() {
        let store = SqliteJobStore::in_memory().unwrap();
        let job = Job::new("consult.wav");
        store.insert(&job).await.unwrap();

        store
            .lock()
            .unwrap()
            .execute("UPDATE jobs SET created_at = 'yesterday'", [])
            .unwrap();

        let err = store.get(job.id).await.unwrap_err();
        assert!(matches!(err, TolkError::Database(_)));
    }

    #[tokio::test]
    async fn test_corrupt_status_is_a_database_error() {
        let store = SqliteJobStore::in_memory().unwrap();
        let job = Job::new("consult.wav");
        store.insert(&job).await.unwrap();

        store
            .lock()
            .unwrap()
            .execute("UPDATE jobs SET status = 'queued'", [])
            .unwrap();

        let err = store.list().await.unwrap_err();
        assert!(matches!(err, TolkError::Database(_)));
    }

    #[tokio::test]
    async fn test_save_edited_missing_job_is_false() {
        let store = SqliteJobStore::in_memory().unwrap();
        let doc = serde_json::json!({});
        assert!(!store.save_edited(uuid::Uuid::new_v4(), &doc).await.unwrap());
    }
}

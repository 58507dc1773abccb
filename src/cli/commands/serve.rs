//! HTTP backend for transcription jobs.
//!
//! Accepts audio uploads, queues them onto a bounded worker pool, and exposes
//! job records plus the on-demand merge and manuscript endpoints. A full
//! queue rejects new uploads with 503 instead of accepting unbounded work.

use crate::cli::Output;
use crate::config::Settings;
use crate::merge::{OpenAiReconciler, Reconciler};
use crate::pipeline::{Pipeline, TranscriptionPipeline};
use crate::store::{Job, JobStore, SqliteJobStore};
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};
use uuid::Uuid;

/// A queued unit of background work: one uploaded file, one job record.
struct JobMessage {
    job_id: Uuid,
    audio_path: PathBuf,
}

/// Shared application state.
struct AppState {
    store: Arc<dyn JobStore>,
    reconciler: Arc<dyn Reconciler>,
    job_tx: mpsc::Sender<JobMessage>,
    temp_dir: PathBuf,
}

/// Run the HTTP backend.
pub async fn run_serve(
    host: Option<&str>,
    port: Option<u16>,
    settings: Settings,
) -> anyhow::Result<()> {
    let host = host.unwrap_or(&settings.server.host).to_string();
    let port = port.unwrap_or(settings.server.port);

    let store: Arc<dyn JobStore> = Arc::new(SqliteJobStore::new(&settings.database_path())?);
    let pipeline: Arc<dyn Pipeline> = Arc::new(TranscriptionPipeline::new(&settings)?);
    let reconciler: Arc<dyn Reconciler> = Arc::new(
        OpenAiReconciler::from_settings(&settings.merge).with_prompts(settings.prompts.clone()),
    );

    let temp_dir = settings.temp_dir();
    std::fs::create_dir_all(&temp_dir)?;

    let (state, rx) = build_state(
        store,
        reconciler,
        temp_dir,
        settings.server.queue_depth,
    );
    spawn_workers(settings.server.workers, state.store.clone(), pipeline, rx);

    let app = app(state);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Tolk API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Upload", "POST /transcripts");
    Output::kv("List Jobs", "GET  /transcripts");
    Output::kv("Job Detail", "GET  /transcripts/:id");
    Output::kv("Save Edit", "PUT  /transcripts/:id");
    Output::kv("Improve", "POST /improve");
    Output::kv("Manuscript", "POST /manuscript");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Build shared state and the job queue it feeds.
fn build_state(
    store: Arc<dyn JobStore>,
    reconciler: Arc<dyn Reconciler>,
    temp_dir: PathBuf,
    queue_depth: usize,
) -> (Arc<AppState>, mpsc::Receiver<JobMessage>) {
    let (job_tx, job_rx) = mpsc::channel(queue_depth);
    let state = Arc::new(AppState {
        store,
        reconciler,
        job_tx,
        temp_dir,
    });
    (state, job_rx)
}

/// Spawn the worker pool draining the job queue.
fn spawn_workers(
    count: usize,
    store: Arc<dyn JobStore>,
    pipeline: Arc<dyn Pipeline>,
    rx: mpsc::Receiver<JobMessage>,
) {
    let rx = Arc::new(Mutex::new(rx));
    for worker_id in 0..count.max(1) {
        let store = store.clone();
        let pipeline = pipeline.clone();
        let rx = rx.clone();
        tokio::spawn(async move {
            loop {
                let msg = rx.lock().await.recv().await;
                let Some(msg) = msg else {
                    info!("Worker {} shutting down", worker_id);
                    break;
                };
                process_job(&*store, &*pipeline, msg).await;
            }
        });
    }
}

/// Run the workflow for one job and write the outcome onto its record.
async fn process_job(store: &dyn JobStore, pipeline: &dyn Pipeline, msg: JobMessage) {
    info!("Processing job {}", msg.job_id);

    let report = pipeline.run(&msg.audio_path, None).await;
    let status = report.job_status();
    let reason = report.failure_reason();

    if let Err(e) = store
        .record_results(
            msg.job_id,
            report.whisper_text(),
            report.clinical_text(),
            status,
            reason.as_deref(),
        )
        .await
    {
        error!("Failed to record results for job {}: {}", msg.job_id, e);
    }

    if let Err(e) = tokio::fs::remove_file(&msg.audio_path).await {
        warn!("Failed to remove temp file {:?}: {}", msg.audio_path, e);
    }
}

/// Build the router.
fn app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index))
        .route("/transcripts", post(create_job).get(list_jobs))
        .route("/transcripts/{id}", get(get_job).put(save_edited))
        .route("/improve", post(improve))
        .route("/manuscript", post(manuscript))
        .layer(cors)
        .with_state(state)
}

// === Request/Response Types ===

#[derive(Serialize)]
struct JobCreatedResponse {
    transcript_id: Uuid,
    status: String,
}

#[derive(Deserialize)]
struct SaveEditedRequest {
    improved_transcript: serde_json::Value,
}

#[derive(Serialize)]
struct MessageResponse {
    message: String,
}

#[derive(Deserialize)]
struct ImproveRequest {
    whisper_transcription: String,
    clinical_transcription: String,
}

#[derive(Deserialize)]
struct ManuscriptRequest {
    topic: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn error_response(status: StatusCode, msg: impl Into<String>) -> axum::response::Response {
    (status, Json(ErrorResponse { error: msg.into() })).into_response()
}

// === Handlers ===

async fn index() -> impl IntoResponse {
    Html(include_str!("../../../static/index.html"))
}

async fn create_job(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let field = match multipart.next_field().await {
        Ok(Some(f)) => f,
        Ok(None) => return error_response(StatusCode::BAD_REQUEST, "No file uploaded"),
        Err(e) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                format!("Failed to read multipart: {}", e),
            )
        }
    };

    let filename = field.file_name().unwrap_or("unknown").to_string();
    let data = match field.bytes().await {
        Ok(d) => d,
        Err(e) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                format!("Failed to read file: {}", e),
            )
        }
    };

    // Reserve a queue slot before creating any state, so a full queue
    // rejects the upload without leaving an orphaned record behind.
    let permit = match state.job_tx.try_reserve() {
        Ok(p) => p,
        Err(mpsc::error::TrySendError::Full(())) => {
            warn!("Job queue full, rejecting upload {}", filename);
            return error_response(
                StatusCode::SERVICE_UNAVAILABLE,
                "Transcription queue is full, try again later",
            );
        }
        Err(mpsc::error::TrySendError::Closed(())) => {
            return error_response(StatusCode::SERVICE_UNAVAILABLE, "Worker pool is down")
        }
    };

    let job = Job::new(&filename);
    // the client-supplied name may carry path separators; only its final
    // component goes into the temp path
    let safe_name = std::path::Path::new(&filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload");
    let audio_path = state.temp_dir.join(format!("{}_{}", job.id, safe_name));

    if let Err(e) = tokio::fs::write(&audio_path, &data).await {
        return error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to store upload: {}", e),
        );
    }

    if let Err(e) = state.store.insert(&job).await {
        let _ = tokio::fs::remove_file(&audio_path).await;
        return error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to create job: {}", e),
        );
    }

    permit.send(JobMessage {
        job_id: job.id,
        audio_path,
    });

    info!("Accepted upload {} as job {}", filename, job.id);

    Json(JobCreatedResponse {
        transcript_id: job.id,
        status: job.status.as_str().to_string(),
    })
    .into_response()
}

async fn list_jobs(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.store.list().await {
        Ok(jobs) => Json(jobs).into_response(),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

async fn get_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let Ok(id) = Uuid::parse_str(&id) else {
        return error_response(StatusCode::BAD_REQUEST, format!("Invalid job id: {}", id));
    };

    match state.store.get(id).await {
        Ok(Some(job)) => Json(job).into_response(),
        Ok(None) => error_response(StatusCode::NOT_FOUND, format!("Transcript not found: {}", id)),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

async fn save_edited(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<SaveEditedRequest>,
) -> impl IntoResponse {
    let Ok(id) = Uuid::parse_str(&id) else {
        return error_response(StatusCode::BAD_REQUEST, format!("Invalid job id: {}", id));
    };

    match state.store.save_edited(id, &req.improved_transcript).await {
        Ok(true) => Json(MessageResponse {
            message: "Transcript updated successfully".to_string(),
        })
        .into_response(),
        Ok(false) => error_response(StatusCode::NOT_FOUND, format!("Transcript not found: {}", id)),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

async fn improve(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ImproveRequest>,
) -> impl IntoResponse {
    match state
        .reconciler
        .merge(&req.whisper_transcription, &req.clinical_transcription)
        .await
    {
        Ok(merged) => Json(merged).into_response(),
        Err(e) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to generate improved transcript: {}", e),
        ),
    }
}

async fn manuscript(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ManuscriptRequest>,
) -> impl IntoResponse {
    match state.reconciler.manuscript(&req.topic).await {
        Ok(doc) => Json(doc).into_response(),
        Err(e) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to generate manuscript: {}", e),
        ),
    }
}

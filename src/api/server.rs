//! Caller-facing HTTP surface.
//!
//! Two routes: `POST /ingest` accepts a single multipart file upload and
//! answers either with the finished record (sync) or `202 Accepted` plus a
//! job id (async); `GET /ingest/{id}` exposes the job's status/step/summary
//! for polling. The blocking pipeline runs on `spawn_blocking` so the
//! runtime is never starved.

use std::sync::Arc;

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use uuid::Uuid;

use super::error::ApiError;
use crate::db;
use crate::models::{JobStatus, NormalizedRecord};
use crate::pipeline::jobs;
use crate::pipeline::{DocumentUpload, IngestOutcome, IngestionPipeline};

#[derive(Clone)]
pub struct ApiContext {
    pub pipeline: Arc<IngestionPipeline>,
}

/// Build the ingestion router.
pub fn ingest_router(ctx: ApiContext) -> Router {
    Router::new()
        .route("/ingest", post(ingest_document))
        .route("/ingest/:id", get(job_status))
        .with_state(ctx)
}

/// Serve the router until the process is stopped.
pub async fn serve(ctx: ApiContext, bind_addr: &str) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!(addr = %bind_addr, "Ingestion API listening");
    axum::serve(listener, ingest_router(ctx)).await
}

#[derive(Debug, Serialize)]
struct IngestResponse {
    job_id: Uuid,
    status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    record: Option<NormalizedRecord>,
}

async fn ingest_document(
    State(ctx): State<ApiContext>,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("documento.bin").to_string();
        let media_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(e.to_string()))?;
        upload = Some(DocumentUpload {
            file_name,
            media_type,
            bytes: bytes.to_vec(),
        });
        break;
    }

    let upload = upload
        .ok_or_else(|| ApiError::BadRequest("No se encontró el archivo en la solicitud.".into()))?;

    let pipeline = ctx.pipeline.clone();
    let outcome = tokio::task::spawn_blocking(move || pipeline.ingest(upload))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))??;

    let response = match outcome {
        IngestOutcome::Completed { job_id, record } => (
            StatusCode::OK,
            Json(IngestResponse {
                job_id,
                status: JobStatus::Completed,
                record: Some(record),
            }),
        ),
        IngestOutcome::Accepted { job_id } => (
            StatusCode::ACCEPTED,
            Json(IngestResponse {
                job_id,
                status: JobStatus::Processing,
                record: None,
            }),
        ),
    };
    Ok(response.into_response())
}

async fn job_status(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<jobs::JobView>, ApiError> {
    let job_id = Uuid::parse_str(&id)
        .map_err(|_| ApiError::BadRequest(format!("Invalid job id: {id}")))?;

    let db_path = ctx.pipeline.config().db_path();
    let view = tokio::task::spawn_blocking(move || -> Result<_, ApiError> {
        let conn = db::open_database(&db_path).map_err(|e| ApiError::Internal(e.to_string()))?;
        jobs::load(&conn, &job_id).map_err(|e| ApiError::Internal(e.to_string()))
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))??;

    view.map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Job {job_id}")))
}

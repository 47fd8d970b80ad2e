//! HTTP Handlers

use crate::error::{ApiError, ApiResult};
use crate::types::{HealthResponse, IngestRequest, IngestResponse, StatsResponse};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use ingestq_core::application::{IngestRequest as CoreIngestRequest, IngestionService};
use ingestq_core::domain::StatusRecord;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    service: Arc<IngestionService>,
    start_time: Instant,
}

impl AppState {
    pub fn new(service: Arc<IngestionService>) -> Self {
        Self {
            service,
            start_time: Instant::now(),
        }
    }
}

/// POST /ingest
pub async fn ingest(
    State(state): State<AppState>,
    payload: Result<Json<IngestRequest>, JsonRejection>,
) -> ApiResult<Json<IngestResponse>> {
    let Json(req) = payload.map_err(|rejection| {
        warn!(error = %rejection, "Malformed ingest request");
        ApiError::from(rejection)
    })?;

    let req = CoreIngestRequest::try_from(req).map_err(|e| {
        warn!(error = %e, "Rejected ingest request");
        e
    })?;
    let ingestion_id = state.service.ingest(req).await?;
    Ok(Json(IngestResponse { ingestion_id }))
}

/// GET /status/{ingestion_id}
pub async fn get_status(
    State(state): State<AppState>,
    Path(ingestion_id): Path<String>,
) -> ApiResult<Json<StatusRecord>> {
    debug!(ingestion_id = %ingestion_id, "Status requested");
    let record = state.service.get_status(&ingestion_id).await?;
    Ok(Json(record))
}

/// GET /stats
pub async fn stats(State(state): State<AppState>) -> ApiResult<Json<StatsResponse>> {
    let stats = state.service.stats().await?;
    Ok(Json(StatsResponse {
        stats,
        uptime_seconds: state.start_time.elapsed().as_secs(),
    }))
}

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: ingestq_core::VERSION,
    })
}

/// Unmatched routes
pub async fn not_found() -> ApiError {
    ApiError::not_found("Not Found")
}

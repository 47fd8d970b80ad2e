//! Route table

use crate::handler::{self, AppState};
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/ingest", post(handler::ingest))
        .route("/status/{ingestion_id}", get(handler::get_status))
        .route("/stats", get(handler::stats))
        .route("/health", get(handler::health))
        .fallback(handler::not_found)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

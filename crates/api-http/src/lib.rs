//! HTTP API Layer
//!
//! Thin axum transport over `IngestionService`:
//! `POST /ingest`, `GET /status/{ingestion_id}`, `GET /stats`, `GET /health`.

pub mod error;
pub mod handler;
pub mod router;
pub mod server;
pub mod types;

pub use handler::AppState;
pub use router::build_router;
pub use server::{HttpServer, HttpServerConfig};

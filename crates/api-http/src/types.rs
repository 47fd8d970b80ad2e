//! HTTP Request/Response Types

use crate::error::ApiError;
use ingestq_core::application::{IngestRequest as CoreIngestRequest, IngestionStats};
use ingestq_core::domain::{DomainError, Priority, MAX_ITEM_ID, MIN_ITEM_ID};
use ingestq_core::error::AppError;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

/// POST /ingest
///
/// `ids` stay raw JSON literals until conversion, so an integer that does not
/// fit `i64` (a 400) is told apart from a float or a string (a 422).
#[derive(Debug, Deserialize)]
pub struct IngestRequest {
    pub ids: Vec<Box<RawValue>>,
    pub priority: Priority,
}

fn is_integer_literal(literal: &str) -> bool {
    let digits = literal.strip_prefix('-').unwrap_or(literal);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

impl TryFrom<IngestRequest> for CoreIngestRequest {
    type Error = ApiError;

    fn try_from(req: IngestRequest) -> Result<Self, Self::Error> {
        let mut ids = Vec::with_capacity(req.ids.len());
        let mut overflow: Option<(usize, String)> = None;

        for (i, raw) in req.ids.iter().enumerate() {
            let literal = raw.get().trim();
            if !is_integer_literal(literal) {
                return Err(ApiError::unprocessable(format!(
                    "ids[{}]: expected an integer, got {}",
                    i, literal
                )));
            }
            match literal.parse::<i64>() {
                Ok(id) => ids.push(id),
                Err(_) if overflow.is_none() => overflow = Some((ids.len(), literal.to_string())),
                Err(_) => {}
            }
        }

        // An in-range-for-i64 violation ahead of the overflow is reported by
        // the core validation instead, keeping first-offender order.
        if let Some((pos, literal)) = overflow {
            let earlier_violation = ids[..pos]
                .iter()
                .any(|id| !(MIN_ITEM_ID..=MAX_ITEM_ID).contains(id));
            if !earlier_violation {
                return Err(AppError::Domain(DomainError::IdentifierOverflow(literal)).into());
            }
        }

        Ok(Self {
            ids,
            priority: req.priority,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestResponse {
    pub ingestion_id: String,
}

/// GET /stats
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub stats: IngestionStats,
    pub uptime_seconds: u64,
}

/// GET /health
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

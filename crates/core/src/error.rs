// Central Error Type for the Application

use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Domain error: {0}")]
    Domain(#[from] crate::domain::DomainError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Status store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Processing error: {0}")]
    Processing(#[from] crate::port::ProcessingError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Errors the scheduler loop recovers from by backing off and moving on
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            AppError::StoreUnavailable(_) | AppError::Processing(_) | AppError::Internal(_)
        )
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

// Note: sqlx::Error conversion is handled in infra-sqlite crate
// by converting to AppError::StoreUnavailable(String)

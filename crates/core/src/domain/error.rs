// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid ID: {0}. Must be between 1 and 10^9+7")]
    InvalidIdentifier(i64),

    /// An integer literal too large for `i64`, kept verbatim
    #[error("Invalid ID: {0}. Must be between 1 and 10^9+7")]
    IdentifierOverflow(String),

    #[error("ids must contain at least one identifier")]
    EmptyIdentifiers,

    #[error("Invalid priority: {0}. Must be one of HIGH, MEDIUM, LOW")]
    InvalidPriority(String),

    #[error("Invalid batch state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Batch {batch_id} not found in ingestion {ingestion_id}")]
    BatchNotFound {
        ingestion_id: String,
        batch_id: String,
    },
}

pub type Result<T> = std::result::Result<T, DomainError>;

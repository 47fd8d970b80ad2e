// Priority label and its ordering rank

use crate::domain::error::DomainError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Ingestion priority.
///
/// The wire form is the uppercase literal; ordering goes through [`Priority::rank`]
/// so the two never depend on each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    High,
    Medium,
    Low,
}

/// Rank table (lower = served first)
const RANKS: [(Priority, u8); 3] = [(Priority::High, 0), (Priority::Medium, 1), (Priority::Low, 2)];

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::High, Priority::Medium, Priority::Low];

    /// Ordering rank, lower is dispatched first
    pub fn rank(self) -> u8 {
        RANKS
            .iter()
            .find(|(p, _)| *p == self)
            .map(|(_, r)| *r)
            .unwrap_or(u8::MAX)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::High => "HIGH",
            Priority::Medium => "MEDIUM",
            Priority::Low => "LOW",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Priority::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| DomainError::InvalidPriority(s.to_string()))
    }
}

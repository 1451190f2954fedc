//! Fatal and rejection errors returned by runner operations.

use thiserror::Error;

use crate::core::report::Violations;

/// Failure of a runner operation.
///
/// `Rejected` carries aggregated, expected failures (bad definitions, failed
/// validation, state conflicts) as data. Every other variant is fatal: it
/// aborts the current step before its completion record is written.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("seed rejected: {0}")]
    Rejected(Violations),

    #[error("step {order}: item {index} is not a valid {item_type}")]
    ItemDecode {
        order: i64,
        index: usize,
        item_type: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("step {order}: handler for {item_type} failed on item {index}")]
    Handler {
        order: i64,
        index: usize,
        item_type: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("step {order}: item type {item_type} is not registered")]
    UnresolvedType { order: i64, item_type: String },

    #[error("step {order}: no handler registered for {item_type}")]
    MissingHandler { order: i64, item_type: String },

    #[error(transparent)]
    Io(#[from] anyhow::Error),
}

impl SeedError {
    /// Violations of a rejected operation.
    pub fn violations(&self) -> Option<&Violations> {
        match self {
            SeedError::Rejected(violations) => Some(violations),
            _ => None,
        }
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, SeedError::Rejected(_))
    }
}

impl From<Violations> for SeedError {
    fn from(violations: Violations) -> Self {
        SeedError::Rejected(violations)
    }
}

//! Errors shared by the messaging store ports.

use thiserror::Error;

/// Errors from a messaging store adapter.
///
/// Adapters classify their native failures into these variants so handlers
/// can decide between retrying, reconciling and giving up.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// A row the operation depends on disappeared mid-flight.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A uniqueness constraint rejected the write.
    #[error("Unique violation: {0}")]
    UniqueViolation(String),

    /// The store could not be reached; nothing was written.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// The connection failed while committing; the write may have landed.
    #[error("Commit outcome unknown: {0}")]
    CommitUncertain(String),

    /// Any other storage failure.
    #[error("Database error: {0}")]
    Database(String),
}

impl StoreError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::Database(message.into())
    }

    /// Whether a read that failed with this error is worth repeating.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

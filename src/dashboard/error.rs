//! Dashboard controller error types

use thiserror::Error;

use crate::store::StoreError;

/// Errors surfaced by dashboard gestures
#[derive(Error, Debug)]
pub enum DashboardError {
    /// Load or relay number outside 1..=4
    #[error("Invalid load number: {0} (expected 1-4)")]
    InvalidLoad(u8),

    /// Store rejected a read or write
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Some of the limit writes failed; the others were still issued
    #[error("Failed to write limits for {}", failed.join(", "))]
    LimitWrites { failed: Vec<String> },

    /// Writing the report to disk failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for dashboard operations
pub type DashboardResult<T> = Result<T, DashboardError>;

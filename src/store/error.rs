//! Store error types
//!
//! Defines all errors that can occur in the key-value store layer.

use thiserror::Error;

/// Errors that can occur in the observable store
#[derive(Error, Debug)]
pub enum StoreError {
    /// I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Data corruption detected (checksum mismatch, oversized length prefix)
    #[error("Corrupt data: {0}")]
    Corruption(String),

    /// Path is empty, malformed, or contains forbidden characters
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Attempted to push a child under a scalar value
    #[error("Cannot append under non-object value at {0}")]
    NotAnObject(String),

    /// A single write is too big to be logged
    #[error("Entry too large: {size} bytes (max {max})")]
    EntryTooLarge { size: usize, max: usize },

    /// WAL format or recovery error
    #[error("WAL error: {0}")]
    WalError(String),

    /// The store has been closed
    #[error("Store is closed")]
    Closed,
}

impl From<bincode::Error> for StoreError {
    fn from(err: bincode::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StoreError::InvalidPath("relays/".to_string());
        assert_eq!(err.to_string(), "Invalid path: relays/");

        let err = StoreError::EntryTooLarge { size: 10, max: 4 };
        assert_eq!(err.to_string(), "Entry too large: 10 bytes (max 4)");

        let err = StoreError::NotAnObject("settings/unitPrice".to_string());
        assert_eq!(
            err.to_string(),
            "Cannot append under non-object value at settings/unitPrice"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let store_err: StoreError = io_err.into();
        assert!(matches!(store_err, StoreError::Io(_)));
    }
}

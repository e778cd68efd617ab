//! Error types for the record store.

use std::io;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in record store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// I/O error from the underlying file.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The data file failed to parse.
    ///
    /// Carries the entry type name and the 1-based record ordinal so the
    /// message pinpoints the damage: `"<type> is corrupt on line <n>: ..."`.
    #[error("{type_name} is corrupt on line {line}: {reason}")]
    Corrupt {
        /// Short name of the entry type stored in the file.
        type_name: String,
        /// 1-based ordinal of the record that failed to parse.
        line: u64,
        /// Description of the damage.
        reason: String,
    },

    /// A caller violated the store contract.
    ///
    /// These indicate a bug in the caller, not an environment condition,
    /// and are never retried.
    #[error("invalid operation: {message}")]
    InvalidOperation {
        /// Description of the violated contract.
        message: String,
    },
}

impl StoreError {
    /// Creates a corruption error for the given record ordinal.
    pub fn corrupt(type_name: impl Into<String>, line: u64, reason: impl Into<String>) -> Self {
        Self::Corrupt {
            type_name: type_name.into(),
            line,
            reason: reason.into(),
        }
    }

    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }
}

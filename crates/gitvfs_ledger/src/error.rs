//! Error types for the placeholder ledger.

use thiserror::Error;

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Errors that can occur in placeholder ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The underlying record store failed.
    #[error("record store error: {0}")]
    Store(#[from] gitvfs_store::StoreError),

    /// A snapshot rebuild window is already open.
    ///
    /// Exactly one rebuild may be in flight at a time; opening a second is
    /// a caller bug, not a runtime condition.
    #[error("a snapshot rebuild is already in flight")]
    RebuildInFlight,
}

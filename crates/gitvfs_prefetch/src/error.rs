//! Error types for the prefetch pipeline.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for prefetch operations.
pub type PrefetchResult<T> = Result<T, PrefetchError>;

/// Errors that can occur during a prefetch run.
///
/// Only unrecoverable conditions surface as errors: a chunk that fails to
/// download or a pack that fails to index is accumulated into the run's
/// failure flag instead, and siblings keep going.
#[derive(Debug, Error)]
pub enum PrefetchError {
    /// Local I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The tree diff against the target commit could not be computed.
    #[error("diff computation failed: {message}")]
    Diff {
        /// Description of the failure.
        message: String,
    },

    /// A batched object download failed.
    #[error("object download failed: {message}")]
    Download {
        /// Description of the failure.
        message: String,
    },

    /// A pack could not be indexed.
    #[error("failed to index pack {path}: {message}")]
    Index {
        /// The pack that failed.
        path: PathBuf,
        /// Description of the failure.
        message: String,
    },

    /// A local ref could not be updated.
    #[error("ref update failed: {message}")]
    Refs {
        /// Description of the failure.
        message: String,
    },

    /// An object the hydrator needs is not available locally.
    #[error("object {sha} is not available locally")]
    ObjectUnavailable {
        /// The missing object id.
        sha: String,
    },
}

impl PrefetchError {
    /// Creates a diff failure.
    pub fn diff(message: impl Into<String>) -> Self {
        Self::Diff {
            message: message.into(),
        }
    }

    /// Creates a download failure.
    pub fn download(message: impl Into<String>) -> Self {
        Self::Download {
            message: message.into(),
        }
    }

    /// Creates an indexing failure.
    pub fn index(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Index {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a ref update failure.
    pub fn refs(message: impl Into<String>) -> Self {
        Self::Refs {
            message: message.into(),
        }
    }
}

//! Placeholder ledger entry type.

/// One placeholder event persisted in the ledger.
///
/// Identity is the pair (variant, path): two adds, or an add and a remove,
/// for the same path collide and the later record wins on replay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaceholderEntry {
    /// A materialized file and the blob it represents.
    File {
        /// Virtual path of the file, relative to the enlistment root.
        path: String,
        /// Hex SHA-1 of the backing blob, 40 ASCII characters.
        sha: String,
    },

    /// A materialized folder.
    Folder {
        /// Virtual path of the folder, relative to the enlistment root.
        path: String,
        /// True once the folder's full child listing has been read;
        /// false while it is still partially virtual.
        expanded: bool,
    },

    /// A bare path, the payload of remove records.
    Path {
        /// Virtual path being tombstoned.
        path: String,
    },
}

impl PlaceholderEntry {
    /// Creates a file entry.
    pub fn file(path: impl Into<String>, sha: impl Into<String>) -> Self {
        Self::File {
            path: path.into(),
            sha: sha.into(),
        }
    }

    /// Creates a folder entry.
    pub fn folder(path: impl Into<String>, expanded: bool) -> Self {
        Self::Folder {
            path: path.into(),
            expanded,
        }
    }

    /// Returns the entry's path.
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::File { path, .. } | Self::Folder { path, .. } | Self::Path { path } => path,
        }
    }
}

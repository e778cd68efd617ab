//! Collaborator traits consumed by the prefetch pipeline.
//!
//! The pipeline orchestrates; it does not talk Git. Object lookup, batched
//! downloads, pack indexing, tree diffing, and ref plumbing are all
//! provided by the host through these traits. Mock implementations live
//! here as well so engine tests can script collaborator behavior.

use crate::error::{PrefetchError, PrefetchResult};
use crate::filter::PathFilter;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Output of the diff stage.
#[derive(Debug, Clone, Default)]
pub struct DiffOutput {
    /// Blob ids required for the target commit under the allow list.
    pub required_blobs: Vec<String>,
    /// File materializations to perform if hydration was requested.
    pub file_operations: Vec<FileOperation>,
}

/// One working-directory file to hydrate after download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOperation {
    /// Path relative to the working directory root.
    pub path: String,
    /// Blob backing the file.
    pub sha: String,
}

/// Local object store lookups (loose objects and packs).
pub trait ObjectStore: Send + Sync {
    /// Checks whether the object exists locally.
    fn contains(&self, sha: &str) -> bool;

    /// Reads an object's content.
    ///
    /// # Errors
    ///
    /// Returns an error if the object is not available locally.
    fn read_object(&self, sha: &str) -> PrefetchResult<Vec<u8>>;
}

/// Batched remote download endpoint (cache-server-first, origin-fallback;
/// retry and backoff live behind this call).
pub trait ObjectDownloader: Send + Sync {
    /// Downloads the given objects as a single pack.
    ///
    /// # Errors
    ///
    /// Returns an error if the batch cannot be fetched; the caller treats
    /// this as a partial failure and keeps processing other batches.
    fn download(&self, shas: &[String]) -> PrefetchResult<Vec<u8>>;
}

/// Local pack-indexing invocation.
pub trait PackIndexer: Send + Sync {
    /// Produces the `.idx` sidecar for a pack.
    ///
    /// # Errors
    ///
    /// Returns an error if the pack cannot be indexed.
    fn index(&self, pack_path: &Path) -> PrefetchResult<()>;
}

/// Tree/blob delta computation between two commits.
pub trait DiffProvider: Send + Sync {
    /// Computes the objects required to move from `previous` (if any) to
    /// `target`, restricted to the allow list.
    ///
    /// # Errors
    ///
    /// Returns an error if the target commit cannot be resolved.
    fn diff(
        &self,
        previous: Option<&str>,
        target: &str,
        filter: &PathFilter,
    ) -> PrefetchResult<DiffOutput>;
}

/// Local ref plumbing.
pub trait RefStore: Send + Sync {
    /// Points `name` at a commit sha.
    ///
    /// # Errors
    ///
    /// Returns an error if the ref cannot be written.
    fn update_ref(&self, name: &str, sha: &str) -> PrefetchResult<()>;

    /// Points `name` at another ref symbolically.
    ///
    /// # Errors
    ///
    /// Returns an error if the ref cannot be written.
    fn set_symbolic_ref(&self, name: &str, target: &str) -> PrefetchResult<()>;

    /// Narrows the remote-tracking refspec to a single branch, replacing
    /// any wildcard refspec, so later incremental fetches stay cheap.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be written.
    fn set_fetch_refspec(&self, branch: &str) -> PrefetchResult<()>;
}

// ---------------------------------------------------------------------------
// Mocks
// ---------------------------------------------------------------------------

/// In-memory object store for tests.
#[derive(Debug, Default)]
pub struct MockObjectStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
}

impl MockObjectStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an object.
    pub fn insert(&self, sha: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.objects.lock().insert(sha.into(), bytes.into());
    }
}

impl ObjectStore for MockObjectStore {
    fn contains(&self, sha: &str) -> bool {
        self.objects.lock().contains_key(sha)
    }

    fn read_object(&self, sha: &str) -> PrefetchResult<Vec<u8>> {
        self.objects
            .lock()
            .get(sha)
            .cloned()
            .ok_or_else(|| PrefetchError::ObjectUnavailable {
                sha: sha.to_string(),
            })
    }
}

/// Scripted downloader for tests.
///
/// Returns the requested ids joined by newlines as the pack body, records
/// every batch, and can be told to fail batches containing a given id.
#[derive(Debug, Default)]
pub struct MockDownloader {
    batches: Mutex<Vec<Vec<String>>>,
    fail_for: Mutex<HashSet<String>>,
    store: Option<std::sync::Arc<MockObjectStore>>,
}

impl MockDownloader {
    /// Creates a downloader that fabricates pack bytes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a downloader that also deposits downloaded objects into the
    /// given store, the way a real download makes them locally readable.
    #[must_use]
    pub fn backed_by(store: std::sync::Arc<MockObjectStore>) -> Self {
        Self {
            store: Some(store),
            ..Self::default()
        }
    }

    /// Makes any batch containing `sha` fail.
    pub fn fail_batches_containing(&self, sha: impl Into<String>) {
        self.fail_for.lock().insert(sha.into());
    }

    /// Returns every batch requested so far.
    #[must_use]
    pub fn batches(&self) -> Vec<Vec<String>> {
        self.batches.lock().clone()
    }

    /// Returns every id downloaded so far.
    #[must_use]
    pub fn downloaded_ids(&self) -> HashSet<String> {
        self.batches.lock().iter().flatten().cloned().collect()
    }
}

impl ObjectDownloader for MockDownloader {
    fn download(&self, shas: &[String]) -> PrefetchResult<Vec<u8>> {
        let poisoned = {
            let fail_for = self.fail_for.lock();
            shas.iter().any(|sha| fail_for.contains(sha))
        };
        if poisoned {
            return Err(PrefetchError::download("scripted batch failure"));
        }
        self.batches.lock().push(shas.to_vec());
        if let Some(store) = &self.store {
            for sha in shas {
                store.insert(sha.clone(), format!("content-of-{sha}").into_bytes());
            }
        }
        Ok(shas.join("\n").into_bytes())
    }
}

/// Scripted pack indexer for tests.
///
/// On success, writes an empty `.idx` sidecar next to the pack. Packs
/// whose file name contains a scripted marker fail instead.
#[derive(Debug, Default)]
pub struct MockPackIndexer {
    fail_markers: Mutex<Vec<String>>,
    indexed: Mutex<Vec<PathBuf>>,
}

impl MockPackIndexer {
    /// Creates an indexer that succeeds for every pack.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes packs whose file name contains `marker` fail to index.
    pub fn fail_packs_containing(&self, marker: impl Into<String>) {
        self.fail_markers.lock().push(marker.into());
    }

    /// Returns every pack indexed so far.
    #[must_use]
    pub fn indexed(&self) -> Vec<PathBuf> {
        self.indexed.lock().clone()
    }
}

impl PackIndexer for MockPackIndexer {
    fn index(&self, pack_path: &Path) -> PrefetchResult<()> {
        let name = pack_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if self
            .fail_markers
            .lock()
            .iter()
            .any(|marker| name.contains(marker))
        {
            return Err(PrefetchError::index(pack_path, "scripted indexing failure"));
        }
        let idx = crate::packs::idx_path_for(pack_path);
        std::fs::write(idx, b"")?;
        self.indexed.lock().push(pack_path.to_path_buf());
        Ok(())
    }
}

/// Scripted diff provider for tests.
#[derive(Debug, Default)]
pub struct MockDiffProvider {
    output: Mutex<DiffOutput>,
    error: Mutex<Option<String>>,
    calls: Mutex<Vec<(Option<String>, String)>>,
}

impl MockDiffProvider {
    /// Creates a provider returning an empty diff.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the diff output; paths not matching the run's filter are
    /// dropped at call time, as a real differ would.
    pub fn set_output(&self, output: DiffOutput) {
        *self.output.lock() = output;
    }

    /// Makes every diff call fail.
    pub fn fail_with(&self, message: impl Into<String>) {
        *self.error.lock() = Some(message.into());
    }

    /// Returns the (previous, target) pairs diffed so far.
    #[must_use]
    pub fn calls(&self) -> Vec<(Option<String>, String)> {
        self.calls.lock().clone()
    }
}

impl DiffProvider for MockDiffProvider {
    fn diff(
        &self,
        previous: Option<&str>,
        target: &str,
        filter: &PathFilter,
    ) -> PrefetchResult<DiffOutput> {
        self.calls
            .lock()
            .push((previous.map(str::to_string), target.to_string()));
        if let Some(message) = self.error.lock().clone() {
            return Err(PrefetchError::diff(message));
        }
        let scripted = self.output.lock().clone();
        let file_operations: Vec<FileOperation> = scripted
            .file_operations
            .into_iter()
            .filter(|op| filter.matches(&op.path))
            .collect();
        let required_blobs = file_operations.iter().map(|op| op.sha.clone()).collect();
        Ok(DiffOutput {
            required_blobs,
            file_operations,
        })
    }
}

/// Recording ref store for tests.
#[derive(Debug, Default)]
pub struct MockRefStore {
    updated: Mutex<Vec<(String, String)>>,
    symbolic: Mutex<Vec<(String, String)>>,
    refspecs: Mutex<Vec<String>>,
}

impl MockRefStore {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns recorded `update_ref` calls.
    #[must_use]
    pub fn updated(&self) -> Vec<(String, String)> {
        self.updated.lock().clone()
    }

    /// Returns recorded `set_symbolic_ref` calls.
    #[must_use]
    pub fn symbolic(&self) -> Vec<(String, String)> {
        self.symbolic.lock().clone()
    }

    /// Returns recorded refspec narrowings.
    #[must_use]
    pub fn refspecs(&self) -> Vec<String> {
        self.refspecs.lock().clone()
    }
}

impl RefStore for MockRefStore {
    fn update_ref(&self, name: &str, sha: &str) -> PrefetchResult<()> {
        self.updated.lock().push((name.to_string(), sha.to_string()));
        Ok(())
    }

    fn set_symbolic_ref(&self, name: &str, target: &str) -> PrefetchResult<()> {
        self.symbolic
            .lock()
            .push((name.to_string(), target.to_string()));
        Ok(())
    }

    fn set_fetch_refspec(&self, branch: &str) -> PrefetchResult<()> {
        self.refspecs.lock().push(branch.to_string());
        Ok(())
    }
}

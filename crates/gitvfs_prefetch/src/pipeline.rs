//! The prefetch pipeline.
//!
//! One run fetches the objects needed for a (commit, branch) target:
//!
//! 1. **diff** (single thread) — compute the blob delta from the last
//!    fetched commit, restricted to the allow list
//! 2. **find missing** (worker pool) — route each required id to
//!    already-local or the download queue
//! 3. **batch download** (worker pool) — fetch missing ids in chunks,
//!    write each pack under a timestamped prefetch name
//! 4. **pack index** (worker pool) — produce each pack's idx sidecar
//! 5. **hydrate** (worker pool, only on request) — write blob content
//!    over working-directory placeholders
//!
//! The search stage must fully drain before indexing starts; searching
//! while packs are being indexed degrades lookup throughput progressively
//! as each new idx joins the search set. Failures in individual chunks or
//! packs never cancel siblings — they accumulate into a failure flag and
//! the run completes with whatever it managed to fetch.

use crate::collaborators::{
    DiffProvider, FileOperation, ObjectDownloader, ObjectStore, PackIndexer, RefStore,
};
use crate::config::PrefetchConfig;
use crate::error::PrefetchResult;
use crate::filter::PathFilter;
use crate::lock::PrefetchLock;
use crate::{packs, shallow};
use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{SystemTime, UNIX_EPOCH};

/// Capacity of the inter-stage queues; backpressure is queue blocking.
const QUEUE_CAPACITY: usize = 4096;

/// Lock file name inside the pack directory.
const LOCK_FILE: &str = "prefetch.lock";

/// What a prefetch run fetches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchTarget {
    /// A raw commit id.
    Commit(String),
    /// A branch and the commit it currently points at.
    Branch {
        /// Branch name, short (`main`) or fully qualified
        /// (`refs/heads/main`).
        name: String,
        /// The commit the branch resolves to.
        commit: String,
    },
}

impl FetchTarget {
    /// Returns the commit id being fetched.
    #[must_use]
    pub fn commit(&self) -> &str {
        match self {
            Self::Commit(commit) => commit,
            Self::Branch { commit, .. } => commit,
        }
    }
}

/// Counts and the cumulative failure flag from a completed run.
///
/// Partial progress is an accepted terminal state: objects already
/// downloaded are kept even when `has_failures` is set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrefetchOutcome {
    /// Required blob ids that matched the allow list.
    pub matched: usize,
    /// Matched ids that were already present locally.
    pub already_local: usize,
    /// Objects downloaded this run.
    pub downloaded: usize,
    /// Packs successfully indexed this run.
    pub packs_indexed: usize,
    /// Working-directory files hydrated this run.
    pub hydrated: usize,
    /// Whether any chunk, pack, or hydration failed.
    pub has_failures: bool,
}

#[derive(Debug, Default)]
struct Counters {
    matched: AtomicUsize,
    already_local: AtomicUsize,
    downloaded: AtomicUsize,
    indexed: AtomicUsize,
    hydrated: AtomicUsize,
    failed: AtomicBool,
}

impl Counters {
    fn fail(&self) {
        self.failed.store(true, Ordering::SeqCst);
    }
}

/// Orchestrates prefetch runs against a set of collaborators.
pub struct Prefetcher {
    config: PrefetchConfig,
    objects: Arc<dyn ObjectStore>,
    downloader: Arc<dyn ObjectDownloader>,
    indexer: Arc<dyn PackIndexer>,
    diff: Arc<dyn DiffProvider>,
    refs: Arc<dyn RefStore>,
}

impl Prefetcher {
    /// Creates a prefetcher.
    pub fn new(
        config: PrefetchConfig,
        objects: Arc<dyn ObjectStore>,
        downloader: Arc<dyn ObjectDownloader>,
        indexer: Arc<dyn PackIndexer>,
        diff: Arc<dyn DiffProvider>,
        refs: Arc<dyn RefStore>,
    ) -> Self {
        Self {
            config,
            objects,
            downloader,
            indexer,
            diff,
            refs,
        }
    }

    /// Runs one prefetch.
    ///
    /// Holds the cross-process pack-directory lock for the duration. On a
    /// fully successful run (and unless suppressed by config) the branch
    /// ref, fetch refspec, and shallow marker are updated afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error for unrecoverable conditions: the pack directory
    /// is unusable, or hydration was requested and the diff cannot be
    /// computed at all. Per-chunk and per-pack failures are reported via
    /// [`PrefetchOutcome::has_failures`] instead.
    pub fn run(&self, target: &FetchTarget, filter: &PathFilter) -> PrefetchResult<PrefetchOutcome> {
        fs::create_dir_all(&self.config.pack_dir)?;
        let _lock = PrefetchLock::acquire(self.config.pack_dir.join(LOCK_FILE))?;

        let last_good = packs::max_good_timestamp(&self.config.pack_dir, self.indexer.as_ref())?;
        let previous = shallow::last_fetched_commit(&self.config.shallow_path)?;
        let timestamp = unix_now().max(last_good);

        tracing::info!(
            target = target.commit(),
            previous = previous.as_deref().unwrap_or("none"),
            last_good_pack = last_good,
            "starting prefetch"
        );

        let counters = Arc::new(Counters::default());

        let (required_tx, required_rx) = bounded::<String>(QUEUE_CAPACITY);
        let (missing_tx, missing_rx) = bounded::<String>(QUEUE_CAPACITY);
        // Unbounded so downloads never stall while the index stage waits
        // for the search stage to drain.
        let (pack_tx, pack_rx) = unbounded::<PathBuf>();

        let search_handles = self.spawn_search_workers(required_rx, missing_tx, &counters);
        let download_handles =
            self.spawn_download_workers(missing_rx, pack_tx, timestamp, &counters);

        let (file_operations, diff_handle) =
            self.run_diff_stage(target, filter, previous.as_deref(), required_tx, &counters)?;

        // The search stage signals completion here; indexing must not
        // start until it has fully drained.
        join_all(search_handles);
        if let Some(handle) = diff_handle {
            join_all([handle]);
        }

        let index_handles = self.spawn_index_workers(pack_rx, &counters);
        join_all(download_handles);
        join_all(index_handles);

        if self.config.hydrate_after_download {
            self.run_hydration(file_operations, &counters);
        }

        let outcome = PrefetchOutcome {
            matched: counters.matched.load(Ordering::SeqCst),
            already_local: counters.already_local.load(Ordering::SeqCst),
            downloaded: counters.downloaded.load(Ordering::SeqCst),
            packs_indexed: counters.indexed.load(Ordering::SeqCst),
            hydrated: counters.hydrated.load(Ordering::SeqCst),
            has_failures: counters.failed.load(Ordering::SeqCst),
        };

        if !outcome.has_failures && self.config.update_refs {
            self.update_refs_and_shallow(target)?;
        }

        tracing::info!(
            matched = outcome.matched,
            already_local = outcome.already_local,
            downloaded = outcome.downloaded,
            packs_indexed = outcome.packs_indexed,
            hydrated = outcome.hydrated,
            has_failures = outcome.has_failures,
            "prefetch finished"
        );
        Ok(outcome)
    }

    /// Stage 1. When hydration is requested the diff runs to completion
    /// on the calling thread — the hydrator needs the whole operation
    /// list up front — and a diff failure is fatal. Otherwise the diff
    /// runs concurrently with the later stages and a failure only sets
    /// the run's failure flag.
    fn run_diff_stage(
        &self,
        target: &FetchTarget,
        filter: &PathFilter,
        previous: Option<&str>,
        required_tx: Sender<String>,
        counters: &Arc<Counters>,
    ) -> PrefetchResult<(Vec<FileOperation>, Option<JoinHandle<()>>)> {
        if self.config.hydrate_after_download {
            let output = self.diff.diff(previous, target.commit(), filter)?;
            for sha in output.required_blobs {
                if required_tx.send(sha).is_err() {
                    break;
                }
            }
            return Ok((output.file_operations, None));
        }

        let diff = Arc::clone(&self.diff);
        let counters = Arc::clone(counters);
        let previous = previous.map(str::to_string);
        let commit = target.commit().to_string();
        let filter = filter.clone();
        let handle = thread::spawn(move || {
            match diff.diff(previous.as_deref(), &commit, &filter) {
                Ok(output) => {
                    for sha in output.required_blobs {
                        if required_tx.send(sha).is_err() {
                            break;
                        }
                    }
                }
                Err(err) => {
                    tracing::error!(error = %err, "diff stage failed");
                    counters.fail();
                }
            }
        });
        Ok((Vec::new(), Some(handle)))
    }

    fn spawn_search_workers(
        &self,
        required_rx: Receiver<String>,
        missing_tx: Sender<String>,
        counters: &Arc<Counters>,
    ) -> Vec<JoinHandle<()>> {
        (0..self.config.search_thread_count)
            .map(|_| {
                let rx = required_rx.clone();
                let tx = missing_tx.clone();
                let objects = Arc::clone(&self.objects);
                let counters = Arc::clone(counters);
                thread::spawn(move || {
                    for sha in rx {
                        counters.matched.fetch_add(1, Ordering::SeqCst);
                        if objects.contains(&sha) {
                            counters.already_local.fetch_add(1, Ordering::SeqCst);
                        } else if tx.send(sha).is_err() {
                            break;
                        }
                    }
                })
            })
            .collect()
    }

    fn spawn_download_workers(
        &self,
        missing_rx: Receiver<String>,
        pack_tx: Sender<PathBuf>,
        timestamp: i64,
        counters: &Arc<Counters>,
    ) -> Vec<JoinHandle<()>> {
        let sequence = Arc::new(AtomicU64::new(0));
        (0..self.config.download_thread_count)
            .map(|_| {
                let rx = missing_rx.clone();
                let tx = pack_tx.clone();
                let downloader = Arc::clone(&self.downloader);
                let counters = Arc::clone(counters);
                let sequence = Arc::clone(&sequence);
                let pack_dir = self.config.pack_dir.clone();
                let chunk_size = self.config.chunk_size;
                thread::spawn(move || loop {
                    // Block for the first id of a chunk, then top up
                    // without waiting.
                    let first = match rx.recv() {
                        Ok(sha) => sha,
                        Err(_) => break,
                    };
                    let mut chunk = vec![first];
                    while chunk.len() < chunk_size {
                        match rx.try_recv() {
                            Ok(sha) => chunk.push(sha),
                            Err(_) => break,
                        }
                    }

                    match downloader.download(&chunk) {
                        Ok(bytes) => {
                            let seq = sequence.fetch_add(1, Ordering::SeqCst);
                            let path = packs::pack_path(&pack_dir, timestamp, seq);
                            match fs::write(&path, &bytes) {
                                Ok(()) => {
                                    counters.downloaded.fetch_add(chunk.len(), Ordering::SeqCst);
                                    let _ = tx.send(path);
                                }
                                Err(err) => {
                                    tracing::warn!(
                                        pack = %path.display(),
                                        error = %err,
                                        "failed to write downloaded pack"
                                    );
                                    counters.fail();
                                }
                            }
                        }
                        Err(err) => {
                            // One bad chunk must not abort chunks already
                            // in flight on other workers.
                            tracing::warn!(
                                objects = chunk.len(),
                                error = %err,
                                "batched download failed"
                            );
                            counters.fail();
                        }
                    }
                })
            })
            .collect()
    }

    fn spawn_index_workers(
        &self,
        pack_rx: Receiver<PathBuf>,
        counters: &Arc<Counters>,
    ) -> Vec<JoinHandle<()>> {
        (0..self.config.index_thread_count)
            .map(|_| {
                let rx = pack_rx.clone();
                let indexer = Arc::clone(&self.indexer);
                let counters = Arc::clone(counters);
                thread::spawn(move || {
                    for pack in rx {
                        match indexer.index(&pack) {
                            Ok(()) => {
                                counters.indexed.fetch_add(1, Ordering::SeqCst);
                            }
                            Err(err) => {
                                tracing::warn!(
                                    pack = %pack.display(),
                                    error = %err,
                                    "pack indexing failed"
                                );
                                counters.fail();
                            }
                        }
                    }
                })
            })
            .collect()
    }

    /// Stage 5. Runs only after download and indexing have both drained,
    /// so every blob an operation needs is locally readable.
    fn run_hydration(&self, operations: Vec<FileOperation>, counters: &Arc<Counters>) {
        if operations.is_empty() {
            return;
        }

        let (ops_tx, ops_rx) = unbounded::<FileOperation>();
        for op in operations {
            let _ = ops_tx.send(op);
        }
        drop(ops_tx);

        let thread_count = 2 * num_cpus::get().max(1);
        let handles: Vec<_> = (0..thread_count)
            .map(|_| {
                let rx = ops_rx.clone();
                let objects = Arc::clone(&self.objects);
                let counters = Arc::clone(counters);
                let working_dir = self.config.working_dir.clone();
                thread::spawn(move || {
                    for op in rx {
                        match objects.read_object(&op.sha) {
                            Ok(bytes) => {
                                let path = working_dir.join(&op.path);
                                let written = (|| -> io::Result<()> {
                                    if let Some(parent) = path.parent() {
                                        fs::create_dir_all(parent)?;
                                    }
                                    fs::write(&path, &bytes)
                                })();
                                match written {
                                    Ok(()) => {
                                        counters.hydrated.fetch_add(1, Ordering::SeqCst);
                                    }
                                    Err(err) => {
                                        tracing::warn!(
                                            path = %path.display(),
                                            error = %err,
                                            "failed to hydrate file"
                                        );
                                        counters.fail();
                                    }
                                }
                            }
                            Err(err) => {
                                tracing::warn!(
                                    sha = %op.sha,
                                    error = %err,
                                    "blob unavailable for hydration"
                                );
                                counters.fail();
                            }
                        }
                    }
                })
            })
            .collect();
        join_all(handles);
    }

    fn update_refs_and_shallow(&self, target: &FetchTarget) -> PrefetchResult<()> {
        if let FetchTarget::Branch { name, commit } = target {
            let short = name.strip_prefix("refs/heads/").unwrap_or(name);
            let tracking = format!("refs/remotes/origin/{short}");
            if name.starts_with("refs/") {
                self.refs.set_symbolic_ref(&tracking, name)?;
            } else {
                self.refs.update_ref(&tracking, commit)?;
            }
            self.refs.set_fetch_refspec(short)?;
        }
        shallow::append_fetched_commit(&self.config.shallow_path, target.commit())?;
        Ok(())
    }
}

impl std::fmt::Debug for Prefetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Prefetcher")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn join_all(handles: impl IntoIterator<Item = JoinHandle<()>>) {
    for handle in handles {
        let _ = handle.join();
    }
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs() as i64)
        .unwrap_or(0)
}

//! The placeholder ledger.

use crate::codec::PlaceholderCodec;
use crate::entry::PlaceholderEntry;
use crate::error::{LedgerError, LedgerResult};
use gitvfs_store::{RecordPrefix, RecordStore};
use parking_lot::Mutex;
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Snapshot value for a file placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Hex SHA-1 of the backing blob.
    pub sha: String,
}

/// Snapshot value for a folder placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FolderEntry {
    /// Whether the folder's full child listing has been materialized.
    pub expanded: bool,
}

/// The rebuild window.
///
/// `InFlight` exists strictly between `begin_snapshot_and_prep_rebuild`
/// and its paired `commit_rebuild_and_flush`; every add or remove that
/// races against that window is mirrored into the buffer and replayed
/// during commit. Modeling the window as an enum makes "exactly one open
/// at a time" impossible to violate silently.
#[derive(Debug)]
enum RebuildState {
    Idle,
    InFlight(Vec<(RecordPrefix, PlaceholderEntry)>),
}

#[derive(Debug)]
struct LedgerState {
    estimated_count: i64,
    rebuild: RebuildState,
}

/// Persistent ledger of materialized placeholders.
///
/// Append-only on disk; each mutation is flushed before returning so a
/// crash never loses an acknowledged placeholder. The in-memory footprint
/// stays flat regardless of placeholder count — entries are only
/// materialized into maps for the duration of a snapshot.
///
/// # Count semantics
///
/// [`get_count`](Self::get_count) is an estimate: it is the signed
/// add/remove delta of the log, and duplicate adds of the same path
/// legitimately double count. Use it as a sizing hint, never for
/// correctness.
#[derive(Debug)]
pub struct PlaceholderLedger {
    store: RecordStore<PlaceholderCodec>,
    state: Mutex<LedgerState>,
}

impl PlaceholderLedger {
    /// Opens (creating if missing) the ledger at `path`.
    ///
    /// Replays existing data once to validate integrity and compute the
    /// estimated count; the parsed entries are not retained.
    ///
    /// # Errors
    ///
    /// Returns an error if the data file cannot be opened or is corrupt.
    pub fn try_create(path: impl Into<PathBuf>) -> LedgerResult<Self> {
        let ledger = Self {
            store: RecordStore::open(path, true, PlaceholderCodec),
            state: Mutex::new(LedgerState {
                estimated_count: 0,
                rebuild: RebuildState::Idle,
            }),
        };

        let delta = Cell::new(0i64);
        ledger.store.load(
            || {},
            |_| delta.set(delta.get() + 1),
            |_| delta.set(delta.get() - 1),
        )?;
        ledger.state.lock().estimated_count = delta.get();

        Ok(ledger)
    }

    /// Returns the path of the ledger data file.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.store.path()
    }

    /// Returns the estimated placeholder count.
    ///
    /// Approximate by design; see the type-level docs.
    #[must_use]
    pub fn get_count(&self) -> i64 {
        self.state.lock().estimated_count
    }

    /// Records a materialized file and flushes.
    ///
    /// # Errors
    ///
    /// Returns an error if the sha is not 40 hex characters or the append
    /// fails.
    pub fn add_file_and_flush(&self, path: &str, sha: &str) -> LedgerResult<()> {
        self.append_and_flush(RecordPrefix::Add, PlaceholderEntry::file(path, sha), 1)
    }

    /// Records a materialized folder and flushes.
    ///
    /// # Errors
    ///
    /// Returns an error if the append fails.
    pub fn add_folder_and_flush(&self, path: &str, expanded: bool) -> LedgerResult<()> {
        self.append_and_flush(
            RecordPrefix::Add,
            PlaceholderEntry::folder(path, expanded),
            1,
        )
    }

    /// Tombstones a prior add for `path` and flushes.
    ///
    /// # Errors
    ///
    /// Returns an error if the append fails.
    pub fn remove_and_flush(&self, path: &str) -> LedgerResult<()> {
        self.append_and_flush(
            RecordPrefix::Remove,
            PlaceholderEntry::Path {
                path: path.to_string(),
            },
            -1,
        )
    }

    /// Takes a point-in-time snapshot and opens the rebuild window.
    ///
    /// Replays the on-disk log into maps with last-add-wins semantics for
    /// a given path and removes deleting prior adds. The window opens
    /// atomically with the snapshot — it is impossible for a concurrent
    /// add to land in neither the snapshot nor the pending buffer.
    ///
    /// No ordering guarantee exists among the returned entries.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::RebuildInFlight`] if a window is already
    /// open (caller bug), or a store error if the replay fails.
    pub fn begin_snapshot_and_prep_rebuild(
        &self,
    ) -> LedgerResult<(HashMap<String, FileEntry>, HashMap<String, FolderEntry>)> {
        let already_in_flight = Cell::new(false);
        let maps = RefCell::new((HashMap::new(), HashMap::new()));

        self.store.load(
            || {
                let mut state = self.state.lock();
                match state.rebuild {
                    RebuildState::Idle => state.rebuild = RebuildState::InFlight(Vec::new()),
                    RebuildState::InFlight(_) => already_in_flight.set(true),
                }
            },
            |entry| {
                if already_in_flight.get() {
                    return;
                }
                let (files, folders) = &mut *maps.borrow_mut();
                match entry {
                    PlaceholderEntry::File { path, sha } => {
                        files.insert(path, FileEntry { sha });
                    }
                    PlaceholderEntry::Folder { path, expanded } => {
                        folders.insert(path, FolderEntry { expanded });
                    }
                    PlaceholderEntry::Path { .. } => {}
                }
            },
            |entry| {
                if already_in_flight.get() {
                    return;
                }
                let (files, folders) = &mut *maps.borrow_mut();
                files.remove(entry.path());
                folders.remove(entry.path());
            },
        )?;

        if already_in_flight.get() {
            return Err(LedgerError::RebuildInFlight);
        }
        Ok(maps.into_inner())
    }

    /// Rewrites the data file from `updated_entries` and closes the
    /// rebuild window.
    ///
    /// The rewrite emits every updated entry as an add, deduplicating by
    /// path case-insensitively (first occurrence wins), then replays the
    /// changes that raced in while the window was open, in the order they
    /// actually occurred, against the same key set: a buffered add is
    /// emitted only if its path is new, a buffered remove only if it
    /// cancels a path already emitted. Nothing created by an external
    /// actor between snapshot and rewrite can be lost.
    ///
    /// The estimated count is recomputed from the unique paths written.
    ///
    /// # Errors
    ///
    /// Returns an error if the rewrite fails; the window is closed either
    /// way.
    pub fn commit_rebuild_and_flush<I>(&self, updated_entries: I) -> LedgerResult<()>
    where
        I: IntoIterator<Item = PlaceholderEntry>,
    {
        let result = self.store.rewrite_all(|| {
            let mut updated = updated_entries.into_iter();
            let mut keys: HashSet<String> = HashSet::new();
            let mut count: i64 = 0;
            let mut pending: Option<std::vec::IntoIter<(RecordPrefix, PlaceholderEntry)>> = None;
            let mut done = false;

            std::iter::from_fn(move || {
                if done {
                    return None;
                }

                if pending.is_none() {
                    for entry in updated.by_ref() {
                        if keys.insert(entry.path().to_lowercase()) {
                            count += 1;
                            return Some((RecordPrefix::Add, entry));
                        }
                    }
                    // Snapshot drained; take the buffered racers. The store
                    // lock is held for the whole rewrite, so nothing can be
                    // appended to the buffer after this point.
                    let mut state = self.state.lock();
                    let buffered =
                        match std::mem::replace(&mut state.rebuild, RebuildState::Idle) {
                            RebuildState::InFlight(buffered) => buffered,
                            RebuildState::Idle => Vec::new(),
                        };
                    pending = Some(buffered.into_iter());
                }

                if let Some(iter) = pending.as_mut() {
                    for (prefix, entry) in iter.by_ref() {
                        match prefix {
                            RecordPrefix::Add => {
                                if keys.insert(entry.path().to_lowercase()) {
                                    count += 1;
                                    return Some((RecordPrefix::Add, entry));
                                }
                            }
                            RecordPrefix::Remove => {
                                if keys.remove(&entry.path().to_lowercase()) {
                                    count -= 1;
                                    return Some((RecordPrefix::Remove, entry));
                                }
                            }
                        }
                    }
                }

                self.state.lock().estimated_count = count;
                done = true;
                None
            })
        });

        match &result {
            Ok(()) => {
                tracing::debug!(
                    path = %self.store.path().display(),
                    estimated_count = self.state.lock().estimated_count,
                    "placeholder ledger rewritten"
                );
            }
            Err(err) => {
                // Never leave the window open behind a failed rewrite; the
                // next begin would hit the contract error for a rebuild
                // that no longer exists.
                tracing::warn!(
                    path = %self.store.path().display(),
                    error = %err,
                    "ledger rewrite failed; closing the rebuild window"
                );
                self.state.lock().rebuild = RebuildState::Idle;
            }
        }
        result.map_err(LedgerError::from)
    }

    /// Flushes buffered appends to stable storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the sync fails.
    pub fn force_flush(&self) -> LedgerResult<()> {
        Ok(self.store.force_flush()?)
    }

    fn append_and_flush(
        &self,
        prefix: RecordPrefix,
        entry: PlaceholderEntry,
        delta: i64,
    ) -> LedgerResult<()> {
        self.store.append(prefix, &entry, || {
            let mut state = self.state.lock();
            state.estimated_count += delta;
            if let RebuildState::InFlight(pending) = &mut state.rebuild {
                pending.push((prefix, entry.clone()));
            }
        })?;
        Ok(())
    }
}

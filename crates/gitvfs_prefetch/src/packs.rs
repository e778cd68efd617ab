//! Prefetch pack timestamp ledger.
//!
//! Prefetch packs are named `prefetch-<timestamp>-<suffix>.pack` with an
//! `.idx` sidecar. The timestamp is a Unix-epoch integer used purely as a
//! monotonic ordering key. Every valid pack must have a matching idx; a
//! pack that cannot produce one poisons itself and everything newer,
//! because a gap in the sequence would make future incremental fetches
//! skip over missing history.

use crate::collaborators::PackIndexer;
use crate::error::PrefetchResult;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

/// File name prefix shared by all prefetch packs.
const PACK_PREFIX: &str = "prefetch-";

/// Delete retries for a bad pack pair. Bounded, unlike the record store's
/// reopen policy: ~10 seconds total is a wait the caller can sit out.
const DELETE_ATTEMPTS: u32 = 100;
const DELETE_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Builds the path of a new prefetch pack.
#[must_use]
pub fn pack_path(pack_dir: &Path, timestamp: i64, sequence: u64) -> PathBuf {
    pack_dir.join(format!("{PACK_PREFIX}{timestamp}-{sequence}.pack"))
}

/// Returns the idx sidecar path for a pack.
#[must_use]
pub fn idx_path_for(pack: &Path) -> PathBuf {
    pack.with_extension("idx")
}

/// Parses the timestamp out of a prefetch pack file name.
///
/// Returns `None` for names that do not follow the
/// `prefetch-<timestamp>-<suffix>.pack` convention; such files are
/// ignored by the ledger.
#[must_use]
pub fn parse_pack_timestamp(file_name: &str) -> Option<i64> {
    let rest = file_name.strip_prefix(PACK_PREFIX)?;
    let rest = rest.strip_suffix(".pack")?;
    rest.split('-').next()?.parse().ok()
}

/// Determines the newest trustworthy pack timestamp, pruning bad packs.
///
/// Lists the pack directory, sorts packs by embedded timestamp, and walks
/// forward. A pack without an idx gets one regeneration attempt via the
/// indexer; if that succeeds the pack still counts as good. The first
/// unrecoverable pack marks the start of the bad suffix, which is deleted
/// newest-first — if this process is killed mid-cleanup, the survivors
/// are still a contiguous good prefix and the next run resumes instead of
/// finding a gap.
///
/// Returns −1 when no valid packs exist.
///
/// # Errors
///
/// Returns an error if the directory cannot be listed or a bad pack pair
/// cannot be deleted within the retry budget.
pub fn max_good_timestamp(pack_dir: &Path, indexer: &dyn PackIndexer) -> PrefetchResult<i64> {
    let mut packs: Vec<(i64, PathBuf)> = Vec::new();
    let entries = match fs::read_dir(pack_dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(-1),
        Err(err) => return Err(err.into()),
    };
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name();
        if let Some(timestamp) = parse_pack_timestamp(&name.to_string_lossy()) {
            packs.push((timestamp, entry.path()));
        }
    }
    packs.sort_by_key(|(timestamp, _)| *timestamp);

    let mut max_good: i64 = -1;
    let mut first_bad: Option<usize> = None;

    for (i, (timestamp, pack)) in packs.iter().enumerate() {
        if idx_path_for(pack).exists() {
            max_good = *timestamp;
            continue;
        }
        match indexer.index(pack) {
            Ok(()) => max_good = *timestamp,
            Err(err) => {
                tracing::warn!(
                    pack = %pack.display(),
                    error = %err,
                    "pack idx unrecoverable; pruning it and everything newer"
                );
                first_bad = Some(i);
                break;
            }
        }
    }

    if let Some(start) = first_bad {
        for (_, pack) in packs[start..].iter().rev() {
            delete_pack_and_idx(pack)?;
        }
    }

    Ok(max_good)
}

/// Deletes a pack and its idx sidecar with a bounded retry budget.
fn delete_pack_and_idx(pack: &Path) -> PrefetchResult<()> {
    let idx = idx_path_for(pack);
    let mut attempt: u32 = 0;
    loop {
        let result = remove_if_present(&idx).and_then(|()| remove_if_present(pack));
        match result {
            Ok(()) => return Ok(()),
            Err(err) => {
                attempt += 1;
                if attempt >= DELETE_ATTEMPTS {
                    return Err(err.into());
                }
                thread::sleep(DELETE_RETRY_DELAY);
            }
        }
    }
}

fn remove_if_present(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err),
    }
}

//! Prefetch pack commands.

use gitvfs_prefetch::{
    idx_path_for, max_good_timestamp, parse_pack_timestamp, PackIndexer, PrefetchError,
    PrefetchResult,
};
use std::fs;
use std::path::Path;

/// Indexer that cannot regenerate anything.
///
/// Used for pruning from the CLI, where the Git tooling is not wired up:
/// every pack missing its idx is treated as unrecoverable.
struct NullIndexer;

impl PackIndexer for NullIndexer {
    fn index(&self, pack_path: &Path) -> PrefetchResult<()> {
        Err(PrefetchError::index(
            pack_path,
            "idx regeneration is not available from the CLI",
        ))
    }
}

#[derive(Debug, serde::Serialize)]
struct PackReport {
    name: String,
    timestamp: i64,
    has_idx: bool,
}

/// Runs `packs validate`.
pub fn validate(dir: &Path, prune: bool, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let mut reports: Vec<PackReport> = Vec::new();
    if dir.exists() {
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if let Some(timestamp) = parse_pack_timestamp(&name) {
                reports.push(PackReport {
                    has_idx: idx_path_for(&entry.path()).exists(),
                    name,
                    timestamp,
                });
            }
        }
    }
    reports.sort_by_key(|report| report.timestamp);

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        println!("Prefetch packs in {}", dir.display());
        if reports.is_empty() {
            println!("  (none)");
        }
        for report in &reports {
            let marker = if report.has_idx { "ok " } else { "BAD" };
            println!("  [{marker}] {} (timestamp {})", report.name, report.timestamp);
        }
    }

    if prune {
        tracing::debug!(dir = %dir.display(), "pruning packs without idx sidecars");
        let max = max_good_timestamp(dir, &NullIndexer)?;
        if max < 0 {
            println!("Pruned; no valid packs remain");
        } else {
            println!("Pruned; newest trustworthy pack timestamp is {max}");
        }
    } else if reports.iter().any(|report| !report.has_idx) {
        println!("Packs without idx found; rerun with --prune to delete them");
    }

    Ok(())
}

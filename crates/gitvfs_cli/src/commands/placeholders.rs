//! Placeholder ledger commands.

use gitvfs_ledger::{PlaceholderCodec, PlaceholderEntry, PlaceholderLedger};
use gitvfs_store::RecordStore;
use std::collections::HashSet;
use std::path::Path;

/// Ledger summary for `placeholders stats`.
#[derive(Debug, Default, serde::Serialize)]
pub struct LedgerStats {
    /// Add records in the log.
    pub add_records: usize,
    /// Remove records in the log.
    pub remove_records: usize,
    /// Distinct file placeholder paths.
    pub file_paths: usize,
    /// Distinct folder placeholder paths.
    pub folder_paths: usize,
    /// Folders whose full listing has been expanded.
    pub expanded_folders: usize,
}

/// Runs `placeholders stats`.
pub fn stats(path: &Path, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    if !path.exists() {
        return Err(format!("ledger not found at {}", path.display()).into());
    }

    // Read-only one-shot parse; no live handle is kept.
    let store = RecordStore::open(path, false, PlaceholderCodec);
    let gathered = std::cell::RefCell::new((LedgerStats::default(), Gathered::default()));
    store.load(
        || {},
        |entry| {
            let (stats, gathered) = &mut *gathered.borrow_mut();
            stats.add_records += 1;
            match entry {
                PlaceholderEntry::File { path, .. } => {
                    gathered.files.insert(path);
                }
                PlaceholderEntry::Folder { path, expanded } => {
                    if expanded {
                        gathered.expanded.insert(path.clone());
                    } else {
                        gathered.expanded.remove(&path);
                    }
                    gathered.folders.insert(path);
                }
                PlaceholderEntry::Path { .. } => {}
            }
        },
        |entry| {
            let (stats, gathered) = &mut *gathered.borrow_mut();
            stats.remove_records += 1;
            gathered.files.remove(entry.path());
            gathered.folders.remove(entry.path());
            gathered.expanded.remove(entry.path());
        },
    )?;

    let (mut stats, gathered) = gathered.into_inner();
    stats.file_paths = gathered.files.len();
    stats.folder_paths = gathered.folders.len();
    stats.expanded_folders = gathered.expanded.len();

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!("Placeholder ledger: {}", path.display());
        println!("  Add records:      {}", stats.add_records);
        println!("  Remove records:   {}", stats.remove_records);
        println!("  File paths:       {}", stats.file_paths);
        println!("  Folder paths:     {}", stats.folder_paths);
        println!("  Expanded folders: {}", stats.expanded_folders);
    }
    Ok(())
}

#[derive(Default)]
struct Gathered {
    files: HashSet<String>,
    folders: HashSet<String>,
    expanded: HashSet<String>,
}

/// Runs `placeholders compact`.
///
/// Takes a snapshot and writes it straight back, which collapses
/// duplicate adds and add/remove pairs into one record per live path.
pub fn compact(path: &Path, dry_run: bool) -> Result<(), Box<dyn std::error::Error>> {
    if !path.exists() {
        return Err(format!("ledger not found at {}", path.display()).into());
    }

    let bytes_before = std::fs::metadata(path)?.len();

    if dry_run {
        // Count live paths with a read-only parse; no rebuild window opens.
        let live = std::cell::RefCell::new((HashSet::new(), HashSet::new()));
        let store = RecordStore::open(path, false, PlaceholderCodec);
        store.load(
            || {},
            |entry| {
                let (files, folders): &mut (HashSet<String>, HashSet<String>) =
                    &mut *live.borrow_mut();
                match entry {
                    PlaceholderEntry::File { path, .. } => {
                        files.insert(path);
                    }
                    PlaceholderEntry::Folder { path, .. } => {
                        folders.insert(path);
                    }
                    PlaceholderEntry::Path { .. } => {}
                }
            },
            |entry| {
                let (files, folders) = &mut *live.borrow_mut();
                files.remove(entry.path());
                folders.remove(entry.path());
            },
        )?;
        let (files, folders) = live.into_inner();
        println!("Compacting {} (dry run - no changes will be made)", path.display());
        println!("  Size before:            {bytes_before} bytes");
        println!("  Live placeholder paths: {}", files.len() + folders.len());
        return Ok(());
    }

    let ledger = PlaceholderLedger::try_create(path)?;
    let records_before = ledger.get_count();
    let (files, folders) = ledger.begin_snapshot_and_prep_rebuild()?;
    let live_paths = files.len() + folders.len();

    let entries: Vec<PlaceholderEntry> = files
        .into_iter()
        .map(|(path, file)| PlaceholderEntry::file(path, file.sha))
        .chain(
            folders
                .into_iter()
                .map(|(path, folder)| PlaceholderEntry::folder(path, folder.expanded)),
        )
        .collect();
    ledger.commit_rebuild_and_flush(entries)?;

    let bytes_after = std::fs::metadata(path)?.len();
    println!("Compacting {}", path.display());
    println!("  Estimated records before: {records_before}");
    println!("  Live placeholder paths:   {live_paths}");
    println!("  Size before: {bytes_before} bytes");
    println!("  Size after:  {bytes_after} bytes");
    println!("Compaction complete");
    Ok(())
}

//! Shallow marker command.

use gitvfs_prefetch::last_fetched_commit;
use std::path::Path;

/// Runs `shallow`.
pub fn run(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    match last_fetched_commit(path)? {
        Some(commit) => println!("{commit}"),
        None => println!("(no prefetched commit recorded)"),
    }
    Ok(())
}

//! Shallow marker file.
//!
//! Plain text, one commit SHA per line, newline-terminated, append-only.
//! Only the last non-blank line is consulted as the previous known commit
//! when computing an incremental diff.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

/// Reads the most recently fetched commit from the shallow marker.
///
/// Returns `None` if the file does not exist or holds no non-blank line.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read.
pub fn last_fetched_commit(path: &Path) -> io::Result<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    Ok(content
        .lines()
        .rev()
        .find(|line| !line.trim().is_empty())
        .map(|line| line.trim().to_string()))
}

/// Appends a fetched commit to the shallow marker, creating the file if
/// absent.
///
/// The written line always ends with exactly one newline; if a previous
/// writer was interrupted before its newline, one is inserted first so
/// the SHAs never run together.
///
/// # Errors
///
/// Returns an error if the file cannot be read or appended.
pub fn append_fetched_commit(path: &Path, sha: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let needs_leading_newline = match fs::read_to_string(path) {
        Ok(existing) => !existing.is_empty() && !existing.ends_with('\n'),
        Err(err) if err.kind() == io::ErrorKind::NotFound => false,
        Err(err) => return Err(err),
    };

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    if needs_leading_newline {
        file.write_all(b"\n")?;
    }
    file.write_all(sha.as_bytes())?;
    file.write_all(b"\n")?;
    file.sync_all()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_has_no_commit() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("shallow");
        assert_eq!(last_fetched_commit(&path).unwrap(), None);
    }

    #[test]
    fn append_creates_file_with_single_trailing_newline() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("shallow");
        append_fetched_commit(&path, "aaaa").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "aaaa\n");
        assert_eq!(last_fetched_commit(&path).unwrap().as_deref(), Some("aaaa"));
    }

    #[test]
    fn last_non_blank_line_wins() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("shallow");
        append_fetched_commit(&path, "aaaa").unwrap();
        append_fetched_commit(&path, "bbbb").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "aaaa\nbbbb\n");
        assert_eq!(last_fetched_commit(&path).unwrap().as_deref(), Some("bbbb"));
    }

    #[test]
    fn trailing_blank_lines_are_skipped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("shallow");
        fs::write(&path, "aaaa\nbbbb\n\n  \n").unwrap();
        assert_eq!(last_fetched_commit(&path).unwrap().as_deref(), Some("bbbb"));
    }

    #[test]
    fn missing_newline_from_interrupted_writer_is_repaired() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("shallow");
        fs::write(&path, "aaaa").unwrap();
        append_fetched_commit(&path, "bbbb").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "aaaa\nbbbb\n");
    }
}

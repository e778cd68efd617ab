//! Cross-process prefetch lock.
//!
//! Two prefetch invocations racing on the same pack directory (say, a
//! foreground command and a background timer in another process) would
//! fight over pack names and prune each other's work. An advisory file
//! lock, distinct from the in-process store mutex, serializes them.

use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

/// Polling period while waiting for the lock holder to finish.
const POLL_PERIOD: Duration = Duration::from_millis(100);

/// A waiting message is logged once per this many poll attempts.
const POLL_LOG_INTERVAL: u64 = 50;

/// Held advisory lock over a prefetch pack directory.
///
/// The lock releases when this value drops (or the process dies — the OS
/// reclaims advisory locks, which is what makes them safe against
/// crashed holders).
#[derive(Debug)]
pub struct PrefetchLock {
    path: PathBuf,
    _file: File,
}

impl PrefetchLock {
    /// Acquires the lock, polling until the current holder releases it.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock file cannot be created.
    pub fn acquire(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        let file = Self::open_lock_file(&path)?;
        let mut attempt: u64 = 0;
        loop {
            if file.try_lock_exclusive().is_ok() {
                return Ok(Self { path, _file: file });
            }
            attempt += 1;
            if attempt % POLL_LOG_INTERVAL == 0 {
                tracing::info!(
                    lock = %path.display(),
                    attempt,
                    "waiting for another prefetch to finish"
                );
            }
            thread::sleep(POLL_PERIOD);
        }
    }

    /// Tries to acquire the lock without waiting.
    ///
    /// Returns `None` if another process holds it.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock file cannot be created.
    pub fn try_acquire(path: impl Into<PathBuf>) -> io::Result<Option<Self>> {
        let path = path.into();
        let file = Self::open_lock_file(&path)?;
        if file.try_lock_exclusive().is_ok() {
            Ok(Some(Self { path, _file: file }))
        } else {
            Ok(None)
        }
    }

    /// Returns the lock file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open_lock_file(path: &Path) -> io::Result<File> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn acquire_creates_lock_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("packs").join("prefetch.lock");
        let lock = PrefetchLock::acquire(&path).unwrap();
        assert!(path.exists());
        assert_eq!(lock.path(), path);
    }

    #[test]
    fn second_try_acquire_in_same_process_sees_contention_released_on_drop() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prefetch.lock");

        let held = PrefetchLock::acquire(&path).unwrap();
        drop(held);

        // After release the lock is immediately available again.
        let reacquired = PrefetchLock::try_acquire(&path).unwrap();
        assert!(reacquired.is_some());
    }
}

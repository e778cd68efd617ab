//! I/O retry policies.
//!
//! Two budgets exist. `retry_until_success` loops forever with a fixed
//! short delay and is reserved for operations that must not be allowed to
//! fail silently, such as reopening the live handle after a rewrite (a
//! store that cannot reopen would drop every future append on the floor).
//! `retry_bounded` gives up after a fixed number of attempts and is used
//! where the caller can reasonably wait out the whole budget.
//!
//! Another process, an antivirus scanner, or a crashed prior instance may
//! hold the file between our steps; transient share violations here are an
//! environment condition, not a bug.

use std::io;
use std::thread;
use std::time::Duration;

/// Delay between I/O retry attempts.
pub(crate) const IO_RETRY_DELAY: Duration = Duration::from_millis(20);

/// A warning is logged once per this many failed attempts, not on every
/// attempt, to keep a wedged file from flooding the log.
pub(crate) const RETRY_LOG_INTERVAL: u64 = 50;

/// Retries `op` until it succeeds.
pub(crate) fn retry_until_success<T>(what: &str, mut op: impl FnMut() -> io::Result<T>) -> T {
    let mut attempt: u64 = 0;
    loop {
        match op() {
            Ok(value) => return value,
            Err(err) => {
                attempt += 1;
                if attempt % RETRY_LOG_INTERVAL == 0 {
                    tracing::warn!(what, attempt, error = %err, "I/O retry still failing");
                }
                thread::sleep(IO_RETRY_DELAY);
            }
        }
    }
}

/// Retries `op` up to `max_attempts` times, returning the last error.
pub(crate) fn retry_bounded<T>(
    what: &str,
    max_attempts: u64,
    delay: Duration,
    mut op: impl FnMut() -> io::Result<T>,
) -> io::Result<T> {
    let mut attempt: u64 = 0;
    loop {
        match op() {
            Ok(value) => return Ok(value),
            Err(err) => {
                attempt += 1;
                if attempt >= max_attempts {
                    return Err(err);
                }
                if attempt % RETRY_LOG_INTERVAL == 0 {
                    tracing::warn!(what, attempt, error = %err, "I/O retry still failing");
                }
                thread::sleep(delay);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn until_success_eventually_returns() {
        let calls = AtomicU32::new(0);
        let value = retry_until_success("test", || {
            if calls.fetch_add(1, Ordering::SeqCst) < 3 {
                Err(io::Error::new(io::ErrorKind::PermissionDenied, "locked"))
            } else {
                Ok(42)
            }
        });
        assert_eq!(value, 42);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn bounded_gives_up() {
        let calls = AtomicU32::new(0);
        let result: io::Result<()> = retry_bounded("test", 3, Duration::ZERO, || {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "locked"))
        });
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn bounded_stops_on_success() {
        let calls = AtomicU32::new(0);
        let result = retry_bounded("test", 5, Duration::ZERO, || {
            if calls.fetch_add(1, Ordering::SeqCst) == 1 {
                Ok(7)
            } else {
                Err(io::Error::new(io::ErrorKind::PermissionDenied, "locked"))
            }
        });
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}

//! Background prefetch runner.
//!
//! A timer in the host fires periodically; each tick calls
//! [`BackgroundPrefetcher::try_start`]. If the previous run is still
//! going, the tick is skipped outright — runs never overlap and never
//! queue. The job receives a [`StopSignal`] and is expected to check it
//! at safe points; there is no way to kill a thread from the outside,
//! only to ask it to stop.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

/// Cooperative stop signal threaded through a background job.
#[derive(Debug, Clone)]
pub struct StopSignal {
    stop: Arc<AtomicBool>,
}

impl StopSignal {
    /// Returns true once a stop has been requested.
    #[must_use]
    pub fn is_stop_requested(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }
}

/// Runs prefetch jobs on a retained background thread, at most one at a
/// time.
#[derive(Debug, Default)]
pub struct BackgroundPrefetcher {
    running: Arc<AtomicBool>,
    stop: Arc<AtomicBool>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl BackgroundPrefetcher {
    /// Creates an idle runner.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts `job` on a background thread unless a run is already alive.
    ///
    /// Returns whether the job was started; a skipped tick returns false.
    pub fn try_start<F>(&self, job: F) -> bool
    where
        F: FnOnce(&StopSignal) + Send + 'static,
    {
        if self.running.swap(true, Ordering::SeqCst) {
            tracing::debug!("previous background prefetch still running; skipping");
            return false;
        }

        self.stop.store(false, Ordering::SeqCst);
        let signal = StopSignal {
            stop: Arc::clone(&self.stop),
        };
        let running = Arc::clone(&self.running);

        let handle = std::thread::spawn(move || {
            job(&signal);
            running.store(false, Ordering::SeqCst);
        });

        // A finished prior handle may still be parked here; reap it so the
        // slot never accumulates threads.
        let previous = self.handle.lock().replace(handle);
        if let Some(previous) = previous {
            let _ = previous.join();
        }
        true
    }

    /// Returns whether a run is currently alive.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Asks the current run to stop at its next safe point.
    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    /// Blocks until the current run (if any) completes.
    ///
    /// Exists so tests and shutdown paths can be deterministic.
    pub fn wait(&self) {
        let handle = self.handle.lock().take();
        if let Some(handle) = handle {
            let _ = handle.join();
        }
    }
}

//! Prefetch configuration.

use std::path::PathBuf;

/// Default object-id count per batched download request.
const DEFAULT_CHUNK_SIZE: usize = 4000;

/// Configuration for a prefetch run.
#[derive(Debug, Clone)]
pub struct PrefetchConfig {
    /// Directory holding prefetch packs and their idx sidecars.
    pub pack_dir: PathBuf,

    /// Path of the shallow marker file recording previously fetched
    /// commits.
    pub shallow_path: PathBuf,

    /// Root of the working directory, used only when hydration is
    /// requested.
    pub working_dir: PathBuf,

    /// Worker threads checking local object existence.
    pub search_thread_count: usize,

    /// Worker threads issuing batched downloads.
    pub download_thread_count: usize,

    /// Worker threads indexing downloaded packs.
    pub index_thread_count: usize,

    /// Object ids per batched download request.
    pub chunk_size: usize,

    /// Whether to hydrate working-directory files after the download
    /// completes. Forces the diff stage to run to completion before the
    /// rest of the pipeline starts.
    pub hydrate_after_download: bool,

    /// Whether a fully successful run updates refs, the refspec, and the
    /// shallow marker afterwards.
    pub update_refs: bool,
}

impl PrefetchConfig {
    /// Creates a configuration with default thread counts.
    #[must_use]
    pub fn new(
        pack_dir: impl Into<PathBuf>,
        shallow_path: impl Into<PathBuf>,
        working_dir: impl Into<PathBuf>,
    ) -> Self {
        let workers = num_cpus::get().max(1);
        Self {
            pack_dir: pack_dir.into(),
            shallow_path: shallow_path.into(),
            working_dir: working_dir.into(),
            search_thread_count: workers,
            download_thread_count: workers,
            index_thread_count: workers,
            chunk_size: DEFAULT_CHUNK_SIZE,
            hydrate_after_download: false,
            update_refs: true,
        }
    }

    /// Sets the search worker count.
    #[must_use]
    pub fn search_thread_count(mut self, count: usize) -> Self {
        self.search_thread_count = count.max(1);
        self
    }

    /// Sets the download worker count.
    #[must_use]
    pub fn download_thread_count(mut self, count: usize) -> Self {
        self.download_thread_count = count.max(1);
        self
    }

    /// Sets the index worker count.
    #[must_use]
    pub fn index_thread_count(mut self, count: usize) -> Self {
        self.index_thread_count = count.max(1);
        self
    }

    /// Sets the download chunk size.
    #[must_use]
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size.max(1);
        self
    }

    /// Enables or disables post-download hydration.
    #[must_use]
    pub fn hydrate_after_download(mut self, value: bool) -> Self {
        self.hydrate_after_download = value;
        self
    }

    /// Enables or disables post-success ref and shallow updates.
    #[must_use]
    pub fn update_refs(mut self, value: bool) -> Self {
        self.update_refs = value;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = PrefetchConfig::new("packs", "shallow", "work");
        assert!(config.search_thread_count >= 1);
        assert_eq!(config.chunk_size, 4000);
        assert!(!config.hydrate_after_download);
        assert!(config.update_refs);
    }

    #[test]
    fn builder_clamps_to_one() {
        let config = PrefetchConfig::new("packs", "shallow", "work")
            .search_thread_count(0)
            .chunk_size(0);
        assert_eq!(config.search_thread_count, 1);
        assert_eq!(config.chunk_size, 1);
    }
}

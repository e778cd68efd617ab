//! # gitvfs prefetch
//!
//! Concurrent prefetch pipeline that populates the local Git object cache
//! ahead of need, and the timestamp ledger that tracks which prefetch
//! pack batches can be trusted.
//!
//! The pipeline stages — diff, find-missing, batch-download, pack-index,
//! and optional file-hydrate — run on worker thread pools connected by
//! bounded queues. Remote access, object lookup, and pack indexing are
//! collaborator traits; this crate owns only the orchestration, the pack
//! naming/validity rules, and the shallow marker bookkeeping.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod background;
mod collaborators;
mod config;
mod error;
mod filter;
mod lock;
mod packs;
mod pipeline;
mod shallow;

pub use background::{BackgroundPrefetcher, StopSignal};
pub use collaborators::{
    DiffOutput, DiffProvider, FileOperation, MockDiffProvider, MockDownloader, MockObjectStore,
    MockPackIndexer, MockRefStore, ObjectDownloader, ObjectStore, PackIndexer, RefStore,
};
pub use config::PrefetchConfig;
pub use error::{PrefetchError, PrefetchResult};
pub use filter::PathFilter;
pub use lock::PrefetchLock;
pub use packs::{idx_path_for, max_good_timestamp, pack_path, parse_pack_timestamp};
pub use pipeline::{FetchTarget, PrefetchOutcome, Prefetcher};
pub use shallow::{append_fetched_commit, last_fetched_commit};

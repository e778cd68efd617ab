//! # gitvfs ledger
//!
//! Persistent ledger of placeholder files and folders in a virtualized
//! working directory.
//!
//! The virtualization callback layer records every placeholder it
//! materializes here, so that after a restart (or crash) the client knows
//! exactly which on-disk entries it owns. The ledger is one instantiation
//! of the append-only record store from `gitvfs_store`, plus a
//! snapshot/rebuild protocol that lets a consumer compact the log while
//! placeholders keep being created concurrently.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod codec;
mod entry;
mod error;
mod ledger;

pub use codec::PlaceholderCodec;
pub use entry::PlaceholderEntry;
pub use error::{LedgerError, LedgerResult};
pub use ledger::{FileEntry, FolderEntry, PlaceholderLedger};

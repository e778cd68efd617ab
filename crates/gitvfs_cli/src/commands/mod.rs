//! CLI command implementations.

pub mod packs;
pub mod placeholders;
pub mod shallow;

//! Core types for replisync.
//!
//! This crate provides the data model shared by the reconciliation engine
//! and the command-line driver: directory entries, reconciliation actions,
//! the sync target and its configuration, and the error type.

mod action;
mod config;
mod entry;
mod error;

pub use action::{ActionKind, SyncAction};
pub use config::{
    DEFAULT_HASH_BLOCK_SIZE, ErrorPolicy, SyncConfig, SyncConfigBuilder, SyncConfigBuilderError,
    SyncTarget,
};
pub use entry::{ContentHash, DirectoryEntry, EntryKind};
pub use error::SyncError;

//! Tree reconciliation engine for replisync.
//!
//! This crate keeps a replica directory tree identical to a source tree:
//!
//! - [`ContentHasher`] streams file content through BLAKE3
//! - [`EntryComparator`] decides whether a replica file is stale
//! - [`TreeReconciler`] applies one full pass and reports what it did
//! - [`SyncDriver`] repeats passes at a fixed interval until cancelled
//!
//! ```rust,ignore
//! use replisync_engine::{RecordingReporter, TreeReconciler};
//!
//! let reconciler = TreeReconciler::new(RecordingReporter::new());
//! let actions = reconciler.reconcile("/data/source".as_ref(), "/backup/replica".as_ref())?;
//!
//! for action in &actions {
//!     println!("{action}");
//! }
//! ```

mod compare;
mod copy;
mod driver;
mod hash;
mod reconcile;
mod report;

pub use compare::{Comparison, Difference, EntryComparator};
pub use driver::{DriverSummary, SyncDriver};
pub use hash::ContentHasher;
pub use reconcile::TreeReconciler;
pub use report::{ActionReporter, RecordingReporter, TracingReporter};

// Re-export core types
pub use replisync_core::{
    ActionKind, DirectoryEntry, EntryKind, ErrorPolicy, SyncAction, SyncConfig, SyncError,
    SyncTarget,
};

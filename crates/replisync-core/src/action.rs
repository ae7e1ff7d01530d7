//! Reconciliation actions.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::entry::EntryKind;

/// The kind of change applied to the replica.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    FileCreated,
    FileUpdated,
    FileRemoved,
    DirectoryCreated,
    DirectoryRemoved,
}

impl ActionKind {
    /// Check if this action created something.
    pub fn is_creation(&self) -> bool {
        matches!(self, Self::FileCreated | Self::DirectoryCreated)
    }

    /// Check if this action removed something.
    pub fn is_removal(&self) -> bool {
        matches!(self, Self::FileRemoved | Self::DirectoryRemoved)
    }

    /// Human-readable label used in log lines.
    pub fn label(&self) -> &'static str {
        match self {
            Self::FileCreated => "File created",
            Self::FileUpdated => "File updated",
            Self::FileRemoved => "File removed",
            Self::DirectoryCreated => "Folder created",
            Self::DirectoryRemoved => "Folder removed",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single change applied to the replica during a pass.
///
/// Actions are reported as they happen and are not persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncAction {
    /// What happened.
    pub kind: ActionKind,
    /// Replica path affected.
    pub path: PathBuf,
}

impl SyncAction {
    /// Create a new action.
    pub fn new(kind: ActionKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            path: path.into(),
        }
    }

    /// Creation of an entry of the given kind.
    pub fn created(kind: EntryKind, path: impl Into<PathBuf>) -> Self {
        let kind = if kind.is_dir() {
            ActionKind::DirectoryCreated
        } else {
            ActionKind::FileCreated
        };
        Self::new(kind, path)
    }

    /// Removal of an entry of the given kind.
    pub fn removed(kind: EntryKind, path: impl Into<PathBuf>) -> Self {
        let kind = if kind.is_dir() {
            ActionKind::DirectoryRemoved
        } else {
            ActionKind::FileRemoved
        };
        Self::new(kind, path)
    }

    /// Overwrite of an existing replica file.
    pub fn updated(path: impl Into<PathBuf>) -> Self {
        Self::new(ActionKind::FileUpdated, path)
    }
}

impl fmt::Display for SyncAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.path.display())
    }
}

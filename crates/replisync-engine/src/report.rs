//! Action reporting sinks.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{info, warn};

use replisync_core::SyncAction;

/// Receives the observable output of a reconciliation pass.
///
/// Injected into the reconciler so callers decide where events go.
pub trait ActionReporter: Send + Sync {
    /// Called once per action, right after it was applied.
    fn action(&self, action: &SyncAction);

    /// Called when a missing replica directory is about to be created.
    fn replica_created(&self, path: &Path);
}

impl<T: ActionReporter + ?Sized> ActionReporter for Arc<T> {
    fn action(&self, action: &SyncAction) {
        (**self).action(action);
    }

    fn replica_created(&self, path: &Path) {
        (**self).replica_created(path);
    }
}

impl<T: ActionReporter + ?Sized> ActionReporter for &T {
    fn action(&self, action: &SyncAction) {
        (**self).action(action);
    }

    fn replica_created(&self, path: &Path) {
        (**self).replica_created(path);
    }
}

/// Emits actions as `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl ActionReporter for TracingReporter {
    fn action(&self, action: &SyncAction) {
        info!("{action}");
    }

    fn replica_created(&self, path: &Path) {
        warn!(
            "Replica folder '{}' does not exist. Creating it.",
            path.display()
        );
    }
}

/// Keeps every reported event in memory.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    actions: Mutex<Vec<SyncAction>>,
    created_replicas: Mutex<Vec<PathBuf>>,
}

impl RecordingReporter {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the actions recorded so far.
    pub fn actions(&self) -> Vec<SyncAction> {
        lock(&self.actions).clone()
    }

    /// Replica directories reported as auto-created.
    pub fn created_replicas(&self) -> Vec<PathBuf> {
        lock(&self.created_replicas).clone()
    }
}

impl ActionReporter for RecordingReporter {
    fn action(&self, action: &SyncAction) {
        lock(&self.actions).push(action.clone());
    }

    fn replica_created(&self, path: &Path) {
        lock(&self.created_replicas).push(path.to_path_buf());
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

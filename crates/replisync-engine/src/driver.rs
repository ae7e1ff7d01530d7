//! Fixed-interval sync loop.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use replisync_core::{ErrorPolicy, SyncAction, SyncConfig, SyncError, SyncTarget};

use crate::hash::ContentHasher;
use crate::reconcile::TreeReconciler;
use crate::report::ActionReporter;

/// Counters for a finished driver run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriverSummary {
    /// Passes that completed.
    pub cycles: u64,
    /// Actions applied across all completed passes.
    pub actions: u64,
    /// Passes that failed and were skipped.
    pub failed_cycles: u64,
}

/// Runs a reconciliation pass, sleeps for the interval, and repeats until
/// cancelled.
///
/// Cancellation is only observed before a pass and during the sleep; a
/// pass that has started always runs to completion.
pub struct SyncDriver<R> {
    target: SyncTarget,
    interval: Duration,
    error_policy: ErrorPolicy,
    reconciler: Arc<TreeReconciler<R>>,
}

impl<R: ActionReporter + 'static> SyncDriver<R> {
    /// Create a driver for `target` using `reconciler`.
    pub fn new(target: SyncTarget, interval: Duration, reconciler: TreeReconciler<R>) -> Self {
        Self {
            target,
            interval,
            error_policy: ErrorPolicy::default(),
            reconciler: Arc::new(reconciler),
        }
    }

    /// Create a driver from a validated config.
    pub fn from_config(config: &SyncConfig, reporter: R) -> Self {
        let hasher = ContentHasher::with_block_size(config.hash_block_size);
        Self::new(
            config.target(),
            config.interval,
            TreeReconciler::with_hasher(hasher, reporter),
        )
        .with_error_policy(config.error_policy)
    }

    /// Set the behavior for failed passes.
    pub fn with_error_policy(mut self, error_policy: ErrorPolicy) -> Self {
        self.error_policy = error_policy;
        self
    }

    /// The reconciler driven by this loop.
    pub fn reconciler(&self) -> &TreeReconciler<R> {
        &self.reconciler
    }

    /// Run until `cancel` fires.
    ///
    /// Returns early with an error, before any pass runs, if the source root
    /// is missing or the roots overlap. Under [`ErrorPolicy::Abort`] a failed pass also ends the
    /// run with its error.
    pub async fn run(&self, cancel: CancellationToken) -> Result<DriverSummary, SyncError> {
        self.check_source()?;

        info!(
            "Synchronizing '{}' into '{}' every {}s",
            self.target.source.display(),
            self.target.replica.display(),
            self.interval.as_secs_f64()
        );

        let mut summary = DriverSummary::default();

        while !cancel.is_cancelled() {
            match self.run_cycle().await {
                Ok(actions) => {
                    summary.cycles += 1;
                    summary.actions += actions.len() as u64;
                    debug!(
                        cycle = summary.cycles,
                        created = actions.iter().filter(|a| a.kind.is_creation()).count(),
                        removed = actions.iter().filter(|a| a.kind.is_removal()).count(),
                        total = actions.len(),
                        "Reconciliation pass complete"
                    );
                }
                Err(err) => {
                    error!("Reconciliation pass failed: {err}");
                    match self.error_policy {
                        ErrorPolicy::Abort => return Err(err),
                        ErrorPolicy::SkipCycle => summary.failed_cycles += 1,
                    }
                }
            }

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        info!("Synchronization stopped by user.");
        debug!(?summary, "Driver finished");
        Ok(summary)
    }

    fn check_source(&self) -> Result<(), SyncError> {
        let source = &self.target.source;
        let err = if let Err(err) = self.target.check_disjoint() {
            err
        } else if !source.exists() {
            SyncError::SourceMissing {
                path: source.clone(),
            }
        } else if !source.is_dir() {
            SyncError::NotADirectory {
                path: source.clone(),
            }
        } else {
            return Ok(());
        };

        error!("{err}");
        Err(err)
    }

    async fn run_cycle(&self) -> Result<Vec<SyncAction>, SyncError> {
        let reconciler = Arc::clone(&self.reconciler);
        let target = self.target.clone();

        tokio::task::spawn_blocking(move || reconciler.reconcile(&target.source, &target.replica))
            .await
            .map_err(|e| SyncError::Task {
                message: e.to_string(),
            })?
    }
}

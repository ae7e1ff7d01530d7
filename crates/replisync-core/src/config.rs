//! Sync configuration types.

use std::path::PathBuf;
use std::time::Duration;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::error::SyncError;

/// Default size of each block read while hashing file content.
pub const DEFAULT_HASH_BLOCK_SIZE: usize = 64 * 1024;

/// What the driver does when a reconciliation pass fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Stop the driver and return the error.
    #[default]
    Abort,
    /// Log the error and wait for the next cycle, which rescans everything.
    SkipCycle,
}

/// The pair of trees being kept in sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncTarget {
    /// Authoritative tree.
    pub source: PathBuf,
    /// Derived tree, made to mirror `source`.
    pub replica: PathBuf,
}

impl SyncTarget {
    /// Create a new sync target.
    pub fn new(source: impl Into<PathBuf>, replica: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            replica: replica.into(),
        }
    }

    /// Check that neither root is nested in the other.
    ///
    /// Lexical only: symlinks and `..` components are not resolved.
    pub fn check_disjoint(&self) -> Result<(), SyncError> {
        match self.overlap() {
            Some(message) => Err(SyncError::InvalidConfig { message }),
            None => Ok(()),
        }
    }

    fn overlap(&self) -> Option<String> {
        let relation = if self.replica.starts_with(&self.source) {
            "must not be inside or equal to"
        } else if self.source.starts_with(&self.replica) {
            "must not contain"
        } else {
            return None;
        };

        Some(format!(
            "Replica path {} {} source path {}",
            self.replica.display(),
            relation,
            self.source.display()
        ))
    }
}

/// Configuration for a sync run.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct SyncConfig {
    /// Source root.
    pub source: PathBuf,

    /// Replica root.
    pub replica: PathBuf,

    /// Pause between the end of one pass and the start of the next.
    pub interval: Duration,

    /// Block size used when hashing file content.
    #[builder(default = "DEFAULT_HASH_BLOCK_SIZE")]
    #[serde(default = "default_hash_block_size")]
    pub hash_block_size: usize,

    /// Behavior when a pass fails.
    #[builder(default)]
    #[serde(default)]
    pub error_policy: ErrorPolicy,
}

fn default_hash_block_size() -> usize {
    DEFAULT_HASH_BLOCK_SIZE
}

impl SyncConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        let source = match self.source {
            Some(ref source) if source.as_os_str().is_empty() => {
                return Err("Source path cannot be empty".to_string());
            }
            Some(ref source) => source,
            None => return Err("Source path is required".to_string()),
        };

        let replica = match self.replica {
            Some(ref replica) if replica.as_os_str().is_empty() => {
                return Err("Replica path cannot be empty".to_string());
            }
            Some(ref replica) => replica,
            None => return Err("Replica path is required".to_string()),
        };

        // Removing orphans would otherwise reach into the source tree.
        if let Some(message) = SyncTarget::new(source, replica).overlap() {
            return Err(message);
        }

        match self.interval {
            Some(interval) if interval.is_zero() => {
                return Err("Interval must be positive".to_string());
            }
            Some(_) => {}
            None => return Err("Interval is required".to_string()),
        }

        if self.hash_block_size == Some(0) {
            return Err("Hash block size must be positive".to_string());
        }

        Ok(())
    }
}

impl From<SyncConfigBuilderError> for SyncError {
    fn from(err: SyncConfigBuilderError) -> Self {
        let message = match err {
            SyncConfigBuilderError::UninitializedField(field) => format!("`{field}` must be set"),
            SyncConfigBuilderError::ValidationError(message) => message,
        };
        Self::InvalidConfig { message }
    }
}

impl SyncConfig {
    /// Create a new sync config builder.
    pub fn builder() -> SyncConfigBuilder {
        SyncConfigBuilder::default()
    }

    /// The source/replica pair this config synchronizes.
    pub fn target(&self) -> SyncTarget {
        SyncTarget::new(&self.source, &self.replica)
    }
}

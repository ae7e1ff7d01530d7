//! Source/replica file comparison.

use replisync_core::{DirectoryEntry, SyncError};

use crate::hash::ContentHasher;

/// Why two files were judged different.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Difference {
    Size,
    Modified,
    Content,
}

/// Outcome of comparing a source file with its replica counterpart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Equal,
    Different(Difference),
}

impl Comparison {
    /// Check if the files were judged equal.
    pub fn is_equal(&self) -> bool {
        matches!(self, Self::Equal)
    }
}

/// Decides whether a replica file still matches its source.
///
/// Checks run cheapest first and stop at the first mismatch: size, then
/// modification time, then content digest. Files whose metadata matches
/// are always hashed, so a content change that keeps size and mtime is
/// still caught.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntryComparator {
    hasher: ContentHasher,
}

impl EntryComparator {
    /// Create a comparator that hashes with `hasher`.
    pub fn new(hasher: ContentHasher) -> Self {
        Self { hasher }
    }

    /// Compare two regular files sharing a name.
    ///
    /// Hashing failures propagate; they are never treated as a difference.
    pub fn compare(
        &self,
        source: &DirectoryEntry,
        replica: &DirectoryEntry,
    ) -> Result<Comparison, SyncError> {
        if source.size != replica.size {
            return Ok(Comparison::Different(Difference::Size));
        }
        if source.modified != replica.modified {
            return Ok(Comparison::Different(Difference::Modified));
        }

        let source_hash = source.digest_with(|path| self.hasher.hash_file(path))?;
        let replica_hash = replica.digest_with(|path| self.hasher.hash_file(path))?;

        if source_hash == replica_hash {
            Ok(Comparison::Equal)
        } else {
            Ok(Comparison::Different(Difference::Content))
        }
    }
}

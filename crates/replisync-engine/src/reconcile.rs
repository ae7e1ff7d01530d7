//! One-way reconciliation of a replica tree against its source.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use jwalk::{Parallelism, WalkDir};
use tracing::debug;

use replisync_core::{DirectoryEntry, EntryKind, SyncAction, SyncError};

use crate::compare::{Comparison, EntryComparator};
use crate::copy::{copy_dir, copy_file, remove_entry};
use crate::hash::ContentHasher;
use crate::report::ActionReporter;

/// Makes a replica tree mirror a source tree, one directory level at a time.
///
/// Each call re-lists both trees from scratch; nothing is cached between
/// passes. Levels are processed from an explicit work stack, so deep trees
/// do not grow the call stack.
///
/// Per level, every source entry is classified by name against the replica
/// listing:
///
/// - missing in the replica: copied wholesale, one creation action for the
///   entry plus one per descendant of a new directory
/// - file on both sides: compared, and overwritten on any difference
/// - directory on both sides: queued for its own level
/// - file on one side and directory on the other: the replica entry is
///   removed, then the source entry is copied as new
///
/// Replica entries left unmatched are removed with one action each,
/// however large the removed subtree is.
///
/// The first filesystem error aborts the pass. A later pass starts over
/// and converges from whatever state the aborted one left behind.
pub struct TreeReconciler<R> {
    comparator: EntryComparator,
    reporter: R,
}

impl<R: ActionReporter> TreeReconciler<R> {
    /// Create a reconciler with the default hasher.
    pub fn new(reporter: R) -> Self {
        Self::with_hasher(ContentHasher::new(), reporter)
    }

    /// Create a reconciler that hashes with `hasher`.
    pub fn with_hasher(hasher: ContentHasher, reporter: R) -> Self {
        Self {
            comparator: EntryComparator::new(hasher),
            reporter,
        }
    }

    /// The sink actions are reported to.
    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    /// Reconcile `replica` against `source`, returning the actions taken.
    ///
    /// Fails with [`SyncError::SourceMissing`] before touching the replica
    /// if `source` does not exist.
    pub fn reconcile(&self, source: &Path, replica: &Path) -> Result<Vec<SyncAction>, SyncError> {
        match fs::metadata(source) {
            Ok(metadata) if metadata.is_dir() => {}
            Ok(_) => {
                return Err(SyncError::NotADirectory {
                    path: source.to_path_buf(),
                });
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(SyncError::SourceMissing {
                    path: source.to_path_buf(),
                });
            }
            Err(e) => return Err(SyncError::io(source, e)),
        }

        let mut actions = Vec::new();
        let mut pending: Vec<(PathBuf, PathBuf)> = vec![(source.to_path_buf(), replica.to_path_buf())];

        while let Some((source_dir, replica_dir)) = pending.pop() {
            self.reconcile_level(&source_dir, &replica_dir, &mut pending, &mut actions)?;
        }

        Ok(actions)
    }

    fn reconcile_level(
        &self,
        source_dir: &Path,
        replica_dir: &Path,
        pending: &mut Vec<(PathBuf, PathBuf)>,
        actions: &mut Vec<SyncAction>,
    ) -> Result<(), SyncError> {
        self.ensure_replica_dir(replica_dir)?;

        // Whatever is left here once all source entries are matched gets deleted.
        let mut orphans: BTreeMap<OsString, DirectoryEntry> = DirectoryEntry::list(replica_dir)?
            .into_iter()
            .map(|entry| (entry.name.clone(), entry))
            .collect();
        let mut subdirs = Vec::new();

        for entry in DirectoryEntry::list(source_dir)? {
            let target = replica_dir.join(&entry.name);
            let existing = orphans.remove(&entry.name);

            match (entry.kind, existing) {
                (EntryKind::Other, _) => {
                    debug!(path = %entry.path.display(), "Skipping special entry");
                }
                (_, None) => self.create(&entry, &target, actions)?,
                (EntryKind::File, Some(replica)) if replica.is_file() => {
                    if let Comparison::Different(reason) = self.comparator.compare(&entry, &replica)? {
                        debug!(path = %target.display(), ?reason, "Replica file is stale");
                        copy_file(&entry.path, &target)?;
                        self.emit(SyncAction::updated(target), actions);
                    }
                }
                (EntryKind::Directory, Some(replica)) if replica.is_dir() => {
                    subdirs.push((entry.path, target));
                }
                (_, Some(replica)) => {
                    debug!(path = %target.display(), "Entry changed type, replacing");
                    remove_entry(&replica.path, replica.kind)?;
                    self.emit(SyncAction::removed(replica.kind, replica.path), actions);
                    self.create(&entry, &target, actions)?;
                }
            }
        }

        for orphan in orphans.into_values() {
            remove_entry(&orphan.path, orphan.kind)?;
            self.emit(SyncAction::removed(orphan.kind, orphan.path), actions);
        }

        // Reversed so subdirectories pop off the stack in name order.
        pending.extend(subdirs.into_iter().rev());
        Ok(())
    }

    fn ensure_replica_dir(&self, replica_dir: &Path) -> Result<(), SyncError> {
        match fs::metadata(replica_dir) {
            Ok(metadata) if metadata.is_dir() => Ok(()),
            Ok(_) => Err(SyncError::NotADirectory {
                path: replica_dir.to_path_buf(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                self.reporter.replica_created(replica_dir);
                fs::create_dir_all(replica_dir).map_err(|e| SyncError::io(replica_dir, e))
            }
            Err(e) => Err(SyncError::io(replica_dir, e)),
        }
    }

    /// Copy a source entry that has no replica counterpart.
    fn create(
        &self,
        entry: &DirectoryEntry,
        target: &Path,
        actions: &mut Vec<SyncAction>,
    ) -> Result<(), SyncError> {
        match entry.kind {
            EntryKind::File => {
                copy_file(&entry.path, target)?;
                self.emit(SyncAction::created(EntryKind::File, target), actions);
            }
            EntryKind::Directory => {
                copy_dir(&entry.path, target)?;
                self.emit(SyncAction::created(EntryKind::Directory, target), actions);
                for descendant in created_descendants(target)? {
                    self.emit(descendant, actions);
                }
            }
            EntryKind::Other => {}
        }
        Ok(())
    }

    fn emit(&self, action: SyncAction, actions: &mut Vec<SyncAction>) {
        self.reporter.action(&action);
        actions.push(action);
    }
}

/// One creation action per entry below a freshly copied directory.
fn created_descendants(root: &Path) -> Result<Vec<SyncAction>, SyncError> {
    let walker = WalkDir::new(root)
        .parallelism(Parallelism::Serial)
        .skip_hidden(false)
        .follow_links(false)
        .sort(true)
        .min_depth(1);

    let mut actions = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|err| SyncError::Walk {
            path: err
                .path()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| root.to_path_buf()),
            message: err.to_string(),
        })?;

        let kind = if entry.file_type().is_dir() {
            EntryKind::Directory
        } else {
            EntryKind::File
        };
        actions.push(SyncAction::created(kind, entry.path()));
    }

    Ok(actions)
}

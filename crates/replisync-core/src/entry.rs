//! Directory entry types.

use std::cell::OnceCell;
use std::ffi::OsString;
use std::fs::{self, Metadata};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::error::SyncError;

/// BLAKE3 content hash used for file equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(pub [u8; 32]);

impl ContentHash {
    /// Create a new ContentHash from raw bytes.
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

/// Type of a listed entry, after following symbolic links.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryKind {
    /// Regular file.
    File,
    /// Directory.
    Directory,
    /// Anything else: sockets, devices, dangling links.
    Other,
}

impl EntryKind {
    /// Classify from (link-following) metadata.
    pub fn from_metadata(metadata: &Metadata) -> Self {
        if metadata.is_dir() {
            Self::Directory
        } else if metadata.is_file() {
            Self::File
        } else {
            Self::Other
        }
    }

    /// Check if this is a directory.
    pub fn is_dir(&self) -> bool {
        matches!(self, Self::Directory)
    }

    /// Check if this is a regular file.
    pub fn is_file(&self) -> bool {
        matches!(self, Self::File)
    }
}

/// A single named item in a directory listing.
///
/// Entries are snapshots taken when the parent is listed. The content
/// digest is computed at most once, on first request.
#[derive(Debug, Clone)]
pub struct DirectoryEntry {
    /// Name within the parent directory.
    pub name: OsString,
    /// Full path of the entry.
    pub path: PathBuf,
    /// Entry type.
    pub kind: EntryKind,
    /// Size in bytes (0 for anything but files).
    pub size: u64,
    /// Last modification time, if the platform reports one.
    pub modified: Option<SystemTime>,
    digest: OnceCell<ContentHash>,
}

impl DirectoryEntry {
    /// Stat `path` and build an entry named `name`.
    ///
    /// A path that disappears or dangles between listing and stat is
    /// reported as [`EntryKind::Other`] rather than as an error.
    pub fn from_path(name: OsString, path: PathBuf) -> Result<Self, SyncError> {
        match fs::metadata(&path) {
            Ok(metadata) => {
                let kind = EntryKind::from_metadata(&metadata);
                Ok(Self {
                    name,
                    path,
                    kind,
                    size: if kind.is_file() { metadata.len() } else { 0 },
                    modified: metadata.modified().ok(),
                    digest: OnceCell::new(),
                })
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self {
                name,
                path,
                kind: EntryKind::Other,
                size: 0,
                modified: None,
                digest: OnceCell::new(),
            }),
            Err(e) => Err(SyncError::io(path, e)),
        }
    }

    /// List the entries of `dir`, sorted by name.
    pub fn list(dir: &Path) -> Result<Vec<Self>, SyncError> {
        let mut entries = Vec::new();

        for entry in fs::read_dir(dir).map_err(|e| SyncError::io(dir, e))? {
            let entry = entry.map_err(|e| SyncError::io(dir, e))?;
            entries.push(Self::from_path(entry.file_name(), entry.path())?);
        }

        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    /// Return the content digest, computing it with `compute` on first use.
    pub fn digest_with<F>(&self, compute: F) -> Result<ContentHash, SyncError>
    where
        F: FnOnce(&Path) -> Result<ContentHash, SyncError>,
    {
        if let Some(hash) = self.digest.get() {
            return Ok(*hash);
        }
        let hash = compute(&self.path)?;
        Ok(*self.digest.get_or_init(|| hash))
    }

    /// Check if this entry is a directory.
    pub fn is_dir(&self) -> bool {
        self.kind.is_dir()
    }

    /// Check if this entry is a regular file.
    pub fn is_file(&self) -> bool {
        self.kind.is_file()
    }
}

//! Streaming BLAKE3 content hashing.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use blake3::Hasher;

use replisync_core::{ContentHash, DEFAULT_HASH_BLOCK_SIZE, SyncError};

/// Computes content digests by reading files in fixed-size blocks.
///
/// The digest depends only on the bytes read, never on the block size.
#[derive(Debug, Clone, Copy)]
pub struct ContentHasher {
    block_size: usize,
}

impl ContentHasher {
    /// Create a hasher with the default block size.
    pub fn new() -> Self {
        Self::with_block_size(DEFAULT_HASH_BLOCK_SIZE)
    }

    /// Create a hasher reading `block_size` bytes at a time (minimum 1).
    pub fn with_block_size(block_size: usize) -> Self {
        Self {
            block_size: block_size.max(1),
        }
    }

    /// Block size used for reads.
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Hash the full content of the file at `path`.
    pub fn hash_file(&self, path: &Path) -> Result<ContentHash, SyncError> {
        let mut file = File::open(path).map_err(|e| SyncError::io(path, e))?;
        self.hash_reader(&mut file).map_err(|e| SyncError::io(path, e))
    }

    /// Hash everything `reader` yields until EOF.
    pub fn hash_reader<R: Read>(&self, reader: &mut R) -> io::Result<ContentHash> {
        let mut hasher = Hasher::new();
        let mut buffer = vec![0u8; self.block_size];

        loop {
            let bytes_read = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            hasher.update(&buffer[..bytes_read]);
        }

        Ok(ContentHash::new(*hasher.finalize().as_bytes()))
    }
}

impl Default for ContentHasher {
    fn default() -> Self {
        Self::new()
    }
}

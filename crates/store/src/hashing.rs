use ledgerprep_core::{ContentHash, Error, Result};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

const CHUNK_SIZE: usize = 8192;

/// Content hash of an in-memory payload
pub fn compute_hash(bytes: &[u8]) -> ContentHash {
    let mut hasher = ContentHasher::new();
    hasher.update(bytes);
    hasher.finalize()
}

/// Content hash of a file, streamed in chunks
pub fn hash_file(path: &Path) -> Result<ContentHash> {
    let file = File::open(path).map_err(|e| Error::file_system(path, "open file for hashing", e))?;
    let mut reader = BufReader::with_capacity(CHUNK_SIZE, file);
    let mut hasher = ContentHasher::new();
    let mut buffer = [0u8; CHUNK_SIZE];

    loop {
        let bytes_read = reader
            .read(&mut buffer)
            .map_err(|e| Error::file_system(path, "read file chunk for hashing", e))?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hasher.finalize())
}

/// Incremental SHA-256 over a byte stream
#[derive(Debug, Clone, Default)]
pub struct ContentHasher {
    hasher: Sha256,
    bytes: u64,
}

impl ContentHasher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, chunk: &[u8]) {
        self.hasher.update(chunk);
        self.bytes += chunk.len() as u64;
    }

    /// Number of bytes hashed so far
    pub fn len(&self) -> u64 {
        self.bytes
    }

    pub fn is_empty(&self) -> bool {
        self.bytes == 0
    }

    pub fn finalize(self) -> ContentHash {
        ContentHash::from_digest(self.hasher.finalize().into())
    }
}

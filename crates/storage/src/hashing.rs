//! Pluggable checksums for uploads and content saves
//!
//! The algorithm is configuration, not code: call sites ask the
//! [`Hasher`] for a file or content hash and never depend on which digest
//! is behind it.

use crate::error::{Error, Result};
use pixstore_core::HashAlgorithm;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Computes file and content checksums with independently configured
/// algorithms.
#[derive(Debug, Clone, Copy)]
pub struct Hasher {
    file_algorithm: HashAlgorithm,
    content_algorithm: HashAlgorithm,
}

enum DigestState {
    Sha256(Sha256),
    Md5(md5::Context),
}

impl DigestState {
    fn new(algorithm: HashAlgorithm) -> Self {
        match algorithm {
            HashAlgorithm::Sha256 => Self::Sha256(Sha256::new()),
            HashAlgorithm::Md5 => Self::Md5(md5::Context::new()),
        }
    }

    fn update(&mut self, bytes: &[u8]) {
        match self {
            Self::Sha256(digest) => digest.update(bytes),
            Self::Md5(context) => context.consume(bytes),
        }
    }

    fn finish(self) -> String {
        match self {
            Self::Sha256(digest) => hex::encode(digest.finalize()),
            Self::Md5(context) => hex::encode(context.compute().0),
        }
    }
}

impl Hasher {
    /// Create a hasher with the configured algorithms.
    #[must_use]
    pub fn new(file_algorithm: HashAlgorithm, content_algorithm: HashAlgorithm) -> Self {
        Self {
            file_algorithm,
            content_algorithm,
        }
    }

    /// Hex digest of a file's contents, streamed in chunks.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when the file cannot be opened or read.
    pub fn file_hash(&self, path: &Path) -> Result<String> {
        let mut file = File::open(path).map_err(|e| Error::io(e, path, "open"))?;
        let mut state = DigestState::new(self.file_algorithm);
        let mut buffer = [0u8; 8192];
        loop {
            let read = file
                .read(&mut buffer)
                .map_err(|e| Error::io(e, path, "read"))?;
            if read == 0 {
                break;
            }
            state.update(&buffer[..read]);
        }
        Ok(state.finish())
    }

    /// Hex digest of in-memory content.
    #[must_use]
    pub fn content_hash(&self, bytes: &[u8]) -> String {
        let mut state = DigestState::new(self.content_algorithm);
        state.update(bytes);
        state.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn file_and_content_hashes_agree() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("data.bin");
        std::fs::write(&path, b"pixstore").unwrap();

        let hasher = Hasher::new(HashAlgorithm::Sha256, HashAlgorithm::Sha256);
        assert_eq!(hasher.file_hash(&path).unwrap(), hasher.content_hash(b"pixstore"));
    }

    #[test]
    fn sha256_matches_known_vector() {
        let hasher = Hasher::new(HashAlgorithm::Sha256, HashAlgorithm::Sha256);
        assert_eq!(
            hasher.content_hash(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn md5_matches_known_vector() {
        let hasher = Hasher::new(HashAlgorithm::Md5, HashAlgorithm::Md5);
        assert_eq!(hasher.content_hash(b"abc"), "900150983cd24fb0d6963f7d28e17f72");
    }

    #[test]
    fn algorithms_are_selected_independently() {
        let hasher = Hasher::new(HashAlgorithm::Md5, HashAlgorithm::Sha256);
        // 64 hex chars for sha256 content hashing, 32 for md5 file hashing.
        assert_eq!(hasher.content_hash(b"x").len(), 64);

        let temp = TempDir::new().unwrap();
        let path = temp.path().join("f");
        std::fs::write(&path, b"x").unwrap();
        assert_eq!(hasher.file_hash(&path).unwrap().len(), 32);
    }
}

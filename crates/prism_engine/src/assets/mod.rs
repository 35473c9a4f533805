//! # Asset Provider Boundary
//!
//! The rendering core never touches the filesystem directly; everything it
//! loads (shader sources, texture files) comes through the [`AssetSource`]
//! trait as whole-file byte reads against a logical path. The provider
//! resolves paths against a platform root directory and reports missing
//! files through [`AssetError`].
//!
//! Two implementations are provided: [`FileAssetSource`] for the common
//! on-disk case and [`MemoryAssetSource`] for tests and embedded resources.

pub mod image_loader;

use std::cell::Cell;
use std::collections::HashMap;
use std::path::PathBuf;

use thiserror::Error;

pub use image_loader::ImageData;

/// Errors produced by asset providers and decoders
#[derive(Debug, Error)]
pub enum AssetError {
    /// The logical path did not resolve to a readable asset
    #[error("Asset not found: {0}")]
    NotFound(String),

    /// The asset was found but reading it failed
    #[error("Failed to read asset {path}: {source}")]
    ReadFailed {
        /// Logical path of the asset
        path: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The asset bytes could not be decoded into the expected format
    #[error("Failed to decode asset: {0}")]
    DecodeFailed(String),
}

/// Synchronous asset provider contract
///
/// Every read returns the complete file contents; loading happens inline on
/// the calling thread, which is accepted behavior for this core (a cache
/// miss stalls the frame).
pub trait AssetSource {
    /// Read the complete contents of the asset at `path`
    fn read(&self, path: &str) -> Result<Vec<u8>, AssetError>;

    /// Whether an asset exists at `path`
    fn exists(&self, path: &str) -> bool;
}

/// Asset provider reading files from a root directory on disk
pub struct FileAssetSource {
    root: PathBuf,
}

impl FileAssetSource {
    /// Create a provider resolving logical paths against `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }
}

impl AssetSource for FileAssetSource {
    fn read(&self, path: &str) -> Result<Vec<u8>, AssetError> {
        let resolved = self.resolve(path);
        if !resolved.is_file() {
            return Err(AssetError::NotFound(path.to_string()));
        }
        std::fs::read(&resolved).map_err(|source| AssetError::ReadFailed {
            path: path.to_string(),
            source,
        })
    }

    fn exists(&self, path: &str) -> bool {
        self.resolve(path).is_file()
    }
}

/// In-memory asset provider
///
/// Used by tests and for resources embedded into the binary. Counts reads so
/// callers can observe that a cache loaded a key exactly once.
#[derive(Default)]
pub struct MemoryAssetSource {
    entries: HashMap<String, Vec<u8>>,
    reads: Cell<usize>,
}

impl MemoryAssetSource {
    /// Create an empty provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an asset under a logical path
    pub fn insert(&mut self, path: impl Into<String>, bytes: Vec<u8>) {
        self.entries.insert(path.into(), bytes);
    }

    /// Number of successful reads performed so far
    pub fn read_count(&self) -> usize {
        self.reads.get()
    }
}

impl AssetSource for MemoryAssetSource {
    fn read(&self, path: &str) -> Result<Vec<u8>, AssetError> {
        match self.entries.get(path) {
            Some(bytes) => {
                self.reads.set(self.reads.get() + 1);
                Ok(bytes.clone())
            }
            None => Err(AssetError::NotFound(path.to_string())),
        }
    }

    fn exists(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_source_counts_reads() {
        let mut source = MemoryAssetSource::new();
        source.insert("a.txt", b"hello".to_vec());

        assert_eq!(source.read_count(), 0);
        assert_eq!(source.read("a.txt").unwrap(), b"hello");
        assert_eq!(source.read("a.txt").unwrap(), b"hello");
        assert_eq!(source.read_count(), 2);
    }

    #[test]
    fn test_memory_source_missing_asset() {
        let source = MemoryAssetSource::new();
        assert!(!source.exists("nope.png"));
        assert!(matches!(
            source.read("nope.png"),
            Err(AssetError::NotFound(_))
        ));
    }
}

//! Pluggable storage backends for index files.
//!
//! An index is a flat namespace of named files. [`FileStorage`] maps it onto
//! a directory, [`MemoryStorage`] keeps everything in process memory (used
//! by tests and throwaway indexes). Both are reached through the
//! [`Storage`] trait so the engine never touches `std::fs` directly.

pub mod file;
pub mod memory;
pub mod structured;

use std::io::{Read, Write};
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::Result;

pub use file::{FileStorage, FileStorageConfig};
pub use memory::{MemoryStorage, MemoryStorageConfig};

/// A writable file handle.
pub trait StorageOutput: Write + Send + std::fmt::Debug {
    /// Flush buffered bytes and make them durable.
    fn flush_and_sync(&mut self) -> Result<()>;
}

/// A readable file handle.
pub trait StorageInput: Read + Send + std::fmt::Debug {
    /// Total size of the file in bytes.
    fn size(&self) -> Result<u64>;
}

/// A flat namespace of named files.
pub trait Storage: Send + Sync + std::fmt::Debug {
    /// Create (or truncate) a file for writing.
    fn create_output(&self, name: &str) -> Result<Box<dyn StorageOutput>>;

    /// Open an existing file for reading.
    fn open_input(&self, name: &str) -> Result<Box<dyn StorageInput>>;

    fn file_exists(&self, name: &str) -> bool;

    /// Atomically replace `to` with `from`.
    fn rename_file(&self, from: &str, to: &str) -> Result<()>;

    fn delete_file(&self, name: &str) -> Result<()>;

    fn list_files(&self) -> Result<Vec<String>>;

    /// Read a whole file into memory.
    fn read_all(&self, name: &str) -> Result<Vec<u8>> {
        let mut input = self.open_input(name)?;
        let mut buf = Vec::with_capacity(input.size()? as usize);
        input.read_to_end(&mut buf)?;
        Ok(buf)
    }
}

/// Storage backend selection.
#[derive(Debug, Clone)]
pub enum StorageConfig {
    File(FileStorageConfig),
    Memory(MemoryStorageConfig),
}

impl StorageConfig {
    /// Shorthand for a file storage rooted at `path`.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        StorageConfig::File(FileStorageConfig::new(path))
    }
}

/// Creates storage backends from a [`StorageConfig`].
pub struct StorageFactory;

impl StorageFactory {
    /// Create a storage, creating the backing location if it is missing.
    pub fn create(config: StorageConfig) -> Result<Arc<dyn Storage>> {
        match config {
            StorageConfig::File(config) => Ok(Arc::new(FileStorage::create(config)?)),
            StorageConfig::Memory(config) => Ok(Arc::new(MemoryStorage::new(config))),
        }
    }

    /// Open a storage whose backing location must already exist.
    pub fn open(config: StorageConfig) -> Result<Arc<dyn Storage>> {
        match config {
            StorageConfig::File(config) => Ok(Arc::new(FileStorage::open(config)?)),
            StorageConfig::Memory(config) => Ok(Arc::new(MemoryStorage::new(config))),
        }
    }
}

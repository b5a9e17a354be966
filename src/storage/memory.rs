//! In-memory storage.
//!
//! Clones of a [`MemoryStorage`] share the same files, so a writer and a
//! reader can be pointed at one in-memory index.

use std::collections::BTreeMap;
use std::io::{self, Cursor, Read, Write};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::Result;
use crate::storage::{Storage, StorageInput, StorageOutput};

#[derive(Debug, Clone, Default)]
pub struct MemoryStorageConfig {
    /// Fail every write with this error kind (for exercising error paths).
    pub fail_writes: Option<io::ErrorKind>,
    /// Fail every delete with this error kind.
    pub fail_deletes: Option<io::ErrorKind>,
}

type Files = Arc<RwLock<BTreeMap<String, Arc<Vec<u8>>>>>;

#[derive(Debug, Clone)]
pub struct MemoryStorage {
    files: Files,
    config: MemoryStorageConfig,
}

impl MemoryStorage {
    pub fn new(config: MemoryStorageConfig) -> Self {
        Self {
            files: Arc::new(RwLock::new(BTreeMap::new())),
            config,
        }
    }

    fn not_found(name: &str) -> io::Error {
        io::Error::new(io::ErrorKind::NotFound, format!("no such file: {name}"))
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new(MemoryStorageConfig::default())
    }
}

impl Storage for MemoryStorage {
    fn create_output(&self, name: &str) -> Result<Box<dyn StorageOutput>> {
        if let Some(kind) = self.config.fail_writes {
            return Err(io::Error::new(kind, format!("write to {name} refused")).into());
        }
        self.files
            .write()
            .insert(name.to_string(), Arc::new(Vec::new()));
        Ok(Box::new(MemoryOutput {
            name: name.to_string(),
            buffer: Vec::new(),
            files: Arc::clone(&self.files),
        }))
    }

    fn open_input(&self, name: &str) -> Result<Box<dyn StorageInput>> {
        let data = self
            .files
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| Self::not_found(name))?;
        Ok(Box::new(MemoryInput {
            cursor: Cursor::new(data),
        }))
    }

    fn file_exists(&self, name: &str) -> bool {
        self.files.read().contains_key(name)
    }

    fn rename_file(&self, from: &str, to: &str) -> Result<()> {
        let mut files = self.files.write();
        let data = files.remove(from).ok_or_else(|| Self::not_found(from))?;
        files.insert(to.to_string(), data);
        Ok(())
    }

    fn delete_file(&self, name: &str) -> Result<()> {
        if let Some(kind) = self.config.fail_deletes {
            return Err(io::Error::new(kind, format!("delete of {name} refused")).into());
        }
        self.files.write().remove(name);
        Ok(())
    }

    fn list_files(&self) -> Result<Vec<String>> {
        Ok(self.files.read().keys().cloned().collect())
    }
}

#[derive(Debug)]
struct MemoryOutput {
    name: String,
    buffer: Vec<u8>,
    files: Files,
}

impl MemoryOutput {
    fn publish(&self) {
        self.files
            .write()
            .insert(self.name.clone(), Arc::new(self.buffer.clone()));
    }
}

impl Write for MemoryOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.publish();
        Ok(())
    }
}

impl StorageOutput for MemoryOutput {
    fn flush_and_sync(&mut self) -> Result<()> {
        self.publish();
        Ok(())
    }
}

impl Drop for MemoryOutput {
    fn drop(&mut self) {
        self.publish();
    }
}

#[derive(Debug)]
struct MemoryInput {
    cursor: Cursor<Arc<Vec<u8>>>,
}

impl Read for MemoryInput {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let pos = self.cursor.position() as usize;
        let data = self.cursor.get_ref();
        let remaining = data.len().saturating_sub(pos);
        let n = remaining.min(buf.len());
        buf[..n].copy_from_slice(&data[pos..pos + n]);
        self.cursor.set_position((pos + n) as u64);
        Ok(n)
    }
}

impl StorageInput for MemoryInput {
    fn size(&self) -> Result<u64> {
        Ok(self.cursor.get_ref().len() as u64)
    }
}

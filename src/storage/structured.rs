//! Little-endian length-prefixed record encoding on top of storage handles.

use std::io::{Read, Write};

use crate::error::{FolioError, Result};
use crate::storage::{StorageInput, StorageOutput};

/// Writes fixed-width integers and length-prefixed byte strings.
#[derive(Debug)]
pub struct StructWriter {
    output: Box<dyn StorageOutput>,
}

impl StructWriter {
    pub fn new(output: Box<dyn StorageOutput>) -> Self {
        Self { output }
    }

    pub fn write_u32(&mut self, value: u32) -> Result<()> {
        self.output.write_all(&value.to_le_bytes())?;
        Ok(())
    }

    pub fn write_u64(&mut self, value: u64) -> Result<()> {
        self.output.write_all(&value.to_le_bytes())?;
        Ok(())
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        let len: u32 = bytes.len().try_into().map_err(|_| {
            FolioError::invalid_argument(format!("record of {} bytes is too large", bytes.len()))
        })?;
        self.write_u32(len)?;
        self.output.write_all(bytes)?;
        Ok(())
    }

    /// Flush, sync and release the handle.
    pub fn close(mut self) -> Result<()> {
        self.output.flush_and_sync()
    }
}

/// Reads what [`StructWriter`] wrote.
#[derive(Debug)]
pub struct StructReader {
    input: Box<dyn StorageInput>,
    remaining: u64,
}

impl StructReader {
    pub fn new(input: Box<dyn StorageInput>) -> Result<Self> {
        let remaining = input.size()?;
        Ok(Self { input, remaining })
    }

    pub fn is_eof(&self) -> bool {
        self.remaining == 0
    }

    fn take(&mut self, n: u64) -> Result<()> {
        if n > self.remaining {
            return Err(FolioError::storage("unexpected end of record file"));
        }
        self.remaining -= n;
        Ok(())
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        self.take(4)?;
        let mut buf = [0u8; 4];
        self.input.read_exact(&mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        self.take(8)?;
        let mut buf = [0u8; 8];
        self.input.read_exact(&mut buf)?;
        Ok(u64::from_le_bytes(buf))
    }

    pub fn read_bytes(&mut self) -> Result<Vec<u8>> {
        let len = self.read_u32()? as u64;
        self.take(len)?;
        let mut buf = vec![0u8; len as usize];
        self.input.read_exact(&mut buf)?;
        Ok(buf)
    }
}

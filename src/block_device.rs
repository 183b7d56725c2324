//! Block I/O: absolute sector read/write against a single seekable image file.
//!
//! No caching — every call hits the underlying handle directly, which is
//! acceptable because the image is small (20 MiB) and the shell is
//! interactive. This mirrors the host-backed `BlockFile` device this crate's
//! engine is grounded on, but drops the `Arc<RwLock<File>>` sharing that
//! device used: a `Session` (see `session.rs`) owns its image file
//! exclusively for the session's lifetime, so no internal locking is needed.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};

use crate::error::{Fat32Error, Result};
use crate::geometry::SECTOR_SIZE;

/// A single absolute-sector read/write surface over a disk image file.
pub struct BlockDevice {
    file: File,
}

impl BlockDevice {
    pub fn new(file: File) -> Self {
        Self { file }
    }

    pub fn into_inner(self) -> File {
        self.file
    }

    pub fn file(&self) -> &File {
        &self.file
    }

    /// Read exactly one 512-byte sector into `buf`.
    pub fn read_sector(&mut self, sector: u32, buf: &mut [u8; SECTOR_SIZE]) -> Result<()> {
        self.file.seek(SeekFrom::Start(sector_offset(sector)))?;
        self.file.read_exact(buf).map_err(|_| {
            Fat32Error::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "short sector read",
            ))
        })
    }

    /// Write exactly one 512-byte sector, flushing the handle afterwards so
    /// the underlying file's state stays observable between calls.
    pub fn write_sector(&mut self, sector: u32, buf: &[u8; SECTOR_SIZE]) -> Result<()> {
        self.file.seek(SeekFrom::Start(sector_offset(sector)))?;
        self.file.write_all(buf).map_err(|_| {
            Fat32Error::Io(std::io::Error::new(
                std::io::ErrorKind::WriteZero,
                "short sector write",
            ))
        })?;
        self.file.flush()?;
        Ok(())
    }
}

fn sector_offset(sector: u32) -> u64 {
    sector as u64 * SECTOR_SIZE as u64
}

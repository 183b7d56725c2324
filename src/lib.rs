//! A small FAT32 engine: boot sector, FAT table, cluster I/O, and 8.3
//! directory entries over a single file-backed disk image.
//!
//! File content read/write, long filenames, and multi-level path resolution
//! are out of scope — see `fs::Session` for the operations this engine
//! actually supports (`format`, `mkdir`, `touch`, `cd`, `ls`).

pub mod block_device;
pub mod bpb;
pub mod cluster;
pub mod dir;
pub mod entry;
pub mod error;
pub mod fat;
pub mod fs;
pub mod geometry;
pub mod session;

pub use error::{Fat32Error, Result};
pub use session::Session;

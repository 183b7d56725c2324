//! Crate-level error type.
//!
//! Every public operation in this crate returns `Result<T, Fat32Error>`. Each
//! variant corresponds to one of the Error Kinds of the on-disk engine; the
//! shell maps each variant to one of its fixed short strings (see
//! `bin/shell.rs`).

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Fat32Error {
    /// Seek, read, or short transfer at the block layer.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Boot sector signature or `fs_type` mismatch.
    #[error("invalid FAT32 image")]
    InvalidImage,

    /// No free FAT entry, or no free directory slot.
    #[error("out of space")]
    OutOfSpace,

    /// Collision during `mkdir`/`touch`.
    #[error("name already exists")]
    NameExists,

    /// `cd` target missing.
    #[error("not found")]
    NotFound,

    /// `cd` was given a path with more than one component.
    #[error("unsupported path")]
    Unsupported,

    /// Empty/null name, or a non-absolute path where one is required.
    #[error("bad argument")]
    BadArgument,
}

pub type Result<T> = std::result::Result<T, Fat32Error>;

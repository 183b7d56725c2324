//! Session state: the image file handle, cached geometry, and the
//! current-working-directory cursor.
//!
//! An owned value exposing methods — no globals, no lazy-static, no
//! internal locking. One `Session` has exclusive use of its image file for
//! the lifetime of the process.

use std::fs::OpenOptions;

use crate::block_device::BlockDevice;
use crate::error::{Fat32Error, Result};
use crate::geometry::{Geometry, IMAGE_SIZE, ROOT_CLUSTER};

pub struct Session {
    pub(crate) device: BlockDevice,
    pub(crate) geometry: Geometry,
    pub(crate) valid: bool,
    pub image_path: String,
    pub current_path: String,
    pub current_cluster: u32,
}

impl Session {
    /// Open (creating if necessary) the image at `path`, sizing it to
    /// exactly 20 MiB, and probe it for an existing valid FAT32 layout.
    pub fn open(path: &str) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path)?;
        file.set_len(IMAGE_SIZE)?;

        let mut session = Self {
            device: BlockDevice::new(file),
            geometry: Geometry::default_for_format(),
            valid: false,
            image_path: path.to_string(),
            current_path: "/".to_string(),
            current_cluster: ROOT_CLUSTER,
        };
        session.refresh_validity()?;
        Ok(session)
    }

    /// Re-derive validity and geometry from the boot sector. Never fails on
    /// an unformatted image — it simply reports invalid.
    pub fn refresh_validity(&mut self) -> Result<bool> {
        match crate::bpb::read_and_validate(&mut self.device) {
            Ok(geometry) => {
                self.geometry = geometry;
                self.valid = true;
                Ok(true)
            }
            Err(Fat32Error::InvalidImage) => {
                self.valid = false;
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub(crate) fn ensure_valid(&self) -> Result<()> {
        if self.valid {
            Ok(())
        } else {
            Err(Fat32Error::InvalidImage)
        }
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// Direct access to the underlying block device, for tests that need to
    /// inspect on-disk state (e.g. comparing both FAT copies) beyond what
    /// the filesystem operations expose.
    pub fn device_mut(&mut self) -> &mut BlockDevice {
        &mut self.device
    }
}

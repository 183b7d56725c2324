//! The File Allocation Table: 32-bit entries (28 significant bits), mirrored
//! across `fat_count` identical copies. Given any valid cluster number `c`:
//!
//! ```text
//! FATOffset = c * 4
//! ThisFATSecNum = fat_start + (FATOffset / bytes_per_sector)
//! ThisFATEntOffset = FATOffset % bytes_per_sector
//! ```
//!
//! Entries 0 and 1 are reserved and never allocatable. FAT[0] holds the
//! media-type placeholder, FAT[1] is unused here (no dirty-volume bits are
//! tracked by this core).
//!
//! Mirroring is mandatory on every write: the engine this module is
//! grounded on wrote only the first FAT copy, which violates the invariant
//! that both copies stay byte-equal. This implementation writes every copy
//! inside `write_entry` instead of leaving mirroring to a caller.

use log::debug;

use crate::block_device::BlockDevice;
use crate::error::{Fat32Error, Result};
use crate::geometry::{Geometry, FAT_ENTRY_MASK, SECTOR_SIZE};

fn entry_location(geometry: &Geometry, fat_copy: u32, c: u32) -> (u32, usize) {
    let fat_offset = c as usize * 4;
    let sector_in_fat = fat_offset / SECTOR_SIZE;
    let offset_in_sector = fat_offset % SECTOR_SIZE;
    let fat_base = geometry.fat_start() + fat_copy * geometry.fat_size_sectors;
    (fat_base + sector_in_fat as u32, offset_in_sector)
}

/// Read FAT entry `c` (copy 0). Out-of-range clusters read back as EOC.
pub fn read_entry(device: &mut BlockDevice, geometry: &Geometry, c: u32) -> Result<u32> {
    if c >= geometry.total_clusters() {
        return Ok(crate::geometry::END_OF_CHAIN);
    }
    let (sector, offset) = entry_location(geometry, 0, c);
    let mut buf = [0u8; SECTOR_SIZE];
    device.read_sector(sector, &mut buf)?;
    let raw = u32::from_le_bytes(buf[offset..offset + 4].try_into().unwrap());
    Ok(raw & FAT_ENTRY_MASK)
}

/// Write FAT entry `c <- value` into every FAT copy, preserving each copy's
/// reserved high 4 bits.
pub fn write_entry(device: &mut BlockDevice, geometry: &Geometry, c: u32, value: u32) -> Result<()> {
    if c >= geometry.total_clusters() {
        return Err(Fat32Error::BadArgument);
    }
    let masked = value & FAT_ENTRY_MASK;
    for fat_copy in 0..geometry.fat_count as u32 {
        let (sector, offset) = entry_location(geometry, fat_copy, c);
        let mut buf = [0u8; SECTOR_SIZE];
        device.read_sector(sector, &mut buf)?;
        let existing = u32::from_le_bytes(buf[offset..offset + 4].try_into().unwrap());
        let preserved_high = existing & !FAT_ENTRY_MASK;
        buf[offset..offset + 4].copy_from_slice(&(masked | preserved_high).to_le_bytes());
        device.write_sector(sector, &buf)?;
    }
    Ok(())
}

/// Linear scan from cluster 2 upward for the first entry reading 0.
/// Returns 0 (the "none" sentinel) if the table is full.
pub fn find_first_free(device: &mut BlockDevice, geometry: &Geometry) -> Result<u32> {
    for c in geometry.root_cluster..geometry.total_clusters() {
        if read_entry(device, geometry, c)? == crate::geometry::FREE_CLUSTER {
            debug!("fat: found free cluster {c}");
            return Ok(c);
        }
    }
    debug!("fat: no free cluster found among {} clusters", geometry.total_clusters());
    Ok(0)
}

/// Read FAT entry `c` from a specific FAT copy. Used to verify invariant 2
/// (both copies byte-equal after every write) without assuming copy 0 is
/// the only one ever inspected.
pub fn read_entry_copy(device: &mut BlockDevice, geometry: &Geometry, fat_copy: u32, c: u32) -> Result<u32> {
    let (sector, offset) = entry_location(geometry, fat_copy, c);
    let mut buf = [0u8; SECTOR_SIZE];
    device.read_sector(sector, &mut buf)?;
    Ok(u32::from_le_bytes(buf[offset..offset + 4].try_into().unwrap()) & FAT_ENTRY_MASK)
}

//! BIOS Parameter Block and boot sector.
//!
//! Sector 0 of the image holds the boot sector: a 3-byte jump, an 8-byte OEM
//! name, the BPB fields proper, an 11-byte volume label, an 8-byte
//! `fs_type` string, and the `0xAA55` boot signature at offset 510.
//!
//! Unlike the `#[repr(packed)]` overlay this module is grounded on — sound
//! there only because the reference target happens to be little-endian —
//! `BiosParameterBlock` is a plain struct. `to_bytes`/`from_bytes` serialize
//! every multi-byte field explicitly with `to_le_bytes`/`from_le_bytes`, so
//! the on-disk layout is correct regardless of host endianness.

use crate::block_device::BlockDevice;
use crate::error::{Fat32Error, Result};
use crate::geometry::{Geometry, BOOT_SIGNATURE, SECTOR_SIZE};

const OEM_NAME: &[u8; 8] = b"FAT32EMU";
const VOLUME_LABEL: &[u8; 11] = b"NO NAME    ";
const FS_TYPE: &[u8; 8] = b"FAT32   ";

const OFF_JMP_BOOT: usize = 0x00;
const OFF_OEM_NAME: usize = 0x03;
const OFF_BYTES_PER_SECTOR: usize = 0x0B;
const OFF_SECTORS_PER_CLUSTER: usize = 0x0D;
const OFF_RESERVED_SECTORS: usize = 0x0E;
const OFF_FAT_COUNT: usize = 0x10;
const OFF_TOTAL_SECTORS_32: usize = 0x20;
const OFF_FAT_SIZE_32: usize = 0x24;
const OFF_ROOT_CLUSTER: usize = 0x2C;
const OFF_FS_INFO: usize = 0x30;
const OFF_BACKUP_BOOT: usize = 0x32;
const OFF_VOLUME_LABEL: usize = 0x47;
const OFF_FS_TYPE: usize = 0x52;
const OFF_SIGNATURE: usize = 0x1FE;

/// In-memory view of the fields of the boot sector this engine reads and
/// writes. Fields outside §3's list (drive number, volume id, ...) are
/// written as zero and are not modeled here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BiosParameterBlock {
    pub bytes_per_sector: u16,
    pub sectors_per_cluster: u8,
    pub reserved_sectors: u16,
    pub fat_count: u8,
    pub total_sectors_32: u32,
    pub fat_size_32: u32,
    pub root_cluster: u32,
    pub fs_info: u16,
    pub backup_boot: u16,
}

impl BiosParameterBlock {
    /// The fixed geometry from §3, used by `format`.
    pub fn for_format() -> Self {
        let g = Geometry::default_for_format();
        Self {
            bytes_per_sector: g.bytes_per_sector,
            sectors_per_cluster: g.sectors_per_cluster,
            reserved_sectors: g.reserved_sectors,
            fat_count: g.fat_count,
            total_sectors_32: g.total_sectors,
            fat_size_32: g.fat_size_sectors,
            root_cluster: g.root_cluster,
            fs_info: crate::geometry::FS_INFO_SECTOR,
            backup_boot: crate::geometry::BACKUP_BOOT_SECTOR,
        }
    }

    pub fn geometry(&self) -> Geometry {
        Geometry {
            bytes_per_sector: self.bytes_per_sector,
            sectors_per_cluster: self.sectors_per_cluster,
            reserved_sectors: self.reserved_sectors,
            fat_count: self.fat_count,
            total_sectors: self.total_sectors_32,
            fat_size_sectors: self.fat_size_32,
            root_cluster: self.root_cluster,
        }
    }

    pub fn to_bytes(&self) -> [u8; SECTOR_SIZE] {
        let mut buf = [0u8; SECTOR_SIZE];
        buf[OFF_JMP_BOOT..OFF_JMP_BOOT + 3].copy_from_slice(&[0xEB, 0x00, 0x90]);
        buf[OFF_OEM_NAME..OFF_OEM_NAME + 8].copy_from_slice(OEM_NAME);
        buf[OFF_BYTES_PER_SECTOR..OFF_BYTES_PER_SECTOR + 2]
            .copy_from_slice(&self.bytes_per_sector.to_le_bytes());
        buf[OFF_SECTORS_PER_CLUSTER] = self.sectors_per_cluster;
        buf[OFF_RESERVED_SECTORS..OFF_RESERVED_SECTORS + 2]
            .copy_from_slice(&self.reserved_sectors.to_le_bytes());
        buf[OFF_FAT_COUNT] = self.fat_count;
        buf[OFF_TOTAL_SECTORS_32..OFF_TOTAL_SECTORS_32 + 4]
            .copy_from_slice(&self.total_sectors_32.to_le_bytes());
        buf[OFF_FAT_SIZE_32..OFF_FAT_SIZE_32 + 4].copy_from_slice(&self.fat_size_32.to_le_bytes());
        buf[OFF_ROOT_CLUSTER..OFF_ROOT_CLUSTER + 4].copy_from_slice(&self.root_cluster.to_le_bytes());
        buf[OFF_FS_INFO..OFF_FS_INFO + 2].copy_from_slice(&self.fs_info.to_le_bytes());
        buf[OFF_BACKUP_BOOT..OFF_BACKUP_BOOT + 2].copy_from_slice(&self.backup_boot.to_le_bytes());
        buf[OFF_VOLUME_LABEL..OFF_VOLUME_LABEL + 11].copy_from_slice(VOLUME_LABEL);
        buf[OFF_FS_TYPE..OFF_FS_TYPE + 8].copy_from_slice(FS_TYPE);
        buf[OFF_SIGNATURE..OFF_SIGNATURE + 2].copy_from_slice(&BOOT_SIGNATURE.to_le_bytes());
        buf
    }

    pub fn from_bytes(buf: &[u8; SECTOR_SIZE]) -> Self {
        Self {
            bytes_per_sector: u16::from_le_bytes(
                buf[OFF_BYTES_PER_SECTOR..OFF_BYTES_PER_SECTOR + 2].try_into().unwrap(),
            ),
            sectors_per_cluster: buf[OFF_SECTORS_PER_CLUSTER],
            reserved_sectors: u16::from_le_bytes(
                buf[OFF_RESERVED_SECTORS..OFF_RESERVED_SECTORS + 2].try_into().unwrap(),
            ),
            fat_count: buf[OFF_FAT_COUNT],
            total_sectors_32: u32::from_le_bytes(
                buf[OFF_TOTAL_SECTORS_32..OFF_TOTAL_SECTORS_32 + 4].try_into().unwrap(),
            ),
            fat_size_32: u32::from_le_bytes(
                buf[OFF_FAT_SIZE_32..OFF_FAT_SIZE_32 + 4].try_into().unwrap(),
            ),
            root_cluster: u32::from_le_bytes(
                buf[OFF_ROOT_CLUSTER..OFF_ROOT_CLUSTER + 4].try_into().unwrap(),
            ),
            fs_info: u16::from_le_bytes(buf[OFF_FS_INFO..OFF_FS_INFO + 2].try_into().unwrap()),
            backup_boot: u16::from_le_bytes(
                buf[OFF_BACKUP_BOOT..OFF_BACKUP_BOOT + 2].try_into().unwrap(),
            ),
        }
    }

    fn signature_valid(buf: &[u8; SECTOR_SIZE]) -> bool {
        u16::from_le_bytes(buf[OFF_SIGNATURE..OFF_SIGNATURE + 2].try_into().unwrap()) == BOOT_SIGNATURE
    }

    fn fs_type_valid(buf: &[u8; SECTOR_SIZE]) -> bool {
        buf[OFF_FS_TYPE..OFF_FS_TYPE + 5] == *b"FAT32"
    }
}

/// Write the fixed-geometry boot sector (§3) to sector 0.
pub fn write_boot_sector(device: &mut BlockDevice) -> Result<()> {
    let bpb = BiosParameterBlock::for_format();
    device.write_sector(0, &bpb.to_bytes())
}

/// Read sector 0 and, iff the signature and `fs_type` are valid, return the
/// geometry it describes. This is the sole source of truth for a running
/// session's geometry — never the compiled-in constants.
pub fn read_and_validate(device: &mut BlockDevice) -> Result<Geometry> {
    let mut buf = [0u8; SECTOR_SIZE];
    device.read_sector(0, &mut buf)?;
    if !BiosParameterBlock::signature_valid(&buf) || !BiosParameterBlock::fs_type_valid(&buf) {
        return Err(Fat32Error::InvalidImage);
    }
    Ok(BiosParameterBlock::from_bytes(&buf).geometry())
}

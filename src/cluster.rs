//! Cluster I/O: translate cluster numbers to sector ranges and transfer
//! whole clusters atomically (one `BlockDevice` call per sector, no partial
//! writes).

use crate::block_device::BlockDevice;
use crate::error::{Fat32Error, Result};
use crate::geometry::{Geometry, CLUSTER_SIZE, SECTOR_SIZE};

/// Read the whole cluster `c` into `buf`. Rejects `c < 2`.
pub fn read_cluster(
    device: &mut BlockDevice,
    geometry: &Geometry,
    c: u32,
    buf: &mut [u8; CLUSTER_SIZE],
) -> Result<()> {
    if c < geometry.root_cluster {
        return Err(Fat32Error::BadArgument);
    }
    let first_sector = geometry.sector_of_cluster(c);
    for i in 0..geometry.sectors_per_cluster as u32 {
        let chunk: &mut [u8; SECTOR_SIZE] = (&mut buf[(i as usize) * SECTOR_SIZE..][..SECTOR_SIZE])
            .try_into()
            .unwrap();
        device.read_sector(first_sector + i, chunk)?;
    }
    Ok(())
}

/// Write the whole cluster `c` from `buf`. Rejects `c < 2`.
pub fn write_cluster(
    device: &mut BlockDevice,
    geometry: &Geometry,
    c: u32,
    buf: &[u8; CLUSTER_SIZE],
) -> Result<()> {
    if c < geometry.root_cluster {
        return Err(Fat32Error::BadArgument);
    }
    let first_sector = geometry.sector_of_cluster(c);
    for i in 0..geometry.sectors_per_cluster as u32 {
        let chunk: &[u8; SECTOR_SIZE] = (&buf[(i as usize) * SECTOR_SIZE..][..SECTOR_SIZE])
            .try_into()
            .unwrap();
        device.write_sector(first_sector + i, chunk)?;
    }
    Ok(())
}

/// Zero an entire cluster in one call.
pub fn zero_cluster(device: &mut BlockDevice, geometry: &Geometry, c: u32) -> Result<()> {
    let zeros = [0u8; CLUSTER_SIZE];
    write_cluster(device, geometry, c, &zeros)
}

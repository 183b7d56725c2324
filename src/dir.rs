//! Directory cluster scanning and slot allocation.
//!
//! A directory in this core occupies a single cluster — no chain extension —
//! and holds at most `ENTRIES_PER_CLUSTER` (128) 32-byte entries.

use crate::cluster;
use crate::block_device::BlockDevice;
use crate::entry::DirEntry;
use crate::error::{Fat32Error, Result};
use crate::geometry::{Geometry, CLUSTER_SIZE, DIRENT_SIZE, ENTRIES_PER_CLUSTER};

/// Read directory cluster `c` and decode it into up to `ENTRIES_PER_CLUSTER`
/// entries, in on-disk order including free/deleted/end-marker slots.
pub fn read_entries(
    device: &mut BlockDevice,
    geometry: &Geometry,
    c: u32,
) -> Result<[DirEntry; ENTRIES_PER_CLUSTER]> {
    let mut buf = [0u8; CLUSTER_SIZE];
    cluster::read_cluster(device, geometry, c, &mut buf)?;
    let mut entries = [DirEntry::end_marker(); ENTRIES_PER_CLUSTER];
    for (i, entry) in entries.iter_mut().enumerate() {
        let raw: [u8; DIRENT_SIZE] = buf[i * DIRENT_SIZE..(i + 1) * DIRENT_SIZE].try_into().unwrap();
        *entry = DirEntry::from_bytes(&raw);
    }
    Ok(entries)
}

/// Write one entry back into slot `index` of directory cluster `c`, leaving
/// the rest of the cluster untouched.
pub fn write_entry_at(
    device: &mut BlockDevice,
    geometry: &Geometry,
    c: u32,
    index: usize,
    entry: &DirEntry,
) -> Result<()> {
    let mut buf = [0u8; CLUSTER_SIZE];
    cluster::read_cluster(device, geometry, c, &mut buf)?;
    buf[index * DIRENT_SIZE..(index + 1) * DIRENT_SIZE].copy_from_slice(&entry.to_bytes());
    cluster::write_cluster(device, geometry, c, &buf)
}

/// Live (non-free, non-end-marker) entries in on-disk order, stopping at the
/// first end-of-directory marker.
pub fn live_entries(entries: &[DirEntry; ENTRIES_PER_CLUSTER]) -> Vec<DirEntry> {
    let mut out = Vec::new();
    for entry in entries.iter() {
        if entry.is_end_marker() {
            break;
        }
        if entry.name[0] == crate::geometry::DIR_ENTRY_DELETED {
            continue;
        }
        out.push(*entry);
    }
    out
}

/// Find a live entry whose normalized name matches `name` exactly.
pub fn find_by_name(entries: &[DirEntry; ENTRIES_PER_CLUSTER], name: &[u8; 11]) -> Option<DirEntry> {
    live_entries(entries).into_iter().find(|e| &e.name == name)
}

/// Index of the first free (`0x00` or `0xE5`) slot, scanning the whole
/// cluster (not stopping at an end marker — a deleted slot may sit before
/// the current end marker).
pub fn find_free_slot(entries: &[DirEntry; ENTRIES_PER_CLUSTER]) -> Result<usize> {
    entries
        .iter()
        .position(|e| e.is_free())
        .ok_or(Fat32Error::OutOfSpace)
}

/// `true` if a live entry already carries this normalized name (invariant 3).
pub fn name_collides(entries: &[DirEntry; ENTRIES_PER_CLUSTER], name: &[u8; 11]) -> bool {
    find_by_name(entries, name).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::format_name;
    use crate::geometry::{ATTR_DIRECTORY, Geometry};
    use std::fs::OpenOptions;

    fn scratch() -> (BlockDevice, Geometry, tempfile::NamedTempFile) {
        let geometry = Geometry::default_for_format();
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let file = OpenOptions::new().read(true).write(true).open(tmp.path()).unwrap();
        file.set_len(crate::geometry::IMAGE_SIZE).unwrap();
        (BlockDevice::new(file), geometry, tmp)
    }

    #[test]
    fn empty_cluster_has_only_end_marker() {
        let (mut dev, geometry, _tmp) = scratch();
        cluster::zero_cluster(&mut dev, &geometry, 2).unwrap();
        let entries = read_entries(&mut dev, &geometry, 2).unwrap();
        assert!(live_entries(&entries).is_empty());
        assert_eq!(find_free_slot(&entries).unwrap(), 0);
    }

    #[test]
    fn write_then_find_round_trips_and_detects_collision() {
        let (mut dev, geometry, _tmp) = scratch();
        cluster::zero_cluster(&mut dev, &geometry, 2).unwrap();
        let name = format_name("ttt");
        let entry = DirEntry { name, attr: ATTR_DIRECTORY, cluster: 3, file_size: 0 };
        write_entry_at(&mut dev, &geometry, 2, 0, &entry).unwrap();

        let entries = read_entries(&mut dev, &geometry, 2).unwrap();
        assert_eq!(find_by_name(&entries, &name), Some(entry));
        assert!(name_collides(&entries, &name));
        assert_eq!(find_free_slot(&entries).unwrap(), 1);
    }

    #[test]
    fn deleted_slot_before_end_marker_is_found_free() {
        let (mut dev, geometry, _tmp) = scratch();
        cluster::zero_cluster(&mut dev, &geometry, 2).unwrap();
        let mut deleted = DirEntry { name: format_name("old"), attr: 0, cluster: 0, file_size: 0 };
        deleted.name[0] = crate::geometry::DIR_ENTRY_DELETED;
        write_entry_at(&mut dev, &geometry, 2, 0, &deleted).unwrap();
        let live = DirEntry { name: format_name("new"), attr: 0, cluster: 0, file_size: 0 };
        write_entry_at(&mut dev, &geometry, 2, 1, &live).unwrap();

        let entries = read_entries(&mut dev, &geometry, 2).unwrap();
        assert_eq!(find_free_slot(&entries).unwrap(), 0);
        assert_eq!(live_entries(&entries), vec![live]);
    }
}

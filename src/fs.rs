//! Filesystem operations: `format`, `mkdir`, `touch`, `cd`, `ls`, layered on
//! top of cluster I/O, the FAT table, and the directory module, all
//! operating against a single current-directory cursor held in `Session`.
//!
//! Every operation besides `format` first checks `Session::ensure_valid` —
//! `format` is the sole exception, since it is what creates validity.

use log::debug;

use crate::dir;
use crate::entry::{display_name, format_name, DirEntry};
use crate::error::{Fat32Error, Result};
use crate::geometry::{
    ATTR_ARCHIVE, ATTR_DIRECTORY, END_OF_CHAIN, MEDIA_PLACEHOLDER, ROOT_CLUSTER, SECTOR_SIZE,
};
use crate::session::Session;

impl Session {
    /// Unconditionally rewrite the image with the fixed geometry, a fresh
    /// FAT, and a root directory holding only `.` and `..`.
    pub fn format(&mut self) -> Result<()> {
        crate::bpb::write_boot_sector(&mut self.device)?;
        self.refresh_validity()?;
        let geometry = self.geometry;

        let zero_sector = [0u8; SECTOR_SIZE];
        let fat_span = geometry.fat_count as u32 * geometry.fat_size_sectors;
        for offset in 0..fat_span {
            self.device.write_sector(geometry.fat_start() + offset, &zero_sector)?;
        }
        crate::fat::write_entry(&mut self.device, &geometry, 0, MEDIA_PLACEHOLDER)?;
        crate::fat::write_entry(&mut self.device, &geometry, 1, END_OF_CHAIN)?;

        crate::cluster::zero_cluster(&mut self.device, &geometry, ROOT_CLUSTER)?;
        let dot = DirEntry {
            name: format_name("."),
            attr: ATTR_DIRECTORY,
            cluster: ROOT_CLUSTER,
            file_size: 0,
        };
        let dotdot = DirEntry {
            name: format_name(".."),
            attr: ATTR_DIRECTORY,
            cluster: 0,
            file_size: 0,
        };
        dir::write_entry_at(&mut self.device, &geometry, ROOT_CLUSTER, 0, &dot)?;
        dir::write_entry_at(&mut self.device, &geometry, ROOT_CLUSTER, 1, &dotdot)?;
        crate::fat::write_entry(&mut self.device, &geometry, ROOT_CLUSTER, END_OF_CHAIN)?;

        self.refresh_validity()?;
        self.current_path = "/".to_string();
        self.current_cluster = ROOT_CLUSTER;
        Ok(())
    }

    /// Create a subdirectory of the current directory.
    pub fn mkdir(&mut self, name: &str) -> Result<()> {
        self.ensure_valid()?;
        if name.is_empty() {
            return Err(Fat32Error::BadArgument);
        }
        let geometry = self.geometry;
        let normalized = format_name(name);

        let entries = dir::read_entries(&mut self.device, &geometry, self.current_cluster)?;
        if dir::name_collides(&entries, &normalized) {
            return Err(Fat32Error::NameExists);
        }
        let slot = dir::find_free_slot(&entries)?;

        let new_cluster = crate::fat::find_first_free(&mut self.device, &geometry)?;
        if new_cluster == 0 {
            return Err(Fat32Error::OutOfSpace);
        }
        debug!("mkdir: allocating cluster {new_cluster} for {name}");

        crate::cluster::zero_cluster(&mut self.device, &geometry, new_cluster)?;
        let dot = DirEntry {
            name: format_name("."),
            attr: ATTR_DIRECTORY,
            cluster: new_cluster,
            file_size: 0,
        };
        let dotdot = DirEntry {
            name: format_name(".."),
            attr: ATTR_DIRECTORY,
            cluster: self.current_cluster,
            file_size: 0,
        };
        dir::write_entry_at(&mut self.device, &geometry, new_cluster, 0, &dot)?;
        dir::write_entry_at(&mut self.device, &geometry, new_cluster, 1, &dotdot)?;
        crate::fat::write_entry(&mut self.device, &geometry, new_cluster, END_OF_CHAIN)?;

        let child = DirEntry {
            name: normalized,
            attr: ATTR_DIRECTORY,
            cluster: new_cluster,
            file_size: 0,
        };
        dir::write_entry_at(&mut self.device, &geometry, self.current_cluster, slot, &child)
    }

    /// Create a zero-length file entry in the current directory. No cluster
    /// is allocated — empty files own no cluster.
    pub fn touch(&mut self, name: &str) -> Result<()> {
        self.ensure_valid()?;
        if name.is_empty() {
            return Err(Fat32Error::BadArgument);
        }
        let geometry = self.geometry;
        let normalized = format_name(name);

        let entries = dir::read_entries(&mut self.device, &geometry, self.current_cluster)?;
        if dir::name_collides(&entries, &normalized) {
            return Err(Fat32Error::NameExists);
        }
        let slot = dir::find_free_slot(&entries)?;

        let entry = DirEntry {
            name: normalized,
            attr: ATTR_ARCHIVE,
            cluster: 0,
            file_size: 0,
        };
        dir::write_entry_at(&mut self.device, &geometry, self.current_cluster, slot, &entry)
    }

    /// Navigate the session cursor. Only absolute, single-component paths
    /// (and `/`, `/.`, `/..`) are supported.
    pub fn cd(&mut self, path: &str) -> Result<()> {
        self.ensure_valid()?;
        if !path.starts_with('/') {
            return Err(Fat32Error::BadArgument);
        }
        if path == "/" {
            self.current_cluster = ROOT_CLUSTER;
            self.current_path = "/".to_string();
            return Ok(());
        }
        if path == "/." {
            return Ok(());
        }
        if path == "/.." {
            if self.current_cluster == ROOT_CLUSTER {
                return Ok(());
            }
            let geometry = self.geometry;
            let entries = dir::read_entries(&mut self.device, &geometry, self.current_cluster)?;
            let dotdot = dir::find_by_name(&entries, &format_name("..")).ok_or(Fat32Error::NotFound)?;
            self.current_cluster = dotdot.cluster;
            let mut segments: Vec<&str> = self.current_path.split('/').filter(|s| !s.is_empty()).collect();
            segments.pop();
            self.current_path = if segments.is_empty() {
                "/".to_string()
            } else {
                format!("/{}", segments.join("/"))
            };
            return Ok(());
        }

        let rest = &path[1..];
        if rest.contains('/') {
            return Err(Fat32Error::Unsupported);
        }
        let geometry = self.geometry;
        let normalized = format_name(rest);
        let entries = dir::read_entries(&mut self.device, &geometry, self.current_cluster)?;
        let target = dir::find_by_name(&entries, &normalized).ok_or(Fat32Error::NotFound)?;
        if !target.is_directory() {
            return Err(Fat32Error::NotFound);
        }
        self.current_cluster = target.cluster;
        self.current_path = path.to_string();
        Ok(())
    }

    /// List the directory at `path` (or the current directory if `None`),
    /// one display name per returned line, in on-disk order.
    pub fn ls(&mut self, path: Option<&str>) -> Result<Vec<String>> {
        self.ensure_valid()?;
        let geometry = self.geometry;

        let target_cluster = match path {
            None => self.current_cluster,
            Some("/") => ROOT_CLUSTER,
            Some(p) if p.starts_with('/') => {
                let rest = &p[1..];
                if rest.is_empty() || rest.contains('/') {
                    self.current_cluster
                } else {
                    let root_entries = dir::read_entries(&mut self.device, &geometry, ROOT_CLUSTER)?;
                    let normalized = format_name(rest);
                    match dir::find_by_name(&root_entries, &normalized) {
                        Some(e) if e.is_directory() => e.cluster,
                        _ => self.current_cluster,
                    }
                }
            }
            Some(_) => self.current_cluster,
        };

        let entries = dir::read_entries(&mut self.device, &geometry, target_cluster)?;
        Ok(dir::live_entries(&entries)
            .iter()
            .map(|e| display_name(&e.name))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_session() -> (Session, tempfile::NamedTempFile) {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let session = Session::open(tmp.path().to_str().unwrap()).unwrap();
        (session, tmp)
    }

    #[test]
    fn ops_fail_on_unformatted_image() {
        let (mut session, _tmp) = scratch_session();
        assert!(matches!(session.ls(None), Err(Fat32Error::InvalidImage)));
        assert!(matches!(session.mkdir("a"), Err(Fat32Error::InvalidImage)));
    }

    #[test]
    fn format_then_ls_lists_dot_and_dotdot() {
        let (mut session, _tmp) = scratch_session();
        session.format().unwrap();
        assert_eq!(session.ls(None).unwrap(), vec![".", ".."]);
    }

    #[test]
    fn mkdir_then_ls_shows_new_directory() {
        let (mut session, _tmp) = scratch_session();
        session.format().unwrap();
        session.mkdir("ttt").unwrap();
        let names = session.ls(None).unwrap();
        assert!(names.contains(&"ttt".to_string()));
    }

    #[test]
    fn mkdir_rejects_duplicate_name() {
        let (mut session, _tmp) = scratch_session();
        session.format().unwrap();
        session.mkdir("ttt").unwrap();
        assert!(matches!(session.mkdir("ttt"), Err(Fat32Error::NameExists)));
    }

    #[test]
    fn cd_into_child_then_back_to_root() {
        let (mut session, _tmp) = scratch_session();
        session.format().unwrap();
        session.mkdir("ttt").unwrap();
        session.cd("/ttt").unwrap();
        assert_ne!(session.current_cluster, ROOT_CLUSTER);
        assert_eq!(session.current_path, "/ttt");
        assert_eq!(session.ls(None).unwrap(), vec![".", ".."]);

        session.cd("/").unwrap();
        assert_eq!(session.current_cluster, ROOT_CLUSTER);
        assert_eq!(session.current_path, "/");
    }

    #[test]
    fn touch_creates_zero_length_file_case_preserved() {
        let (mut session, _tmp) = scratch_session();
        session.format().unwrap();
        session.touch("file1.txt").unwrap();
        let names = session.ls(None).unwrap();
        assert!(names.contains(&"file1.txt".to_string()));
    }

    #[test]
    fn cd_rejects_multi_component_paths() {
        let (mut session, _tmp) = scratch_session();
        session.format().unwrap();
        session.mkdir("ttt").unwrap();
        assert!(matches!(session.cd("/ttt/x"), Err(Fat32Error::Unsupported)));
    }

    #[test]
    fn cd_to_missing_directory_is_not_found() {
        let (mut session, _tmp) = scratch_session();
        session.format().unwrap();
        assert!(matches!(session.cd("/nope"), Err(Fat32Error::NotFound)));
    }

    #[test]
    fn ls_unresolvable_path_falls_back_to_current_directory() {
        let (mut session, _tmp) = scratch_session();
        session.format().unwrap();
        session.mkdir("ttt").unwrap();
        let fallback = session.ls(Some("/nope")).unwrap();
        assert_eq!(fallback, session.ls(None).unwrap());
    }

    /// A tiny geometry (6 allocatable clusters) to make FAT exhaustion cheap
    /// to set up, mirroring the one in `fat.rs`'s test module.
    fn tiny_geometry() -> crate::geometry::Geometry {
        crate::geometry::Geometry {
            bytes_per_sector: crate::geometry::BYTES_PER_SECTOR,
            sectors_per_cluster: crate::geometry::SECTORS_PER_CLUSTER,
            reserved_sectors: crate::geometry::RESERVED_SECTORS,
            fat_count: crate::geometry::FAT_COUNT,
            total_sectors: 98,
            fat_size_sectors: 1,
            root_cluster: ROOT_CLUSTER,
        }
    }

    #[test]
    fn mkdir_reports_out_of_space_once_the_fat_is_exhausted() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let mut session = Session::open(tmp.path().to_str().unwrap()).unwrap();
        session.format().unwrap();

        // Swap in a tiny geometry so exhausting the FAT doesn't require
        // thousands of `mkdir`s, then rebuild the root directory and FAT
        // under that geometry exactly as `format` would.
        let geometry = tiny_geometry();
        session.geometry = geometry;
        crate::cluster::zero_cluster(&mut session.device, &geometry, ROOT_CLUSTER).unwrap();
        let dot = DirEntry { name: format_name("."), attr: ATTR_DIRECTORY, cluster: ROOT_CLUSTER, file_size: 0 };
        let dotdot = DirEntry { name: format_name(".."), attr: ATTR_DIRECTORY, cluster: 0, file_size: 0 };
        dir::write_entry_at(&mut session.device, &geometry, ROOT_CLUSTER, 0, &dot).unwrap();
        dir::write_entry_at(&mut session.device, &geometry, ROOT_CLUSTER, 1, &dotdot).unwrap();

        // Allocate every remaining cluster (root is already taken) directly
        // through the FAT so `find_first_free` has nothing left to offer.
        for c in (ROOT_CLUSTER + 1)..geometry.total_clusters() {
            crate::fat::write_entry(&mut session.device, &geometry, c, END_OF_CHAIN).unwrap();
        }
        crate::fat::write_entry(&mut session.device, &geometry, ROOT_CLUSTER, END_OF_CHAIN).unwrap();

        assert_eq!(crate::fat::find_first_free(&mut session.device, &geometry).unwrap(), 0);
        assert!(matches!(session.mkdir("overflow"), Err(Fat32Error::OutOfSpace)));
    }

    #[test]
    fn reopened_image_retains_prior_state() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let path = tmp.path().to_str().unwrap().to_string();
        {
            let mut session = Session::open(&path).unwrap();
            session.format().unwrap();
            session.mkdir("ttt").unwrap();
            session.touch("file1.txt").unwrap();
        }
        let mut session = Session::open(&path).unwrap();
        let names = session.ls(None).unwrap();
        assert_eq!(names, vec![".", "..", "ttt", "file1.txt"]);
    }
}

//! The Archive Store: the canonical directory of relocated fragments.
//!
//! The store owns the two naming rules everything else depends on:
//! filenames are `<sectionId>_<suffix>.json`, and no two files may ever
//! share a filename. Collisions are resolved by appending a second-resolution
//! timestamp to the incoming file's stem; existing files are never touched.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::Local;
use tracing::debug;

use reportdesk_shared::{ReportDeskError, Result};

/// One file in the Archive Store, as returned by [`ArchiveStore::list`].
#[derive(Debug, Clone)]
pub struct StoredFragment {
    /// Absolute path within the store.
    pub path: PathBuf,
    /// File name, `<sectionId>_<suffix>.json`.
    pub file_name: String,
    /// Filesystem modification time.
    pub modified: SystemTime,
    /// Size in bytes.
    pub size_bytes: u64,
}

/// Handle to the Archive Store directory.
#[derive(Debug, Clone)]
pub struct ArchiveStore {
    dir: PathBuf,
}

impl ArchiveStore {
    /// Open the store, creating the directory if absent.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| ReportDeskError::io(&dir, e))?;
        Ok(Self { dir })
    }

    /// The store directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Compute the collision-resolved destination for an incoming file name.
    ///
    /// The plain name wins when free. Otherwise the stem gets a
    /// `_YYYYMMDD_HHMMSS` suffix; if even that name is taken (several
    /// collisions within one second), a numeric counter keeps extending the
    /// stem until a free name is found — an existing file is never the
    /// destination.
    pub fn destination_for(&self, file_name: &str) -> PathBuf {
        let candidate = self.dir.join(file_name);
        if !candidate.exists() {
            return candidate;
        }

        let (stem, ext) = split_name(file_name);
        let stamp = Local::now().format("%Y%m%d_%H%M%S");
        let stamped = self.dir.join(format!("{stem}_{stamp}.{ext}"));
        if !stamped.exists() {
            debug!(original = file_name, renamed = %stamped.display(), "collision rename");
            return stamped;
        }

        let mut counter = 2u32;
        loop {
            let numbered = self.dir.join(format!("{stem}_{stamp}_{counter}.{ext}"));
            if !numbered.exists() {
                debug!(original = file_name, renamed = %numbered.display(), "collision rename");
                return numbered;
            }
            counter += 1;
        }
    }

    /// All revisions of one section: files named `<sectionId>_*.json`.
    pub fn revisions(&self, section_id: &str) -> Result<Vec<PathBuf>> {
        let prefix = format!("{section_id}_");
        let mut files = Vec::new();

        for entry in std::fs::read_dir(&self.dir).map_err(|e| ReportDeskError::io(&self.dir, e))? {
            let entry = entry.map_err(|e| ReportDeskError::io(&self.dir, e))?;
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with(&prefix) && name.ends_with(".json") {
                files.push(entry.path());
            }
        }

        files.sort();
        Ok(files)
    }

    /// Every `*.json` in the store, newest first.
    pub fn list(&self) -> Result<Vec<StoredFragment>> {
        let mut fragments = Vec::new();

        for entry in std::fs::read_dir(&self.dir).map_err(|e| ReportDeskError::io(&self.dir, e))? {
            let entry = entry.map_err(|e| ReportDeskError::io(&self.dir, e))?;
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().to_string();
            if !name.ends_with(".json") || !path.is_file() {
                continue;
            }

            let meta = entry.metadata().map_err(|e| ReportDeskError::io(&path, e))?;
            fragments.push(StoredFragment {
                file_name: name,
                modified: meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
                size_bytes: meta.len(),
                path,
            });
        }

        fragments.sort_by(|a, b| b.modified.cmp(&a.modified));
        Ok(fragments)
    }
}

/// Split `name.json` into `("name", "json")`. Extensionless names keep the
/// `json` extension on rename, matching what relocation always produces.
fn split_name(file_name: &str) -> (&str, &str) {
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, ext),
        _ => (file_name, "json"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_creates_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("saved_sections");
        assert!(!dir.exists());

        let store = ArchiveStore::open(&dir).unwrap();
        assert!(store.dir().exists());
    }

    #[test]
    fn destination_plain_when_free() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ArchiveStore::open(tmp.path()).unwrap();

        let dest = store.destination_for("summary_v1.json");
        assert_eq!(dest, tmp.path().join("summary_v1.json"));
    }

    #[test]
    fn destination_stamped_on_collision() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ArchiveStore::open(tmp.path()).unwrap();
        std::fs::write(tmp.path().join("summary_v1.json"), "{}").unwrap();

        let dest = store.destination_for("summary_v1.json");
        let name = dest.file_name().unwrap().to_string_lossy().to_string();
        assert_ne!(name, "summary_v1.json");
        assert!(name.starts_with("summary_v1_"));
        assert!(name.ends_with(".json"));
    }

    #[test]
    fn destination_never_an_existing_file_within_one_second() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ArchiveStore::open(tmp.path()).unwrap();
        std::fs::write(tmp.path().join("summary_v1.json"), "{}").unwrap();

        // Occupy the stamped name too, simulating a second collision within
        // the same second.
        let stamped = store.destination_for("summary_v1.json");
        std::fs::write(&stamped, "{}").unwrap();

        let third = store.destination_for("summary_v1.json");
        assert!(!third.exists());
        assert_ne!(third, stamped);
    }

    #[test]
    fn revisions_match_only_their_section() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ArchiveStore::open(tmp.path()).unwrap();
        std::fs::write(tmp.path().join("sec_A.json"), "{}").unwrap();
        std::fs::write(tmp.path().join("sec_B.json"), "{}").unwrap();
        std::fs::write(tmp.path().join("section_A.json"), "{}").unwrap();
        std::fs::write(tmp.path().join("sec_notes.txt"), "x").unwrap();

        let revisions = store.revisions("sec").unwrap();
        let names: Vec<_> = revisions
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["sec_A.json", "sec_B.json"]);
    }

    #[test]
    fn list_is_newest_first() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ArchiveStore::open(tmp.path()).unwrap();
        std::fs::write(tmp.path().join("older_v1.json"), "{}").unwrap();
        std::thread::sleep(std::time::Duration::from_millis(50));
        std::fs::write(tmp.path().join("newer_v1.json"), "{}").unwrap();

        let listed = store.list().unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].file_name, "newer_v1.json");
    }
}

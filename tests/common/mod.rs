//! Shared helpers for integration tests

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tempfile::TempDir;
use time::macros::datetime;
use time::OffsetDateTime;

/// Wednesday afternoon
pub const WEEKDAY: OffsetDateTime = datetime!(2024-05-15 14:30 UTC);
/// Saturday afternoon
pub const WEEKEND: OffsetDateTime = datetime!(2024-05-18 14:30 UTC);

/// A temp directory holding list files
pub struct Fixture {
    pub dir: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Write `content` to `name` and return its full path
    pub fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.path(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    /// Replace a file's content and move its mtime forward so the change is
    /// visible even on filesystems with coarse timestamps
    pub fn rewrite(&self, name: &str, content: &str) -> PathBuf {
        let path = self.write(name, content);
        bump_mtime(&path);
        path
    }

    /// Like [`rewrite`](Self::rewrite), but readers never see a partly written
    /// file: the new content is staged next to the target and renamed over it
    pub fn replace(&self, name: &str, content: &str) -> PathBuf {
        let staged = self.write(&format!("{}.tmp", name), content);
        let target = self.path(name);
        let current = std::fs::metadata(&target).unwrap().modified().unwrap();
        set_mtime_after(&staged, current);
        std::fs::rename(&staged, &target).unwrap();
        target
    }
}

/// Set the mtime two seconds past both now and the current mtime
pub fn bump_mtime(path: &Path) {
    let current = std::fs::metadata(path).unwrap().modified().unwrap();
    set_mtime_after(path, current);
}

fn set_mtime_after(path: &Path, previous: SystemTime) {
    let later = previous.max(SystemTime::now()) + Duration::from_secs(2);
    filetime::set_file_mtime(path, filetime::FileTime::from_system_time(later)).unwrap();
}

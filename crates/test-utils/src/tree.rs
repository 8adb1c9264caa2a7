use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use filetime::FileTime;
use tempfile::TempDir;

/// A throwaway directory tree on the real filesystem with controllable
/// modification times.
///
/// Every entry written through the builder, directories included, is
/// back-dated to [`TempTree::BASE`] so walks against a later threshold start
/// out clean.
pub struct TempTree {
    dir: TempDir,
}

impl TempTree {
    /// Mtime given to every entry created through the builder.
    pub const BASE: Duration = Duration::from_secs(1_000_000);

    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("creating temp dir");
        let tree = Self { dir };
        tree.backdate(tree.root());
        tree
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.root().join(rel)
    }

    /// Time strictly after every back-dated entry.
    pub fn after_base() -> SystemTime {
        SystemTime::UNIX_EPOCH + Self::BASE + Duration::from_secs(10)
    }

    /// Write a file (and any missing parents), back-dating all of them.
    pub fn file(self, rel: &str) -> Self {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("creating parent dirs");
        }
        fs::write(&path, rel.as_bytes()).expect("writing file");
        self.backdate_with_parents(&path);
        self
    }

    pub fn dir(self, rel: &str) -> Self {
        let path = self.path(rel);
        fs::create_dir_all(&path).expect("creating dir");
        self.backdate_with_parents(&path);
        self
    }

    /// Set an entry's mtime to `at`.
    pub fn touch_at(&self, rel: &str, at: SystemTime) {
        let path = self.path(rel);
        filetime::set_symlink_file_times(
            &path,
            FileTime::from_system_time(at),
            FileTime::from_system_time(at),
        )
        .expect("setting file times");
    }

    fn backdate_with_parents(&self, path: &Path) {
        let mut current = Some(path);
        while let Some(p) = current {
            self.backdate(p);
            if p == self.root() {
                break;
            }
            current = p.parent();
        }
    }

    fn backdate(&self, path: &Path) {
        let base = FileTime::from_system_time(SystemTime::UNIX_EPOCH + Self::BASE);
        filetime::set_symlink_file_times(path, base, base).expect("back-dating entry");
    }
}

impl Default for TempTree {
    fn default() -> Self {
        Self::new()
    }
}

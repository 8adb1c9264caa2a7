// src/watch/walker.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use tracing::{debug, trace};

use crate::fs::{FileSystem, RealFileSystem};
use crate::watch::patterns::IgnoreRules;

/// Modification-time based change detector for one directory tree.
///
/// Cheap to clone; the driver hands a clone to the blocking pool for every
/// walk.
#[derive(Debug, Clone)]
pub struct ChangeDetector {
    root: PathBuf,
    ignore: IgnoreRules,
    fs: Arc<dyn FileSystem>,
}

impl ChangeDetector {
    /// Detector over the real filesystem.
    pub fn new(root: impl Into<PathBuf>, ignore: IgnoreRules) -> Self {
        Self::with_fs(root, ignore, Arc::new(RealFileSystem))
    }

    pub fn with_fs(
        root: impl Into<PathBuf>,
        ignore: IgnoreRules,
        fs: Arc<dyn FileSystem>,
    ) -> Self {
        Self {
            root: root.into(),
            ignore,
            fs,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Walk the tree and compare every non-ignored entry against `threshold`.
    ///
    /// Returns `threshold` unchanged when nothing is newer, so callers detect
    /// "no change" by equality. When something is newer the result is the
    /// wall-clock time of detection, or the entry's own mtime if that lies
    /// in the future. Either way it is strictly after `threshold`, and
    /// walking again with it reports the same change only once.
    pub fn walk(&self, threshold: SystemTime) -> SystemTime {
        match self.find_change(threshold) {
            Some((path, modified)) => {
                let next = SystemTime::now().max(modified);
                debug!(path = %path.display(), "change detected");
                next
            }
            None => threshold,
        }
    }

    /// Depth-first search for the first file modified strictly after
    /// `threshold`.
    ///
    /// Only non-directory entries are compared. A directory's own mtime moves
    /// whenever a child is created, including hidden and ignored ones, so it
    /// says nothing about watched content. Entries that cannot be read are
    /// skipped.
    pub fn find_change(&self, threshold: SystemTime) -> Option<(PathBuf, SystemTime)> {
        let mut stack = vec![self.root.clone()];

        while let Some(path) = stack.pop() {
            if !self.fs.is_dir(&path) {
                match self.fs.modified(&path) {
                    Ok(modified) if modified > threshold => return Some((path, modified)),
                    Ok(_) => {}
                    Err(err) => {
                        trace!(path = %path.display(), error = %err, "skipping unreadable entry");
                    }
                }
                continue;
            }

            let children = match self.fs.read_dir(&path) {
                Ok(children) => children,
                Err(err) => {
                    trace!(path = %path.display(), error = %err, "skipping unreadable directory");
                    continue;
                }
            };

            for child in children {
                if self.is_ignored(&child) {
                    trace!(path = %child.display(), "ignored");
                    continue;
                }
                stack.push(child);
            }
        }

        None
    }

    fn is_ignored(&self, path: &Path) -> bool {
        match path.strip_prefix(&self.root) {
            Ok(rel) => {
                let rel = rel.to_string_lossy().replace('\\', "/");
                self.ignore.is_ignored(&rel)
            }
            // Not under the root (should not happen for read_dir output);
            // fall back to the base name alone.
            Err(_) => path
                .file_name()
                .map(|name| self.ignore.is_ignored(&name.to_string_lossy()))
                .unwrap_or(false),
        }
    }
}

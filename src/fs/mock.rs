// src/fs/mock.rs

use super::FileSystem;
use anyhow::{anyhow, Result};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

#[derive(Debug, Clone)]
pub enum MockEntry {
    File { modified: SystemTime },
    Dir { children: Vec<String>, modified: SystemTime },
}

impl MockEntry {
    fn modified(&self) -> SystemTime {
        match self {
            MockEntry::File { modified } | MockEntry::Dir { modified, .. } => *modified,
        }
    }
}

#[derive(Debug, Default)]
struct MockState {
    entries: HashMap<PathBuf, MockEntry>,
    /// Paths whose metadata and listing fail, like a permission error would.
    denied: HashSet<PathBuf>,
}

/// In-memory filesystem with explicit modification times.
///
/// Directories created implicitly (as parents of added entries) carry
/// `UNIX_EPOCH` as their mtime, so they never count as changed unless a test
/// says so with [`MockFileSystem::set_modified`].
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    state: Arc<Mutex<MockState>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        let mut state = MockState::default();
        // Ensure root exists
        state.entries.insert(
            PathBuf::from("."),
            MockEntry::Dir {
                children: Vec::new(),
                modified: SystemTime::UNIX_EPOCH,
            },
        );

        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn add_file(&self, path: impl AsRef<Path>, modified: SystemTime) {
        self.insert(path.as_ref(), MockEntry::File { modified });
    }

    pub fn add_dir(&self, path: impl AsRef<Path>, modified: SystemTime) {
        let path = path.as_ref();
        let mut state = self.state.lock().unwrap();
        if let Some(MockEntry::Dir { modified: m, .. }) = state.entries.get_mut(path) {
            *m = modified;
            return;
        }
        drop(state);
        self.insert(
            path,
            MockEntry::Dir {
                children: Vec::new(),
                modified,
            },
        );
    }

    /// Change the mtime of an existing entry. Unknown paths are ignored.
    pub fn set_modified(&self, path: impl AsRef<Path>, modified: SystemTime) {
        let mut state = self.state.lock().unwrap();
        match state.entries.get_mut(path.as_ref()) {
            Some(MockEntry::File { modified: m }) | Some(MockEntry::Dir { modified: m, .. }) => {
                *m = modified;
            }
            None => {}
        }
    }

    /// Make an entry unreadable: listing it and reading its metadata fail.
    pub fn deny(&self, path: impl AsRef<Path>) {
        let mut state = self.state.lock().unwrap();
        state.denied.insert(path.as_ref().to_path_buf());
    }

    fn insert(&self, path: &Path, entry: MockEntry) {
        let mut state = self.state.lock().unwrap();
        state.entries.insert(path.to_path_buf(), entry);
        Self::link_to_parent(&mut state.entries, path);
    }

    /// Register `path` in its parent's children, creating parents as needed.
    fn link_to_parent(entries: &mut HashMap<PathBuf, MockEntry>, path: &Path) {
        let Some(parent) = path.parent() else {
            return;
        };
        let parent = if parent.as_os_str().is_empty() {
            Path::new(".")
        } else {
            parent
        };
        if parent == path {
            return;
        }

        if !entries.contains_key(parent) {
            entries.insert(
                parent.to_path_buf(),
                MockEntry::Dir {
                    children: Vec::new(),
                    modified: SystemTime::UNIX_EPOCH,
                },
            );
            Self::link_to_parent(entries, parent);
        }

        if let Some(MockEntry::Dir { children, .. }) = entries.get_mut(parent) {
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                if !children.iter().any(|c| c == name) {
                    children.push(name.to_string());
                }
            }
        }
    }
}

impl FileSystem for MockFileSystem {
    fn is_dir(&self, path: &Path) -> bool {
        let state = self.state.lock().unwrap();
        matches!(state.entries.get(path), Some(MockEntry::Dir { .. }))
    }

    fn modified(&self, path: &Path) -> Result<SystemTime> {
        let state = self.state.lock().unwrap();
        if state.denied.contains(path) {
            return Err(anyhow!("Permission denied: {:?}", path));
        }
        state
            .entries
            .get(path)
            .map(MockEntry::modified)
            .ok_or_else(|| anyhow!("File not found: {:?}", path))
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let state = self.state.lock().unwrap();
        if state.denied.contains(path) {
            return Err(anyhow!("Permission denied: {:?}", path));
        }
        match state.entries.get(path) {
            Some(MockEntry::Dir { children, .. }) => {
                Ok(children.iter().map(|name| path.join(name)).collect())
            }
            _ => Err(anyhow!("Not a directory or not found: {:?}", path)),
        }
    }
}

// src/watch/patterns.rs

use std::fmt;

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};

/// Decides which entries under the watched root the change detector skips.
///
/// Two rules apply:
/// - any entry whose base name starts with `.` (this covers `.git`, `.hg`,
///   editor swap files and the like). For directories the whole subtree is
///   skipped.
/// - optional user-supplied glob patterns, matched against the path relative
///   to the root with forward slashes (e.g. `"target/**"`, `"*.log"`).
#[derive(Clone, Default)]
pub struct IgnoreRules {
    patterns: Vec<String>,
    globs: Option<GlobSet>,
}

impl fmt::Debug for IgnoreRules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IgnoreRules")
            .field("patterns", &self.patterns)
            .finish_non_exhaustive()
    }
}

impl IgnoreRules {
    /// Only the hidden-entry rule, no extra patterns.
    pub fn hidden_only() -> Self {
        Self::default()
    }

    /// Hidden-entry rule plus the given glob patterns.
    pub fn with_patterns(patterns: &[String]) -> Result<Self> {
        let globs = if patterns.is_empty() {
            None
        } else {
            Some(build_globset(patterns).context("building ignore globset")?)
        };

        Ok(Self {
            patterns: patterns.to_vec(),
            globs,
        })
    }

    /// Patterns this rule set was built from.
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Returns true if the entry at `rel_path` (relative to the watched root,
    /// forward slashes) should be skipped.
    pub fn is_ignored(&self, rel_path: &str) -> bool {
        if is_hidden(rel_path) {
            return true;
        }
        match &self.globs {
            Some(globs) => globs.is_match(rel_path),
            None => false,
        }
    }
}

/// Whether the last path component starts with a dot.
fn is_hidden(rel_path: &str) -> bool {
    rel_path
        .rsplit('/')
        .next()
        .is_some_and(|name| name.starts_with('.'))
}

/// Build a GlobSet from simple string patterns.
fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = Glob::new(pat)
            .with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}

// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::supervisor::OutputSink;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [watch]
/// root = "."
/// interval = "500ms"
/// ignore = ["target/**"]
///
/// [command]
/// program = "cargo"
/// args = ["run"]
/// grace_period = "3s"
/// stdout = "inherit"
/// stderr = "logs/stderr.log"
/// ```
///
/// All sections and keys are optional here; [`Settings`] is where required
/// values are enforced, after CLI overrides have been applied.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub watch: WatchSection,

    #[serde(default)]
    pub command: CommandSection,
}

/// `[watch]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WatchSection {
    /// Directory to watch. The command also runs here.
    ///
    /// Relative paths are resolved against the current working directory.
    #[serde(default)]
    pub root: Option<PathBuf>,

    /// Polling interval as a duration string (e.g. `"500ms"`, `"2s"`).
    #[serde(default)]
    pub interval: Option<String>,

    /// Extra glob patterns to ignore, relative to `root`.
    ///
    /// Hidden entries (names starting with `.`) are always ignored.
    #[serde(default)]
    pub ignore: Vec<String>,
}

/// `[command]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommandSection {
    /// Executable to run (looked up on `PATH` when not a path).
    #[serde(default)]
    pub program: Option<String>,

    #[serde(default)]
    pub args: Vec<String>,

    /// Time between SIGINT and SIGKILL when stopping the process.
    #[serde(default)]
    pub grace_period: Option<String>,

    /// `"inherit"`, `"null"`, or a file path to append to.
    #[serde(default)]
    pub stdout: Option<String>,

    #[serde(default)]
    pub stderr: Option<String>,
}

/// Fully resolved and validated settings.
///
/// Only constructible through `TryFrom<RawConfigFile>`, so holding one means
/// every value has been checked.
#[derive(Debug, Clone)]
pub struct Settings {
    pub root: PathBuf,
    pub interval: Duration,
    pub ignore: Vec<String>,
    pub program: String,
    pub args: Vec<String>,
    pub grace_period: Duration,
    pub stdout: OutputSink,
    pub stderr: OutputSink,
}

/// Polling interval used when none is configured.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(500);

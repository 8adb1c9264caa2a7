// src/supervisor/output.rs

use std::fmt;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::process::Stdio;
use std::str::FromStr;

/// Where a supervised process writes one of its output streams.
///
/// A sink is opened afresh for every start and handed to the OS process
/// object, so it only lives as long as that process.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OutputSink {
    /// Share the supervisor's own stream.
    #[default]
    Inherit,
    /// Discard everything.
    Null,
    /// Append to a file, creating it if needed.
    File(PathBuf),
}

impl OutputSink {
    pub(crate) fn open(&self) -> std::io::Result<Stdio> {
        match self {
            OutputSink::Inherit => Ok(Stdio::inherit()),
            OutputSink::Null => Ok(Stdio::null()),
            OutputSink::File(path) => {
                let file = OpenOptions::new().create(true).append(true).open(path)?;
                Ok(Stdio::from(file))
            }
        }
    }
}

impl FromStr for OutputSink {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.to_lowercase().as_str() {
            "" => Err("empty output sink (expected \"inherit\", \"null\" or a file path)".to_string()),
            "inherit" => Ok(OutputSink::Inherit),
            "null" => Ok(OutputSink::Null),
            _ => Ok(OutputSink::File(PathBuf::from(trimmed))),
        }
    }
}

impl fmt::Display for OutputSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputSink::Inherit => f.write_str("inherit"),
            OutputSink::Null => f.write_str("null"),
            OutputSink::File(path) => write!(f, "{}", path.display()),
        }
    }
}

// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HotrunError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("failed to launch '{program}': {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("process {pid} is still running; kill it before starting again")]
    AlreadyRunning { pid: i32 },

    #[error("failed to kill process group {pgid}: {source}")]
    KillFailed {
        pgid: i32,
        #[source]
        source: Errno,
    },

    #[error("failed to reap child process: {0}")]
    Reap(#[source] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use nix::errno::Errno;

pub type Result<T> = std::result::Result<T, HotrunError>;

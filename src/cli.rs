// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `hotrun`.
#[derive(Debug, Clone, Default, Parser)]
#[command(
    name = "hotrun",
    version,
    about = "Restart a command whenever files under a directory change.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Hotrun.toml` in the current working directory, if present.
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Directory to watch; the command runs here too.
    #[arg(long, value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Polling interval (e.g. `500ms`, `2s`).
    #[arg(long, value_name = "DURATION")]
    pub interval: Option<String>,

    /// Time between SIGINT and SIGKILL when stopping the command.
    #[arg(long, value_name = "DURATION")]
    pub grace_period: Option<String>,

    /// Extra glob pattern to ignore, relative to the watched directory.
    /// May be repeated.
    #[arg(long, value_name = "GLOB")]
    pub ignore: Vec<String>,

    /// Where the command's stdout goes: `inherit`, `null` or a file path.
    #[arg(long, value_name = "SINK")]
    pub stdout: Option<String>,

    /// Where the command's stderr goes: `inherit`, `null` or a file path.
    #[arg(long, value_name = "SINK")]
    pub stderr: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `HOTRUN_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Resolve and print the settings, but don't run anything.
    #[arg(long)]
    pub dry_run: bool,

    /// The command to supervise, e.g. `hotrun -- cargo run --release`.
    #[arg(
        value_name = "COMMAND",
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub command: Vec<String>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

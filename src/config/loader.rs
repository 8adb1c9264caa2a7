// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::cli::CliArgs;
use crate::config::model::{RawConfigFile, Settings};
use crate::errors::Result;

/// Load a configuration file from a given path and return the raw
/// `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_settings`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Resolve the effective settings for a CLI invocation.
///
/// - Reads the config file named by `--config`, or `Hotrun.toml` if it
///   exists. An explicitly named file must exist; the default one may not.
/// - Applies CLI overrides on top.
/// - Validates the result.
pub fn load_settings(args: &CliArgs) -> Result<Settings> {
    let mut raw = match &args.config {
        Some(path) => load_from_path(path)?,
        None => {
            let path = default_config_path();
            if path.is_file() {
                debug!(path = %path.display(), "loading default config file");
                load_from_path(&path)?
            } else {
                RawConfigFile::default()
            }
        }
    };

    apply_cli_overrides(&mut raw, args);
    Settings::try_from(raw)
}

/// Overlay command-line values onto the file config.
///
/// A command given on the command line replaces both `program` and `args`;
/// `--ignore` patterns are added to the file's list.
pub fn apply_cli_overrides(raw: &mut RawConfigFile, args: &CliArgs) {
    if let Some(dir) = &args.dir {
        raw.watch.root = Some(dir.clone());
    }
    if let Some(interval) = &args.interval {
        raw.watch.interval = Some(interval.clone());
    }
    raw.watch.ignore.extend(args.ignore.iter().cloned());

    if let Some((program, rest)) = args.command.split_first() {
        raw.command.program = Some(program.clone());
        raw.command.args = rest.to_vec();
    }
    if let Some(grace) = &args.grace_period {
        raw.command.grace_period = Some(grace.clone());
    }
    if let Some(stdout) = &args.stdout {
        raw.command.stdout = Some(stdout.clone());
    }
    if let Some(stderr) = &args.stderr {
        raw.command.stderr = Some(stderr.clone());
    }
}

/// Config file looked up when `--config` is not given.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Hotrun.toml")
}

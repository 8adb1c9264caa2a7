// src/config/mod.rs

//! Configuration loading and validation for hotrun.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk and merge CLI overrides (`loader.rs`).
//! - Validate and resolve it into [`Settings`] (`validate.rs`).

pub mod duration;
pub mod loader;
pub mod model;
pub mod validate;

pub use duration::parse_duration;
pub use loader::{apply_cli_overrides, load_from_path, load_settings};
pub use model::{CommandSection, RawConfigFile, Settings, WatchSection};

// src/watch/mod.rs

//! Change detection over a directory tree.
//!
//! This module is responsible for:
//! - Deciding which entries are ignored (hidden names, extra glob patterns).
//! - Walking the tree and comparing modification times against a threshold.
//!
//! It does **not** know about processes; the driver turns a newer threshold
//! into a restart.

pub mod patterns;
pub mod walker;

pub use patterns::IgnoreRules;
pub use walker::ChangeDetector;

// src/config/mod.rs

//! Configuration loading and validation for mirrorwatch.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk, falling back to legacy flat files
//!   (`loader.rs`, `legacy.rs`).
//! - Validate basic invariants (`validate.rs`).

pub mod legacy;
pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path};
pub use model::{ConfigFile, ConfigSection, PathsSection, RawConfigFile, StateSection};

// src/config/mod.rs

//! Stage file loading and validation.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a stage file from disk (`loader.rs`).
//! - Validate basic invariants like DAG correctness and decodable file
//!   payloads (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{
    DEFAULT_CONFIG_PATH, default_config_path, load_and_validate, load_from_path, parse_str,
};
pub use model::{ConfigFile, ConfigSection, FileConfig, RawConfigFile, StageConfig};

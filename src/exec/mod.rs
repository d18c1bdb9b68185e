// src/exec/mod.rs

//! Stage actions.
//!
//! Every stage command becomes one graph callback that runs the command
//! through the platform shell with `tokio::process::Command`. Stage files
//! are decoded and written before any command of the stage starts.

pub mod command;
pub mod files;

pub use command::{command_callback, run_command, stage_callbacks};
pub use files::{decode, write_files};

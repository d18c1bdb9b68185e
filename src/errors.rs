// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

use crate::engine::FailureReport;

#[derive(Error, Debug)]
pub enum StagedagError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Operation name must not be empty")]
    EmptyName,

    /// The dependency graph is not acyclic; carries the names of every
    /// operation taking part in the offending cycle.
    #[error("Cycle detected in DAG: cycle detected between operations [{}]", .0.join(", "))]
    DagCycle(Vec<String>),

    /// One or more fatal operations failed during a run.
    #[error("{0}")]
    OperationsFailed(FailureReport),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, StagedagError>;

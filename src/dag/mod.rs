// src/dag/mod.rs

//! Operation registry, layering and runtime state.
//!
//! - [`graph`] holds the arena of operations and their dependency edges.
//! - [`operation`] defines callbacks, dependency strengths and `OpOptions`.
//! - [`layers`] computes the bottom-up layering and rejects cycles.
//! - [`state`] provides per-operation runtime state and the analysis report.

pub mod graph;
pub mod layers;
pub mod operation;
pub mod state;

pub use graph::{Graph, GraphOptions};
pub use operation::{Callback, OpOptions, Strength, callback};
pub use state::{OpReport, OpState, OpStatus};

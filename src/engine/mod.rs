// src/engine/mod.rs

//! Execution engine.
//!
//! [`Graph::run`](crate::dag::Graph::run) lives in [`runner`]: it computes the
//! layering once, walks the layers in order and decides per operation whether
//! to skip, run inline behind the layer barrier, or detach it as a background
//! job.
//!
//! - [`op_task`] executes one operation, fanning out its callbacks.
//! - [`orphans`] tracks background operations and optionally joins them.
//! - [`outcome`] aggregates fatal failures into the run's error.

mod op_task;
mod orphans;
pub mod outcome;
mod runner;

pub use outcome::{FailureReport, OpFailure};

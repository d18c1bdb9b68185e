// src/bootstrap.rs

//! Turn a validated stage file into an operation graph.

use tracing::debug;

use crate::config::ConfigFile;
use crate::dag::{Graph, GraphOptions, OpOptions};
use crate::errors::Result;
use crate::exec::stage_callbacks;
use crate::types::DepsMode;

/// Register every stage of `cfg` as an operation of a new graph.
///
/// The commands of a stage run concurrently; its files are written before
/// any of them starts.
pub fn build_graph(cfg: &ConfigFile, options: GraphOptions) -> Result<Graph> {
    let mut graph = Graph::with_options(options);

    for (name, stage) in cfg.stage.iter() {
        let mut opts = OpOptions::new()
            .depends_on(stage.after.iter().cloned())
            .weak_depends_on(stage.weak_after.iter().cloned())
            .callbacks(stage_callbacks(name, stage));

        if stage.deps_mode == DepsMode::Weak {
            opts = opts.weak_deps();
        }
        if stage.fatal {
            opts = opts.fatal();
        }
        if stage.background {
            opts = opts.background();
        }

        debug!(stage = %name, ?opts, "registering stage");
        graph.add(name.as_str(), opts)?;
    }

    Ok(graph)
}

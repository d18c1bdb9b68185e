// src/engine/orphans.rs

//! Registry of background operations launched during a run.

use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::engine::op_task::OpJob;
use crate::engine::outcome::{FailureReport, OpCompletion};

/// Tracks detached background operations.
///
/// With orphan collection disabled, jobs are spawned fire-and-forget and
/// their outcome is only visible through the state records. With it enabled,
/// jobs go into a join set that the run drains before returning.
#[derive(Debug)]
pub(crate) struct OrphanRegistry {
    collected: Option<JoinSet<OpCompletion>>,
}

impl OrphanRegistry {
    pub(crate) fn new(collect: bool) -> Self {
        Self {
            collected: collect.then(JoinSet::new),
        }
    }

    pub(crate) fn launch(&mut self, job: OpJob) {
        debug!(op = %job.name(), "launching background operation");
        match &mut self.collected {
            Some(set) => {
                set.spawn(job.execute());
            }
            None => {
                tokio::spawn(job.execute());
            }
        }
    }

    /// Wait for every collected background operation and add its fatal
    /// failure, if any, to `report`. No-op when collection is disabled.
    pub(crate) async fn collect(self, report: &mut FailureReport) {
        let Some(mut set) = self.collected else {
            return;
        };
        if set.is_empty() {
            return;
        }

        info!(outstanding = set.len(), "waiting for background operations");
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(completion) => report.absorb(&completion),
                Err(e) => warn!(error = %e, "background operation task did not complete"),
            }
        }
    }
}

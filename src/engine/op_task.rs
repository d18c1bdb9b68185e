// src/engine/op_task.rs

//! Execution of a single operation: callback fan-out and state updates.

use std::sync::Arc;

use anyhow::anyhow;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::dag::operation::{Callback, Operation};
use crate::dag::state::{OpStatus, StateRecord};
use crate::engine::outcome::OpCompletion;
use crate::types::OpName;

/// Everything needed to execute one operation, detached from the graph so it
/// can be moved into a spawned task (background operations).
pub(crate) struct OpJob {
    index: usize,
    name: OpName,
    fatal: bool,
    callbacks: Vec<Callback>,
    record: Arc<StateRecord>,
    run_id: u64,
    token: CancellationToken,
}

impl OpJob {
    pub(crate) fn new(index: usize, op: &Operation, run_id: u64, token: CancellationToken) -> Self {
        Self {
            index,
            name: op.name.clone(),
            fatal: op.fatal,
            callbacks: op.callbacks.clone(),
            record: Arc::clone(&op.record),
            run_id,
            token,
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    /// Mark the operation `Running`, run every callback concurrently and
    /// record the terminal state.
    pub(crate) async fn execute(self) -> OpCompletion {
        let Self {
            index,
            name,
            fatal,
            callbacks,
            record,
            run_id,
            token,
        } = self;

        record.update(run_id, |s| {
            s.status = OpStatus::Running;
            s.executed = true;
        });
        debug!(op = %name, run_id, callbacks = callbacks.len(), "operation running");

        let error = run_callbacks(&name, callbacks, token).await;

        let status = if error.is_some() {
            OpStatus::Failed
        } else {
            OpStatus::Succeeded
        };
        let current = record.update(run_id, |s| {
            s.status = status;
            s.error = error.clone();
        });
        if !current {
            debug!(op = %name, run_id, "run superseded; discarding operation outcome");
        }

        match &error {
            Some(err) => warn!(op = %name, run_id, fatal, error = %format!("{err:#}"), "operation failed"),
            None => debug!(op = %name, run_id, "operation succeeded"),
        }

        OpCompletion {
            index,
            name,
            fatal,
            error,
        }
    }
}

/// Run all callbacks concurrently and wait for every one of them.
///
/// The first failure cancels the token handed to the remaining callbacks and
/// becomes the operation's error.
async fn run_callbacks(
    name: &str,
    callbacks: Vec<Callback>,
    token: CancellationToken,
) -> Option<Arc<anyhow::Error>> {
    if callbacks.is_empty() {
        return None;
    }

    let scope = token.child_token();
    let mut set = JoinSet::new();
    for cb in callbacks {
        let scope = scope.clone();
        set.spawn(async move { cb(scope).await });
    }

    let mut first_error = None;
    while let Some(joined) = set.join_next().await {
        let outcome = joined.unwrap_or_else(|e| Err(anyhow!("callback task failed: {e}")));
        let Err(err) = outcome else {
            continue;
        };
        if first_error.is_none() {
            scope.cancel();
            first_error = Some(Arc::new(err));
        } else {
            debug!(op = %name, error = %format!("{err:#}"), "additional callback failure");
        }
    }

    first_error
}

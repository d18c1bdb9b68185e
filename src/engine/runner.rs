// src/engine/runner.rs

use futures::future::join_all;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::dag::Graph;
use crate::dag::layers::Plan;
use crate::dag::operation::{Operation, Strength};
use crate::dag::state::OpStatus;
use crate::engine::op_task::OpJob;
use crate::engine::orphans::OrphanRegistry;
use crate::engine::outcome::FailureReport;
use crate::errors::Result;

/// Why an operation is not executed in this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SkipReason {
    /// No edges and `enable_init` unset.
    Isolated,
    /// Mandatory dependency (arena index) failed or was skipped.
    Blocked(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decision {
    Run,
    Skip(SkipReason),
}

/// Decide whether `op` runs, given the resolutions of earlier layers.
///
/// Advisory dependencies never block. A background dependency is resolved
/// as `Succeeded` the moment it is launched.
fn decide(op: &Operation, anchored: bool, resolutions: &[OpStatus]) -> Decision {
    if !anchored {
        return Decision::Skip(SkipReason::Isolated);
    }
    for (dep, strength) in op.effective_deps() {
        if strength == Strength::Advisory {
            continue;
        }
        if resolutions[dep] != OpStatus::Succeeded {
            return Decision::Skip(SkipReason::Blocked(dep));
        }
    }
    Decision::Run
}

impl Graph {
    /// Execute the graph once.
    ///
    /// Layers are walked in order; ready operations of a layer run
    /// concurrently and the next layer starts once every non-background
    /// operation of the current one reached a terminal state. The token is
    /// handed to every callback; cancelling it does not abort anything on its
    /// own.
    ///
    /// Returns [`StagedagError::OperationsFailed`](crate::errors::StagedagError::OperationsFailed)
    /// listing every failed fatal operation, or a cycle error if the graph is
    /// not acyclic. Non-fatal failures are only visible through
    /// [`Graph::state`] and [`Graph::analyze`].
    pub async fn run(&self, token: CancellationToken) -> Result<()> {
        let _guard = self.run_lock().lock().await;

        let plan = self.plan()?;
        let run_id = self.next_run_id();
        let ops = self.operations();
        for op in ops {
            op.record.reset(run_id);
        }

        info!(
            run_id,
            operations = ops.len(),
            layers = plan.layers.len(),
            "starting DAG run"
        );

        let mut report = FailureReport::default();
        let mut orphans = OrphanRegistry::new(self.options().collect_orphans);
        let mut resolutions = vec![OpStatus::Pending; ops.len()];

        for (layer_no, layer) in plan.layers.iter().enumerate() {
            if token.is_cancelled() {
                debug!(run_id, layer = layer_no, "run token cancelled; callbacks will observe it");
            }

            let jobs = self.launch_layer(
                &plan,
                layer,
                run_id,
                &token,
                &mut resolutions,
                &mut orphans,
            );

            for completion in join_all(jobs.into_iter().map(OpJob::execute)).await {
                resolutions[completion.index] = if completion.error.is_some() {
                    OpStatus::Failed
                } else {
                    OpStatus::Succeeded
                };
                report.absorb(&completion);
            }
        }

        orphans.collect(&mut report).await;

        info!(run_id, fatal_failures = report.len(), "DAG run finished");
        report.into_result()
    }

    /// Evaluate every operation of `layer`: record skips, detach background
    /// operations and return the jobs the layer barrier has to wait for.
    fn launch_layer(
        &self,
        plan: &Plan,
        layer: &[usize],
        run_id: u64,
        token: &CancellationToken,
        resolutions: &mut [OpStatus],
        orphans: &mut OrphanRegistry,
    ) -> Vec<OpJob> {
        let ops = self.operations();
        let mut jobs = Vec::with_capacity(layer.len());

        for &idx in layer {
            let op = &ops[idx];
            match decide(op, plan.anchored[idx], resolutions) {
                Decision::Skip(reason) => {
                    resolutions[idx] = OpStatus::Skipped;
                    op.record.update(run_id, |s| s.status = OpStatus::Skipped);
                    match reason {
                        SkipReason::Isolated => {
                            debug!(op = %op.name, run_id, "operation has no edges and init is disabled; skipping")
                        }
                        SkipReason::Blocked(dep) => {
                            debug!(
                                op = %op.name,
                                run_id,
                                dependency = %ops[dep].name,
                                "mandatory dependency did not succeed; skipping"
                            )
                        }
                    }
                }
                Decision::Run => {
                    let job = OpJob::new(idx, op, run_id, token.child_token());
                    if op.background {
                        resolutions[idx] = OpStatus::Succeeded;
                        // Visible as started before the detached task is first polled.
                        op.record.update(run_id, |s| {
                            s.status = OpStatus::Running;
                            s.executed = true;
                        });
                        orphans.launch(job);
                    } else {
                        jobs.push(job);
                    }
                }
            }
        }

        jobs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op_with(deps: &[(usize, Strength)], all_weak: bool) -> Operation {
        let mut op = Operation::placeholder("op".into());
        for &(dep, strength) in deps {
            op.add_dependency(dep, strength);
        }
        op.all_weak = all_weak;
        op
    }

    #[test]
    fn mandatory_failure_or_skip_blocks() {
        let op = op_with(&[(0, Strength::Mandatory), (1, Strength::Mandatory)], false);

        let ok = [OpStatus::Succeeded, OpStatus::Succeeded];
        assert_eq!(decide(&op, true, &ok), Decision::Run);

        let failed = [OpStatus::Succeeded, OpStatus::Failed];
        assert_eq!(
            decide(&op, true, &failed),
            Decision::Skip(SkipReason::Blocked(1))
        );

        let skipped = [OpStatus::Skipped, OpStatus::Succeeded];
        assert_eq!(
            decide(&op, true, &skipped),
            Decision::Skip(SkipReason::Blocked(0))
        );
    }

    #[test]
    fn advisory_dependencies_never_block() {
        let op = op_with(&[(0, Strength::Advisory), (1, Strength::Mandatory)], false);
        let resolutions = [OpStatus::Failed, OpStatus::Succeeded];
        assert_eq!(decide(&op, true, &resolutions), Decision::Run);

        let weak = op_with(&[(0, Strength::Mandatory)], true);
        assert_eq!(decide(&weak, true, &[OpStatus::Skipped]), Decision::Run);
    }

    #[test]
    fn unanchored_operations_are_skipped() {
        let op = op_with(&[], false);
        assert_eq!(
            decide(&op, false, &[]),
            Decision::Skip(SkipReason::Isolated)
        );
    }
}

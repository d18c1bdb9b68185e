// src/dag/state.rs

//! Per-operation runtime state and the introspection types built on it.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::types::OpName;

/// Lifecycle of an operation within a single run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpStatus {
    /// Not evaluated yet in this run (or never run).
    Pending,
    /// Not executed: isolated without `enable_init`, or a mandatory
    /// dependency failed or was skipped.
    Skipped,
    /// Callbacks have been launched and not all of them returned.
    Running,
    Succeeded,
    Failed,
}

impl OpStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            OpStatus::Skipped | OpStatus::Succeeded | OpStatus::Failed
        )
    }
}

/// Public, read-only view of an operation's runtime state.
#[derive(Debug, Clone)]
pub struct OpState {
    pub status: OpStatus,
    /// Whether the operation's callbacks were invoked in the current run.
    pub executed: bool,
    /// Error of the current run, if the operation failed.
    pub error: Option<Arc<anyhow::Error>>,
}

impl Default for OpState {
    fn default() -> Self {
        Self {
            status: OpStatus::Pending,
            executed: false,
            error: None,
        }
    }
}

/// One entry of the layering report returned by
/// [`Graph::analyze`](crate::dag::Graph::analyze).
#[derive(Debug, Clone)]
pub struct OpReport {
    pub name: OpName,
    pub status: OpStatus,
    pub executed: bool,
    pub error: Option<Arc<anyhow::Error>>,
    pub fatal: bool,
    pub background: bool,
}

/// Shared state cell of one operation.
///
/// Writes are tagged with the run that produced them so that a background
/// operation finishing after a newer run started cannot overwrite the reset
/// record.
#[derive(Debug, Default)]
pub(crate) struct StateRecord {
    inner: Mutex<Slot>,
}

#[derive(Debug, Default)]
struct Slot {
    run_id: u64,
    state: OpState,
}

impl StateRecord {
    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn reset(&self, run_id: u64) {
        let mut slot = self.lock();
        slot.run_id = run_id;
        slot.state = OpState::default();
    }

    pub(crate) fn snapshot(&self) -> OpState {
        self.lock().state.clone()
    }

    /// Apply `f` if `run_id` is still the current run. Returns `false` for a
    /// stale write.
    pub(crate) fn update(&self, run_id: u64, f: impl FnOnce(&mut OpState)) -> bool {
        let mut slot = self.lock();
        if slot.run_id != run_id {
            return false;
        }
        f(&mut slot.state);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_writes_are_discarded_after_reset() {
        let record = StateRecord::default();
        record.reset(1);
        assert!(record.update(1, |s| s.status = OpStatus::Running));

        record.reset(2);
        let applied = record.update(1, |s| {
            s.status = OpStatus::Failed;
            s.error = Some(Arc::new(anyhow::anyhow!("late")));
        });

        assert!(!applied);
        let state = record.snapshot();
        assert_eq!(state.status, OpStatus::Pending);
        assert!(state.error.is_none());
        assert!(!state.executed);
    }
}

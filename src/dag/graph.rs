// src/dag/graph.rs

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::Mutex;

use crate::dag::layers::{self, Plan};
use crate::dag::operation::{OpOptions, Operation, Strength};
use crate::dag::state::{OpReport, OpState};
use crate::errors::{Result, StagedagError};
use crate::types::OpName;

/// Graph-wide behaviour switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GraphOptions {
    /// Run operations that have no dependency edges at all. Without it they
    /// are skipped.
    pub enable_init: bool,
    /// Make `run` wait for background operations and fold their fatal
    /// failures into the returned error.
    pub collect_orphans: bool,
}

/// Registry of operations and their dependency edges, keyed by name.
///
/// Operations live in an arena; edges refer to arena indices, so the layering
/// can be rebuilt deterministically for every query or run.
#[derive(Debug)]
pub struct Graph {
    options: GraphOptions,
    ops: Vec<Operation>,
    index: HashMap<OpName, usize>,
    /// Monotonically increasing run ID.
    run_counter: AtomicU64,
    /// Serializes runs of the same graph.
    run_lock: Mutex<()>,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl Graph {
    pub fn new() -> Self {
        Self::with_options(GraphOptions::default())
    }

    pub fn with_options(options: GraphOptions) -> Self {
        Self {
            options,
            ops: Vec::new(),
            index: HashMap::new(),
            run_counter: AtomicU64::new(0),
            run_lock: Mutex::new(()),
        }
    }

    pub fn options(&self) -> GraphOptions {
        self.options
    }

    /// Insert an operation, or merge into an existing one with the same name.
    ///
    /// Merging appends callbacks, merges dependencies (advisory wins) and
    /// ORs the flags. Dependencies that are not registered yet are created
    /// as callback-less placeholders.
    pub fn add(&mut self, name: impl Into<OpName>, opts: OpOptions) -> Result<()> {
        let name = name.into();
        let OpOptions {
            callbacks,
            deps,
            all_weak,
            fatal,
            background,
        } = opts;

        check_name(&name)?;
        for (dep, _) in &deps {
            check_name(dep)?;
        }

        let idx = self.ensure(name);
        for (dep, strength) in deps {
            let dep_idx = self.ensure(dep);
            self.ops[idx].add_dependency(dep_idx, strength);
        }

        let op = &mut self.ops[idx];
        op.callbacks.extend(callbacks);
        op.all_weak |= all_weak;
        op.fatal |= fatal;
        op.background |= background;
        Ok(())
    }

    /// Declare a pure ordering edge: `from` depends (mandatorily) on `to`.
    pub fn depend_on(&mut self, from: impl Into<OpName>, to: impl Into<OpName>) -> Result<()> {
        let (from, to) = (from.into(), to.into());
        check_name(&from)?;
        check_name(&to)?;

        let from = self.ensure(from);
        let to = self.ensure(to);
        self.ops[from].add_dependency(to, Strength::Mandatory);
        Ok(())
    }

    /// Index of `name`, registering a placeholder if needed. Callers check
    /// the name first.
    fn ensure(&mut self, name: OpName) -> usize {
        if let Some(&idx) = self.index.get(&name) {
            return idx;
        }
        let idx = self.ops.len();
        self.index.insert(name.clone(), idx);
        self.ops.push(Operation::placeholder(name));
        idx
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Operation names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().map(|op| op.name.as_str())
    }

    /// Direct dependencies of `name` with their effective strength.
    pub fn dependencies_of(&self, name: &str) -> Vec<(&str, Strength)> {
        self.index
            .get(name)
            .map(|&idx| {
                self.ops[idx]
                    .effective_deps()
                    .map(|(dep, strength)| (self.ops[dep].name.as_str(), strength))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Operations that directly depend on `name`.
    pub fn dependents_of(&self, name: &str) -> Vec<&str> {
        let Some(&target) = self.index.get(name) else {
            return Vec::new();
        };
        self.ops
            .iter()
            .filter(|op| op.deps.contains_key(&target))
            .map(|op| op.name.as_str())
            .collect()
    }

    /// Names per layer, layer 0 first. Fails if the graph has a cycle.
    pub fn layers(&self) -> Result<Vec<Vec<OpName>>> {
        let plan = self.plan()?;
        Ok(plan
            .layers
            .iter()
            .map(|layer| layer.iter().map(|&idx| self.ops[idx].name.clone()).collect())
            .collect())
    }

    /// The layering annotated with each operation's current runtime state.
    ///
    /// Before the first run every entry is `Pending`; during a run it
    /// reflects progress so far.
    pub fn analyze(&self) -> Result<Vec<Vec<OpReport>>> {
        let plan = self.plan()?;
        Ok(plan
            .layers
            .iter()
            .map(|layer| {
                layer
                    .iter()
                    .map(|&idx| {
                        let op = &self.ops[idx];
                        let state = op.record.snapshot();
                        OpReport {
                            name: op.name.clone(),
                            status: state.status,
                            executed: state.executed,
                            error: state.error,
                            fatal: op.fatal,
                            background: op.background,
                        }
                    })
                    .collect()
            })
            .collect())
    }

    /// Current runtime state of `name`, or `None` for an unknown operation.
    pub fn state(&self, name: &str) -> Option<OpState> {
        let &idx = self.index.get(name)?;
        Some(self.ops[idx].record.snapshot())
    }

    pub(crate) fn plan(&self) -> Result<Plan> {
        layers::plan(&self.ops, self.options.enable_init)
    }

    pub(crate) fn operations(&self) -> &[Operation] {
        &self.ops
    }

    pub(crate) fn next_run_id(&self) -> u64 {
        self.run_counter.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub(crate) fn run_lock(&self) -> &Mutex<()> {
        &self.run_lock
    }
}

fn check_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(StagedagError::EmptyName);
    }
    Ok(())
}

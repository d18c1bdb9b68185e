// src/dag/operation.rs

//! Operation definitions: callbacks, dependency strengths and flags.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;

use crate::dag::state::StateRecord;
use crate::types::OpName;

/// A unit of work attached to an operation.
///
/// Callbacks receive the run's cancellation token and are expected to honour
/// it cooperatively; the engine never aborts a running callback.
pub type Callback =
    Arc<dyn Fn(CancellationToken) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

/// Wrap an async closure into a [`Callback`].
pub fn callback<F, Fut>(f: F) -> Callback
where
    F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(move |token| f(token).boxed())
}

/// Strength of a dependency edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strength {
    /// A failed or skipped dependency skips the dependent.
    Mandatory,
    /// The dependency is waited for, but its outcome is ignored.
    Advisory,
}

impl Strength {
    /// Combine two declarations of the same edge. Advisory always wins.
    pub fn merge(self, other: Strength) -> Strength {
        if self == Strength::Advisory || other == Strength::Advisory {
            Strength::Advisory
        } else {
            Strength::Mandatory
        }
    }
}

/// Declaration passed to [`Graph::add`](crate::dag::Graph::add).
///
/// ```ignore
/// graph.add(
///     "network",
///     OpOptions::new()
///         .callback(bring_up_links)
///         .depends_on(["mounts"])
///         .weak_depends_on(["hostname"])
///         .fatal(),
/// )?;
/// ```
#[derive(Clone, Default)]
pub struct OpOptions {
    pub(crate) callbacks: Vec<Callback>,
    pub(crate) deps: Vec<(OpName, Strength)>,
    pub(crate) all_weak: bool,
    pub(crate) fatal: bool,
    pub(crate) background: bool,
}

impl fmt::Debug for OpOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpOptions")
            .field("callbacks", &self.callbacks.len())
            .field("deps", &self.deps)
            .field("all_weak", &self.all_weak)
            .field("fatal", &self.fatal)
            .field("background", &self.background)
            .finish()
    }
}

impl OpOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach one more callback. All callbacks of an operation run
    /// concurrently.
    pub fn callback(mut self, cb: Callback) -> Self {
        self.callbacks.push(cb);
        self
    }

    pub fn callbacks(mut self, cbs: impl IntoIterator<Item = Callback>) -> Self {
        self.callbacks.extend(cbs);
        self
    }

    /// Mandatory dependencies.
    pub fn depends_on<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OpName>,
    {
        self.deps
            .extend(names.into_iter().map(|n| (n.into(), Strength::Mandatory)));
        self
    }

    /// Advisory dependencies. An advisory declaration overrides a mandatory
    /// one for the same name.
    pub fn weak_depends_on<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OpName>,
    {
        self.deps
            .extend(names.into_iter().map(|n| (n.into(), Strength::Advisory)));
        self
    }

    /// Treat every dependency of this operation as advisory.
    pub fn weak_deps(mut self) -> Self {
        self.all_weak = true;
        self
    }

    /// Surface this operation's failure in the run's aggregated error.
    pub fn fatal(mut self) -> Self {
        self.fatal = true;
        self
    }

    /// Launch without blocking dependents or the end of the run.
    pub fn background(mut self) -> Self {
        self.background = true;
        self
    }
}

/// Registered operation inside the graph arena.
pub(crate) struct Operation {
    pub(crate) name: OpName,
    pub(crate) callbacks: Vec<Callback>,
    /// Dependency index -> declared strength.
    pub(crate) deps: BTreeMap<usize, Strength>,
    pub(crate) all_weak: bool,
    pub(crate) fatal: bool,
    pub(crate) background: bool,
    pub(crate) record: Arc<StateRecord>,
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation")
            .field("name", &self.name)
            .field("callbacks", &self.callbacks.len())
            .field("deps", &self.deps)
            .field("all_weak", &self.all_weak)
            .field("fatal", &self.fatal)
            .field("background", &self.background)
            .finish_non_exhaustive()
    }
}

impl Operation {
    /// An operation known only by name (e.g. referenced as a dependency
    /// before being added).
    pub(crate) fn placeholder(name: OpName) -> Self {
        Self {
            name,
            callbacks: Vec::new(),
            deps: BTreeMap::new(),
            all_weak: false,
            fatal: false,
            background: false,
            record: Arc::new(StateRecord::default()),
        }
    }

    pub(crate) fn add_dependency(&mut self, dep: usize, strength: Strength) {
        self.deps
            .entry(dep)
            .and_modify(|s| *s = s.merge(strength))
            .or_insert(strength);
    }

    /// Dependencies with `all_weak` applied.
    pub(crate) fn effective_deps(&self) -> impl Iterator<Item = (usize, Strength)> + '_ {
        self.deps.iter().map(|(&dep, &strength)| {
            if self.all_weak {
                (dep, Strength::Advisory)
            } else {
                (dep, strength)
            }
        })
    }
}

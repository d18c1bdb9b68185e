// src/dag/layers.rs

//! Bottom-up layering of the operation graph.
//!
//! Layer `k` holds exactly the operations whose longest dependency chain has
//! length `k`: layer 0 has no dependencies, and every operation sits one
//! layer above its deepest dependency. Operations inside a layer are
//! independent of each other and may run concurrently.

use petgraph::Direction;
use petgraph::algo::{tarjan_scc, toposort};
use petgraph::graph::{DiGraph, NodeIndex};

use crate::dag::operation::Operation;
use crate::errors::{Result, StagedagError};

/// Structural execution plan derived from the registry.
#[derive(Debug, Clone)]
pub(crate) struct Plan {
    /// Arena indices, grouped by dependency depth.
    pub(crate) layers: Vec<Vec<usize>>,
    /// Whether an operation is tied into the graph, either through an edge
    /// or through the implicit init root. Unanchored operations are skipped.
    pub(crate) anchored: Vec<bool>,
}

/// Compute the layering of `ops`.
///
/// With `enable_init`, every isolated operation gets an implicit dependency
/// on an always-satisfied init root, which anchors it without moving it out
/// of layer 0.
pub(crate) fn plan(ops: &[Operation], enable_init: bool) -> Result<Plan> {
    // Edge direction: dependency -> dependent, so a topological order lists
    // dependencies first.
    let mut graph: DiGraph<(), ()> = DiGraph::with_capacity(ops.len(), ops.len());
    for _ in ops {
        graph.add_node(());
    }
    for (idx, op) in ops.iter().enumerate() {
        for &dep in op.deps.keys() {
            graph.add_edge(NodeIndex::new(dep), NodeIndex::new(idx), ());
        }
    }

    let order = match toposort(&graph, None) {
        Ok(order) => order,
        Err(cycle) => return Err(cycle_error(ops, &graph, cycle.node_id())),
    };

    let mut depth = vec![0usize; ops.len()];
    for node in &order {
        depth[node.index()] = graph
            .neighbors_directed(*node, Direction::Incoming)
            .map(|dep| depth[dep.index()] + 1)
            .max()
            .unwrap_or(0);
    }

    let height = depth.iter().copied().max().map_or(0, |d| d + 1);
    let mut layers: Vec<Vec<usize>> = vec![Vec::new(); height];
    for (idx, &d) in depth.iter().enumerate() {
        layers[d].push(idx);
    }

    let anchored = (0..ops.len())
        .map(|idx| {
            let node = NodeIndex::new(idx);
            let isolated = graph
                .neighbors_directed(node, Direction::Incoming)
                .next()
                .is_none()
                && graph
                    .neighbors_directed(node, Direction::Outgoing)
                    .next()
                    .is_none();
            enable_init || !isolated
        })
        .collect();

    Ok(Plan { layers, anchored })
}

/// Build a [`StagedagError::DagCycle`] naming every member of the strongly
/// connected component that contains `culprit`.
fn cycle_error(ops: &[Operation], graph: &DiGraph<(), ()>, culprit: NodeIndex) -> StagedagError {
    let sccs = tarjan_scc(graph);
    let cyclic = |scc: &&Vec<NodeIndex>| scc.len() > 1 || graph.contains_edge(scc[0], scc[0]);
    let component = sccs
        .iter()
        .filter(cyclic)
        .find(|scc| scc.contains(&culprit))
        .or_else(|| sccs.iter().find(cyclic))
        .cloned()
        .unwrap_or_else(|| vec![culprit]);

    let mut names: Vec<String> = component
        .iter()
        .map(|node| ops[node.index()].name.clone())
        .collect();
    names.sort();
    StagedagError::DagCycle(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dag::operation::Strength;

    fn ops(names: &[&str], edges: &[(usize, usize)]) -> Vec<Operation> {
        let mut ops: Vec<Operation> = names
            .iter()
            .map(|n| Operation::placeholder(n.to_string()))
            .collect();
        for &(from, to) in edges {
            ops[from].add_dependency(to, Strength::Mandatory);
        }
        ops
    }

    #[test]
    fn depth_is_longest_chain_not_shortest() {
        // a -> b -> c and a -> c: a must land above b, not next to it.
        let ops = ops(&["a", "b", "c"], &[(0, 1), (1, 2), (0, 2)]);
        let plan = plan(&ops, false).unwrap();
        assert_eq!(plan.layers, vec![vec![2], vec![1], vec![0]]);
    }

    #[test]
    fn isolated_nodes_are_anchored_only_with_init() {
        let ops = ops(&["lonely", "a", "b"], &[(1, 2)]);

        let plan_without = plan(&ops, false).unwrap();
        assert_eq!(plan_without.anchored, vec![false, true, true]);

        let plan_with = plan(&ops, true).unwrap();
        assert_eq!(plan_with.anchored, vec![true, true, true]);
        assert_eq!(plan_with.layers[0], vec![0, 2]);
    }

    #[test]
    fn cycle_reports_every_participant() {
        let ops = ops(&["a", "b", "c", "d"], &[(0, 1), (1, 2), (2, 0), (3, 0)]);
        match plan(&ops, false) {
            Err(StagedagError::DagCycle(names)) => {
                assert_eq!(names, vec!["a", "b", "c"]);
            }
            other => panic!("expected DagCycle, got {other:?}"),
        }
    }

    #[test]
    fn empty_graph_has_no_layers() {
        let plan = plan(&[], true).unwrap();
        assert!(plan.layers.is_empty());
        assert!(plan.anchored.is_empty());
    }
}

//! Solver-free graph algorithms.
//!
//! Everything here is built on one primitive: Kahn levelling, which repeatedly removes every
//! node whose residual in-degree is zero, one round at a time. A graph is acyclic exactly when
//! levelling consumes every node; the nodes it cannot consume lie on or behind a cycle.

use crate::{GraphError, GraphModel, NodeId, Result};
use rustc_hash::FxHashMap as HashMap;

/// Kahn rounds: `levels[i]` holds the nodes removed in round `i`, ascending.
///
/// Fails with [`GraphError::Cyclic`] listing the nodes with positive residual in-degree.
pub fn topological_levels(g: &GraphModel) -> Result<Vec<Vec<NodeId>>> {
    let mut indegree: HashMap<NodeId, usize> = HashMap::default();
    for &v in g.nodes() {
        indegree.insert(v, g.in_degree(v));
    }

    let mut current: Vec<NodeId> = g
        .nodes()
        .iter()
        .copied()
        .filter(|&v| g.in_degree(v) == 0)
        .collect();
    let mut levels: Vec<Vec<NodeId>> = Vec::new();
    let mut consumed = 0usize;

    while !current.is_empty() {
        let mut next: Vec<NodeId> = Vec::new();
        for &v in &current {
            for w in g.successors(v) {
                if let Some(d) = indegree.get_mut(&w) {
                    *d -= 1;
                    if *d == 0 {
                        next.push(w);
                    }
                }
            }
        }
        consumed += current.len();
        next.sort_unstable();
        levels.push(std::mem::replace(&mut current, next));
    }

    if consumed < g.node_count() {
        let mut residual: Vec<NodeId> = indegree
            .into_iter()
            .filter(|&(_, d)| d > 0)
            .map(|(v, _)| v)
            .collect();
        residual.sort_unstable();
        return Err(GraphError::Cyclic { residual });
    }
    Ok(levels)
}

/// Length, in edges, of the longest path of an acyclic graph.
///
/// `0` for a graph without edges (and for the empty graph).
pub fn longest_path(g: &GraphModel) -> Result<usize> {
    let levels = topological_levels(g)?;
    Ok(levels.len().saturating_sub(1))
}

/// Longest path where each edge counts for its minimum span instead of `1`.
///
/// This is the smallest top layer any valid layering of `g` can reach, and equals
/// [`longest_path`] when no edge carries a minimum span above the default.
pub fn longest_min_span_path(g: &GraphModel) -> Result<u64> {
    let levels = topological_levels(g)?;
    let mut dist: HashMap<NodeId, u64> = HashMap::default();
    let mut best = 0u64;
    for v in levels.into_iter().flatten() {
        let d = g
            .in_edges(v)
            .map(|e| dist.get(&e.u).copied().unwrap_or(0) + u64::from(g.min_span(e)))
            .max()
            .unwrap_or(0);
        best = best.max(d);
        dist.insert(v, d);
    }
    Ok(best)
}

pub fn is_acyclic(g: &GraphModel) -> bool {
    topological_levels(g).is_ok()
}

/// Nodes that Kahn levelling cannot consume; empty for an acyclic graph.
pub fn residual_nodes(g: &GraphModel) -> Vec<NodeId> {
    match topological_levels(g) {
        Ok(_) => Vec::new(),
        Err(GraphError::Cyclic { residual }) => residual,
        Err(_) => Vec::new(),
    }
}

//! Break cycles by dropping DFS back edges.
//!
//! Traversal starts from every unvisited node in ascending id order and follows successors in
//! ascending id order, so the feedback set is a function of the graph alone. The search keeps an
//! explicit stack of `(node, next successor)` frames; an edge into a node still on that stack is
//! a back edge. The result is acyclic but the removed set is not minimal.

use rustc_hash::FxHashMap as HashMap;
use strata_graph::{Edge, GraphModel, NodeId};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    OnPath,
    Done,
}

/// Back edges found by the traversal, in discovery order.
pub fn feedback_edges(g: &GraphModel) -> Vec<Edge> {
    let nodes = g.nodes();
    let index: HashMap<NodeId, usize> = nodes.iter().enumerate().map(|(i, &v)| (v, i)).collect();
    let succ: Vec<Vec<usize>> = nodes
        .iter()
        .map(|&v| g.successors(v).filter_map(|w| index.get(&w).copied()).collect())
        .collect();

    let mut mark = vec![Mark::Unvisited; nodes.len()];
    let mut stack: Vec<(usize, usize)> = Vec::new();
    let mut fas: Vec<Edge> = Vec::new();

    for root in 0..nodes.len() {
        if mark[root] != Mark::Unvisited {
            continue;
        }
        mark[root] = Mark::OnPath;
        stack.push((root, 0));

        while let Some(frame) = stack.last_mut() {
            let (v, pos) = *frame;
            let Some(&w) = succ[v].get(pos) else {
                mark[v] = Mark::Done;
                stack.pop();
                continue;
            };
            frame.1 += 1;
            match mark[w] {
                Mark::Unvisited => {
                    mark[w] = Mark::OnPath;
                    stack.push((w, 0));
                }
                Mark::OnPath => fas.push(Edge::new(nodes[v], nodes[w])),
                Mark::Done => {}
            }
        }
    }
    fas
}

/// `g` without its feedback edges, plus the dropped edges in ascending order.
pub fn remove_cycles(g: &GraphModel) -> (GraphModel, Vec<Edge>) {
    let mut fas = feedback_edges(g);
    if fas.is_empty() {
        return (g.clone(), fas);
    }
    fas.sort_unstable();
    let acyclic = g.restrict_edges(|e| fas.binary_search(&e).is_err());
    debug!(
        edges = g.edge_count(),
        removed = fas.len(),
        "feedback edges removed"
    );
    (acyclic, fas)
}

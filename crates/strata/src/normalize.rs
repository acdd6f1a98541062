//! Subdivide long edges by inserting dummy nodes.
//!
//! Every edge whose endpoints are more than one layer apart is replaced by a chain of unit-span
//! edges through fresh nodes, one per intermediate layer. Chains run from `u` toward `v`, so an
//! edge pointing to a lower layer (a torus wrap edge) walks down one layer at a time. Dummy ids
//! start right after the largest existing id and grow in edge order.

use crate::rank::LayerAssignment;
use crate::{Error, Result};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use strata_graph::{Edge, GraphModel, NodeId};
use tracing::debug;

/// The dummy nodes standing in for one long edge, from the `u` end to the `v` end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DummyChain {
    pub edge: Edge,
    pub nodes: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub struct NormalizedGraph {
    /// `V'` and `A'`. Chain edges carry the default weight and minimum span.
    pub graph: GraphModel,
    /// Layers of `V'`.
    pub assignment: LayerAssignment,
    pub chains: Vec<DummyChain>,
    first_dummy: NodeId,
}

impl NormalizedGraph {
    pub fn is_dummy(&self, v: NodeId) -> bool {
        v >= self.first_dummy && self.graph.has_node(v)
    }

    pub fn dummy_count(&self) -> usize {
        self.chains.iter().map(|c| c.nodes.len()).sum()
    }
}

/// Splits every edge of `g` spanning more than one layer under `assignment`.
///
/// Fails with [`Error::InvalidLayering`] when a node has no layer or an edge joins two nodes of
/// the same layer.
pub fn insert_dummy_nodes(g: &GraphModel, assignment: &LayerAssignment) -> Result<NormalizedGraph> {
    let mut ranks: BTreeMap<NodeId, u32> = BTreeMap::new();
    for &v in g.nodes() {
        let r = assignment.rank(v).ok_or_else(|| Error::InvalidLayering {
            message: format!("node {v} has no layer"),
        })?;
        ranks.insert(v, r);
    }

    let first_dummy = g.max_node_id().map_or(0, |m| m + 1);
    let mut next_id = first_dummy;
    let mut nodes: Vec<NodeId> = g.nodes().to_vec();
    let mut edges: Vec<Edge> = Vec::with_capacity(g.edge_count());
    let mut wraps: BTreeSet<Edge> = BTreeSet::new();
    let mut chains: Vec<DummyChain> = Vec::new();

    for e in g.edges() {
        let (ru, rv) = (i64::from(ranks[&e.u]), i64::from(ranks[&e.v]));
        let wrap = assignment.is_wrap(e);
        match (rv - ru).abs() {
            0 => {
                return Err(Error::InvalidLayering {
                    message: format!("edge {e} joins two nodes of layer {ru}"),
                });
            }
            1 => {
                edges.push(e);
                if wrap {
                    wraps.insert(e);
                }
            }
            _ => {
                let step = (rv - ru).signum();
                let mut chain = Vec::new();
                let mut prev = e.u;
                let mut r = ru + step;
                while r != rv {
                    let d = next_id;
                    next_id += 1;
                    nodes.push(d);
                    ranks.insert(d, r as u32);
                    chain.push(d);
                    let link = Edge::new(prev, d);
                    edges.push(link);
                    if wrap {
                        wraps.insert(link);
                    }
                    prev = d;
                    r += step;
                }
                let last = Edge::new(prev, e.v);
                edges.push(last);
                if wrap {
                    wraps.insert(last);
                }
                chains.push(DummyChain {
                    edge: e,
                    nodes: chain,
                });
            }
        }
    }

    let kept: BTreeSet<Edge> = edges.iter().copied().collect();
    let mut b = GraphModel::builder().nodes(nodes).edges(edges);
    for (e, w) in g.weights().iter() {
        if kept.contains(&e) {
            b = b.weight(e, w);
        }
    }
    for (e, lam) in g.min_spans().iter() {
        if kept.contains(&e) {
            b = b.min_span(e, i64::from(lam));
        }
    }
    let graph = b.build()?;

    let out = NormalizedGraph {
        graph,
        assignment: LayerAssignment::new(ranks).with_wrap_edges(wraps),
        chains,
        first_dummy,
    };
    debug!(
        long_edges = out.chains.len(),
        dummies = out.dummy_count(),
        "long edges subdivided"
    );
    Ok(out)
}

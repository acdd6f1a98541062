//! Crossing reduction: order the nodes of each layer to minimize weighted edge crossings.
//!
//! Every edge must join adjacent layers; run
//! [`insert_dummy_nodes`](crate::normalize::insert_dummy_nodes) first. A layering without
//! inter-layer edges is returned as is, each layer in ascending id order.

mod cross_count;
mod pairwise;

pub use cross_count::cross_count;

use crate::rank::LayerAssignment;
use crate::solver::SolverSession;
use crate::{Error, Result};
use pairwise::LayerEdge;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use strata_graph::{Edge, GraphModel, NodeId};
use tracing::{debug, info, warn};

/// The left-to-right order of every layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LayerOrder {
    layers: BTreeMap<u32, Vec<NodeId>>,
    /// Weighted crossing count of this order.
    crossings: f64,
    /// Whether the crossing model was solved; `false` when there was nothing to order.
    optimized: bool,
    #[serde(skip)]
    before: BTreeSet<(NodeId, NodeId)>,
    #[serde(skip)]
    crossing_pairs: BTreeSet<(Edge, Edge)>,
}

impl LayerOrder {
    pub fn layers(&self) -> &BTreeMap<u32, Vec<NodeId>> {
        &self.layers
    }

    pub fn layer(&self, k: u32) -> &[NodeId] {
        self.layers.get(&k).map_or(&[], Vec::as_slice)
    }

    pub fn crossings(&self) -> f64 {
        self.crossings
    }

    pub fn is_optimized(&self) -> bool {
        self.optimized
    }

    /// The order relation read from the model: `a` is placed left of `b`.
    pub fn precedes(&self, a: NodeId, b: NodeId) -> bool {
        self.before.contains(&(a, b))
    }

    /// Edge pairs whose crossing indicator is set, each pair in ascending order.
    pub fn crossing_pairs(&self) -> &BTreeSet<(Edge, Edge)> {
        &self.crossing_pairs
    }

    /// Layers `0..=max` as a dense list; missing layers are empty.
    pub fn to_dense(&self) -> Vec<Vec<NodeId>> {
        let Some(&max) = self.layers.keys().next_back() else {
            return Vec::new();
        };
        (0..=max).map(|k| self.layer(k).to_vec()).collect()
    }
}

/// Orders every layer of `assignment` over the unit-span graph `g`.
pub fn reduce_crossings(
    session: &SolverSession,
    g: &GraphModel,
    assignment: &LayerAssignment,
) -> Result<LayerOrder> {
    let mut layers: BTreeMap<u32, Vec<NodeId>> = BTreeMap::new();
    for &v in g.nodes() {
        let k = assignment.rank(v).ok_or_else(|| Error::InvalidLayering {
            message: format!("node {v} has no layer"),
        })?;
        layers.entry(k).or_default().push(v);
    }

    let mut between: BTreeMap<u32, Vec<LayerEdge>> = BTreeMap::new();
    for e in g.edges() {
        let (ru, rv) = (assignment.rank(e.u), assignment.rank(e.v));
        let (Some(ru), Some(rv)) = (ru, rv) else {
            continue;
        };
        let oriented = if rv == ru + 1 {
            (ru, e.u, e.v)
        } else if ru == rv + 1 {
            (rv, e.v, e.u)
        } else {
            return Err(Error::InvalidLayering {
                message: format!(
                    "edge {e} spans layers {ru} and {rv}; subdivide long edges before ordering"
                ),
            });
        };
        between.entry(oriented.0).or_default().push(LayerEdge {
            edge: e,
            north: oriented.1,
            south: oriented.2,
            weight: g.weight(e),
        });
    }

    if between.is_empty() {
        debug!("no inter-layer edges; crossing reduction skipped");
        let before = layers
            .values()
            .flat_map(|nodes| {
                nodes.iter().enumerate().flat_map(move |(i, &a)| {
                    nodes[i + 1..].iter().map(move |&b| (a, b))
                })
            })
            .collect();
        return Ok(LayerOrder {
            layers,
            crossings: 0.0,
            optimized: false,
            before,
            crossing_pairs: BTreeSet::new(),
        });
    }

    let solved = pairwise::solve(session, &layers, &between)?;
    let mut out = LayerOrder {
        layers: pairwise::order_by_wins(&layers, &solved.before),
        crossings: 0.0,
        optimized: true,
        before: solved.before,
        crossing_pairs: solved.crossing,
    };
    out.crossings = cross_count(g, &out.to_dense());
    if (out.crossings - solved.objective).abs() > 1e-6 {
        warn!(
            counted = out.crossings,
            model = solved.objective,
            "crossing count disagrees with the crossing model"
        );
    }
    info!(
        layers = out.layers.len(),
        crossings = out.crossings,
        "crossings reduced"
    );
    Ok(out)
}

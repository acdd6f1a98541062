//! JSON interchange format.
//!
//! ```json
//! {
//!   "nodes": [0, 1, 2],
//!   "edges": [[0, 1], [1, 2]],
//!   "weights": [[0, 1, 2.5]],
//!   "min_spans": [[1, 2, 2]]
//! }
//! ```
//!
//! `nodes` may be omitted, in which case the node set is `0..=max endpoint`.

use crate::{Edge, GraphModel, NodeId, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nodes: Option<Vec<NodeId>>,
    #[serde(default)]
    pub edges: Vec<Edge>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub weights: Vec<(NodeId, NodeId, f64)>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub min_spans: Vec<(NodeId, NodeId, i64)>,
}

impl GraphInput {
    pub fn into_model(self) -> Result<GraphModel> {
        let nodes: Vec<NodeId> = match self.nodes {
            Some(nodes) => nodes,
            None => {
                let max = self.edges.iter().map(|e| e.u.max(e.v)).max();
                max.map(|m| (0..=m).collect()).unwrap_or_default()
            }
        };

        let mut b = GraphModel::builder().nodes(nodes).edges(self.edges);
        for (u, v, w) in self.weights {
            b = b.weight((u, v), w);
        }
        for (u, v, lam) in self.min_spans {
            b = b.min_span((u, v), lam);
        }
        b.build()
    }
}

impl From<&GraphModel> for GraphInput {
    fn from(g: &GraphModel) -> Self {
        Self {
            nodes: Some(g.nodes().to_vec()),
            edges: g.edges().collect(),
            weights: g.weights().iter().map(|(e, w)| (e.u, e.v, w)).collect(),
            min_spans: g
                .min_spans()
                .iter()
                .map(|(e, s)| (e.u, e.v, i64::from(s)))
                .collect(),
        }
    }
}

//! The validated graph container.
//!
//! Nodes are kept sorted by id and edges in insertion order. Adjacency is materialized once, at
//! construction, as offset tables over edge indices so traversal queries are O(degree) and
//! always visit neighbours in ascending node id.

use crate::alg;
use crate::{DEFAULT_MIN_SPAN, DEFAULT_WEIGHT, Edge, EdgeMap, GraphError, NodeId, Result};
use rustc_hash::FxBuildHasher;
use serde::Serialize;

type HashMap<K, V> = hashbrown::HashMap<K, V, FxBuildHasher>;

#[derive(Debug, Clone)]
struct EdgeEntry {
    edge: Edge,
    u_ix: usize,
    v_ix: usize,
}

#[derive(Debug, Clone, Default)]
struct DirectedAdjCache {
    out_offsets: Vec<usize>,
    out_edges: Vec<usize>,
    in_offsets: Vec<usize>,
    in_edges: Vec<usize>,
}

impl DirectedAdjCache {
    fn build(node_count: usize, edges: &[EdgeEntry]) -> Self {
        let mut out_offsets = vec![0usize; node_count + 1];
        let mut in_offsets = vec![0usize; node_count + 1];
        for e in edges {
            out_offsets[e.u_ix + 1] += 1;
            in_offsets[e.v_ix + 1] += 1;
        }
        for i in 0..node_count {
            out_offsets[i + 1] += out_offsets[i];
            in_offsets[i + 1] += in_offsets[i];
        }

        let mut out_edges = vec![0usize; edges.len()];
        let mut in_edges = vec![0usize; edges.len()];
        let mut out_fill = out_offsets.clone();
        let mut in_fill = in_offsets.clone();
        for (ei, e) in edges.iter().enumerate() {
            out_edges[out_fill[e.u_ix]] = ei;
            out_fill[e.u_ix] += 1;
            in_edges[in_fill[e.v_ix]] = ei;
            in_fill[e.v_ix] += 1;
        }

        for ix in 0..node_count {
            out_edges[out_offsets[ix]..out_offsets[ix + 1]].sort_by_key(|&ei| edges[ei].v_ix);
            in_edges[in_offsets[ix]..in_offsets[ix + 1]].sort_by_key(|&ei| edges[ei].u_ix);
        }

        Self {
            out_offsets,
            out_edges,
            in_offsets,
            in_edges,
        }
    }

    fn out_edges(&self, ix: usize) -> &[usize] {
        &self.out_edges[self.out_offsets[ix]..self.out_offsets[ix + 1]]
    }

    fn in_edges(&self, ix: usize) -> &[usize] {
        &self.in_edges[self.in_offsets[ix]..self.in_offsets[ix + 1]]
    }
}

/// Builder for [`GraphModel`]; all validation happens in [`GraphBuilder::build`].
#[derive(Debug, Clone, Default)]
pub struct GraphBuilder {
    nodes: Vec<NodeId>,
    edges: Vec<Edge>,
    weights: Vec<(Edge, f64)>,
    min_spans: Vec<(Edge, i64)>,
}

impl GraphBuilder {
    pub fn node(mut self, v: NodeId) -> Self {
        self.nodes.push(v);
        self
    }

    pub fn nodes(mut self, nodes: impl IntoIterator<Item = NodeId>) -> Self {
        self.nodes.extend(nodes);
        self
    }

    pub fn edge(mut self, u: NodeId, v: NodeId) -> Self {
        self.edges.push(Edge::new(u, v));
        self
    }

    pub fn edges<E: Into<Edge>>(mut self, edges: impl IntoIterator<Item = E>) -> Self {
        self.edges.extend(edges.into_iter().map(Into::into));
        self
    }

    pub fn weight(mut self, edge: impl Into<Edge>, weight: f64) -> Self {
        self.weights.push((edge.into(), weight));
        self
    }

    pub fn min_span(mut self, edge: impl Into<Edge>, min_span: i64) -> Self {
        self.min_spans.push((edge.into(), min_span));
        self
    }

    pub fn build(self) -> Result<GraphModel> {
        let mut nodes = self.nodes;
        nodes.sort_unstable();
        nodes.dedup();

        let mut node_index: HashMap<NodeId, usize> = HashMap::default();
        for (ix, &v) in nodes.iter().enumerate() {
            node_index.insert(v, ix);
        }

        let mut edge_index: HashMap<Edge, usize> = HashMap::default();
        let mut edges: Vec<EdgeEntry> = Vec::with_capacity(self.edges.len());
        for edge in self.edges {
            if edge.u == edge.v {
                return Err(GraphError::SelfLoop { node: edge.u });
            }
            let Some(&u_ix) = node_index.get(&edge.u) else {
                return Err(GraphError::UnknownNode { edge, node: edge.u });
            };
            let Some(&v_ix) = node_index.get(&edge.v) else {
                return Err(GraphError::UnknownNode { edge, node: edge.v });
            };
            // Duplicates collapse onto the first occurrence.
            if edge_index.contains_key(&edge) {
                continue;
            }
            edge_index.insert(edge, edges.len());
            edges.push(EdgeEntry { edge, u_ix, v_ix });
        }

        let mut weights = EdgeMap::new(DEFAULT_WEIGHT);
        for (edge, value) in self.weights {
            if !edge_index.contains_key(&edge) {
                return Err(GraphError::UnknownEdge { edge });
            }
            if !(value.is_finite() && value > 0.0) {
                return Err(GraphError::InvalidWeight { edge, value });
            }
            weights.insert(edge, value);
        }

        let mut min_spans = EdgeMap::new(DEFAULT_MIN_SPAN);
        for (edge, value) in self.min_spans {
            if !edge_index.contains_key(&edge) {
                return Err(GraphError::UnknownEdge { edge });
            }
            let span = u32::try_from(value)
                .ok()
                .filter(|&s| s >= 1)
                .ok_or(GraphError::InvalidMinSpan { edge, value })?;
            min_spans.insert(edge, span);
        }

        let adj = DirectedAdjCache::build(nodes.len(), &edges);
        Ok(GraphModel {
            nodes,
            node_index,
            edges,
            edge_index,
            weights,
            min_spans,
            adj,
        })
    }
}

/// Node set `V`, edge set `A`, weights `w` and minimum spans `lam`.
#[derive(Debug, Clone)]
pub struct GraphModel {
    nodes: Vec<NodeId>,
    node_index: HashMap<NodeId, usize>,
    edges: Vec<EdgeEntry>,
    edge_index: HashMap<Edge, usize>,
    weights: EdgeMap<f64>,
    min_spans: EdgeMap<u32>,
    adj: DirectedAdjCache,
}

impl GraphModel {
    pub fn builder() -> GraphBuilder {
        GraphBuilder::default()
    }

    pub fn new<E: Into<Edge>>(
        nodes: impl IntoIterator<Item = NodeId>,
        edges: impl IntoIterator<Item = E>,
    ) -> Result<Self> {
        Self::builder().nodes(nodes).edges(edges).build()
    }

    /// Returns a builder pre-filled with this graph, for extending it.
    pub fn to_builder(&self) -> GraphBuilder {
        GraphBuilder {
            nodes: self.nodes.clone(),
            edges: self.edges().collect(),
            weights: self.weights.iter().collect(),
            min_spans: self
                .min_spans
                .iter()
                .map(|(e, s)| (e, i64::from(s)))
                .collect(),
        }
    }

    /// The same node set restricted to the edges accepted by `keep`; weight and minimum-span
    /// entries of dropped edges are dropped with them.
    pub fn restrict_edges(&self, mut keep: impl FnMut(Edge) -> bool) -> Self {
        let edges: Vec<EdgeEntry> = self
            .edges
            .iter()
            .filter(|e| keep(e.edge))
            .cloned()
            .collect();
        let mut edge_index: HashMap<Edge, usize> = HashMap::default();
        for (ix, e) in edges.iter().enumerate() {
            edge_index.insert(e.edge, ix);
        }
        let mut weights = self.weights.clone();
        weights.retain(|e| edge_index.contains_key(&e));
        let mut min_spans = self.min_spans.clone();
        min_spans.retain(|e| edge_index.contains_key(&e));

        let adj = DirectedAdjCache::build(self.nodes.len(), &edges);
        Self {
            nodes: self.nodes.clone(),
            node_index: self.node_index.clone(),
            edges,
            edge_index,
            weights,
            min_spans,
            adj,
        }
    }

    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    pub fn edges(&self) -> impl ExactSizeIterator<Item = Edge> + '_ {
        self.edges.iter().map(|e| e.edge)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn has_node(&self, v: NodeId) -> bool {
        self.node_index.contains_key(&v)
    }

    pub fn has_edge(&self, edge: Edge) -> bool {
        self.edge_index.contains_key(&edge)
    }

    pub fn max_node_id(&self) -> Option<NodeId> {
        self.nodes.last().copied()
    }

    pub fn weight(&self, edge: Edge) -> f64 {
        self.weights.get(edge)
    }

    pub fn min_span(&self, edge: Edge) -> u32 {
        self.min_spans.get(edge)
    }

    pub fn weights(&self) -> &EdgeMap<f64> {
        &self.weights
    }

    pub fn min_spans(&self) -> &EdgeMap<u32> {
        &self.min_spans
    }

    pub fn out_edges(&self, v: NodeId) -> impl Iterator<Item = Edge> + '_ {
        let ix = self.node_index.get(&v).copied();
        ix.into_iter()
            .flat_map(move |ix| self.adj.out_edges(ix).iter().map(move |&ei| self.edges[ei].edge))
    }

    pub fn in_edges(&self, v: NodeId) -> impl Iterator<Item = Edge> + '_ {
        let ix = self.node_index.get(&v).copied();
        ix.into_iter()
            .flat_map(move |ix| self.adj.in_edges(ix).iter().map(move |&ei| self.edges[ei].edge))
    }

    /// Successors of `v` in ascending id order.
    pub fn successors(&self, v: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.out_edges(v).map(|e| e.v)
    }

    /// Predecessors of `v` in ascending id order.
    pub fn predecessors(&self, v: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.in_edges(v).map(|e| e.u)
    }

    pub fn out_degree(&self, v: NodeId) -> usize {
        self.node_index
            .get(&v)
            .map_or(0, |&ix| self.adj.out_edges(ix).len())
    }

    pub fn in_degree(&self, v: NodeId) -> usize {
        self.node_index
            .get(&v)
            .map_or(0, |&ix| self.adj.in_edges(ix).len())
    }

    /// `V0`: nodes without incoming edges, ascending.
    pub fn sources(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .copied()
            .filter(|&v| self.in_degree(v) == 0)
            .collect()
    }

    /// `Vl`: nodes without outgoing edges, ascending.
    pub fn sinks(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .copied()
            .filter(|&v| self.out_degree(v) == 0)
            .collect()
    }

    /// Nodes with neither incoming nor outgoing edges.
    pub fn isolated(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .copied()
            .filter(|&v| self.in_degree(v) == 0 && self.out_degree(v) == 0)
            .collect()
    }

    pub fn summary(&self) -> GraphSummary {
        let longest_path = alg::longest_path(self).ok();
        GraphSummary {
            node_count: self.node_count(),
            edge_count: self.edge_count(),
            sources: self.sources(),
            sinks: self.sinks(),
            acyclic: longest_path.is_some(),
            longest_path,
        }
    }
}

/// Shape statistics of a graph, as printed by `strata-cli analyze`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphSummary {
    pub node_count: usize,
    pub edge_count: usize,
    pub sources: Vec<NodeId>,
    pub sinks: Vec<NodeId>,
    pub acyclic: bool,
    /// Longest path in edges; absent when the graph has a cycle.
    pub longest_path: Option<usize>,
}

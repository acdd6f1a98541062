//! Edge keys and sparse edge-keyed maps.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Opaque node identifier.
pub type NodeId = usize;

/// A directed edge `u -> v`.
///
/// Serialized as a two-element array `[u, v]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "(NodeId, NodeId)", into = "(NodeId, NodeId)")]
pub struct Edge {
    pub u: NodeId,
    pub v: NodeId,
}

impl Edge {
    pub const fn new(u: NodeId, v: NodeId) -> Self {
        Self { u, v }
    }

    pub const fn reversed(self) -> Self {
        Self {
            u: self.v,
            v: self.u,
        }
    }

    pub fn is_incident(&self, node: NodeId) -> bool {
        self.u == node || self.v == node
    }
}

impl From<(NodeId, NodeId)> for Edge {
    fn from((u, v): (NodeId, NodeId)) -> Self {
        Self { u, v }
    }
}

impl From<Edge> for (NodeId, NodeId) {
    fn from(e: Edge) -> Self {
        (e.u, e.v)
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.u, self.v)
    }
}

/// A sparse map from [`Edge`] to a value with a fixed fallback.
///
/// Lookups never fail: an edge without an entry reads as the map's default. Iteration only
/// visits explicit entries, in edge order.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeMap<T> {
    entries: BTreeMap<Edge, T>,
    default: T,
}

impl<T: Copy> EdgeMap<T> {
    pub fn new(default: T) -> Self {
        Self {
            entries: BTreeMap::new(),
            default,
        }
    }

    pub fn get(&self, edge: Edge) -> T {
        self.entries.get(&edge).copied().unwrap_or(self.default)
    }

    pub fn default_value(&self) -> T {
        self.default
    }

    pub fn insert(&mut self, edge: Edge, value: T) -> Option<T> {
        self.entries.insert(edge, value)
    }

    pub fn contains(&self, edge: Edge) -> bool {
        self.entries.contains_key(&edge)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Edge, T)> + '_ {
        self.entries.iter().map(|(e, v)| (*e, *v))
    }

    /// Keeps only the entries whose edge satisfies `keep`.
    pub fn retain(&mut self, mut keep: impl FnMut(Edge) -> bool) {
        self.entries.retain(|e, _| keep(*e));
    }
}

//! Layer assignment.
//!
//! Four MILP formulations share one skeleton (an integer layer `y[v] ≥ 0` per node) and differ
//! in objective and auxiliary variables:
//!
//! - [`Formulation::Difference`] (`P_G`): weighted span sum, acyclic input.
//! - [`Formulation::QuadraticSpan`] (`P_Q`): weighted squared spans between pinned boundaries.
//! - [`Formulation::FlowSelection`] (`P_L`): `P_Q` with one binary span choice per edge.
//! - [`Formulation::Torus`]: cyclic input, with wrap edges chosen by the solver.

pub mod difference;
pub mod flow_selection;
pub mod quadratic;
pub mod torus;
mod util;

use crate::Result;
use crate::solver::SolverSession;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use strata_graph::{Edge, GraphModel, NodeId};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TorusOptions {
    /// Weight of the top layer index.
    pub alpha: f64,
    /// Weight of the squared unrolled spans.
    pub beta: f64,
    /// Weight of each wrap edge.
    pub gamma: f64,
    /// Big-M constant; derived from the graph when absent.
    pub big_m: Option<u64>,
}

impl Default for TorusOptions {
    fn default() -> Self {
        Self {
            alpha: 100.0,
            beta: 1.0,
            gamma: 1000.0,
            big_m: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Formulation {
    #[default]
    Difference,
    QuadraticSpan,
    FlowSelection,
    Torus(TorusOptions),
}

impl Formulation {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Difference => "difference",
            Self::QuadraticSpan => "quadratic_span",
            Self::FlowSelection => "flow_selection",
            Self::Torus(_) => "torus",
        }
    }

    /// Whether the formulation needs an acyclic graph.
    pub fn requires_acyclic(&self) -> bool {
        !matches!(self, Self::Torus(_))
    }
}

impl fmt::Display for Formulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Formulation {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "difference" | "p_g" | "pg" => Ok(Self::Difference),
            "quadratic_span" | "quadratic" | "p_q" | "pq" => Ok(Self::QuadraticSpan),
            "flow_selection" | "flow" | "p_l" | "pl" => Ok(Self::FlowSelection),
            "torus" => Ok(Self::Torus(TorusOptions::default())),
            other => Err(format!(
                "unknown formulation `{other}` (expected difference, quadratic_span, flow_selection or torus)"
            )),
        }
    }
}

/// A layer per node, plus the edges drawn as wrap edges (torus layerings only).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LayerAssignment {
    ranks: BTreeMap<NodeId, u32>,
    wrap_edges: BTreeSet<Edge>,
}

impl LayerAssignment {
    pub fn new(ranks: BTreeMap<NodeId, u32>) -> Self {
        Self {
            ranks,
            wrap_edges: BTreeSet::new(),
        }
    }

    pub fn with_wrap_edges(mut self, wrap_edges: BTreeSet<Edge>) -> Self {
        self.wrap_edges = wrap_edges;
        self
    }

    /// Shifts every layer down so the lowest one is `0`. Spans are unchanged.
    pub fn rebased(mut self) -> Self {
        let min = self.ranks.values().copied().min().unwrap_or(0);
        if min > 0 {
            for r in self.ranks.values_mut() {
                *r -= min;
            }
        }
        self
    }

    pub fn rank(&self, v: NodeId) -> Option<u32> {
        self.ranks.get(&v).copied()
    }

    pub fn ranks(&self) -> &BTreeMap<NodeId, u32> {
        &self.ranks
    }

    pub fn wrap_edges(&self) -> &BTreeSet<Edge> {
        &self.wrap_edges
    }

    pub fn is_wrap(&self, e: Edge) -> bool {
        self.wrap_edges.contains(&e)
    }

    /// `y[v] - y[u]`, when both endpoints have a layer.
    pub fn span(&self, e: Edge) -> Option<i64> {
        Some(i64::from(self.rank(e.v)?) - i64::from(self.rank(e.u)?))
    }

    pub fn max_layer(&self) -> u32 {
        self.ranks.values().copied().max().unwrap_or(0)
    }

    /// Layer index to its nodes, ascending.
    pub fn layers(&self) -> BTreeMap<u32, Vec<NodeId>> {
        let mut out: BTreeMap<u32, Vec<NodeId>> = BTreeMap::new();
        for (&v, &r) in &self.ranks {
            out.entry(r).or_default().push(v);
        }
        out
    }
}

/// Runs `formulation` on `g`.
///
/// Acyclic formulations fail with [`crate::Error::CyclicGraph`] on a cyclic graph; an
/// infeasible model fails with [`crate::Error::Infeasible`].
pub fn assign_layers(
    session: &SolverSession,
    g: &GraphModel,
    formulation: &Formulation,
) -> Result<LayerAssignment> {
    if g.is_empty() {
        return Ok(LayerAssignment::default());
    }
    let assignment = match formulation {
        Formulation::Difference => difference::solve(session, g)?,
        Formulation::QuadraticSpan => quadratic::solve(session, g)?,
        Formulation::FlowSelection => flow_selection::solve(session, g)?,
        Formulation::Torus(options) => torus::solve(session, g, options)?,
    };
    info!(
        formulation = formulation.name(),
        nodes = g.node_count(),
        layers = assignment.max_layer() + 1,
        wraps = assignment.wrap_edges.len(),
        "layers assigned"
    );
    Ok(assignment)
}

/// Non-wrap edges with `y[v] - y[u] < lam(u, v)`, or with an endpoint missing a layer.
pub fn span_violations(g: &GraphModel, assignment: &LayerAssignment) -> Vec<Edge> {
    g.edges()
        .filter(|&e| !assignment.is_wrap(e))
        .filter(|&e| match assignment.span(e) {
            Some(span) => span < i64::from(g.min_span(e)),
            None => true,
        })
        .collect()
}

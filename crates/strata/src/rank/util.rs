//! Pieces shared by the layering formulations.

use crate::solver::{Domain, LinExpr, Model, Relation, Var};
use crate::{Error, Result};
use rustc_hash::FxHashMap as HashMap;
use std::collections::BTreeMap;
use strata_graph::{GraphModel, NodeId, alg};

/// One integer layer variable per node.
pub(crate) struct LayerVars {
    vars: HashMap<NodeId, Var>,
}

impl LayerVars {
    /// Adds `y[v] ∈ [0, upper]` for every node; `None` leaves `y` unbounded above.
    pub(crate) fn add(model: &mut Model<'_>, g: &GraphModel, upper: Option<u64>) -> Self {
        let hi = upper.map_or(f64::INFINITY, |u| u as f64);
        let vars = g
            .nodes()
            .iter()
            .map(|&v| {
                let var = model.add_var(format!("y_{v}"), Domain::Integer, 0.0, hi);
                (v, var)
            })
            .collect();
        Self { vars }
    }

    pub(crate) fn get(&self, v: NodeId) -> Var {
        self.vars[&v]
    }

    /// `y[v] - y[u]` for an edge `u -> v`.
    pub(crate) fn span(&self, u: NodeId, v: NodeId) -> LinExpr {
        self.get(v) - self.get(u)
    }

    pub(crate) fn read(&self, model: &Model<'_>, g: &GraphModel) -> Result<BTreeMap<NodeId, u32>> {
        g.nodes()
            .iter()
            .map(|&v| {
                let raw = model.int_value(self.get(v))?;
                let rank = u32::try_from(raw).map_err(|_| Error::Solver {
                    message: format!("layer of node {v} out of range: {raw}"),
                })?;
                Ok((v, rank))
            })
            .collect()
    }
}

/// `y[v] - y[u] >= lam(u, v)` for every edge.
pub(crate) fn add_span_constraints(model: &mut Model<'_>, g: &GraphModel, y: &LayerVars) {
    for e in g.edges() {
        model.add_constraint(
            format!("diff_{}_{}", e.u, e.v),
            y.span(e.u, e.v),
            Relation::Ge,
            f64::from(g.min_span(e)),
        );
    }
}

/// Pins sources to layer `0` and sinks to `top`. Isolated nodes are both; they go to `0`.
pub(crate) fn pin_boundary(model: &mut Model<'_>, g: &GraphModel, y: &LayerVars, top: u64) {
    for v in g.sources() {
        model.add_constraint(format!("source_{v}"), y.get(v), Relation::Eq, 0.0);
    }
    for v in g.sinks() {
        if g.in_degree(v) == 0 {
            continue;
        }
        model.add_constraint(format!("sink_{v}"), y.get(v), Relation::Eq, top as f64);
    }
}

/// Highest layer needed: the longest path with edges counted at their minimum span.
pub(crate) fn layer_bound(g: &GraphModel) -> Result<u64> {
    Ok(alg::longest_min_span_path(g)?)
}

pub(crate) fn ensure_acyclic(g: &GraphModel) -> Result<()> {
    alg::topological_levels(g)?;
    Ok(())
}

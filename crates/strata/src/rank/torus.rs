//! Layering on a torus: cycles are allowed, and each edge may be drawn as a wrap edge that
//! leaves the top of the drawing and re-enters at the bottom.
//!
//! ```text
//! min  α·L_max + β·Σ w(u,v)·(y[v] − y[u] + M·t[u,v])² + γ·Σ t[u,v]
//! s.t. y[v] ≤ L_max
//!      y[u] − y[v] ≤ M·t[u,v]
//!      y[u] − y[v] ≥ lam(u,v) − M·(1 − t[u,v])
//!      y[v] − y[u] ≥ lam(u,v) − M·t[u,v]
//!      y[v] ∈ [0, U], t binary
//! ```
//!
//! `t[u,v] = 1` exactly when `y[u] > y[v]`. With `n` nodes and largest minimum span `λ`, the
//! layer range is `U = (n − 1)·λ` (placing nodes `λ` apart in any order is always feasible) and
//! the default `M` is `n·λ`, the smallest constant that leaves every inactive branch slack.

use super::util::LayerVars;
use super::{LayerAssignment, TorusOptions};
use crate::solver::{LinExpr, Relation, SolverSession, Var};
use crate::{Error, Result};
use std::collections::BTreeSet;
use strata_graph::{Edge, GraphModel};
use tracing::{debug, warn};

pub fn solve(
    session: &SolverSession,
    g: &GraphModel,
    options: &TorusOptions,
) -> Result<LayerAssignment> {
    options.validate()?;

    let n = g.node_count() as u64;
    let max_lam = g.edges().map(|e| u64::from(g.min_span(e))).max().unwrap_or(1);
    let upper = n.saturating_sub(1) * max_lam;
    let big_m = options.big_m.unwrap_or(n * max_lam);
    if big_m < upper + max_lam {
        warn!(
            big_m,
            required = upper + max_lam,
            "big-M below the layer range; some wrap choices are cut off"
        );
    }
    let m = big_m as f64;

    let mut model = session.create_model("torus");
    let y = LayerVars::add(&mut model, g, Some(upper));
    let l_max = model.add_integer("L_max", 0, upper as i64);
    for &v in g.nodes() {
        model.add_constraint(
            format!("max_layer_{v}"),
            y.get(v) - l_max,
            Relation::Le,
            0.0,
        );
    }

    let mut wraps: Vec<(Edge, Var)> = Vec::with_capacity(g.edge_count());
    let mut wrap_count = LinExpr::new();
    for e in g.edges() {
        let (u, v) = (e.u, e.v);
        let lam = f64::from(g.min_span(e));
        let t = model.add_binary(format!("t_{u}_{v}"));

        // t = 0 forces y[u] <= y[v]
        model.add_constraint(
            format!("torus_a_{u}_{v}"),
            y.span(v, u) - t * m,
            Relation::Le,
            0.0,
        );
        // t = 1 forces y[u] - y[v] >= lam
        model.add_constraint(
            format!("torus_b_{u}_{v}"),
            y.span(v, u) - t * m,
            Relation::Ge,
            lam - m,
        );
        // t = 0 forces y[v] - y[u] >= lam
        model.add_constraint(
            format!("forward_{u}_{v}"),
            y.span(u, v) + t * m,
            Relation::Ge,
            lam,
        );

        if options.beta != 0.0 {
            model.add_squared_term(options.beta * g.weight(e), y.span(u, v) + t * m);
        }
        wrap_count += t;
        wraps.push((e, t));
    }
    model.add_objective(LinExpr::from(l_max) * options.alpha + wrap_count * options.gamma);

    model.solve()?;

    let ranks = y.read(&model, g)?;
    let mut wrap_edges = BTreeSet::new();
    for (e, t) in wraps {
        if model.bool_value(t)? {
            wrap_edges.insert(e);
        }
    }
    if !wrap_edges.is_empty() {
        debug!(wraps = wrap_edges.len(), "torus layering uses wrap edges");
    }
    Ok(LayerAssignment::new(ranks).with_wrap_edges(wrap_edges))
}

impl TorusOptions {
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("alpha", self.alpha),
            ("beta", self.beta),
            ("gamma", self.gamma),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(Error::Solver {
                    message: format!(
                        "torus weight {name} must be finite and non-negative, got {value}"
                    ),
                });
            }
        }
        Ok(())
    }
}

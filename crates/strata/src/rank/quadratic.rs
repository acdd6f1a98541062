//! `P_Q`: minimize the weighted sum of squared edge spans between pinned boundaries.
//!
//! ```text
//! min  Σ w(u,v)·(y[v] − y[u])²
//! s.t. y[v] − y[u] ≥ lam(u,v)     for every edge
//!      y[v] = 0                   for v ∈ V0
//!      y[v] = L                   for v ∈ Vl
//! ```
//!
//! `L` is the longest path with edges counted at their minimum span, so every node fits in
//! `[0, L]` and the squared spans have finite bounds.

use super::LayerAssignment;
use super::util::{self, LayerVars};
use crate::Result;
use crate::solver::SolverSession;
use strata_graph::GraphModel;

pub fn solve(session: &SolverSession, g: &GraphModel) -> Result<LayerAssignment> {
    let top = util::layer_bound(g)?;

    let mut model = session.create_model("quadratic_span");
    let y = LayerVars::add(&mut model, g, Some(top));
    util::add_span_constraints(&mut model, g, &y);
    util::pin_boundary(&mut model, g, &y, top);
    for e in g.edges() {
        model.add_squared_term(g.weight(e), y.span(e.u, e.v));
    }

    model.solve()?;
    Ok(LayerAssignment::new(y.read(&model, g)?))
}

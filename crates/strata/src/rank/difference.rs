//! `P_G`: minimize the weighted sum of edge spans.
//!
//! ```text
//! min  Σ w(u,v)·(y[v] − y[u])
//! s.t. y[v] − y[u] ≥ lam(u,v)     for every edge
//!      y[v] ∈ ℤ, y[v] ≥ 0
//! ```

use super::LayerAssignment;
use super::util::{self, LayerVars};
use crate::Result;
use crate::solver::{LinExpr, SolverSession};
use strata_graph::GraphModel;

pub fn solve(session: &SolverSession, g: &GraphModel) -> Result<LayerAssignment> {
    util::ensure_acyclic(g)?;

    let mut model = session.create_model("difference");
    let y = LayerVars::add(&mut model, g, None);
    util::add_span_constraints(&mut model, g, &y);
    let objective: LinExpr = g.edges().map(|e| y.span(e.u, e.v) * g.weight(e)).sum();
    model.add_objective(objective);

    model.solve()?;
    // The objective only sees differences; any shift of an optimum is optimal too.
    Ok(LayerAssignment::new(y.read(&model, g)?).rebased())
}

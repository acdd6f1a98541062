//! `P_L`: the quadratic-span objective expressed as one discrete span choice per edge.
//!
//! ```text
//! min  Σ w(u,v)·Σ_k k²·x[u,v,k]
//! s.t. Σ_k x[u,v,k] = 1                       for every edge
//!      Σ_k k·x[u,v,k] − y[v] + y[u] = 0       for every edge
//!      y[v] = 0 for v ∈ V0,  y[v] = L for v ∈ Vl
//!      k ∈ [lam(u,v), L], x binary
//! ```
//!
//! The model is linear; span costs live in the objective coefficients, so any per-span cost
//! table fits the same shape.

use super::LayerAssignment;
use super::util::{self, LayerVars};
use crate::Result;
use crate::solver::{LinExpr, Relation, SolverSession};
use strata_graph::GraphModel;

pub fn solve(session: &SolverSession, g: &GraphModel) -> Result<LayerAssignment> {
    let top = util::layer_bound(g)?;

    let mut model = session.create_model("flow_selection");
    let y = LayerVars::add(&mut model, g, Some(top));
    util::pin_boundary(&mut model, g, &y, top);

    let mut objective = LinExpr::new();
    for e in g.edges() {
        let (u, v) = (e.u, e.v);
        let lam = u64::from(g.min_span(e));
        let w = g.weight(e);

        let mut choice = LinExpr::new();
        let mut flow = LinExpr::new();
        for k in lam..=top {
            let x = model.add_binary(format!("x_{u}_{v}_{k}"));
            let k = k as f64;
            choice += x;
            flow += x * k;
            objective += x * (w * k * k);
        }
        model.add_constraint(format!("one_choice_{u}_{v}"), choice, Relation::Eq, 1.0);
        model.add_constraint(
            format!("flow_eq_{u}_{v}"),
            flow - y.span(u, v),
            Relation::Eq,
            0.0,
        );
    }
    model.add_objective(objective);

    model.solve()?;
    Ok(LayerAssignment::new(y.read(&model, g)?))
}

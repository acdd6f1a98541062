//! Irreducible infeasible subsets by deletion filtering.
//!
//! Each constraint is dropped in turn; if the rest stays infeasible it is left out for good,
//! otherwise it is restored. What survives is infeasible, and removing any single member makes
//! it feasible. Variable bounds are never dropped.

use super::{ConstraintDef, LinExpr, Outcome, Problem, SolverSession, VarDef};
use crate::{Error, Result};
use tracing::debug;

/// Indices of an irreducible infeasible subset of `constraints`.
pub(super) fn deletion_filter(
    session: &SolverSession,
    name: &str,
    vars: &[VarDef],
    constraints: &[ConstraintDef],
) -> Result<Vec<usize>> {
    let objective = LinExpr::new();
    let feasible = |keep: &[bool]| -> Result<bool> {
        let active: Vec<&ConstraintDef> = constraints
            .iter()
            .zip(keep)
            .filter_map(|(c, &k)| k.then_some(c))
            .collect();
        let problem = Problem {
            name,
            vars,
            constraints: &active,
            objective: &objective,
        };
        match session.solve(&problem)? {
            Outcome::Optimal(_) => Ok(true),
            Outcome::Infeasible => Ok(false),
            Outcome::Other(message) => Err(Error::Solver {
                message: format!("model `{name}` diagnostic solve failed: {message}"),
            }),
        }
    };

    let mut keep = vec![true; constraints.len()];
    if feasible(&keep)? {
        return Err(Error::Solver {
            message: format!("model `{name}` has a feasible linear core; nothing to diagnose"),
        });
    }
    for i in 0..constraints.len() {
        keep[i] = false;
        if feasible(&keep)? {
            keep[i] = true;
        }
    }

    let subset: Vec<usize> = keep
        .iter()
        .enumerate()
        .filter_map(|(i, &k)| k.then_some(i))
        .collect();
    debug!(model = name, size = subset.len(), "infeasible subset isolated");
    Ok(subset)
}

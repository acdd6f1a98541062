use super::{Domain, LinExpr, Outcome, Problem, Relation, SolverBackend, SolverConfig};
use crate::Result;
use good_lp::{
    Expression, IntoAffineExpression, ProblemVariables, ResolutionError, Solution, SolverModel,
    Variable, constraint, variable,
};
use tracing::trace;

/// Pure-Rust MILP backend built on `good_lp`'s `microlp` solver.
///
/// Time limits and branching priorities are not supported by the underlying solver.
#[derive(Debug, Clone, Copy, Default)]
pub struct MicroLpBackend;

impl SolverBackend for MicroLpBackend {
    fn name(&self) -> &'static str {
        "microlp"
    }

    fn solve(&self, problem: &Problem<'_>, _config: &SolverConfig) -> Result<Outcome> {
        let mut vars = ProblemVariables::new();
        let handles: Vec<Variable> = problem
            .vars
            .iter()
            .map(|def| {
                let mut v = match def.domain {
                    Domain::Continuous => variable(),
                    Domain::Integer => variable().integer(),
                    Domain::Binary => variable().binary(),
                };
                if def.domain != Domain::Binary {
                    if def.lower.is_finite() {
                        v = v.min(def.lower);
                    }
                    if def.upper.is_finite() {
                        v = v.max(def.upper);
                    }
                }
                vars.add(v.name(def.name.clone()))
            })
            .collect();

        let objective = lower(problem.objective, &handles);
        let mut model = vars
            .minimise(objective)
            .using(good_lp::solvers::microlp::microlp);
        for c in problem.constraints {
            let lhs = lower(&c.expr, &handles);
            let rhs = c.rhs;
            let constraint = match c.relation {
                Relation::Le => constraint!(lhs <= rhs),
                Relation::Ge => constraint!(lhs >= rhs),
                Relation::Eq => constraint!(lhs == rhs),
            };
            model.add_constraint(constraint);
        }

        trace!(problem = problem.name, "microlp solve");
        match model.solve() {
            Ok(solution) => Ok(Outcome::Optimal(
                handles.iter().map(|&h| solution.value(h)).collect(),
            )),
            Err(ResolutionError::Infeasible) => Ok(Outcome::Infeasible),
            Err(err) => Ok(Outcome::Other(err.to_string())),
        }
    }
}

fn lower(expr: &LinExpr, handles: &[Variable]) -> Expression {
    let mut out = expr.constant().into_expression();
    for &(var, coef) in expr.terms() {
        out.add_mul(coef, handles[var.index()]);
    }
    out
}

//! The boundary to the mixed-integer solver.
//!
//! Layout code never talks to a solver library directly. It opens one [`SolverSession`] per
//! process, creates a scoped [`Model`] per optimization, and reads values back after
//! [`Model::optimize`]. A model borrows its session and owns its variables and constraints, so
//! dropping it releases everything it built whether or not the solve succeeded.
//!
//! Objectives may carry squared affine terms. Before a model reaches a [`SolverBackend`] they
//! are rewritten into a purely linear program (see [`quadratic`]), so backends only ever solve
//! MILPs.

mod config;
mod expr;
mod iis;
mod microlp;
pub mod quadratic;

pub use config::{BackendKind, SolverConfig};
pub use expr::{LinExpr, Var};
pub use microlp::MicroLpBackend;

use crate::{Error, Result};
use std::fmt;
use tracing::{debug, trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Domain {
    Continuous,
    Integer,
    Binary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Le,
    Ge,
    Eq,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Optimal,
    Infeasible,
    /// Any other termination (unbounded, numerical trouble, backend error).
    Other(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarDef {
    pub name: String,
    pub domain: Domain,
    pub lower: f64,
    pub upper: f64,
    /// Branching hint; larger values should be branched on first.
    pub priority: i32,
}

impl VarDef {
    pub fn is_integral(&self) -> bool {
        matches!(self.domain, Domain::Integer | Domain::Binary)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintDef {
    pub name: String,
    pub expr: LinExpr,
    pub relation: Relation,
    pub rhs: f64,
}

/// A linear program as handed to a backend: minimize `objective` subject to `constraints`.
#[derive(Debug, Clone, Copy)]
pub struct Problem<'a> {
    pub name: &'a str,
    pub vars: &'a [VarDef],
    pub constraints: &'a [&'a ConstraintDef],
    pub objective: &'a LinExpr,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// One value per variable of the problem, in declaration order.
    Optimal(Vec<f64>),
    Infeasible,
    Other(String),
}

/// A MILP engine.
pub trait SolverBackend: fmt::Debug {
    fn name(&self) -> &'static str;

    fn supports_time_limit(&self) -> bool {
        false
    }

    fn supports_branch_priority(&self) -> bool {
        false
    }

    fn solve(&self, problem: &Problem<'_>, config: &SolverConfig) -> Result<Outcome>;
}

/// Process-wide solver handle.
#[derive(Debug)]
pub struct SolverSession {
    config: SolverConfig,
    backend: Box<dyn SolverBackend>,
}

impl SolverSession {
    /// Opens a session for the backend named by `config`.
    ///
    /// Fails with [`Error::SolverUnavailable`] when the configuration is invalid.
    pub fn open(config: SolverConfig) -> Result<Self> {
        let backend: Box<dyn SolverBackend> = match config.backend {
            BackendKind::MicroLp => Box::new(MicroLpBackend),
        };
        Self::with_backend(config, backend)
    }

    pub fn with_backend(config: SolverConfig, backend: Box<dyn SolverBackend>) -> Result<Self> {
        config.validate()?;
        if config.time_limit_secs.is_some() && !backend.supports_time_limit() {
            warn!(
                backend = backend.name(),
                "solver backend has no time limit support; time_limit_secs is ignored"
            );
        }
        debug!(backend = backend.name(), "solver session opened");
        Ok(Self { config, backend })
    }

    /// Opens a session from `STRATA_SOLVER_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::open(SolverConfig::from_env()?)
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn create_model(&self, name: impl Into<String>) -> Model<'_> {
        Model {
            session: self,
            name: name.into(),
            vars: Vec::new(),
            constraints: Vec::new(),
            objective: LinExpr::new(),
            squares: Vec::new(),
            status: None,
            values: Vec::new(),
        }
    }

    /// Releases the session.
    pub fn close(self) {
        drop(self);
    }

    fn solve(&self, problem: &Problem<'_>) -> Result<Outcome> {
        self.backend.solve(problem, &self.config)
    }
}

impl Drop for SolverSession {
    fn drop(&mut self) {
        debug!(backend = self.backend.name(), "solver session closed");
    }
}

/// One optimization model, scoped to its session.
#[derive(Debug)]
pub struct Model<'s> {
    session: &'s SolverSession,
    name: String,
    vars: Vec<VarDef>,
    constraints: Vec<ConstraintDef>,
    objective: LinExpr,
    squares: Vec<(f64, LinExpr)>,
    status: Option<Status>,
    values: Vec<f64>,
}

impl<'s> Model<'s> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn var_count(&self) -> usize {
        self.vars.len()
    }

    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    /// Adds a variable. Infinite bounds leave that side unbounded; binaries are always `[0, 1]`.
    pub fn add_var(
        &mut self,
        name: impl Into<String>,
        domain: Domain,
        lower: f64,
        upper: f64,
    ) -> Var {
        let (lower, upper) = match domain {
            Domain::Binary => (0.0, 1.0),
            _ => (lower, upper),
        };
        self.vars.push(VarDef {
            name: name.into(),
            domain,
            lower,
            upper,
            priority: 0,
        });
        self.invalidate();
        Var(self.vars.len() - 1)
    }

    pub fn add_integer(&mut self, name: impl Into<String>, lower: i64, upper: i64) -> Var {
        self.add_var(name, Domain::Integer, lower as f64, upper as f64)
    }

    pub fn add_binary(&mut self, name: impl Into<String>) -> Var {
        self.add_var(name, Domain::Binary, 0.0, 1.0)
    }

    /// Adds `expr (relation) rhs`. A constant inside `expr` is moved to the right-hand side.
    pub fn add_constraint(
        &mut self,
        name: impl Into<String>,
        expr: impl Into<LinExpr>,
        relation: Relation,
        rhs: f64,
    ) {
        let expr = expr.into();
        let constant = expr.constant();
        let expr = expr - constant;
        let rhs = rhs - constant;
        self.constraints.push(ConstraintDef {
            name: name.into(),
            expr,
            relation,
            rhs,
        });
        self.invalidate();
    }

    /// Adds a linear term to the (minimized) objective.
    pub fn add_objective(&mut self, expr: impl Into<LinExpr>) {
        self.objective += expr;
        self.invalidate();
    }

    /// Adds `coef · expr²` to the (minimized) objective.
    pub fn add_squared_term(&mut self, coef: f64, expr: impl Into<LinExpr>) {
        self.squares.push((coef, expr.into()));
        self.invalidate();
    }

    pub fn set_branch_priority(&mut self, var: Var, priority: i32) {
        if let Some(def) = self.vars.get_mut(var.0) {
            def.priority = priority;
        }
    }

    pub fn status(&self) -> Option<&Status> {
        self.status.as_ref()
    }

    pub fn optimize(&mut self) -> Result<Status> {
        let lowered = quadratic::linearize(&self.vars, &self.squares)?;

        let mut vars = self.vars.clone();
        vars.extend(lowered.vars);
        let mut objective = self.objective.clone();
        objective += lowered.objective;
        let constraints: Vec<&ConstraintDef> =
            self.constraints.iter().chain(lowered.cuts.iter()).collect();

        if vars.iter().any(|v| v.priority != 0) && !self.session.backend.supports_branch_priority()
        {
            debug!(
                model = %self.name,
                backend = self.session.backend_name(),
                "branch priorities recorded but not forwarded"
            );
        }
        debug!(
            model = %self.name,
            vars = vars.len(),
            constraints = constraints.len(),
            squared_terms = self.squares.len(),
            "optimizing"
        );

        let problem = Problem {
            name: &self.name,
            vars: &vars,
            constraints: &constraints,
            objective: &objective,
        };
        let status = match self.session.solve(&problem)? {
            Outcome::Optimal(mut values) => {
                values.truncate(self.vars.len());
                self.values = values;
                Status::Optimal
            }
            Outcome::Infeasible => Status::Infeasible,
            Outcome::Other(reason) => Status::Other(reason),
        };
        debug!(model = %self.name, ?status, "optimization finished");
        self.status = Some(status.clone());
        Ok(status)
    }

    /// Value of `var` in the optimal solution; `None` unless the last status was optimal.
    pub fn value(&self, var: Var) -> Option<f64> {
        match self.status {
            Some(Status::Optimal) => self.values.get(var.0).copied(),
            _ => None,
        }
    }

    pub fn int_value(&self, var: Var) -> Result<i64> {
        self.value(var)
            .map(|v| v.round() as i64)
            .ok_or_else(|| self.missing_value(var))
    }

    pub fn bool_value(&self, var: Var) -> Result<bool> {
        self.value(var)
            .map(|v| v > 0.5)
            .ok_or_else(|| self.missing_value(var))
    }

    /// Names of an irreducible infeasible subset of the constraints.
    ///
    /// Only meaningful after [`Model::optimize`] returned [`Status::Infeasible`]; variable
    /// bounds are always kept, so a model infeasible by its bounds alone yields an empty list.
    pub fn compute_iis(&self) -> Result<Vec<String>> {
        if self.status != Some(Status::Infeasible) {
            return Err(Error::Solver {
                message: format!(
                    "model `{}` is not known to be infeasible; no diagnostic available",
                    self.name
                ),
            });
        }
        let keep = iis::deletion_filter(self.session, &self.name, &self.vars, &self.constraints)?;
        Ok(keep
            .into_iter()
            .map(|ix| self.constraints[ix].name.clone())
            .collect())
    }

    /// Optimizes and turns every non-optimal status into an error.
    ///
    /// Infeasible models carry an irreducible infeasible subset when the session is configured
    /// to diagnose them.
    pub fn solve(&mut self) -> Result<()> {
        match self.optimize()? {
            Status::Optimal => Ok(()),
            Status::Infeasible => {
                let diagnostic = if self.session.config().diagnose_infeasible {
                    self.compute_iis()?
                } else {
                    Vec::new()
                };
                Err(Error::Infeasible {
                    model: self.name.clone(),
                    diagnostic,
                })
            }
            Status::Other(message) => Err(Error::Solver {
                message: format!("model `{}`: {message}", self.name),
            }),
        }
    }

    fn missing_value(&self, var: Var) -> Error {
        let name = self
            .vars
            .get(var.0)
            .map_or("<unknown>", |v| v.name.as_str());
        Error::Solver {
            message: format!("model `{}` has no value for `{name}`", self.name),
        }
    }

    fn invalidate(&mut self) {
        self.status = None;
        self.values.clear();
    }
}

impl Drop for Model<'_> {
    fn drop(&mut self) {
        trace!(
            model = %self.name,
            vars = self.vars.len(),
            constraints = self.constraints.len(),
            "model released"
        );
    }
}

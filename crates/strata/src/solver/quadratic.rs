//! Exact linearization of squared integer terms.
//!
//! A term `c·e²` with `c > 0` and `e` an integer-valued affine expression with range
//! `[lo, hi]` becomes `c·z` for a fresh continuous `z`, bounded below by the secants of `x²`
//! through consecutive integers:
//!
//! ```text
//! z ≥ (2k + 1)·e − k(k + 1)    for k = lo, …, hi − 1
//! ```
//!
//! At every integer `e` in range the largest right-hand side is exactly `e²`, so a minimizing
//! solver drives `z` down to `e²` and the linear model has the same optimum as the quadratic one.

use super::{ConstraintDef, Domain, LinExpr, Relation, Var, VarDef};
use crate::{Error, Result};

/// Widest `hi - lo` accepted for one squared term.
pub const MAX_SQUARE_RANGE: i64 = 1 << 16;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Linearized {
    /// Auxiliary variables, numbered after the model's own variables.
    pub vars: Vec<VarDef>,
    pub cuts: Vec<ConstraintDef>,
    /// Linear replacement of the squared part of the objective.
    pub objective: LinExpr,
}

pub fn linearize(vars: &[VarDef], squares: &[(f64, LinExpr)]) -> Result<Linearized> {
    let mut out = Linearized::default();
    for (i, (coef, expr)) in squares.iter().enumerate() {
        if *coef == 0.0 {
            continue;
        }
        if !(coef.is_finite() && *coef > 0.0) {
            return Err(Error::Solver {
                message: format!("squared term {i} needs a positive coefficient, got {coef}"),
            });
        }

        let expr = expr.compact();
        let (lo, hi) = integral_range(vars, &expr)?;
        if hi - lo > MAX_SQUARE_RANGE {
            return Err(Error::Solver {
                message: format!("squared term {i} ranges over [{lo}, {hi}], which is too wide"),
            });
        }

        let z = Var(vars.len() + out.vars.len());
        let floor = if lo <= 0 && hi >= 0 {
            0
        } else {
            (lo * lo).min(hi * hi)
        };
        out.vars.push(VarDef {
            name: format!("sq{i}"),
            domain: Domain::Continuous,
            lower: floor as f64,
            upper: f64::INFINITY,
            priority: 0,
        });

        let pieces: Vec<(i64, i64)> = if lo == hi {
            vec![(2 * lo, lo * lo)]
        } else {
            (lo..hi).map(|k| (2 * k + 1, k * (k + 1))).collect()
        };
        for (j, (slope, offset)) in pieces.into_iter().enumerate() {
            // z - slope·e >= -offset
            let cut = LinExpr::from(z) - expr.clone() * slope as f64;
            let constant = cut.constant();
            out.cuts.push(ConstraintDef {
                name: format!("sq{i}_cut{j}"),
                expr: cut - constant,
                relation: Relation::Ge,
                rhs: -(offset as f64) - constant,
            });
        }
        out.objective += LinExpr::term(z, *coef);
    }
    Ok(out)
}

/// Integer range of `expr` implied by its variables' bounds.
fn integral_range(vars: &[VarDef], expr: &LinExpr) -> Result<(i64, i64)> {
    let not_integral = || Error::Solver {
        message: "squared terms must be integer-valued with bounded variables".to_string(),
    };

    if expr.constant().fract() != 0.0 {
        return Err(not_integral());
    }
    let mut lo = expr.constant();
    let mut hi = expr.constant();
    for &(var, coef) in expr.terms() {
        let def = vars.get(var.index()).ok_or_else(not_integral)?;
        if !def.is_integral() || coef.fract() != 0.0 {
            return Err(not_integral());
        }
        if !(def.lower.is_finite() && def.upper.is_finite()) {
            return Err(not_integral());
        }
        let a = coef * def.lower.ceil();
        let b = coef * def.upper.floor();
        lo += a.min(b);
        hi += a.max(b);
    }
    Ok((lo.round() as i64, hi.round() as i64))
}

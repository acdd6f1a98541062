//! Affine expressions over model variables.

use std::collections::BTreeMap;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

/// Handle to a variable of one [`Model`](super::Model).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Var(pub(crate) usize);

impl Var {
    pub fn index(self) -> usize {
        self.0
    }
}

/// `Σ coef·var + constant`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinExpr {
    terms: Vec<(Var, f64)>,
    constant: f64,
}

impl LinExpr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn term(var: Var, coef: f64) -> Self {
        Self {
            terms: vec![(var, coef)],
            constant: 0.0,
        }
    }

    pub fn sum(vars: impl IntoIterator<Item = Var>) -> Self {
        Self {
            terms: vars.into_iter().map(|v| (v, 1.0)).collect(),
            constant: 0.0,
        }
    }

    pub fn add_term(&mut self, var: Var, coef: f64) -> &mut Self {
        self.terms.push((var, coef));
        self
    }

    pub fn terms(&self) -> &[(Var, f64)] {
        &self.terms
    }

    pub fn constant(&self) -> f64 {
        self.constant
    }

    /// Merges repeated variables and drops zero coefficients.
    pub fn compact(&self) -> Self {
        let mut merged: BTreeMap<Var, f64> = BTreeMap::new();
        for &(v, c) in &self.terms {
            *merged.entry(v).or_insert(0.0) += c;
        }
        Self {
            terms: merged.into_iter().filter(|&(_, c)| c != 0.0).collect(),
            constant: self.constant,
        }
    }
}

impl From<Var> for LinExpr {
    fn from(var: Var) -> Self {
        Self::term(var, 1.0)
    }
}

impl From<f64> for LinExpr {
    fn from(constant: f64) -> Self {
        Self {
            terms: Vec::new(),
            constant,
        }
    }
}

impl<T: Into<LinExpr>> AddAssign<T> for LinExpr {
    fn add_assign(&mut self, rhs: T) {
        let rhs = rhs.into();
        self.terms.extend(rhs.terms);
        self.constant += rhs.constant;
    }
}

impl<T: Into<LinExpr>> SubAssign<T> for LinExpr {
    fn sub_assign(&mut self, rhs: T) {
        let rhs = rhs.into();
        self.terms.extend(rhs.terms.into_iter().map(|(v, c)| (v, -c)));
        self.constant -= rhs.constant;
    }
}

impl<T: Into<LinExpr>> Add<T> for LinExpr {
    type Output = LinExpr;

    fn add(mut self, rhs: T) -> LinExpr {
        self += rhs;
        self
    }
}

impl<T: Into<LinExpr>> Sub<T> for LinExpr {
    type Output = LinExpr;

    fn sub(mut self, rhs: T) -> LinExpr {
        self -= rhs;
        self
    }
}

impl<T: Into<LinExpr>> Add<T> for Var {
    type Output = LinExpr;

    fn add(self, rhs: T) -> LinExpr {
        LinExpr::from(self) + rhs
    }
}

impl<T: Into<LinExpr>> Sub<T> for Var {
    type Output = LinExpr;

    fn sub(self, rhs: T) -> LinExpr {
        LinExpr::from(self) - rhs
    }
}

impl Mul<f64> for LinExpr {
    type Output = LinExpr;

    fn mul(self, k: f64) -> LinExpr {
        LinExpr {
            terms: self.terms.into_iter().map(|(v, c)| (v, c * k)).collect(),
            constant: self.constant * k,
        }
    }
}

impl Mul<f64> for Var {
    type Output = LinExpr;

    fn mul(self, k: f64) -> LinExpr {
        LinExpr::term(self, k)
    }
}

impl Mul<Var> for f64 {
    type Output = LinExpr;

    fn mul(self, var: Var) -> LinExpr {
        LinExpr::term(var, self)
    }
}

impl Neg for LinExpr {
    type Output = LinExpr;

    fn neg(self) -> LinExpr {
        self * -1.0
    }
}

impl std::iter::Sum for LinExpr {
    fn sum<I: Iterator<Item = LinExpr>>(iter: I) -> LinExpr {
        iter.fold(LinExpr::new(), |acc, e| acc + e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compact_merges_repeated_variables() {
        let (a, b) = (Var(0), Var(1));
        let e = (a + b) - a * 2.0 + 3.0 + b;
        let c = e.compact();
        assert_eq!(c.terms(), &[(a, -1.0), (b, 2.0)]);
        assert_eq!(c.constant(), 3.0);
    }

    #[test]
    fn difference_of_variables_cancels() {
        let a = Var(4);
        assert!((a - a).compact().terms().is_empty());
    }
}

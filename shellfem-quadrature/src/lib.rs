//! Quadrature rules for the reference tetrahedron.
//!
//! The reference tetrahedron has the vertices `(0, 0, 0)`, `(1, 0, 0)`, `(0, 1, 0)` and
//! `(0, 0, 1)`, so that its volume is `1/6`. All rules are returned as plain arrays so that they
//! can be used independently of `shellfem`.

use std::fmt;
use std::fmt::{Display, Formatter};

pub mod tetrahedron;

pub use tetrahedron::tetrahedron_order4;

/// Library-wide error type.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// Indicates that a rule satisfying the given requirements is not available.
    NoRuleAvailable,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoRuleAvailable => {
                write!(f, "There is no quadrature rule satisfying the requirements available")
            }
        }
    }
}

impl std::error::Error for Error {}

/// A D-dimensional point.
pub type Point<const D: usize> = [f64; D];

/// A three-dimensional point.
pub type Point3 = Point<3>;

/// A D-dimensional rule, stored as `(weights, points)`.
pub type Rule<const D: usize> = (Vec<f64>, Vec<Point<D>>);

/// A three-dimensional rule.
pub type Rule3d = Rule<3>;

/// Approximates the integral of `f` over the reference domain of the rule.
pub fn integrate<const D: usize>(rule: &Rule<D>, f: impl Fn(&Point<D>) -> f64) -> f64 {
    let (weights, points) = rule;
    weights.iter().zip(points).map(|(w, p)| w * f(p)).sum()
}

//! Integration over the reference tetrahedron.
use crate::nalgebra::Point3;
use crate::quadrature::{tet_quadrature_order4, Quadrature, QuadraturePair3d};

/// Evaluates integrals over the reference tetrahedron with a fixed quadrature rule.
///
/// The integrator does not know about the mapping from the reference element to the physical
/// element. Integrands are expected to include the factor `|det J|` themselves.
#[derive(Debug, Clone)]
pub struct Integrator {
    quadrature: QuadraturePair3d,
}

impl Default for Integrator {
    fn default() -> Self {
        Self::new(tet_quadrature_order4())
    }
}

impl Integrator {
    pub fn new(quadrature: QuadraturePair3d) -> Self {
        Self { quadrature }
    }

    pub fn quadrature(&self) -> &QuadraturePair3d {
        &self.quadrature
    }

    pub fn num_points(&self) -> usize {
        self.quadrature.num_points()
    }

    pub fn points(&self) -> &[Point3<f64>] {
        self.quadrature.points()
    }

    /// Computes `Σ_q w_q f(q, ξ_q)`.
    ///
    /// The index `q` of the quadrature point is passed along so that integrands can look up data
    /// precomputed per quadrature point.
    pub fn gauss_3d(&self, f: impl Fn(usize, &Point3<f64>) -> f64) -> f64 {
        self.quadrature
            .weights()
            .iter()
            .zip(self.quadrature.points())
            .enumerate()
            .map(|(q, (w, xi))| w * f(q, xi))
            .sum()
    }

    /// Integrates a function of the reference coordinates only.
    pub fn integrate(&self, f: impl Fn(&Point3<f64>) -> f64) -> f64 {
        self.quadrature.integrate(f)
    }
}

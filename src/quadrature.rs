//! Quadrature rules on the reference tetrahedron, expressed with `nalgebra` points.
use crate::nalgebra::Point3;

/// Errors returned by quadrature methods.
pub use shellfem_quadrature::Error as QuadratureError;

pub type QuadraturePair3d = (Vec<f64>, Vec<Point3<f64>>);

/// A quadrature rule consisting of weights and points.
pub trait Quadrature {
    fn weights(&self) -> &[f64];
    fn points(&self) -> &[Point3<f64>];

    fn num_points(&self) -> usize {
        self.weights().len()
    }

    /// Approximates the integral of the given function using this quadrature rule.
    fn integrate<Function>(&self, f: Function) -> f64
    where
        Function: Fn(&Point3<f64>) -> f64,
    {
        self.weights()
            .iter()
            .zip(self.points())
            .map(|(w, p)| f(p) * w)
            .sum()
    }
}

impl<A, B> Quadrature for (A, B)
where
    A: AsRef<[f64]>,
    B: AsRef<[Point3<f64>]>,
{
    fn weights(&self) -> &[f64] {
        self.0.as_ref()
    }

    fn points(&self) -> &[Point3<f64>] {
        self.1.as_ref()
    }
}

impl<Q> Quadrature for &Q
where
    Q: Quadrature,
{
    fn weights(&self) -> &[f64] {
        Q::weights(self)
    }

    fn points(&self) -> &[Point3<f64>] {
        Q::points(self)
    }
}

fn convert_quadrature_rule((weights, points): shellfem_quadrature::Rule3d) -> QuadraturePair3d {
    let points = points.into_iter().map(Point3::from).collect();
    (weights, points)
}

/// A quadrature rule on the reference tetrahedron that exactly integrates polynomials of the
/// given total degree.
pub fn tet_quadrature_strength(strength: usize) -> Result<QuadraturePair3d, QuadratureError> {
    shellfem_quadrature::tetrahedron::tetrahedron(strength).map(convert_quadrature_rule)
}

/// The five-point rule with one negative weight used for element assembly.
pub fn tet_quadrature_order4() -> QuadraturePair3d {
    convert_quadrature_rule(shellfem_quadrature::tetrahedron_order4())
}

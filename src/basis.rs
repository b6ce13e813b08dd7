//! Lagrange basis functions on tetrahedra.
//!
//! Basis functions are expressed through the barycentric coordinates `L_i` of an element, which
//! are affine functions of the physical position. For an element with vertices `v_0, ..., v_3`,
//! the matrix
//!
//! ```text
//!     [ 1     1     1     1    ]
//! A = [ v_0x  v_1x  v_2x  v_3x ]
//!     [ v_0y  v_1y  v_2y  v_3y ]
//!     [ v_0z  v_1z  v_2z  v_3z ]
//! ```
//!
//! maps barycentric coordinates to `[1; x; y; z]`. Row `i` of `A⁻¹` therefore holds the affine
//! coefficients of `L_i`.
use crate::dense::invert_4x4;
use crate::nalgebra::{Matrix4, Point3, Vector3, Vector4};
use crate::Error;
use serde::{Deserialize, Serialize};

/// Local vertex pairs of the edges of a tetrahedron, in the order of the quadratic edge nodes.
pub const TET_EDGES: [[usize; 2]; 6] = [[0, 1], [0, 2], [0, 3], [1, 2], [1, 3], [2, 3]];

/// Vertices of the reference tetrahedron.
pub fn reference_tet_vertices() -> [Point3<f64>; 4] {
    [
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
        Point3::new(0.0, 0.0, 1.0),
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Basis {
    /// Four vertex functions.
    #[default]
    Linear,
    /// Four vertex functions and six edge functions.
    Quadratic,
}

impl Basis {
    /// Number of local shape functions.
    pub fn size(&self) -> usize {
        match self {
            Self::Linear => 4,
            Self::Quadratic => 10,
        }
    }

    /// Computes the affine coefficients of the barycentric coordinates for the element with the
    /// given vertices.
    ///
    /// Returns an error if the vertices span a tetrahedron of (numerically) zero volume.
    pub fn update_cache(&self, vertices: &[Point3<f64>; 4]) -> Result<BasisContext, Error> {
        // Coordinates relative to the first vertex keep the rows of the alpha matrix on the scale
        // of the element, independent of where it is located
        let origin = vertices[0];
        let mut alpha = Matrix4::zeros();
        for (j, v) in vertices.iter().enumerate() {
            let local = v - origin;
            alpha[(0, j)] = 1.0;
            alpha[(1, j)] = local.x;
            alpha[(2, j)] = local.y;
            alpha[(3, j)] = local.z;
        }
        let mut coefficients = invert_4x4(&alpha)?;
        // L_i(x) = c_i0 + c_i · (x - origin), so shift the constant term back to global coordinates
        for i in 0..4 {
            let gradient = coefficients.fixed_view::<1, 3>(i, 1).transpose();
            coefficients[(i, 0)] -= gradient.dot(&origin.coords);
        }
        Ok(BasisContext {
            basis: *self,
            coefficients,
        })
    }
}

/// Basis functions of a single element.
#[derive(Debug, Clone, PartialEq)]
pub struct BasisContext {
    basis: Basis,
    coefficients: Matrix4<f64>,
}

impl BasisContext {
    pub fn basis(&self) -> Basis {
        self.basis
    }

    pub fn size(&self) -> usize {
        self.basis.size()
    }

    /// The inverse of the vertex matrix, whose row `i` holds the coefficients of `L_i`.
    pub fn coefficients(&self) -> &Matrix4<f64> {
        &self.coefficients
    }

    /// Barycentric coordinates of the given point with respect to the element.
    pub fn barycentric(&self, p: &Point3<f64>) -> Vector4<f64> {
        self.coefficients * Vector4::new(1.0, p.x, p.y, p.z)
    }

    fn barycentric_gradient(&self, i: usize) -> Vector3<f64> {
        self.coefficients.fixed_view::<1, 3>(i, 1).transpose()
    }

    fn check_index(&self, i: usize) -> Result<(), Error> {
        if i < self.size() {
            Ok(())
        } else {
            Err(Error::BasisFunctionIndex {
                index: i,
                size: self.size(),
            })
        }
    }

    /// Value of shape function `i` at `p`.
    pub fn psi(&self, i: usize, p: &Point3<f64>) -> Result<f64, Error> {
        self.check_index(i)?;
        let l = self.barycentric(p);
        let value = match (self.basis, i) {
            (Basis::Linear, _) => l[i],
            (Basis::Quadratic, 0..=3) => l[i] * (2.0 * l[i] - 1.0),
            (Basis::Quadratic, _) => {
                let [a, b] = TET_EDGES[i - 4];
                4.0 * l[a] * l[b]
            }
        };
        Ok(value)
    }

    /// Gradient of shape function `i` at `p`.
    pub fn gradient(&self, i: usize, p: &Point3<f64>) -> Result<Vector3<f64>, Error> {
        self.check_index(i)?;
        let gradient = match (self.basis, i) {
            (Basis::Linear, _) => self.barycentric_gradient(i),
            (Basis::Quadratic, 0..=3) => {
                let l = self.barycentric(p);
                self.barycentric_gradient(i) * (4.0 * l[i] - 1.0)
            }
            (Basis::Quadratic, _) => {
                let l = self.barycentric(p);
                let [a, b] = TET_EDGES[i - 4];
                (self.barycentric_gradient(a) * l[b] + self.barycentric_gradient(b) * l[a]) * 4.0
            }
        };
        Ok(gradient)
    }

    /// Derivative of shape function `i` with respect to coordinate `var` (0, 1 or 2) at `p`.
    pub fn dpsi(&self, i: usize, var: usize, p: &Point3<f64>) -> Result<f64, Error> {
        if var > 2 {
            return Err(Error::DerivativeIndex { index: var });
        }
        Ok(self.gradient(i, p)?[var])
    }

    /// Values of all shape functions at `p`.
    pub fn populate_basis(&self, values: &mut [f64], p: &Point3<f64>) -> Result<(), Error> {
        assert_eq!(values.len(), self.size(), "Buffer length must match number of shape functions");
        for (i, value) in values.iter_mut().enumerate() {
            *value = self.psi(i, p)?;
        }
        Ok(())
    }
}

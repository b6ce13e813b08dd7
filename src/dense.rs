//! Small dense kernels used during element assembly.
//!
//! Jacobians are inverted with the closed-form cofactor formula. The 4x4 matrices that map
//! barycentric coordinates to physical positions are inverted with Gauss-Jordan elimination
//! using partial pivoting. Both report a [`Error::SingularMatrix`] instead of producing
//! non-finite entries.
//!
//! Singularity is decided relative to the scale of the matrix: a matrix is treated as singular
//! when `|det| <= DEGENERACY_TOLERANCE * Π ||row_i||`. By Hadamard's inequality the product of
//! row norms bounds `|det|`.
use crate::Error;
use nalgebra::{DMatrix, DVector, Dim, Matrix, Matrix3, Matrix4, Storage};

/// Relative tolerance for the singularity test.
pub const DEGENERACY_TOLERANCE: f64 = 1e-14;

/// Product of the Euclidean norms of the rows of `m`.
fn hadamard_bound<R: Dim, C: Dim, S: Storage<f64, R, C>>(m: &Matrix<f64, R, C, S>) -> f64 {
    m.row_iter().map(|row| row.norm()).product()
}

fn is_singular(determinant: f64, hadamard_bound: f64) -> bool {
    !(determinant.abs() > DEGENERACY_TOLERANCE * hadamard_bound)
}

/// Determinant of a 3x3 matrix by cofactor expansion along the first row.
pub fn determinant_3x3(m: &Matrix3<f64>) -> f64 {
    m[(0, 0)] * (m[(1, 1)] * m[(2, 2)] - m[(1, 2)] * m[(2, 1)])
        - m[(0, 1)] * (m[(1, 0)] * m[(2, 2)] - m[(1, 2)] * m[(2, 0)])
        + m[(0, 2)] * (m[(1, 0)] * m[(2, 1)] - m[(1, 1)] * m[(2, 0)])
}

pub fn invert_3x3(m: &Matrix3<f64>) -> Result<Matrix3<f64>, Error> {
    let determinant = determinant_3x3(m);
    if is_singular(determinant, hadamard_bound(m)) {
        return Err(Error::SingularMatrix { determinant });
    }
    let inv_det = 1.0 / determinant;
    let (m11, m12, m13) = (m[(0, 0)], m[(0, 1)], m[(0, 2)]);
    let (m21, m22, m23) = (m[(1, 0)], m[(1, 1)], m[(1, 2)]);
    let (m31, m32, m33) = (m[(2, 0)], m[(2, 1)], m[(2, 2)]);
    #[rustfmt::skip]
    let cofactors = Matrix3::new(
        m22 * m33 - m23 * m32, -(m12 * m33 - m13 * m32), m12 * m23 - m13 * m22,
        -(m21 * m33 - m23 * m31), m11 * m33 - m13 * m31, -(m11 * m23 - m13 * m21),
        m21 * m32 - m22 * m31, -(m11 * m32 - m12 * m31), m11 * m22 - m12 * m21,
    );
    Ok(cofactors * inv_det)
}

/// Inverts a 4x4 matrix by Gauss-Jordan elimination with partial pivoting.
pub fn invert_4x4(m: &Matrix4<f64>) -> Result<Matrix4<f64>, Error> {
    let mut a = *m;
    let mut inverse = Matrix4::identity();
    let mut determinant = 1.0;

    for col in 0..4 {
        let pivot_row = (col..4)
            .max_by(|&i, &j| a[(i, col)].abs().total_cmp(&a[(j, col)].abs()))
            .unwrap_or(col);
        if pivot_row != col {
            a.swap_rows(pivot_row, col);
            inverse.swap_rows(pivot_row, col);
            determinant = -determinant;
        }

        let pivot = a[(col, col)];
        determinant *= pivot;
        if pivot == 0.0 || !pivot.is_finite() {
            return Err(Error::SingularMatrix { determinant });
        }

        for j in 0..4 {
            a[(col, j)] /= pivot;
            inverse[(col, j)] /= pivot;
        }
        for i in (0..4).filter(|&i| i != col) {
            let factor = a[(i, col)];
            if factor != 0.0 {
                for j in 0..4 {
                    a[(i, j)] -= factor * a[(col, j)];
                    inverse[(i, j)] -= factor * inverse[(col, j)];
                }
            }
        }
    }

    if is_singular(determinant, hadamard_bound(m)) {
        return Err(Error::SingularMatrix { determinant });
    }
    Ok(inverse)
}

/// Crout decomposition `A = L U` of a square dense matrix, where `U` has a unit diagonal.
///
/// No pivoting is performed, so the decomposition is intended for diagonally dominant or
/// symmetric positive definite matrices. A pivot is considered zero when it is small relative to
/// the largest entry of the matrix.
#[derive(Debug, Clone)]
pub struct LuDecomposition {
    // L in the lower triangle (including the diagonal), U in the strictly upper triangle
    lu: DMatrix<f64>,
}

impl LuDecomposition {
    pub fn new(matrix: DMatrix<f64>) -> Result<Self, Error> {
        if !matrix.is_square() {
            return Err(Error::InvalidConfiguration(format!(
                "LU decomposition requires a square matrix, got {}x{}",
                matrix.nrows(),
                matrix.ncols()
            )));
        }
        let n = matrix.nrows();
        let scale = matrix.amax();
        let mut lu = matrix;
        let mut determinant = 1.0;

        for i in 0..n {
            for j in 0..n {
                if i < j {
                    let sum: f64 = (0..i).map(|k| lu[(i, k)] * lu[(k, j)]).sum();
                    lu[(i, j)] = (lu[(i, j)] - sum) / lu[(i, i)];
                } else {
                    let sum: f64 = (0..j).map(|k| lu[(i, k)] * lu[(k, j)]).sum();
                    lu[(i, j)] -= sum;
                }
            }
            let pivot = lu[(i, i)];
            determinant *= pivot;
            if !(pivot.abs() > DEGENERACY_TOLERANCE * scale) {
                return Err(Error::SingularMatrix { determinant });
            }
        }

        Ok(Self { lu })
    }

    pub fn dim(&self) -> usize {
        self.lu.nrows()
    }

    pub fn determinant(&self) -> f64 {
        self.lu.diagonal().product()
    }

    /// Solves `A x = f`.
    ///
    /// # Panics
    ///
    /// Panics if the length of `f` does not match the dimension of the matrix.
    pub fn solve(&self, f: &DVector<f64>) -> DVector<f64> {
        assert_eq!(f.len(), self.dim(), "Right-hand side must match matrix dimension");
        let n = self.dim();
        let mut x = f.clone();

        for i in 0..n {
            let sum: f64 = (0..i).map(|k| self.lu[(i, k)] * x[k]).sum();
            x[i] = (x[i] - sum) / self.lu[(i, i)];
        }
        for i in (0..n).rev() {
            let sum: f64 = (i + 1..n).map(|k| self.lu[(i, k)] * x[k]).sum();
            x[i] -= sum;
        }
        x
    }
}

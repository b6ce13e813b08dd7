//! Incomplete Cholesky factorization restricted to the sparsity pattern of the input matrix.
use crate::cg::{LinearOperator, OperatorError};
use crate::matrix::SymmetricCsrMatrix;
use crate::pattern::LowerTriangularPattern;
use nalgebra::{DVector, DVectorView, DVectorViewMut};
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// The factorization encountered a non-positive (or non-finite) value under the square root.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CholeskyBreakdown {
    pub row: usize,
    pub pivot: f64,
}

impl fmt::Display for CholeskyBreakdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Incomplete Cholesky breakdown at row {}: pivot {:e} is not positive",
            self.row, self.pivot
        )
    }
}

impl std::error::Error for CholeskyBreakdown {}

/// Lower triangular factor `L` with `A ≈ L Lᵀ`, sharing the portrait of the factored matrix.
///
/// The diagonal of `L` is stored separately from its strictly lower part. No fill-in is
/// introduced: entries of `L` outside the pattern of `A` are dropped.
#[derive(Debug, Clone)]
pub struct IncompleteCholesky {
    pattern: Arc<LowerTriangularPattern>,
    diagonal: Vec<f64>,
    lower: Vec<f64>,
}

/// Sum of `L[i, m] * L[j, m]` over columns `m < j` present in both rows `i` and `j`.
fn common_column_product(pattern: &LowerTriangularPattern, lower: &[f64], i: usize, j: usize) -> f64 {
    let columns = pattern.columns();
    let (mut a, a_end) = (pattern.offsets()[i], pattern.offsets()[i + 1]);
    let (mut b, b_end) = (pattern.offsets()[j], pattern.offsets()[j + 1]);
    let mut sum = 0.0;
    while a < a_end && b < b_end && columns[a] < j {
        match columns[a].cmp(&columns[b]) {
            Ordering::Equal => {
                sum += lower[a] * lower[b];
                a += 1;
                b += 1;
            }
            Ordering::Less => a += 1,
            Ordering::Greater => b += 1,
        }
    }
    sum
}

impl IncompleteCholesky {
    pub fn factor(matrix: &SymmetricCsrMatrix) -> Result<Self, CholeskyBreakdown> {
        let pattern = Arc::clone(matrix.pattern());
        let n = pattern.dim();
        let mut diagonal = vec![0.0; n];
        let mut lower = vec![0.0; pattern.nnz()];

        for i in 0..n {
            let mut sum_squares = 0.0;
            for k in pattern.row_range(i) {
                let j = pattern.columns()[k];
                let s = matrix.off_diagonal()[k] - common_column_product(&pattern, &lower, i, j);
                lower[k] = s / diagonal[j];
                sum_squares += lower[k] * lower[k];
            }

            let pivot = matrix.diagonal()[i] - sum_squares;
            if !(pivot > 0.0) || !pivot.is_finite() {
                return Err(CholeskyBreakdown { row: i, pivot });
            }
            diagonal[i] = pivot.sqrt();
        }

        Ok(Self {
            pattern,
            diagonal,
            lower,
        })
    }

    pub fn dim(&self) -> usize {
        self.diagonal.len()
    }

    pub fn pattern(&self) -> &Arc<LowerTriangularPattern> {
        &self.pattern
    }

    pub fn diagonal(&self) -> &[f64] {
        &self.diagonal
    }

    pub fn lower(&self) -> &[f64] {
        &self.lower
    }

    /// Solves `L y = r` in place.
    pub fn forward_substitute(&self, mut y: DVectorViewMut<f64>) {
        assert_eq!(y.len(), self.dim());
        let columns = self.pattern.columns();
        for i in 0..self.dim() {
            let mut value = y[i];
            for k in self.pattern.row_range(i) {
                value -= self.lower[k] * y[columns[k]];
            }
            y[i] = value / self.diagonal[i];
        }
    }

    /// Solves `Lᵀ x = y` in place.
    pub fn backward_substitute(&self, mut x: DVectorViewMut<f64>) {
        assert_eq!(x.len(), self.dim());
        let columns = self.pattern.columns();
        for i in (0..self.dim()).rev() {
            let xi = x[i] / self.diagonal[i];
            x[i] = xi;
            for k in self.pattern.row_range(i) {
                x[columns[k]] -= self.lower[k] * xi;
            }
        }
    }

    /// Computes `(L Lᵀ)⁻¹ r`.
    pub fn solve(&self, r: &DVector<f64>) -> DVector<f64> {
        let mut x = r.clone();
        self.forward_substitute(DVectorViewMut::from(&mut x));
        self.backward_substitute(DVectorViewMut::from(&mut x));
        x
    }

    /// Reconstructs `L` as a dense lower triangular matrix.
    pub fn to_dense_factor(&self) -> nalgebra::DMatrix<f64> {
        let n = self.dim();
        let mut l = nalgebra::DMatrix::zeros(n, n);
        for i in 0..n {
            l[(i, i)] = self.diagonal[i];
            for k in self.pattern.row_range(i) {
                l[(i, self.pattern.columns()[k])] = self.lower[k];
            }
        }
        l
    }
}

impl LinearOperator for IncompleteCholesky {
    fn apply(&self, mut y: DVectorViewMut<f64>, x: DVectorView<f64>) -> Result<(), OperatorError> {
        if x.len() != self.dim() || y.len() != self.dim() {
            return Err("Dimension mismatch in incomplete Cholesky preconditioner".into());
        }
        y.copy_from(&x);
        self.forward_substitute(DVectorViewMut::from(&mut y));
        self.backward_substitute(y);
        Ok(())
    }
}

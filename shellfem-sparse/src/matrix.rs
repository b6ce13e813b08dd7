use crate::cg::LinearOperator;
use crate::pattern::LowerTriangularPattern;
use nalgebra::{DMatrix, DVector, DVectorView, DVectorViewMut};
use nalgebra_sparse::{CooMatrix, CsrMatrix};
use std::error::Error;
use std::ops::Mul;
use std::sync::Arc;

/// A symmetric sparse matrix storing its full diagonal and its strictly lower triangle.
///
/// The off-diagonal values are parallel to [`LowerTriangularPattern::columns`]: the value at
/// storage position `k` of row `i` represents both `A[i, columns[k]]` and `A[columns[k], i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct SymmetricCsrMatrix {
    pattern: Arc<LowerTriangularPattern>,
    diagonal: Vec<f64>,
    off_diagonal: Vec<f64>,
}

impl SymmetricCsrMatrix {
    /// A matrix with the given pattern and all values set to zero.
    pub fn zeros(pattern: Arc<LowerTriangularPattern>) -> Self {
        let diagonal = vec![0.0; pattern.dim()];
        let off_diagonal = vec![0.0; pattern.nnz()];
        Self {
            pattern,
            diagonal,
            off_diagonal,
        }
    }

    /// # Panics
    ///
    /// Panics if the number of values does not match the dimensions of the pattern.
    pub fn from_pattern_and_values(
        pattern: Arc<LowerTriangularPattern>,
        diagonal: Vec<f64>,
        off_diagonal: Vec<f64>,
    ) -> Self {
        assert_eq!(diagonal.len(), pattern.dim(), "Diagonal length must match pattern dimension.");
        assert_eq!(
            off_diagonal.len(),
            pattern.nnz(),
            "Number of off-diagonal values must match pattern."
        );
        Self {
            pattern,
            diagonal,
            off_diagonal,
        }
    }

    /// Builds a sparse matrix from the diagonal and the non-zero entries of the strictly lower
    /// triangle of a square dense matrix. The upper triangle is ignored.
    ///
    /// # Panics
    ///
    /// Panics if the matrix is not square.
    pub fn from_dense_lower(matrix: &DMatrix<f64>) -> Self {
        assert_eq!(matrix.nrows(), matrix.ncols(), "Matrix must be square.");
        let n = matrix.nrows();

        let mut offsets = Vec::with_capacity(n + 1);
        let mut columns = Vec::new();
        let mut off_diagonal = Vec::new();
        offsets.push(0);
        for i in 0..n {
            for j in 0..i {
                let value = matrix[(i, j)];
                if value != 0.0 {
                    columns.push(j);
                    off_diagonal.push(value);
                }
            }
            offsets.push(columns.len());
        }

        let pattern = LowerTriangularPattern::from_offsets_and_columns_unchecked(offsets, columns);
        let diagonal = matrix.diagonal().iter().copied().collect();
        Self::from_pattern_and_values(Arc::new(pattern), diagonal, off_diagonal)
    }

    pub fn dim(&self) -> usize {
        self.diagonal.len()
    }

    /// Number of explicitly stored off-diagonal entries of the lower triangle.
    pub fn nnz(&self) -> usize {
        self.off_diagonal.len()
    }

    pub fn pattern(&self) -> &Arc<LowerTriangularPattern> {
        &self.pattern
    }

    pub fn diagonal(&self) -> &[f64] {
        &self.diagonal
    }

    pub fn diagonal_mut(&mut self) -> &mut [f64] {
        &mut self.diagonal
    }

    pub fn off_diagonal(&self) -> &[f64] {
        &self.off_diagonal
    }

    pub fn off_diagonal_mut(&mut self) -> &mut [f64] {
        &mut self.off_diagonal
    }

    /// Pattern, diagonal and off-diagonal values, with the values mutable at the same time.
    pub fn parts_mut(&mut self) -> (&LowerTriangularPattern, &mut [f64], &mut [f64]) {
        (&self.pattern, &mut self.diagonal, &mut self.off_diagonal)
    }

    /// Returns `A[i, j]`, which is zero for entries outside of the pattern.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        if i == j {
            self.diagonal[i]
        } else {
            let (row, col) = if i > j { (i, j) } else { (j, i) };
            self.pattern
                .find(row, col)
                .map(|k| self.off_diagonal[k])
                .unwrap_or(0.0)
        }
    }

    /// Sets all stored values to zero, keeping the pattern.
    pub fn clear(&mut self) {
        self.diagonal.fill(0.0);
        self.off_diagonal.fill(0.0);
    }

    /// Computes `y = A x`.
    ///
    /// # Panics
    ///
    /// Panics if the dimensions of `x` or `y` do not match the matrix.
    pub fn spmv_into(&self, mut y: DVectorViewMut<f64>, x: DVectorView<f64>) {
        assert_eq!(x.len(), self.dim());
        assert_eq!(y.len(), self.dim());
        y.fill(0.0);

        let columns = self.pattern.columns();
        for i in 0..self.dim() {
            y[i] += self.diagonal[i] * x[i];
            for k in self.pattern.row_range(i) {
                let j = columns[k];
                let a_ij = self.off_diagonal[k];
                y[i] += a_ij * x[j];
                y[j] += a_ij * x[i];
            }
        }
    }

    pub fn to_dense(&self) -> DMatrix<f64> {
        let mut dense = DMatrix::from_diagonal(&DVector::from_column_slice(&self.diagonal));
        let columns = self.pattern.columns();
        for i in 0..self.dim() {
            for k in self.pattern.row_range(i) {
                let j = columns[k];
                dense[(i, j)] = self.off_diagonal[k];
                dense[(j, i)] = self.off_diagonal[k];
            }
        }
        dense
    }

    /// Converts to a general CSR matrix with both triangles stored explicitly.
    pub fn to_nalgebra_csr(&self) -> CsrMatrix<f64> {
        let n = self.dim();
        let mut coo = CooMatrix::new(n, n);
        let columns = self.pattern.columns();
        for i in 0..n {
            coo.push(i, i, self.diagonal[i]);
            for k in self.pattern.row_range(i) {
                coo.push(i, columns[k], self.off_diagonal[k]);
                coo.push(columns[k], i, self.off_diagonal[k]);
            }
        }
        CsrMatrix::from(&coo)
    }
}

impl<'a> Mul<&'a DVector<f64>> for &'a SymmetricCsrMatrix {
    type Output = DVector<f64>;

    fn mul(self, rhs: &'a DVector<f64>) -> Self::Output {
        let mut y = DVector::zeros(self.dim());
        self.spmv_into(DVectorViewMut::from(&mut y), DVectorView::from(rhs));
        y
    }
}

impl LinearOperator for SymmetricCsrMatrix {
    fn apply(&self, y: DVectorViewMut<f64>, x: DVectorView<f64>) -> Result<(), Box<dyn Error + Send + Sync>> {
        if x.len() != self.dim() || y.len() != self.dim() {
            return Err(format!(
                "Operator of dimension {} applied to vectors of length {} and {}",
                self.dim(),
                x.len(),
                y.len()
            )
            .into());
        }
        self.spmv_into(y, x);
        Ok(())
    }
}

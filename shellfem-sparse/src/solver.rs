//! Stateful front-end for solving a symmetric positive definite sparse system.
use crate::cg::{CgOutput, ConjugateGradient, IdentityOperator, RelativeResidualCriterion, SolveError, SolveErrorKind};
use crate::cholesky::IncompleteCholesky;
use crate::matrix::SymmetricCsrMatrix;
use log::{debug, warn};
use nalgebra::{DVector, DVectorView, DVectorViewMut};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Preconditioner {
    /// Plain Conjugate Gradient.
    None,
    /// Incomplete Cholesky factorization on the pattern of the system matrix.
    #[default]
    IncompleteCholesky,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverState {
    Uninitialized,
    MatrixSet,
    VectorSet,
    /// Both the matrix and the right-hand side are available.
    Ready,
    Converged,
    MaxIterationsExceeded,
}

/// Preconditioned Conjugate Gradient solver for `A x = b`, starting from `x = 0`.
///
/// The matrix and right-hand side must both be provided before [`IterativeSolver::compute`].
/// Replacing either one after a solve discards the previous solution.
#[derive(Debug, Clone)]
pub struct IterativeSolver {
    max_iterations: usize,
    tolerance: f64,
    preconditioner: Preconditioner,
    matrix: Option<SymmetricCsrMatrix>,
    vector: Option<DVector<f64>>,
    solution: Option<DVector<f64>>,
    output: Option<CgOutput>,
    running_time: Option<Duration>,
}

impl IterativeSolver {
    pub fn new(max_iterations: usize, tolerance: f64, preconditioner: Preconditioner) -> Self {
        Self {
            max_iterations,
            tolerance,
            preconditioner,
            matrix: None,
            vector: None,
            solution: None,
            output: None,
            running_time: None,
        }
    }

    pub fn set_matrix(&mut self, matrix: SymmetricCsrMatrix) {
        self.matrix = Some(matrix);
        self.reset_result();
    }

    pub fn set_vector(&mut self, vector: DVector<f64>) {
        self.vector = Some(vector);
        self.reset_result();
    }

    fn reset_result(&mut self) {
        self.solution = None;
        self.output = None;
        self.running_time = None;
    }

    pub fn state(&self) -> SolverState {
        match (&self.matrix, &self.vector, &self.output) {
            (_, _, Some(output)) if output.converged => SolverState::Converged,
            (_, _, Some(_)) => SolverState::MaxIterationsExceeded,
            (None, None, None) => SolverState::Uninitialized,
            (Some(_), None, None) => SolverState::MatrixSet,
            (None, Some(_), None) => SolverState::VectorSet,
            (Some(_), Some(_), None) => SolverState::Ready,
        }
    }

    pub fn matrix(&self) -> Option<&SymmetricCsrMatrix> {
        self.matrix.as_ref()
    }

    pub fn vector(&self) -> Option<&DVector<f64>> {
        self.vector.as_ref()
    }

    /// The solution of the last call to [`compute`](Self::compute), if any.
    pub fn solution(&self) -> Option<&DVector<f64>> {
        self.solution.as_ref()
    }

    pub fn into_solution(self) -> Option<DVector<f64>> {
        self.solution
    }

    pub fn output(&self) -> Option<&CgOutput> {
        self.output.as_ref()
    }

    /// Wall-clock time of the last solve, including the preconditioner factorization.
    pub fn running_time(&self) -> Option<Duration> {
        self.running_time
    }

    pub fn compute(&mut self) -> Result<CgOutput, SolveError> {
        let matrix = self
            .matrix
            .as_ref()
            .ok_or_else(|| SolveError::new(CgOutput::initial(), SolveErrorKind::MatrixNotSet))?;
        let b = self
            .vector
            .as_ref()
            .ok_or_else(|| SolveError::new(CgOutput::initial(), SolveErrorKind::VectorNotSet))?;
        if matrix.dim() != b.len() {
            let kind = SolveErrorKind::DimensionMismatch {
                matrix_dim: matrix.dim(),
                vector_len: b.len(),
            };
            return Err(SolveError::new(CgOutput::initial(), kind));
        }

        let start = Instant::now();
        let mut x = DVector::zeros(b.len());
        let criterion = RelativeResidualCriterion::new(self.tolerance);
        let cg = ConjugateGradient::new()
            .with_operator(matrix)
            .with_stopping_criterion(criterion)
            .with_max_iter(self.max_iterations);

        let output = match self.preconditioner {
            Preconditioner::None => cg
                .with_preconditioner(IdentityOperator)
                .solve_with_guess(DVectorView::from(b), DVectorViewMut::from(&mut x))?,
            Preconditioner::IncompleteCholesky => {
                let factor = IncompleteCholesky::factor(matrix).map_err(|breakdown| {
                    let kind = SolveErrorKind::CholeskyBreakdown {
                        row: breakdown.row,
                        pivot: breakdown.pivot,
                    };
                    SolveError::new(CgOutput::initial(), kind)
                })?;
                cg.with_preconditioner(&factor)
                    .solve_with_guess(DVectorView::from(b), DVectorViewMut::from(&mut x))?
            }
        };
        let elapsed = start.elapsed();

        if output.converged {
            debug!(
                "CG ({:?}) converged after {} iterations, relative residual {:e}",
                self.preconditioner, output.num_iterations, output.relative_residual
            );
        } else {
            warn!(
                "CG ({:?}) did not converge within {} iterations, relative residual {:e}",
                self.preconditioner, self.max_iterations, output.relative_residual
            );
        }

        self.solution = Some(x);
        self.output = Some(output.clone());
        self.running_time = Some(elapsed);
        Ok(output)
    }
}

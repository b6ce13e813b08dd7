//! Preconditioned Conjugate Gradient for symmetric positive definite operators.
use core::fmt;
use nalgebra::{DMatrix, DVector, DVectorView, DVectorViewMut};
use std::error::Error;
use std::ops::{Deref, DerefMut};

/// Type-erased error produced by operators and preconditioners.
pub type OperatorError = Box<dyn Error + Send + Sync>;

pub trait LinearOperator {
    /// Computes `y = A x`.
    fn apply(&self, y: DVectorViewMut<f64>, x: DVectorView<f64>) -> Result<(), OperatorError>;
}

impl<'a, A> LinearOperator for &'a A
where
    A: ?Sized + LinearOperator,
{
    fn apply(&self, y: DVectorViewMut<f64>, x: DVectorView<f64>) -> Result<(), OperatorError> {
        <A as LinearOperator>::apply(self, y, x)
    }
}

impl LinearOperator for DMatrix<f64> {
    fn apply(&self, mut y: DVectorViewMut<f64>, x: DVectorView<f64>) -> Result<(), OperatorError> {
        if self.ncols() != x.len() || self.nrows() != y.len() {
            return Err("Dimension mismatch in dense operator".into());
        }
        y.gemv(1.0, self, &x, 0.0);
        Ok(())
    }
}

pub struct IdentityOperator;

impl LinearOperator for IdentityOperator {
    fn apply(&self, mut y: DVectorViewMut<f64>, x: DVectorView<f64>) -> Result<(), OperatorError> {
        y.copy_from(&x);
        Ok(())
    }
}

pub trait CgStoppingCriterion {
    fn has_converged(&self, b_norm: f64, iteration: usize, approx_residual: DVectorView<f64>) -> bool;
}

/// Relative residual tolerance `||r|| < tol * ||b||`.
///
/// Note that we use the *approximate* residual given by Conjugate-Gradient. For ill-conditioned
/// problems, it is possible that CG's residual converges, but the real residual does not.
#[derive(Debug, Clone, Copy)]
pub struct RelativeResidualCriterion {
    tol: f64,
}

impl RelativeResidualCriterion {
    pub fn new(tol: f64) -> Self {
        Self { tol }
    }

    pub fn tolerance(&self) -> f64 {
        self.tol
    }
}

impl Default for RelativeResidualCriterion {
    fn default() -> Self {
        Self::new(1e-8)
    }
}

impl CgStoppingCriterion for RelativeResidualCriterion {
    fn has_converged(&self, b_norm: f64, _iteration: usize, approx_residual: DVectorView<f64>) -> bool {
        approx_residual.norm() < self.tol * b_norm
    }
}

#[derive(Debug, Clone)]
#[allow(non_snake_case)]
pub struct CgWorkspace {
    r: DVector<f64>,
    z: DVector<f64>,
    p: DVector<f64>,
    Ap: DVector<f64>,
}

#[allow(non_snake_case)]
struct Buffers<'a> {
    r: &'a mut DVector<f64>,
    z: &'a mut DVector<f64>,
    p: &'a mut DVector<f64>,
    Ap: &'a mut DVector<f64>,
}

impl Default for CgWorkspace {
    fn default() -> Self {
        Self {
            r: DVector::zeros(0),
            z: DVector::zeros(0),
            p: DVector::zeros(0),
            Ap: DVector::zeros(0),
        }
    }
}

impl CgWorkspace {
    fn prepare_buffers(&mut self, dim: usize) -> Buffers {
        self.r.resize_vertically_mut(dim, 0.0);
        self.z.resize_vertically_mut(dim, 0.0);
        self.p.resize_vertically_mut(dim, 0.0);
        self.Ap.resize_vertically_mut(dim, 0.0);
        Buffers {
            r: &mut self.r,
            z: &mut self.z,
            p: &mut self.p,
            Ap: &mut self.Ap,
        }
    }
}

#[derive(Debug)]
enum OwnedOrMutRef<'a, T> {
    Owned(T),
    MutRef(&'a mut T),
}

impl<'a, T> Deref for OwnedOrMutRef<'a, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        match self {
            Self::Owned(owned) => owned,
            Self::MutRef(mutref) => mutref,
        }
    }
}

impl<'a, T> DerefMut for OwnedOrMutRef<'a, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        match self {
            Self::Owned(owned) => owned,
            Self::MutRef(mutref) => mutref,
        }
    }
}

#[derive(Debug)]
pub struct ConjugateGradient<'a, A, P, Criterion> {
    workspace: OwnedOrMutRef<'a, CgWorkspace>,
    operator: A,
    preconditioner: P,
    stopping_criterion: Criterion,
    max_iter: Option<usize>,
}

impl<'a> ConjugateGradient<'a, (), IdentityOperator, ()> {
    pub fn new() -> Self {
        Self {
            workspace: OwnedOrMutRef::Owned(CgWorkspace::default()),
            operator: (),
            preconditioner: IdentityOperator,
            stopping_criterion: (),
            max_iter: None,
        }
    }

    pub fn with_workspace(workspace: &'a mut CgWorkspace) -> Self {
        Self {
            workspace: OwnedOrMutRef::MutRef(workspace),
            operator: (),
            preconditioner: IdentityOperator,
            stopping_criterion: (),
            max_iter: None,
        }
    }
}

impl<'a> Default for ConjugateGradient<'a, (), IdentityOperator, ()> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, P, Criterion> ConjugateGradient<'a, (), P, Criterion> {
    pub fn with_operator<A>(self, operator: A) -> ConjugateGradient<'a, A, P, Criterion> {
        ConjugateGradient {
            workspace: self.workspace,
            operator,
            preconditioner: self.preconditioner,
            stopping_criterion: self.stopping_criterion,
            max_iter: self.max_iter,
        }
    }
}

impl<'a, A, P, Criterion> ConjugateGradient<'a, A, P, Criterion> {
    pub fn with_preconditioner<P2>(self, preconditioner: P2) -> ConjugateGradient<'a, A, P2, Criterion> {
        ConjugateGradient {
            workspace: self.workspace,
            operator: self.operator,
            preconditioner,
            stopping_criterion: self.stopping_criterion,
            max_iter: self.max_iter,
        }
    }

    pub fn with_max_iter(self, max_iter: usize) -> Self {
        Self {
            max_iter: Some(max_iter),
            ..self
        }
    }
}

impl<'a, A, P> ConjugateGradient<'a, A, P, ()> {
    pub fn with_stopping_criterion<Criterion>(
        self,
        stopping_criterion: Criterion,
    ) -> ConjugateGradient<'a, A, P, Criterion> {
        ConjugateGradient {
            workspace: self.workspace,
            operator: self.operator,
            preconditioner: self.preconditioner,
            stopping_criterion,
            max_iter: self.max_iter,
        }
    }
}

#[derive(Debug)]
#[non_exhaustive]
pub enum SolveErrorKind {
    /// `compute` was called before a matrix was provided.
    MatrixNotSet,
    /// `compute` was called before a right-hand side was provided.
    VectorNotSet,
    DimensionMismatch { matrix_dim: usize, vector_len: usize },
    /// The incomplete Cholesky factorization encountered a non-positive pivot.
    CholeskyBreakdown { row: usize, pivot: f64 },
    OperatorError(OperatorError),
    PreconditionerError(OperatorError),
    IndefiniteOperator,
    IndefinitePreconditioner,
}

impl fmt::Display for SolveErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MatrixNotSet => write!(f, "No matrix has been set. Call `set_matrix` before `compute`."),
            Self::VectorNotSet => write!(f, "No right-hand side has been set. Call `set_vector` before `compute`."),
            Self::DimensionMismatch { matrix_dim, vector_len } => write!(
                f,
                "Matrix dimension {} does not match right-hand side length {}",
                matrix_dim, vector_len
            ),
            Self::CholeskyBreakdown { row, pivot } => write!(
                f,
                "Incomplete Cholesky factorization broke down at row {} (pivot {:e}); \
                 the matrix is not positive definite",
                row, pivot
            ),
            Self::OperatorError(err) => {
                write!(f, "Error applying operator: ")?;
                err.fmt(f)
            }
            Self::PreconditionerError(err) => {
                write!(f, "Error applying preconditioner: ")?;
                err.fmt(f)
            }
            Self::IndefiniteOperator => write!(f, "Operator appears to be indefinite"),
            Self::IndefinitePreconditioner => write!(f, "Indefinite preconditioner"),
        }
    }
}

#[non_exhaustive]
#[derive(Debug)]
pub struct SolveError {
    pub output: CgOutput,
    pub kind: SolveErrorKind,
}

impl SolveError {
    pub(crate) fn new(output: CgOutput, kind: SolveErrorKind) -> Self {
        Self { output, kind }
    }
}

impl fmt::Display for SolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CG solve failed after {} iterations. ", self.output.num_iterations)?;
        write!(f, "Error: {}", self.kind)
    }
}

impl std::error::Error for SolveError {}

/// y = Ax
fn apply_operator<A: LinearOperator>(y: &mut DVector<f64>, a: &A, x: DVectorView<f64>) -> Result<(), OperatorError> {
    a.apply(DVectorViewMut::from(y), x)
}

#[non_exhaustive]
#[derive(Debug, Clone, PartialEq)]
pub struct CgOutput {
    /// Number of iterations of the solver.
    ///
    /// Corresponds to the number of updates made to the (initial) solution vector.
    pub num_iterations: usize,
    /// Relative norm `||r|| / ||b||` of the approximate residual at termination.
    pub relative_residual: f64,
    /// Whether the stopping criterion was satisfied. Reaching the iteration limit is not an
    /// error; the best available iterate is kept in that case.
    pub converged: bool,
}

impl CgOutput {
    pub(crate) fn initial() -> Self {
        Self {
            num_iterations: 0,
            relative_residual: f64::INFINITY,
            converged: false,
        }
    }
}

impl<'a, A, P, Criterion> ConjugateGradient<'a, A, P, Criterion>
where
    A: LinearOperator,
    P: LinearOperator,
    Criterion: CgStoppingCriterion,
{
    pub fn solve_with_guess<'b>(
        &mut self,
        b: impl Into<DVectorView<'b, f64>>,
        x: impl Into<DVectorViewMut<'b, f64>>,
    ) -> Result<CgOutput, SolveError> {
        self.solve_with_guess_(b.into(), x.into())
    }

    #[allow(non_snake_case)]
    fn solve_with_guess_(&mut self, b: DVectorView<f64>, mut x: DVectorViewMut<f64>) -> Result<CgOutput, SolveError> {
        use SolveErrorKind::*;
        assert_eq!(b.len(), x.len());

        let mut output = CgOutput::initial();

        let Buffers { r, z, p, Ap } = self.workspace.prepare_buffers(x.len());

        let b_norm = b.norm();
        if b_norm == 0.0 {
            x.fill(0.0);
            output.relative_residual = 0.0;
            output.converged = true;
            return Ok(output);
        }

        // r = b - Ax
        if let Err(err) = apply_operator(r, &self.operator, (&x).into()) {
            return Err(SolveError::new(output, OperatorError(err)));
        }
        r.axpy(1.0, &b, -1.0);

        // z = Pr
        if let Err(err) = apply_operator(z, &self.preconditioner, (&*r).into()) {
            return Err(SolveError::new(output, PreconditionerError(err)));
        }

        // p = z
        p.copy_from(&*z);

        let mut zTr = z.dot(&*r);
        let mut pAp;

        loop {
            output.relative_residual = r.norm() / b_norm;
            if self
                .stopping_criterion
                .has_converged(b_norm, output.num_iterations, (&*r).into())
            {
                output.converged = true;
                break;
            } else if let Some(max_iter) = self.max_iter {
                if output.num_iterations >= max_iter {
                    break;
                }
            }

            // Ap = A * p
            if let Err(err) = apply_operator(Ap, &self.operator, (&*p).into()) {
                return Err(SolveError::new(output, OperatorError(err)));
            }
            pAp = p.dot(&*Ap);

            if !(pAp > 0.0) {
                return Err(SolveError::new(output, IndefiniteOperator));
            }
            if !(zTr > 0.0) {
                return Err(SolveError::new(output, IndefinitePreconditioner));
            }

            let alpha = zTr / pAp;
            // x <- x + alpha * p
            x.axpy(alpha, &*p, 1.0);
            // r <- r - alpha * Ap
            r.axpy(-alpha, &*Ap, 1.0);

            // Number of iterations corresponds to number of updates to the x vector
            output.num_iterations += 1;

            // z <- P r
            if let Err(err) = apply_operator(z, &self.preconditioner, (&*r).into()) {
                return Err(SolveError::new(output, PreconditionerError(err)));
            }
            let zTr_next = z.dot(&*r);
            let beta = zTr_next / zTr;

            // p <- z + beta * p
            p.axpy(1.0, &*z, beta);

            zTr = zTr_next;
        }

        Ok(output)
    }
}

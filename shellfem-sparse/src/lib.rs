//! Sparse linear algebra for symmetric finite element systems.
//!
//! Only the diagonal and the strictly lower triangle of a symmetric matrix are stored. The index
//! structure (the *portrait*) is shared between matrices through an [`Arc`](std::sync::Arc), so
//! that the incomplete Cholesky factor can reuse the pattern of the system matrix.

pub mod cg;
pub mod cholesky;
pub mod pattern;
pub mod solver;

mod matrix;

pub use cg::{CgOutput, LinearOperator, SolveError, SolveErrorKind};
pub use cholesky::{CholeskyBreakdown, IncompleteCholesky};
pub use matrix::SymmetricCsrMatrix;
pub use pattern::{LowerTriangularPattern, PatternError};
pub use solver::{IterativeSolver, Preconditioner, SolverState};

pub extern crate nalgebra;
pub extern crate nalgebra_sparse;

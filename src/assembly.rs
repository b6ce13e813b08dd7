//! Assembly of the global system for the Poisson problem.
//!
//! Assembly proceeds in three stages: the portrait (sparsity pattern) of the global matrix is
//! built from the element connectivity, local stiffness and mass matrices are computed for each
//! element, and finally the local contributions are scattered into the lower triangle of the
//! global matrix and into the load vector.
pub mod global;
pub mod local;

mod portrait;

pub use portrait::build_portrait;

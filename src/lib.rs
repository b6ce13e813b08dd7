use std::fmt;

pub mod assembly;
pub mod basis;
pub mod boundary;
pub mod dense;
pub mod error;
pub mod integrate;
pub mod mesh;
pub mod problem;
pub mod quadrature;

#[cfg(feature = "proptest")]
pub mod proptest;

pub mod sparse {
    pub use shellfem_sparse::*;
}

pub extern crate nalgebra;

/// Errors produced while setting up and assembling a finite element system.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// The global matrix was accessed before its portrait was built.
    MatrixNotInitialized,
    /// A dense matrix could not be inverted.
    SingularMatrix { determinant: f64 },
    /// An element has (numerically) zero volume.
    DegenerateElement { element: usize, determinant: f64 },
    /// A local shape function index is out of range.
    BasisFunctionIndex { index: usize, size: usize },
    /// A derivative index is not one of 0, 1 or 2.
    DerivativeIndex { index: usize },
    InvalidMesh(String),
    /// An entry in the strict upper triangle was passed to a symmetric matrix.
    UpperTriangleEntry { row: usize, col: usize },
    /// An entry of the strict lower triangle is not part of the portrait.
    EntryNotInPattern { row: usize, col: usize },
    /// An entry lies outside of the global matrix.
    EntryOutOfBounds { row: usize, col: usize, dim: usize },
    InvalidConfiguration(String),
    BoundaryNodeOutOfBounds { node: usize, num_nodes: usize },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MatrixNotInitialized => {
                write!(f, "The global matrix is not initialized. Build the portrait before assembly.")
            }
            Self::SingularMatrix { determinant } => {
                write!(f, "Matrix is not invertible (determinant {determinant:e})")
            }
            Self::DegenerateElement { element, determinant } => {
                write!(f, "Element {element} is degenerate (determinant {determinant:e})")
            }
            Self::BasisFunctionIndex { index, size } => write!(
                f,
                "Shape function index {index} is out of range, expected an index in 0..{size}"
            ),
            Self::DerivativeIndex { index } => {
                write!(f, "Derivative index {index} is out of range, expected 0, 1 or 2")
            }
            Self::InvalidMesh(msg) => write!(f, "Invalid mesh: {msg}"),
            Self::UpperTriangleEntry { row, col } => write!(
                f,
                "Entry ({row}, {col}) lies in the upper triangle, but only the lower triangle is stored"
            ),
            Self::EntryNotInPattern { row, col } => {
                write!(f, "Entry ({row}, {col}) is not part of the matrix portrait")
            }
            Self::EntryOutOfBounds { row, col, dim } => write!(
                f,
                "Entry ({row}, {col}) is out of bounds for a matrix of dimension {dim}"
            ),
            Self::InvalidConfiguration(msg) => write!(f, "Invalid configuration: {msg}"),
            Self::BoundaryNodeOutOfBounds { node, num_nodes } => write!(
                f,
                "Boundary node {node} is out of bounds for a mesh with {num_nodes} nodes"
            ),
        }
    }
}

impl std::error::Error for Error {}

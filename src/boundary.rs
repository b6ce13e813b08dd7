//! Elimination of Dirichlet boundary conditions from the assembled system.
use crate::nalgebra::{DVector, Point3};
use crate::sparse::SymmetricCsrMatrix;
use crate::Error;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DirichletKind {
    /// Prescribed value on the outer boundary of the domain.
    External,
    /// Prescribed value on the inner boundary of the domain.
    Internal,
    /// The value is taken from the exact solution at the node.
    NeedExact,
}

/// A node with a prescribed value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DirichletBoundary {
    pub node: usize,
    /// Filled in by [`apply_dirichlet`].
    pub value: f64,
    pub kind: DirichletKind,
    pub area: usize,
}

impl DirichletBoundary {
    pub fn new(node: usize, kind: DirichletKind, area: usize) -> Self {
        Self {
            node,
            value: 0.0,
            kind,
            area,
        }
    }
}

/// Constant values for the `External` and `Internal` boundary kinds.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundaryValues {
    pub external: f64,
    pub internal: f64,
}

/// Computes the prescribed value of every boundary entry and stores it in its `value` field.
pub fn resolve_boundary_values(
    boundaries: &mut [DirichletBoundary],
    points: &[Point3<f64>],
    values: &BoundaryValues,
    exact_solution: impl Fn(&Point3<f64>, usize) -> f64,
) -> Result<(), Error> {
    for boundary in boundaries.iter_mut() {
        let point = points.get(boundary.node).ok_or(Error::BoundaryNodeOutOfBounds {
            node: boundary.node,
            num_nodes: points.len(),
        })?;
        boundary.value = match boundary.kind {
            DirichletKind::External => values.external,
            DirichletKind::Internal => values.internal,
            DirichletKind::NeedExact => exact_solution(point, boundary.area),
        };
    }
    Ok(())
}

/// Maps every node to the index of its boundary entry, if any.
///
/// If a node appears several times, the last entry wins.
fn boundary_lookup(boundaries: &[DirichletBoundary], num_nodes: usize) -> Result<Vec<Option<usize>>, Error> {
    let mut lookup = vec![None; num_nodes];
    for (index, boundary) in boundaries.iter().enumerate() {
        let entry = lookup
            .get_mut(boundary.node)
            .ok_or(Error::BoundaryNodeOutOfBounds {
                node: boundary.node,
                num_nodes,
            })?;
        if entry.replace(index).is_some() {
            warn!("Node {} has several Dirichlet entries, using the last one", boundary.node);
        }
    }
    Ok(lookup)
}

/// Eliminates the Dirichlet conditions from the symmetric system `A x = b`.
///
/// Boundary values must already be resolved (see [`resolve_boundary_values`]). Afterwards,
/// rows and columns of boundary nodes are decoupled: their diagonal entry is one, their
/// off-diagonal entries are zero, and the right-hand side holds the prescribed value. The known
/// values are moved to the right-hand side of the coupled free nodes. The portrait is unchanged,
/// so eliminated entries remain stored as explicit zeros.
pub fn apply_dirichlet_values(
    matrix: &mut SymmetricCsrMatrix,
    rhs: &mut DVector<f64>,
    boundaries: &[DirichletBoundary],
) -> Result<(), Error> {
    let n = matrix.dim();
    if rhs.len() != n {
        return Err(Error::InvalidConfiguration(format!(
            "right-hand side has length {}, but the matrix has dimension {n}",
            rhs.len()
        )));
    }
    let lookup = boundary_lookup(boundaries, n)?;

    let (pattern, diagonal, off_diagonal) = matrix.parts_mut();
    let columns = pattern.columns();
    for i in 0..n {
        if let Some(index) = lookup[i] {
            diagonal[i] = 1.0;
            rhs[i] = boundaries[index].value;
            for k in pattern.row_range(i) {
                let col = columns[k];
                if lookup[col].is_none() {
                    rhs[col] -= off_diagonal[k] * rhs[i];
                }
                off_diagonal[k] = 0.0;
            }
        } else {
            for k in pattern.row_range(i) {
                let col = columns[k];
                if lookup[col].is_some() {
                    rhs[i] -= off_diagonal[k] * rhs[col];
                    off_diagonal[k] = 0.0;
                }
            }
        }
    }

    debug!(
        "Eliminated {} Dirichlet nodes",
        lookup.iter().filter(|entry| entry.is_some()).count()
    );
    Ok(())
}

/// Resolves the boundary values and eliminates them from the system.
pub fn apply_dirichlet(
    matrix: &mut SymmetricCsrMatrix,
    rhs: &mut DVector<f64>,
    points: &[Point3<f64>],
    boundaries: &mut [DirichletBoundary],
    values: &BoundaryValues,
    exact_solution: impl Fn(&Point3<f64>, usize) -> f64,
) -> Result<(), Error> {
    resolve_boundary_values(boundaries, points, values, exact_solution)?;
    apply_dirichlet_values(matrix, rhs, boundaries)
}

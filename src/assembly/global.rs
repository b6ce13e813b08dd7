//! Scattering of local element contributions into the global system.
use crate::assembly::build_portrait;
use crate::assembly::local::{LocalAssembler, LocalMatrices};
use crate::basis::Basis;
use crate::integrate::Integrator;
use crate::mesh::Mesh;
use crate::nalgebra::{DMatrix, DVector, Point3};
use crate::sparse::SymmetricCsrMatrix;
use crate::Error;
use log::debug;
use std::sync::Arc;

/// Assembles the global stiffness matrix and load vector of a mesh.
///
/// The global matrix only exists once [`build_portrait`](Self::build_portrait) has been called.
/// Only its diagonal and strictly lower triangle are stored.
#[derive(Debug, Clone)]
pub struct SystemAssembler<'a> {
    mesh: &'a Mesh,
    local_assembler: LocalAssembler,
    matrix: Option<SymmetricCsrMatrix>,
    vector: DVector<f64>,
}

impl<'a> SystemAssembler<'a> {
    /// Returns an error if the elements of the mesh do not have as many nodes as the basis has
    /// shape functions.
    pub fn new(mesh: &'a Mesh, basis: Basis, integrator: Integrator) -> Result<Self, Error> {
        if let Some(n) = mesh.nodes_per_element().filter(|&n| n != basis.size()) {
            return Err(Error::InvalidConfiguration(format!(
                "{basis:?} basis requires elements with {} nodes, but the mesh has elements with {n} nodes",
                basis.size()
            )));
        }
        Ok(Self {
            mesh,
            local_assembler: LocalAssembler::new(basis, integrator)?,
            matrix: None,
            vector: DVector::zeros(mesh.num_nodes()),
        })
    }

    pub fn mesh(&self) -> &Mesh {
        self.mesh
    }

    pub fn local_assembler(&self) -> &LocalAssembler {
        &self.local_assembler
    }

    /// Builds the portrait of the global matrix and resets all values to zero.
    pub fn build_portrait(&mut self) -> Result<(), Error> {
        let pattern = build_portrait(self.mesh)?;
        self.matrix = Some(SymmetricCsrMatrix::zeros(Arc::new(pattern)));
        self.vector.fill(0.0);
        Ok(())
    }

    pub fn matrix(&self) -> Option<&SymmetricCsrMatrix> {
        self.matrix.as_ref()
    }

    pub fn vector(&self) -> &DVector<f64> {
        &self.vector
    }

    /// Returns the assembled matrix and load vector.
    pub fn into_system(self) -> Result<(SymmetricCsrMatrix, DVector<f64>), Error> {
        let matrix = self.matrix.ok_or(Error::MatrixNotInitialized)?;
        Ok((matrix, self.vector))
    }

    /// Adds `value` to the global matrix entry `(i, j)`.
    ///
    /// Only entries on the diagonal or in the strictly lower triangle (`i > j`) may be passed.
    /// Entries in the strictly lower triangle must be part of the portrait, and both indices must
    /// be smaller than the number of nodes.
    pub fn fill_global_matrix(&mut self, i: usize, j: usize, value: f64) -> Result<(), Error> {
        let matrix = self.matrix.as_mut().ok_or(Error::MatrixNotInitialized)?;
        let dim = matrix.dim();
        if i >= dim || j >= dim {
            return Err(Error::EntryOutOfBounds { row: i, col: j, dim });
        }
        if i < j {
            return Err(Error::UpperTriangleEntry { row: i, col: j });
        }
        let (pattern, diagonal, off_diagonal) = matrix.parts_mut();
        if i == j {
            diagonal[i] += value;
        } else {
            let k = pattern
                .find(i, j)
                .ok_or(Error::EntryNotInPattern { row: i, col: j })?;
            off_diagonal[k] += value;
        }
        Ok(())
    }

    /// Computes the local stiffness and mass matrices of the given element.
    pub fn assembly_local_matrices(&self, element_index: usize) -> Result<LocalMatrices, Error> {
        let vertices = self.mesh.element_vertices(element_index);
        self.local_assembler
            .assemble_local_matrices(&vertices)
            .map_err(|err| match err {
                Error::SingularMatrix { determinant } => Error::DegenerateElement {
                    element: element_index,
                    determinant,
                },
                err => err,
            })
    }

    /// Adds the source contribution of an element to the load vector.
    ///
    /// The source is projected through the local mass matrix:
    /// `b[g_i] += Σ_j M[i, j] f(x_{g_j})`, where `g_i` is the global index of local node `i`.
    pub fn assembly_vector(&mut self, element_index: usize, mass: &DMatrix<f64>, source: impl Fn(&Point3<f64>) -> f64) {
        let mesh = self.mesh;
        let nodes = &mesh.elements()[element_index].nodes;
        assert_eq!(mass.nrows(), nodes.len(), "Mass matrix must match the element node count");
        let source_values = DVector::from_iterator(nodes.len(), nodes.iter().map(|&n| source(&mesh.points()[n])));
        let local_vector = mass * source_values;
        for (&node, value) in nodes.iter().zip(local_vector.iter()) {
            self.vector[node] += value;
        }
    }

    /// Adds the stiffness matrix of an element, scaled by its coefficient, to the global matrix.
    fn add_element_stiffness(&mut self, element_index: usize, stiffness: &DMatrix<f64>) -> Result<(), Error> {
        let mesh = self.mesh;
        let element = &mesh.elements()[element_index];
        let lambda = element.lambda;
        for (a, &global_a) in element.nodes.iter().enumerate() {
            for (b, &global_b) in element.nodes.iter().enumerate() {
                if global_a >= global_b {
                    self.fill_global_matrix(global_a, global_b, lambda * stiffness[(a, b)])?;
                }
            }
        }
        Ok(())
    }

    /// Builds the portrait and assembles the complete global matrix and load vector.
    pub fn assemble_system(&mut self, source: impl Fn(&Point3<f64>) -> f64) -> Result<(), Error> {
        self.build_portrait()?;
        for element_index in 0..self.mesh.num_elements() {
            let LocalMatrices { stiffness, mass } = self.assembly_local_matrices(element_index)?;
            self.add_element_stiffness(element_index, &stiffness)?;
            self.assembly_vector(element_index, &mass, &source);
        }
        debug!("Assembled {} elements", self.mesh.num_elements());
        Ok(())
    }
}

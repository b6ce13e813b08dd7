//! Element-level assembly of stiffness and mass matrices.
use crate::basis::{reference_tet_vertices, Basis};
use crate::dense::{determinant_3x3, invert_3x3};
use crate::integrate::Integrator;
use crate::mesh::Mesh;
use crate::nalgebra::{DMatrix, Matrix3, Point3, Vector3};
use crate::Error;

pub trait ElementConnectivityAssembler {
    fn num_elements(&self) -> usize;

    fn num_nodes(&self) -> usize;

    fn element_node_count(&self, element_index: usize) -> usize;

    fn populate_element_nodes(&self, output: &mut [usize], element_index: usize);
}

impl ElementConnectivityAssembler for Mesh {
    fn num_elements(&self) -> usize {
        self.elements().len()
    }

    fn num_nodes(&self) -> usize {
        self.points().len()
    }

    fn element_node_count(&self, element_index: usize) -> usize {
        self.elements()[element_index].nodes.len()
    }

    fn populate_element_nodes(&self, output: &mut [usize], element_index: usize) {
        output.copy_from_slice(&self.elements()[element_index].nodes);
    }
}

/// Mapping data of an element at a single quadrature point.
#[derive(Debug, Clone, PartialEq)]
pub struct QuadraturePointGeometry {
    /// Determinant of the Jacobian of the map from the reference element.
    pub determinant: f64,
    pub inverse_jacobian: Matrix3<f64>,
}

/// Local matrices of an element, indexed by local node.
///
/// The stiffness matrix is not yet scaled by the element coefficient.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalMatrices {
    pub stiffness: DMatrix<f64>,
    pub mass: DMatrix<f64>,
}

/// Computes local matrices for elements of a given basis with a fixed quadrature rule.
///
/// Basis values and reference gradients at the quadrature points do not depend on the element
/// and are tabulated once on construction.
#[derive(Debug, Clone)]
pub struct LocalAssembler {
    basis: Basis,
    integrator: Integrator,
    // Indexed by [quadrature point][shape function]
    reference_values: Vec<Vec<f64>>,
    reference_gradients: Vec<Vec<Vector3<f64>>>,
    // Gradients of the linear geometric shape functions, which are constant
    geometric_gradients: [Vector3<f64>; 4],
}

impl LocalAssembler {
    pub fn new(basis: Basis, integrator: Integrator) -> Result<Self, Error> {
        let reference = basis.update_cache(&reference_tet_vertices())?;
        let geometry = Basis::Linear.update_cache(&reference_tet_vertices())?;

        let mut reference_values = Vec::with_capacity(integrator.num_points());
        let mut reference_gradients = Vec::with_capacity(integrator.num_points());
        for xi in integrator.points() {
            let values = (0..basis.size())
                .map(|i| reference.psi(i, xi))
                .collect::<Result<Vec<_>, _>>()?;
            let gradients = (0..basis.size())
                .map(|i| reference.gradient(i, xi))
                .collect::<Result<Vec<_>, _>>()?;
            reference_values.push(values);
            reference_gradients.push(gradients);
        }

        let origin = Point3::origin();
        let mut geometric_gradients = [Vector3::zeros(); 4];
        for (i, gradient) in geometric_gradients.iter_mut().enumerate() {
            *gradient = geometry.gradient(i, &origin)?;
        }

        Ok(Self {
            basis,
            integrator,
            reference_values,
            reference_gradients,
            geometric_gradients,
        })
    }

    pub fn basis(&self) -> Basis {
        self.basis
    }

    pub fn integrator(&self) -> &Integrator {
        &self.integrator
    }

    /// Jacobian of the map from the reference tetrahedron to the tetrahedron with the given
    /// vertices.
    ///
    /// Row `k` holds the derivatives `(dx/dξ_k, dy/dξ_k, dz/dξ_k)`.
    pub fn jacobian(&self, vertices: &[Point3<f64>; 4]) -> Matrix3<f64> {
        let mut jacobian = Matrix3::zeros();
        for (gradient, vertex) in self.geometric_gradients.iter().zip(vertices) {
            jacobian += gradient * vertex.coords.transpose();
        }
        jacobian
    }

    /// Computes the determinant and inverse of the Jacobian at every quadrature point.
    ///
    /// Returns [`Error::SingularMatrix`] if the element is degenerate.
    pub fn element_geometry(&self, vertices: &[Point3<f64>; 4]) -> Result<Vec<QuadraturePointGeometry>, Error> {
        // The geometry is affine, so the Jacobian is the same at every point
        let jacobian = self.jacobian(vertices);
        let determinant = determinant_3x3(&jacobian);
        let inverse_jacobian = invert_3x3(&jacobian)?;
        let geometry = QuadraturePointGeometry {
            determinant,
            inverse_jacobian,
        };
        Ok(vec![geometry; self.integrator.num_points()])
    }

    /// Assembles the local stiffness and mass matrices of the element with the given vertices.
    pub fn assemble_local_matrices(&self, vertices: &[Point3<f64>; 4]) -> Result<LocalMatrices, Error> {
        let geometry = self.element_geometry(vertices)?;
        let n = self.basis.size();

        let physical_gradients: Vec<Vec<Vector3<f64>>> = geometry
            .iter()
            .zip(&self.reference_gradients)
            .map(|(g, gradients)| gradients.iter().map(|grad| g.inverse_jacobian * grad).collect())
            .collect();

        let mut stiffness = DMatrix::zeros(n, n);
        let mut mass = DMatrix::zeros(n, n);
        for i in 0..n {
            for j in 0..=i {
                let k_ij = self.integrator.gauss_3d(|q, _| {
                    let grad_i = &physical_gradients[q][i];
                    let grad_j = &physical_gradients[q][j];
                    grad_i.dot(grad_j) * geometry[q].determinant.abs()
                });
                let m_ij = self.integrator.gauss_3d(|q, _| {
                    let phi = &self.reference_values[q];
                    phi[i] * phi[j] * geometry[q].determinant.abs()
                });
                stiffness[(i, j)] = k_ij;
                stiffness[(j, i)] = k_ij;
                mass[(i, j)] = m_ij;
                mass[(j, i)] = m_ij;
            }
        }

        Ok(LocalMatrices { stiffness, mass })
    }
}

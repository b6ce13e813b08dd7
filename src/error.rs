//! Functionality for error estimation.
use crate::basis::{Basis, BasisContext};
use crate::dense::determinant_3x3;
use crate::mesh::Mesh;
use crate::nalgebra::{DVector, Matrix3, Point3};
use crate::quadrature::Quadrature;
use crate::Error;
use eyre::{eyre, WrapErr};
use itertools::izip;

fn check_solution_len(mesh: &Mesh, u_h: &DVector<f64>) -> eyre::Result<()> {
    if u_h.len() != mesh.num_nodes() {
        return Err(eyre!(
            "solution has {} entries, but the mesh has {} nodes",
            u_h.len(),
            mesh.num_nodes()
        ));
    }
    Ok(())
}

/// Root mean square of the nodal error `u_h(x_i) - u(x_i)`.
///
/// The exact solution is evaluated with the area of the first element referencing each node.
/// Nodes that are not part of any element are ignored.
pub fn rms_error(mesh: &Mesh, u_h: &DVector<f64>, u: impl Fn(&Point3<f64>, usize) -> f64) -> eyre::Result<f64> {
    check_solution_len(mesh, u_h)?;

    let mut sum_squares = 0.0;
    let mut count = 0;
    for (point, area, value) in izip!(mesh.points(), mesh.node_areas(), u_h.iter()) {
        if let Some(area) = area {
            let error = value - u(point, area);
            sum_squares += error * error;
            count += 1;
        }
    }

    if count == 0 {
        Ok(0.0)
    } else {
        Ok((sum_squares / count as f64).sqrt())
    }
}

/// Estimate the squared $L^2$ error $\norm{u_h - u}^2_{L^2}$ on a single element.
///
/// `u_h_element` holds the nodal weights of the element's shape functions, and the quadrature
/// is given on the reference tetrahedron.
///
/// # Panics
///
/// Panics if the length of `u_h_element` does not match the number of shape functions.
#[allow(non_snake_case)]
pub fn estimate_element_L2_error_squared(
    context: &BasisContext,
    vertices: &[Point3<f64>; 4],
    u_h_element: &[f64],
    u: impl Fn(&Point3<f64>) -> f64,
    quadrature: &impl Quadrature,
) -> Result<f64, Error> {
    assert_eq!(u_h_element.len(), context.size());

    let [v0, v1, v2, v3] = vertices;
    let edges = Matrix3::from_columns(&[v1 - v0, v2 - v0, v3 - v0]);
    let determinant = determinant_3x3(&edges);
    let mut phi = vec![0.0; context.size()];

    let mut result = 0.0;
    for (w, xi) in izip!(quadrature.weights(), quadrature.points()) {
        let x = v0 + edges * xi.coords;
        context.populate_basis(&mut phi, &x)?;
        let u_h: f64 = izip!(u_h_element, &phi).map(|(weight, phi_i)| weight * phi_i).sum();
        let error = u_h - u(&x);
        result += w * error * error * determinant.abs();
    }
    Ok(result)
}

/// Estimate the $L^2$ error $\norm{u_h - u}_{L^2}$ over the whole mesh.
#[allow(non_snake_case)]
pub fn estimate_L2_error(
    mesh: &Mesh,
    basis: Basis,
    u_h: &DVector<f64>,
    u: impl Fn(&Point3<f64>, usize) -> f64,
    quadrature: &impl Quadrature,
) -> eyre::Result<f64> {
    check_solution_len(mesh, u_h)?;

    let mut u_h_element = Vec::new();
    let mut error_squared = 0.0;
    for (element_index, element) in mesh.elements().iter().enumerate() {
        let vertices = mesh.element_vertices(element_index);
        let context = basis
            .update_cache(&vertices)
            .wrap_err_with(|| format!("failed to evaluate basis on element {element_index}"))?;
        u_h_element.clear();
        u_h_element.extend(element.nodes.iter().map(|&node| u_h[node]));
        let area = element.area;
        error_squared +=
            estimate_element_L2_error_squared(&context, &vertices, &u_h_element, |x| u(x, area), quadrature)
                .wrap_err_with(|| format!("failed to estimate error on element {element_index}"))?;
    }
    Ok(error_squared.sqrt())
}

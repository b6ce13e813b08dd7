//! Basic procedural mesh generation routines.
use crate::mesh::{FiniteElement, Mesh};
use crate::nalgebra::{Point3, Vector3};
use crate::Error;

/// Area number assigned to procedurally generated elements.
pub const DEFAULT_AREA: usize = 1;

/// Creates a uniform tetrahedral mesh of the unit cube `[0, 1]^3` with the given number of
/// cells along each axis.
pub fn create_unit_box_uniform_tet_mesh(cells_per_dim: usize) -> Result<Mesh, Error> {
    create_box_uniform_tet_mesh(
        &Point3::origin(),
        &Point3::new(1.0, 1.0, 1.0),
        [cells_per_dim; 3],
    )
}

/// Generates an axis-aligned box mesh `[min.x, max.x] x [min.y, max.y] x [min.z, max.z]`.
///
/// The box is divided into `splits[0] x splits[1] x splits[2]` hexahedral cells, each of which is
/// split into 6 tetrahedra sharing the diagonal from the cell's lowest to its highest corner.
/// Every cell face is thereby cut along the same diagonal direction, so the mesh is conforming.
/// Nodes are numbered with the x index running fastest, then y, then z.
/// All elements have area [`DEFAULT_AREA`] and unit coefficient. If any split count is zero,
/// the mesh is empty.
pub fn create_box_uniform_tet_mesh(min: &Point3<f64>, max: &Point3<f64>, splits: [usize; 3]) -> Result<Mesh, Error> {
    if (0..3).any(|d| !(max[d] > min[d])) {
        return Err(Error::InvalidMesh(format!(
            "box bounds must satisfy min < max in every dimension, got {min} and {max}"
        )));
    }
    if splits.contains(&0) {
        return Mesh::new(Vec::new(), Vec::new());
    }

    let [splits_x, splits_y, splits_z] = splits;
    let h = (max - min).component_div(&Vector3::new(splits_x as f64, splits_y as f64, splits_z as f64));
    let (nx, ny, nz) = (splits_x + 1, splits_y + 1, splits_z + 1);

    let mut points = Vec::with_capacity(nx * ny * nz);
    for k in 0..nz {
        for j in 0..ny {
            for i in 0..nx {
                points.push(Point3::new(
                    min.x + i as f64 * h.x,
                    min.y + j as f64 * h.y,
                    min.z + k as f64 * h.z,
                ));
            }
        }
    }

    let idx = |i: usize, j: usize, k: usize| i + j * nx + k * nx * ny;
    let mut elements = Vec::with_capacity(6 * splits_x * splits_y * splits_z);
    for k in 0..splits_z {
        for j in 0..splits_y {
            for i in 0..splits_x {
                let n = [
                    idx(i, j, k),
                    idx(i + 1, j, k),
                    idx(i, j + 1, k),
                    idx(i + 1, j + 1, k),
                    idx(i, j, k + 1),
                    idx(i + 1, j, k + 1),
                    idx(i, j + 1, k + 1),
                    idx(i + 1, j + 1, k + 1),
                ];
                let tets = [
                    [n[0], n[4], n[5], n[7]],
                    [n[0], n[1], n[5], n[7]],
                    [n[0], n[1], n[3], n[7]],
                    [n[0], n[3], n[2], n[7]],
                    [n[0], n[2], n[6], n[7]],
                    [n[0], n[6], n[4], n[7]],
                ];
                elements.extend(
                    tets.into_iter()
                        .map(|tet| FiniteElement::new(tet.to_vec(), DEFAULT_AREA, 1.0)),
                );
            }
        }
    }

    Mesh::new(points, elements)
}

/// Indices of the nodes of the mesh that lie on the boundary of the given box, up to the given
/// absolute tolerance.
pub fn box_boundary_nodes(mesh: &Mesh, min: &Point3<f64>, max: &Point3<f64>, tolerance: f64) -> Vec<usize> {
    mesh.points()
        .iter()
        .enumerate()
        .filter(|(_, p)| (0..3).any(|d| (p[d] - min[d]).abs() <= tolerance || (p[d] - max[d]).abs() <= tolerance))
        .map(|(index, _)| index)
        .collect()
}

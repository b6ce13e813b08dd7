use crate::dense::determinant_3x3;
use crate::nalgebra::{Matrix3, Point3};
use ::proptest::prelude::*;

pub fn point3() -> impl Strategy<Value = Point3<f64>> {
    // Pick a reasonably small range to pick coordinates from,
    // otherwise we can easily get floating point numbers that are
    // so ridiculously large as to break anything we might want to do with them
    let range = -10.0..10.0;
    [range.clone(), range.clone(), range].prop_map(|[x, y, z]| Point3::new(x, y, z))
}

/// Points in the closed reference tetrahedron.
pub fn point_in_reference_tet() -> impl Strategy<Value = Point3<f64>> {
    [0.0..=1.0, 0.0..=1.0, 0.0..=1.0, 0.0..=1.0].prop_map(|weights: [f64; 4]| {
        let sum: f64 = weights.iter().sum();
        if sum == 0.0 {
            Point3::new(0.25, 0.25, 0.25)
        } else {
            Point3::new(weights[1] / sum, weights[2] / sum, weights[3] / sum)
        }
    })
}

/// Vertices of tetrahedra whose volume is not too small compared to their size.
pub fn tetrahedron_vertices() -> impl Strategy<Value = [Point3<f64>; 4]> {
    [point3(), point3(), point3(), point3()].prop_filter("Tetrahedron must not be degenerate", |[v0, v1, v2, v3]| {
        let edges = Matrix3::from_columns(&[v1 - v0, v2 - v0, v3 - v0]);
        let max_edge = edges.column_iter().map(|e| e.norm()).fold(0.0, f64::max);
        determinant_3x3(&edges).abs() > 1e-2 * max_edge.powi(3)
    })
}

use matrixcompare::assert_scalar_eq;
use nalgebra::{DVector, Point3};
use shellfem::basis::{reference_tet_vertices, Basis};
use shellfem::error::{estimate_L2_error, estimate_element_L2_error_squared, rms_error};
use shellfem::mesh::procedural::create_unit_box_uniform_tet_mesh;
use shellfem::mesh::{FiniteElement, Mesh};
use shellfem::quadrature::tet_quadrature_strength;

fn interpolate(mesh: &Mesh, u: impl Fn(&Point3<f64>) -> f64) -> DVector<f64> {
    DVector::from_iterator(mesh.num_nodes(), mesh.points().iter().map(u))
}

#[test]
fn element_error_of_constant_offset() {
    let context = Basis::Linear.update_cache(&reference_tet_vertices()).unwrap();
    let quadrature = tet_quadrature_strength(2).unwrap();
    // u_h interpolates u + 0.5
    let u = |x: &Point3<f64>| x.x - x.z;
    let u_h: Vec<f64> = reference_tet_vertices().iter().map(|v| u(v) + 0.5).collect();
    let error_squared =
        estimate_element_L2_error_squared(&context, &reference_tet_vertices(), &u_h, u, &quadrature).unwrap();
    assert_scalar_eq!(error_squared, 0.25 / 6.0, comp = abs, tol = 1e-14);
}

#[test]
fn l2_error_of_interpolated_polynomials() {
    let quadrature = tet_quadrature_strength(3).unwrap();
    let linear_mesh = create_unit_box_uniform_tet_mesh(2).unwrap();
    let quadratic_mesh = linear_mesh.to_quadratic().unwrap();

    let linear = |x: &Point3<f64>| 2.0 * x.x - x.y + 3.0;
    let u_h = interpolate(&linear_mesh, linear);
    let error = estimate_L2_error(&linear_mesh, Basis::Linear, &u_h, |x, _| linear(x), &quadrature).unwrap();
    assert_scalar_eq!(error, 0.0, comp = abs, tol = 1e-12);

    let quadratic = |x: &Point3<f64>| x.x * x.y - x.z * x.z;
    let u_h = interpolate(&quadratic_mesh, quadratic);
    let error = estimate_L2_error(&quadratic_mesh, Basis::Quadratic, &u_h, |x, _| quadratic(x), &quadrature).unwrap();
    assert_scalar_eq!(error, 0.0, comp = abs, tol = 1e-12);

    // A constant offset of 0.1 over the unit cube
    let u_h = interpolate(&linear_mesh, |x| linear(x) + 0.1);
    let error = estimate_L2_error(&linear_mesh, Basis::Linear, &u_h, |x, _| linear(x), &quadrature).unwrap();
    assert_scalar_eq!(error, 0.1, comp = abs, tol = 1e-12);
}

#[test]
fn rms_error_ignores_unreferenced_nodes() {
    let mut points = reference_tet_vertices().to_vec();
    points.push(Point3::new(10.0, 10.0, 10.0));
    let mesh = Mesh::new(points, vec![FiniteElement::new(vec![0, 1, 2, 3], 4, 1.0)]).unwrap();

    let u_h = DVector::from_column_slice(&[1.0, 1.0, 1.0, 1.0, 100.0]);
    let error = rms_error(&mesh, &u_h, |_, area| {
        assert_eq!(area, 4);
        0.0
    })
    .unwrap();
    assert_scalar_eq!(error, 1.0, comp = abs, tol = 1e-15);

    let u_h = DVector::from_column_slice(&[3.0, 0.0, 0.0, 0.0, 0.0]);
    let error = rms_error(&mesh, &u_h, |_, _| 0.0).unwrap();
    assert_scalar_eq!(error, 1.5, comp = abs, tol = 1e-15);
}

#[test]
fn error_estimates_reject_wrong_solution_length() {
    let mesh = create_unit_box_uniform_tet_mesh(1).unwrap();
    let u_h = DVector::zeros(3);
    assert!(rms_error(&mesh, &u_h, |_, _| 0.0).is_err());
    let quadrature = tet_quadrature_strength(2).unwrap();
    assert!(estimate_L2_error(&mesh, Basis::Linear, &u_h, |_, _| 0.0, &quadrature).is_err());

    let empty = Mesh::new(Vec::new(), Vec::new()).unwrap();
    assert_eq!(rms_error(&empty, &DVector::zeros(0), |_, _| 0.0).unwrap(), 0.0);
}

use matrixcompare::{assert_scalar_eq, prop_assert_scalar_eq};
use nalgebra::{Point3, Vector3};
use proptest::prelude::*;
use shellfem::basis::{reference_tet_vertices, Basis, TET_EDGES};
use shellfem::nalgebra::center;
use shellfem::proptest::{point_in_reference_tet, tetrahedron_vertices};
use shellfem::Error;
use util::assert_panics;

fn map_from_reference(vertices: &[Point3<f64>; 4], xi: &Point3<f64>) -> Point3<f64> {
    let [v0, v1, v2, v3] = vertices;
    v0 + (v1 - v0) * xi.x + (v2 - v0) * xi.y + (v3 - v0) * xi.z
}

#[test]
fn basis_sizes() {
    assert_eq!(Basis::Linear.size(), 4);
    assert_eq!(Basis::Quadratic.size(), 10);
    assert_eq!(Basis::default(), Basis::Linear);
}

#[test]
fn quadratic_basis_kronecker_property_at_nodes() {
    let vertices = reference_tet_vertices();
    let context = Basis::Quadratic.update_cache(&vertices).unwrap();

    let mut nodes = vertices.to_vec();
    nodes.extend(TET_EDGES.iter().map(|&[a, b]| center(&vertices[a], &vertices[b])));

    for (k, node) in nodes.iter().enumerate() {
        for i in 0..10 {
            let expected = if i == k { 1.0 } else { 0.0 };
            assert_scalar_eq!(context.psi(i, node).unwrap(), expected, comp = abs, tol = 1e-14);
        }
    }
}

#[test]
fn linear_basis_gradients_on_reference_element() {
    let context = Basis::Linear.update_cache(&reference_tet_vertices()).unwrap();
    let p = Point3::new(0.1, 0.2, 0.3);
    let expected = [
        Vector3::new(-1.0, -1.0, -1.0),
        Vector3::new(1.0, 0.0, 0.0),
        Vector3::new(0.0, 1.0, 0.0),
        Vector3::new(0.0, 0.0, 1.0),
    ];
    for (i, gradient) in expected.iter().enumerate() {
        for var in 0..3 {
            assert_scalar_eq!(context.dpsi(i, var, &p).unwrap(), gradient[var], comp = abs, tol = 1e-14);
        }
    }
}

#[test]
fn quadratic_gradient_matches_finite_differences() {
    let vertices = [
        Point3::new(0.5, 0.0, 0.2),
        Point3::new(2.0, 0.3, 0.0),
        Point3::new(0.1, 1.5, 0.4),
        Point3::new(0.3, 0.2, 1.7),
    ];
    let context = Basis::Quadratic.update_cache(&vertices).unwrap();
    let p = Point3::new(0.6, 0.4, 0.5);
    let h = 1e-6;
    for i in 0..10 {
        let gradient = context.gradient(i, &p).unwrap();
        for var in 0..3 {
            let mut e = Vector3::zeros();
            e[var] = h;
            let fd = (context.psi(i, &(p + e)).unwrap() - context.psi(i, &(p - e)).unwrap()) / (2.0 * h);
            assert_scalar_eq!(gradient[var], fd, comp = abs, tol = 1e-7);
        }
    }
}

#[test]
fn invalid_indices_are_reported() {
    let p = Point3::origin();
    let linear = Basis::Linear.update_cache(&reference_tet_vertices()).unwrap();
    assert_eq!(linear.psi(4, &p), Err(Error::BasisFunctionIndex { index: 4, size: 4 }));
    assert_eq!(linear.dpsi(0, 3, &p), Err(Error::DerivativeIndex { index: 3 }));

    let quadratic = Basis::Quadratic.update_cache(&reference_tet_vertices()).unwrap();
    assert!(quadratic.psi(9, &p).is_ok());
    assert_eq!(quadratic.dpsi(10, 0, &p), Err(Error::BasisFunctionIndex { index: 10, size: 10 }));

    let mut values = [0.0; 4];
    linear.populate_basis(&mut values, &Point3::new(0.25, 0.25, 0.25)).unwrap();
    for value in values {
        assert_scalar_eq!(value, 0.25, comp = abs, tol = 1e-15);
    }
    assert_panics!({
        let mut too_short = [0.0; 3];
        linear.populate_basis(&mut too_short, &p)
    });
}

#[test]
fn degenerate_element_is_rejected() {
    let coplanar = [
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
        Point3::new(1.0, 1.0, 0.0),
    ];
    assert!(matches!(
        Basis::Linear.update_cache(&coplanar),
        Err(Error::SingularMatrix { .. })
    ));
}

#[test]
fn linear_basis_on_small_and_distant_elements() {
    let small = reference_tet_vertices().map(|v| Point3::from(v.coords * 1e-6));
    let offset = Vector3::new(1e4, -2e4, 5e3);
    let distant = [
        Point3::new(0.0, 0.0, 0.0) + offset,
        Point3::new(1.0, 0.1, 0.0) + offset,
        Point3::new(0.2, 1.0, 0.1) + offset,
        Point3::new(0.1, 0.3, 1.0) + offset,
    ];

    for vertices in [small, distant] {
        let context = Basis::Linear.update_cache(&vertices).unwrap();
        for (k, vertex) in vertices.iter().enumerate() {
            for i in 0..4 {
                let expected = if i == k { 1.0 } else { 0.0 };
                assert_scalar_eq!(context.psi(i, vertex).unwrap(), expected, comp = abs, tol = 1e-9);
            }
        }
    }

    let context = Basis::Linear.update_cache(&small).unwrap();
    let gradient = context.gradient(1, &center(&small[0], &small[1])).unwrap();
    assert_scalar_eq!(gradient.x, 1e6, comp = abs, tol = 1e-6);
}

proptest! {
    #[test]
    fn linear_basis_kronecker_property(vertices in tetrahedron_vertices()) {
        let context = Basis::Linear.update_cache(&vertices).unwrap();
        for (k, vertex) in vertices.iter().enumerate() {
            for i in 0..4 {
                let expected = if i == k { 1.0 } else { 0.0 };
                prop_assert_scalar_eq!(context.psi(i, vertex).unwrap(), expected, comp = abs, tol = 1e-9);
            }
        }
    }

    #[test]
    fn partition_of_unity(vertices in tetrahedron_vertices(), xi in point_in_reference_tet()) {
        let x = map_from_reference(&vertices, &xi);
        for basis in [Basis::Linear, Basis::Quadratic] {
            let context = basis.update_cache(&vertices).unwrap();
            let sum: f64 = (0..basis.size()).map(|i| context.psi(i, &x).unwrap()).sum();
            prop_assert_scalar_eq!(sum, 1.0, comp = abs, tol = 1e-9);

            let gradient_sum: Vector3<f64> = (0..basis.size()).map(|i| context.gradient(i, &x).unwrap()).sum();
            let scale = context.coefficients().amax();
            prop_assert!(gradient_sum.amax() <= 1e-9 * scale.max(1.0));
        }
    }
}

use matrixcompare::{assert_matrix_eq, assert_scalar_eq, prop_assert_matrix_eq};
use nalgebra::{DMatrix, DVector, Matrix3, Matrix4};
use proptest::prelude::*;
use util::assert_approx_matrix_eq;
use shellfem::dense::{determinant_3x3, invert_3x3, invert_4x4, LuDecomposition};
use shellfem::Error;

fn matrix3() -> impl Strategy<Value = Matrix3<f64>> {
    proptest::collection::vec(-10.0..10.0, 9).prop_map(|values| Matrix3::from_iterator(values))
}

#[test]
fn invert_3x3_known_matrix() {
    let m = Matrix3::new(2.0, 0.0, 1.0, 1.0, 3.0, 0.0, 0.0, 1.0, 4.0);
    assert_scalar_eq!(determinant_3x3(&m), 25.0, comp = abs, tol = 1e-14);
    let inverse = invert_3x3(&m).unwrap();
    assert_matrix_eq!(inverse * m, Matrix3::identity(), comp = abs, tol = 1e-14);
}

#[test]
fn invert_3x3_singular() {
    let m = Matrix3::new(1.0, 2.0, 3.0, 2.0, 4.0, 6.0, 0.0, 1.0, 1.0);
    assert!(matches!(invert_3x3(&m), Err(Error::SingularMatrix { .. })));
    assert!(matches!(invert_3x3(&Matrix3::zeros()), Err(Error::SingularMatrix { .. })));
}

#[test]
fn singularity_test_is_relative_to_matrix_scale() {
    // A well-conditioned matrix with a tiny determinant is invertible
    let m = Matrix3::new(2.0, 0.0, 1.0, 1.0, 3.0, 0.0, 0.0, 1.0, 4.0) * 1e-6;
    assert!(determinant_3x3(&m).abs() < 1e-14);
    let inverse = invert_3x3(&m).unwrap();
    assert_matrix_eq!(inverse * m, Matrix3::identity(), comp = abs, tol = 1e-12);

    // A nearly rank-deficient matrix with large entries is singular
    let m = Matrix3::new(1.0, 2.0, 3.0, 2.0, 4.0, 6.0 + 1e-15, 0.0, 1.0, 1.0) * 1e6;
    assert!(matches!(invert_3x3(&m), Err(Error::SingularMatrix { .. })));

    #[rustfmt::skip]
    let m = Matrix4::new(
        1.0,  1.0,  1.0,  1.0,
        0.0, 1e-5,  0.0,  0.0,
        0.0,  0.0, 1e-5,  0.0,
        0.0,  0.0,  0.0, 1e-5,
    );
    let inverse = invert_4x4(&m).unwrap();
    assert_matrix_eq!(inverse * m, Matrix4::identity(), comp = abs, tol = 1e-12);
}

#[test]
fn invert_4x4_requires_pivoting() {
    // Zero on the leading diagonal entry
    #[rustfmt::skip]
    let m = Matrix4::new(
        0.0, 1.0, 0.0, 0.0,
        1.0, 0.0, 0.0, 0.0,
        0.0, 0.0, 2.0, 1.0,
        0.0, 0.0, 1.0, 2.0,
    );
    let inverse = invert_4x4(&m).unwrap();
    assert_matrix_eq!(inverse * m, Matrix4::identity(), comp = abs, tol = 1e-14);
    assert_matrix_eq!(inverse, m.try_inverse().unwrap(), comp = abs, tol = 1e-14);
}

#[test]
fn invert_4x4_singular() {
    // Two identical columns, i.e. two coinciding vertices of a tetrahedron
    #[rustfmt::skip]
    let m = Matrix4::new(
        1.0, 1.0, 1.0, 1.0,
        0.0, 1.0, 1.0, 0.0,
        0.0, 0.0, 0.0, 1.0,
        0.0, 0.0, 0.0, 0.0,
    );
    assert!(matches!(invert_4x4(&m), Err(Error::SingularMatrix { .. })));
}

#[test]
fn lu_decomposition_solves_system() {
    let a = DMatrix::from_row_slice(3, 3, &[4.0, -1.0, 0.0, -1.0, 4.0, -1.0, 0.0, -1.0, 4.0]);
    let x_expected = DVector::from_column_slice(&[1.0, 2.0, 3.0]);
    let b = &a * &x_expected;

    let lu = LuDecomposition::new(a.clone()).unwrap();
    assert_matrix_eq!(lu.solve(&b), x_expected, comp = abs, tol = 1e-13);
    assert_scalar_eq!(lu.determinant(), a.determinant(), comp = abs, tol = 1e-12);
}

#[test]
fn lu_decomposition_matches_nalgebra_on_laplacian() {
    let a = util::laplacian_2d(4);
    let b = util::linspace_vector(16, 0.5);
    let x = LuDecomposition::new(a.clone()).unwrap().solve(&b);
    let x_expected = a.lu().solve(&b).unwrap();
    assert_approx_matrix_eq!(&x, &x_expected, abstol = 1e-12);
}

#[test]
fn lu_decomposition_reports_zero_pivot() {
    let a = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 2.0, 4.0]);
    assert!(matches!(LuDecomposition::new(a), Err(Error::SingularMatrix { .. })));
}

#[test]
fn lu_decomposition_of_small_scale_matrix() {
    let a = util::laplacian_2d(3) * 1e-9;
    let x_expected = util::linspace_vector(9, 1.0);
    let b = &a * &x_expected;
    let x = LuDecomposition::new(a).unwrap().solve(&b);
    assert_approx_matrix_eq!(&x, &x_expected, abstol = 1e-9);
}

#[test]
fn lu_decomposition_rejects_non_square_matrix() {
    let a = DMatrix::<f64>::zeros(2, 3);
    assert!(matches!(LuDecomposition::new(a), Err(Error::InvalidConfiguration(_))));
}

proptest! {
    #[test]
    fn determinant_3x3_agrees_with_nalgebra(m in matrix3()) {
        let det = determinant_3x3(&m);
        prop_assert!((det - m.determinant()).abs() <= 1e-10 * (1.0 + det.abs()));
    }

    #[test]
    fn invert_3x3_is_inverse(m in matrix3()) {
        prop_assume!(determinant_3x3(&m).abs() > 1e-2);
        let inverse = invert_3x3(&m).unwrap();
        let tol = 1e-9 * inverse.amax().max(1.0);
        prop_assert_matrix_eq!(&inverse * m, Matrix3::identity(), comp = abs, tol = tol);
    }
}

use nalgebra::{DMatrix, DVector};

/// Poor man's approx assertion for matrices
#[macro_export]
macro_rules! assert_approx_matrix_eq {
    ($x:expr, $y:expr, abstol = $tol:expr) => {{
        let diff = $x - $y;

        let max_absdiff = diff.abs().max();
        let approx_eq = max_absdiff <= $tol;

        if !approx_eq {
            println!("abstol: {:e}", $tol);
            println!("left: {}", $x);
            println!("right: {}", $y);
            println!("diff: {:e}", diff);
        }
        assert!(approx_eq);
    }};
}

#[macro_export]
macro_rules! assert_panics {
    ($e:expr) => {{
        use std::panic::catch_unwind;
        use std::stringify;
        let expr_string = stringify!($e);
        let result = catch_unwind(|| $e);
        if result.is_ok() {
            panic!("assert_panics!({}) failed.", expr_string);
        }
    }};
}

/// The `n x n` matrix `tridiag(-1, 2, -1)`, the standard 1D finite difference Laplacian.
pub fn laplacian_1d(n: usize) -> DMatrix<f64> {
    DMatrix::from_fn(n, n, |i, j| match i.abs_diff(j) {
        0 => 2.0,
        1 => -1.0,
        _ => 0.0,
    })
}

/// The 5-point Laplacian on an `n x n` grid of unknowns, with row-major numbering.
pub fn laplacian_2d(n: usize) -> DMatrix<f64> {
    let dim = n * n;
    let mut matrix = DMatrix::zeros(dim, dim);
    for row in 0..n {
        for col in 0..n {
            let i = row * n + col;
            matrix[(i, i)] = 4.0;
            if col + 1 < n {
                matrix[(i, i + 1)] = -1.0;
                matrix[(i + 1, i)] = -1.0;
            }
            if row + 1 < n {
                matrix[(i, i + n)] = -1.0;
                matrix[(i + n, i)] = -1.0;
            }
        }
    }
    matrix
}

/// A vector with entries `1, 2, ..., n` scaled by `scale`.
pub fn linspace_vector(n: usize, scale: f64) -> DVector<f64> {
    DVector::from_fn(n, |i, _| scale * (i + 1) as f64)
}

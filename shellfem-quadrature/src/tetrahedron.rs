//! Rules for the reference tetrahedron, indexed by polynomial strength.

use crate::{Error, Rule3d};

/// Returns a quadrature rule that integrates polynomials of total degree up to `strength`
/// exactly.
///
/// Strength 0 and 1 give the one-point centroid rule, strength 2 the symmetric four-point rule
/// and strength 3 the five-point rule returned by [`tetrahedron_order4`].
pub fn tetrahedron(strength: usize) -> Result<Rule3d, Error> {
    match strength {
        0 | 1 => Ok(centroid()),
        2 => Ok(four_point()),
        3 => Ok(tetrahedron_order4()),
        _ => Err(Error::NoRuleAvailable),
    }
}

fn centroid() -> Rule3d {
    (vec![1.0 / 6.0], vec![[0.25, 0.25, 0.25]])
}

fn four_point() -> Rule3d {
    let a = 0.585_410_196_624_968_5;
    let b = 0.138_196_601_125_010_5;
    let w = 1.0 / 24.0;
    (
        vec![w; 4],
        vec![[b, b, b], [a, b, b], [b, a, b], [b, b, a]],
    )
}

/// The five-point rule with a negative centroid weight.
///
/// The sample points are the centroid and the points with barycentric coordinates
/// `(1/2, 1/6, 1/6, 1/6)` permuted over the first three coordinates, plus `(1/6, 1/6, 1/6)`.
/// Weights are `(-4/5, 9/20, 9/20, 9/20, 9/20) / 6`, summing to the reference volume.
/// Polynomials of total degree up to 3 are integrated exactly.
pub fn tetrahedron_order4() -> Rule3d {
    let p1 = [1.0 / 4.0, 1.0 / 2.0, 1.0 / 6.0, 1.0 / 6.0, 1.0 / 6.0];
    let p2 = [1.0 / 4.0, 1.0 / 6.0, 1.0 / 2.0, 1.0 / 6.0, 1.0 / 6.0];
    let p3 = [1.0 / 4.0, 1.0 / 6.0, 1.0 / 6.0, 1.0 / 2.0, 1.0 / 6.0];
    let w = [-4.0 / 5.0, 9.0 / 20.0, 9.0 / 20.0, 9.0 / 20.0, 9.0 / 20.0];

    let weights = w.iter().map(|w| w / 6.0).collect();
    let points = (0..w.len()).map(|i| [p1[i], p2[i], p3[i]]).collect();
    (weights, points)
}

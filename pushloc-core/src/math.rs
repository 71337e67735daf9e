//! Small numerical helpers: floating modulo and Lagrange interpolation.

use crate::Vector3;

#[inline]
pub fn fmod(x: f64, y: f64) -> f64 {
    libm::fmod(x, y)
}

/// Lagrange interpolation of scalar samples `(xs[k], ys[k])` at `x`.
///
/// The sample abscissae must be pairwise distinct; the polynomial degree
/// is `xs.len() - 1`. Intended for the small windows (2 to 8 points) used
/// by ephemeris and attitude interpolation, where the barycentric
/// refinements for large node counts are not worth their complexity.
pub fn lagrange_interpolate(xs: &[f64], ys: &[f64], x: f64) -> f64 {
    debug_assert_eq!(xs.len(), ys.len());
    let mut sum = 0.0;
    for k in 0..xs.len() {
        let mut basis = 1.0;
        for m in 0..xs.len() {
            if m != k {
                basis *= (x - xs[m]) / (xs[k] - xs[m]);
            }
        }
        sum += basis * ys[k];
    }
    sum
}

/// Lagrange interpolation of vector samples, component-wise.
pub fn lagrange_interpolate_vector3(xs: &[f64], vs: &[Vector3], x: f64) -> Vector3 {
    debug_assert_eq!(xs.len(), vs.len());
    let mut sum = Vector3::zeros();
    for k in 0..xs.len() {
        let mut basis = 1.0;
        for m in 0..xs.len() {
            if m != k {
                basis *= (x - xs[m]) / (xs[k] - xs[m]);
            }
        }
        sum = sum + vs[k] * basis;
    }
    sum
}

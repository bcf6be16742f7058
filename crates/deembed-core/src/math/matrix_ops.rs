//! Matrix operation helpers
//!
//! Closed-form operations on 2x2 complex matrices. Inversion goes through
//! the adjugate and determinant so that singularity is an explicit numeric
//! check rather than a failure deep inside a generic solver.

use ndarray::Array2;
use num_complex::Complex64;
use thiserror::Error;

use crate::constants::SINGULAR_RELATIVE_TOL;

/// A 2x2 matrix could not be inverted
#[derive(Error, Debug, Clone, Copy, PartialEq)]
#[error("singular 2x2 matrix (|det| = {determinant:e}, ||A||_F^2 = {scale:e})")]
pub struct SingularMatrix {
    /// Magnitude of the determinant (NaN when the input was not finite)
    pub determinant: f64,
    /// Squared Frobenius norm of the input
    pub scale: f64,
}

/// A matrix produced by an inversion, with the condition number of the
/// matrix that was inverted
#[derive(Debug, Clone, PartialEq)]
pub struct Conditioned {
    /// The resulting matrix
    pub matrix: Array2<Complex64>,
    /// 2-norm condition number of the inverted matrix
    pub condition: f64,
}

impl Conditioned {
    /// True when the condition number exceeds `threshold`
    #[inline]
    pub fn is_ill_conditioned(&self, threshold: f64) -> bool {
        self.condition > threshold
    }
}

/// Create a diagonal matrix from a slice of values
#[inline]
pub fn diag_matrix(values: &[Complex64]) -> Array2<Complex64> {
    let n = values.len();
    let mut m = Array2::<Complex64>::zeros((n, n));
    for (i, v) in values.iter().enumerate() {
        m[[i, i]] = *v;
    }
    m
}

/// 2x2 identity matrix
#[inline]
pub fn identity() -> Array2<Complex64> {
    Array2::<Complex64>::eye(2)
}

/// 2x2 matrix with every entry NaN, used as a sentinel for failed points
pub fn nan_matrix() -> Array2<Complex64> {
    Array2::from_elem((2, 2), Complex64::new(f64::NAN, f64::NAN))
}

/// Build a 2x2 matrix from its entries in row-major order
#[inline]
pub fn mat2(m11: Complex64, m12: Complex64, m21: Complex64, m22: Complex64) -> Array2<Complex64> {
    let mut m = Array2::<Complex64>::zeros((2, 2));
    m[[0, 0]] = m11;
    m[[0, 1]] = m12;
    m[[1, 0]] = m21;
    m[[1, 1]] = m22;
    m
}

/// Determinant of a 2x2 matrix
#[inline]
pub fn det_2x2(m: &Array2<Complex64>) -> Complex64 {
    m[[0, 0]] * m[[1, 1]] - m[[0, 1]] * m[[1, 0]]
}

/// Squared Frobenius norm
#[inline]
pub fn frobenius_sq(m: &Array2<Complex64>) -> f64 {
    m.iter().map(|c| c.norm_sqr()).sum()
}

/// True when every entry is finite
#[inline]
pub fn is_finite(m: &Array2<Complex64>) -> bool {
    m.iter().all(|c| c.re.is_finite() && c.im.is_finite())
}

/// 2-norm condition number of a 2x2 matrix
///
/// The singular values follow from `trace(A^H A) = ||A||_F^2` and
/// `det(A^H A) = |det A|^2`, so `cond = sigma_max^2 / |det A|`.
/// Returns infinity for a singular matrix.
pub fn condition_number_2x2(m: &Array2<Complex64>) -> f64 {
    let t = frobenius_sq(m);
    let det = det_2x2(m).norm();
    if det == 0.0 {
        return f64::INFINITY;
    }
    let disc = (t * t - 4.0 * det * det).max(0.0).sqrt();
    let sigma_max_sq = 0.5 * (t + disc);
    sigma_max_sq / det
}

/// Invert a 2x2 complex matrix
///
/// Fails with [`SingularMatrix`] when an entry is not finite or when the
/// determinant is negligible relative to the matrix scale. Ill-conditioned
/// but invertible matrices succeed; the condition number is returned so the
/// caller decides whether to report it.
pub fn invert_2x2(m: &Array2<Complex64>) -> Result<Conditioned, SingularMatrix> {
    debug_assert_eq!(m.shape(), &[2, 2]);

    let scale = frobenius_sq(m);
    let det = det_2x2(m);
    let det_norm = det.norm();

    if !is_finite(m) || !det_norm.is_finite() || det_norm <= SINGULAR_RELATIVE_TOL * scale {
        return Err(SingularMatrix {
            determinant: det_norm,
            scale,
        });
    }

    let inv_det = Complex64::new(1.0, 0.0) / det;
    let matrix = mat2(
        m[[1, 1]] * inv_det,
        -m[[0, 1]] * inv_det,
        -m[[1, 0]] * inv_det,
        m[[0, 0]] * inv_det,
    );

    Ok(Conditioned {
        matrix,
        condition: condition_number_2x2(m),
    })
}

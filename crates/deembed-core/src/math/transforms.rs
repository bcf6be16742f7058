//! Two-port parameter transformation functions
//!
//! Conversions between S, Y and Z parameters of a single two-port at one
//! frequency, relative to a real diagonal reference impedance `Z0`.
//!
//! With `F = diag(sqrt(z0))` and `G = F^-1`:
//!
//! - `Y = G (I - S) (I + S)^-1 G`
//! - `Z = F (I + S) (I - S)^-1 F`
//! - `S = F^-1 (Z - Z0) (Z + Z0)^-1 F`
//! - `S = (I - F Y F) (I + F Y F)^-1`
//!
//! For equal port impedances these reduce to `Y = Z0^-1 (I - S)(I + S)^-1`
//! and `S = (Z - Z0)(Z + Z0)^-1`. Operand order is significant: the
//! matrices do not commute in general.
//!
//! Every conversion that inverts a matrix returns a [`Conditioned`] value
//! so callers can report ill-conditioned points.

use ndarray::{Array2, Array3};
use num_complex::Complex64;
use thiserror::Error;

use crate::constants::{DEFAULT_Z0_OHMS, NPORTS};
use crate::math::matrix_ops::{
    diag_matrix, identity, invert_2x2, nan_matrix, Conditioned, SingularMatrix,
};

/// Reference impedance rejected at construction
#[derive(Error, Debug, Clone, Copy, PartialEq)]
#[error("invalid reference impedance {0} ohm: must be finite and positive")]
pub struct InvalidReferenceImpedance(pub f64);

/// Real diagonal reference impedance shared by all conversions of a run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferenceImpedance {
    ohms: [f64; NPORTS],
}

impl Default for ReferenceImpedance {
    fn default() -> Self {
        Self {
            ohms: [DEFAULT_Z0_OHMS; NPORTS],
        }
    }
}

impl ReferenceImpedance {
    /// Same reference impedance on both ports
    pub fn new(ohms: f64) -> Result<Self, InvalidReferenceImpedance> {
        Self::per_port(ohms, ohms)
    }

    /// Individual reference impedance per port
    pub fn per_port(port1: f64, port2: f64) -> Result<Self, InvalidReferenceImpedance> {
        for z in [port1, port2] {
            if !z.is_finite() || z <= 0.0 {
                return Err(InvalidReferenceImpedance(z));
            }
        }
        Ok(Self {
            ohms: [port1, port2],
        })
    }

    /// Per-port values in ohms
    #[inline]
    pub fn ohms(&self) -> [f64; NPORTS] {
        self.ohms
    }

    /// Diagonal `Z0` matrix
    pub fn matrix(&self) -> Array2<Complex64> {
        diag_matrix(&self.ohms.map(|z| Complex64::new(z, 0.0)))
    }

    /// Diagonal `sqrt(Z0)` matrix
    pub fn sqrt_matrix(&self) -> Array2<Complex64> {
        diag_matrix(&self.ohms.map(|z| Complex64::new(z.sqrt(), 0.0)))
    }

    /// Diagonal `Z0^-1/2` matrix
    pub fn inv_sqrt_matrix(&self) -> Array2<Complex64> {
        diag_matrix(&self.ohms.map(|z| Complex64::new(1.0 / z.sqrt(), 0.0)))
    }
}

/// Convert S-parameters to Y-parameters
///
/// Fails when `I + S` is singular (an ideal short on a port).
pub fn s2y(s: &Array2<Complex64>, z0: &ReferenceImpedance) -> Result<Conditioned, SingularMatrix> {
    let identity = identity();
    let g = z0.inv_sqrt_matrix();

    let inv = invert_2x2(&(&identity + s))?;
    let i_minus_s = &identity - s;
    let y = g.dot(&i_minus_s.dot(&inv.matrix)).dot(&g);

    Ok(Conditioned {
        matrix: y,
        condition: inv.condition,
    })
}

/// Convert S-parameters to Z-parameters
///
/// Fails when `I - S` is singular (an ideal open on a port).
pub fn s2z(s: &Array2<Complex64>, z0: &ReferenceImpedance) -> Result<Conditioned, SingularMatrix> {
    let identity = identity();
    let f = z0.sqrt_matrix();

    let inv = invert_2x2(&(&identity - s))?;
    let i_plus_s = &identity + s;
    let z = f.dot(&i_plus_s.dot(&inv.matrix)).dot(&f);

    Ok(Conditioned {
        matrix: z,
        condition: inv.condition,
    })
}

/// Convert Z-parameters to S-parameters
///
/// Fails when `Z + Z0` is singular.
pub fn z2s(z: &Array2<Complex64>, z0: &ReferenceImpedance) -> Result<Conditioned, SingularMatrix> {
    let z0_diag = z0.matrix();
    let f = z0.sqrt_matrix();
    let inv_f = z0.inv_sqrt_matrix();

    let inv = invert_2x2(&(z + &z0_diag))?;
    let z_minus_z0 = z - &z0_diag;
    let s = inv_f.dot(&z_minus_z0.dot(&inv.matrix)).dot(&f);

    Ok(Conditioned {
        matrix: s,
        condition: inv.condition,
    })
}

/// Convert Y-parameters to S-parameters
///
/// Works on the normalized admittance `Y' = F Y F`.
pub fn y2s(y: &Array2<Complex64>, z0: &ReferenceImpedance) -> Result<Conditioned, SingularMatrix> {
    let identity = identity();
    let f = z0.sqrt_matrix();

    let y_prime = f.dot(y).dot(&f);
    let inv = invert_2x2(&(&identity + &y_prime))?;
    let s = (&identity - &y_prime).dot(&inv.matrix);

    Ok(Conditioned {
        matrix: s,
        condition: inv.condition,
    })
}

/// Convert Y-parameters to Z-parameters
#[inline]
pub fn y2z(y: &Array2<Complex64>) -> Result<Conditioned, SingularMatrix> {
    invert_2x2(y)
}

/// Convert Z-parameters to Y-parameters
#[inline]
pub fn z2y(z: &Array2<Complex64>) -> Result<Conditioned, SingularMatrix> {
    invert_2x2(z)
}

/// Apply a per-frequency conversion to a `[nfreq, 2, 2]` array
///
/// Frequencies where the conversion is singular are filled with NaN.
pub fn convert_sweep<F>(params: &Array3<Complex64>, convert: F) -> Array3<Complex64>
where
    F: Fn(&Array2<Complex64>) -> Result<Conditioned, SingularMatrix>,
{
    let nfreq = params.shape()[0];
    let mut out = Array3::<Complex64>::zeros((nfreq, NPORTS, NPORTS));

    for f in 0..nfreq {
        let m = params.slice(ndarray::s![f, .., ..]).to_owned();
        let converted = convert(&m).map_or_else(|_| nan_matrix(), |c| c.matrix);
        out.slice_mut(ndarray::s![f, .., ..]).assign(&converted);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::matrix_ops::mat2;
    use approx::assert_relative_eq;

    fn c(re: f64, im: f64) -> Complex64 {
        Complex64::new(re, im)
    }

    fn sample_s() -> Array2<Complex64> {
        mat2(c(0.1, 0.05), c(0.02, -0.01), c(0.02, -0.01), c(0.15, 0.03))
    }

    fn assert_matrix_eq(a: &Array2<Complex64>, b: &Array2<Complex64>, tol: f64) {
        for (x, y) in a.iter().zip(b.iter()) {
            assert_relative_eq!(x.re, y.re, epsilon = tol);
            assert_relative_eq!(x.im, y.im, epsilon = tol);
        }
    }

    #[test]
    fn test_matched_load() {
        // S = 0 corresponds to Z = Z0 and Y = 1/Z0 on each port
        let s = Array2::<Complex64>::zeros((2, 2));
        let z0 = ReferenceImpedance::default();

        let z = s2z(&s, &z0).unwrap().matrix;
        assert_relative_eq!(z[[0, 0]].re, 50.0, epsilon = 1e-10);
        assert_relative_eq!(z[[1, 1]].re, 50.0, epsilon = 1e-10);
        assert_relative_eq!(z[[0, 1]].norm(), 0.0, epsilon = 1e-12);

        let y = s2y(&s, &z0).unwrap().matrix;
        assert_relative_eq!(y[[0, 0]].re, 0.02, epsilon = 1e-12);
        assert_relative_eq!(y[[1, 1]].re, 0.02, epsilon = 1e-12);
    }

    #[test]
    fn test_equal_z0_reduces_to_scalar_formula() {
        // Y = Z0^-1 (I - S)(I + S)^-1 when both ports share Z0
        let s = sample_s();
        let z0 = ReferenceImpedance::new(50.0).unwrap();
        let y = s2y(&s, &z0).unwrap().matrix;

        let identity = identity();
        let inv = invert_2x2(&(&identity + &s)).unwrap().matrix;
        let expected = (&identity - &s).dot(&inv).mapv(|v| v / 50.0);
        assert_matrix_eq(&y, &expected, 1e-14);
    }

    #[test]
    fn test_s2y_y2s_roundtrip() {
        let s = sample_s();
        let z0 = ReferenceImpedance::per_port(50.0, 75.0).unwrap();
        let y = s2y(&s, &z0).unwrap().matrix;
        let s_back = y2s(&y, &z0).unwrap().matrix;
        assert_matrix_eq(&s_back, &s, 1e-12);
    }

    #[test]
    fn test_s2y_z2s_roundtrip_through_inverse() {
        // S -> Y -> Z -> S is the identity when nothing is cancelled
        let s = sample_s();
        for z0 in [
            ReferenceImpedance::new(50.0).unwrap(),
            ReferenceImpedance::per_port(25.0, 100.0).unwrap(),
        ] {
            let y = s2y(&s, &z0).unwrap().matrix;
            let z = y2z(&y).unwrap().matrix;
            let s_back = z2s(&z, &z0).unwrap().matrix;
            assert_matrix_eq(&s_back, &s, 1e-12);
        }
    }

    #[test]
    fn test_s2z_matches_inverse_of_s2y() {
        let s = sample_s();
        let z0 = ReferenceImpedance::per_port(50.0, 75.0).unwrap();
        let z = s2z(&s, &z0).unwrap().matrix;
        let y = s2y(&s, &z0).unwrap().matrix;
        let y_from_z = z2y(&z).unwrap().matrix;
        assert_matrix_eq(&y_from_z, &y, 1e-12);
    }

    #[test]
    fn test_ideal_short_is_singular_for_s2y() {
        let s = mat2(c(-1.0, 0.0), c(0.0, 0.0), c(0.0, 0.0), c(-1.0, 0.0));
        assert!(s2y(&s, &ReferenceImpedance::default()).is_err());
    }

    #[test]
    fn test_ideal_open_has_zero_admittance() {
        let s = identity();
        let y = s2y(&s, &ReferenceImpedance::default()).unwrap().matrix;
        assert!(y.iter().all(|v| v.norm() == 0.0));
    }

    #[test]
    fn test_open_circuit_impedance() {
        // Z = very large -> S ≈ 1 on the diagonal
        let z = diag_matrix(&[c(1e10, 0.0), c(1e10, 0.0)]);
        let s = z2s(&z, &ReferenceImpedance::default()).unwrap().matrix;
        assert_relative_eq!(s[[0, 0]].re, 1.0, epsilon = 1e-5);
        assert_relative_eq!(s[[1, 1]].re, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_invalid_reference_impedance() {
        assert!(ReferenceImpedance::new(0.0).is_err());
        assert!(ReferenceImpedance::new(-50.0).is_err());
        assert!(ReferenceImpedance::new(f64::NAN).is_err());
        assert!(ReferenceImpedance::per_port(50.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_convert_sweep_fills_nan() {
        let mut s = Array3::<Complex64>::zeros((2, 2, 2));
        s[[1, 0, 0]] = c(-1.0, 0.0);
        s[[1, 1, 1]] = c(-1.0, 0.0);
        let z0 = ReferenceImpedance::default();
        let y = convert_sweep(&s, |m| s2y(m, &z0));
        assert_relative_eq!(y[[0, 0, 0]].re, 0.02, epsilon = 1e-12);
        assert!(y[[1, 0, 0]].re.is_nan());
    }
}

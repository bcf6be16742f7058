//! Unit conversion functions
//!
//! Conversions between the dB/degree encoding used by measurement files
//! and complex values.
//!
//! Zero-magnitude values have no defined phase. [`reim_2_dbdeg`] maps the
//! complex zero to `(-inf, 0.0)`: the magnitude is reported as negative
//! infinity instead of being clamped, and the phase is pinned to zero.

use num_complex::Complex64;
use std::f64::consts::PI;

/// Convert complex number to magnitude
pub fn complex_2_magnitude(z: Complex64) -> f64 {
    z.norm()
}

/// Convert complex number to dB (20*log10(|z|))
///
/// Returns `f64::NEG_INFINITY` for `z == 0`.
pub fn complex_2_db(z: Complex64) -> f64 {
    magnitude_2_db(z.norm())
}

/// Convert complex number to phase in degrees, in `(-180, 180]`
///
/// The phase of the complex zero is `0.0`.
pub fn complex_2_degree(z: Complex64) -> f64 {
    if z.norm() == 0.0 {
        return 0.0;
    }
    normalize_degree(radian_2_degree(z.im.atan2(z.re)))
}

/// Convert magnitude to dB (20*log10(mag))
pub fn magnitude_2_db(mag: f64) -> f64 {
    20.0 * mag.log10()
}

/// Convert dB to magnitude (10^(dB/20))
pub fn db_2_magnitude(db: f64) -> f64 {
    10.0_f64.powf(db / 20.0)
}

/// Convert (magnitude, degree) to complex
pub fn magdeg_2_reim(mag: f64, deg: f64) -> Complex64 {
    let rad = degree_2_radian(deg);
    Complex64::new(mag * rad.cos(), mag * rad.sin())
}

/// Convert (dB, degree) to complex
///
/// `magnitude = 10^(dB/20)`, `value = magnitude * (cos(phase) + i sin(phase))`.
pub fn dbdeg_2_reim(db: f64, deg: f64) -> Complex64 {
    magdeg_2_reim(db_2_magnitude(db), deg)
}

/// Convert complex to (dB, degree)
///
/// The phase lies in `(-180, 180]`. See the module docs for the zero case.
pub fn reim_2_dbdeg(z: Complex64) -> (f64, f64) {
    (complex_2_db(z), complex_2_degree(z))
}

/// Wrap a phase in degrees into `(-180, 180]`
pub fn normalize_degree(deg: f64) -> f64 {
    let wrapped = deg.rem_euclid(360.0);
    if wrapped > 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}

/// Convert radians to degrees
pub fn radian_2_degree(rad: f64) -> f64 {
    rad * 180.0 / PI
}

/// Convert degrees to radians
pub fn degree_2_radian(deg: f64) -> f64 {
    deg * PI / 180.0
}

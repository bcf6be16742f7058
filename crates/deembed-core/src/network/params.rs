//! Network parameter properties (S, Z, Y)
//!
//! Provides access to the parameter representations of a network and to
//! the dB/degree encoding of its S-parameters.

use ndarray::Array3;
use num_complex::Complex64;

use super::core::Network;
use crate::math::conversions::{complex_2_db, complex_2_degree, complex_2_magnitude};
use crate::math::transforms::{convert_sweep, s2y, s2z};

impl Network {
    /// Get frequency vector in Hz
    pub fn f(&self) -> &[f64] {
        self.frequency.f()
    }

    /// Get Z-parameters (impedance)
    ///
    /// Points where `I - S` is singular are NaN.
    pub fn z(&self) -> Array3<Complex64> {
        convert_sweep(&self.s, |s| s2z(s, &self.z0))
    }

    /// Get Y-parameters (admittance)
    ///
    /// Points where `I + S` is singular are NaN.
    pub fn y(&self) -> Array3<Complex64> {
        convert_sweep(&self.s, |s| s2y(s, &self.z0))
    }

    /// S-parameter magnitude in dB
    pub fn s_db(&self) -> Array3<f64> {
        self.s.mapv(complex_2_db)
    }

    /// S-parameter phase in degrees, in `(-180, 180]`
    pub fn s_deg(&self) -> Array3<f64> {
        self.s.mapv(complex_2_degree)
    }

    /// S-parameter linear magnitude
    pub fn s_mag(&self) -> Array3<f64> {
        self.s.mapv(complex_2_magnitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frequency::{Frequency, FrequencyUnit, SweepType};
    use crate::math::transforms::ReferenceImpedance;
    use approx::assert_relative_eq;

    fn matched(nfreq: usize) -> Network {
        let freq = Frequency::new(1.0, 2.0, nfreq, FrequencyUnit::GHz, SweepType::Linear);
        let s = Array3::<Complex64>::zeros((nfreq, 2, 2));
        Network::new(freq, s, ReferenceImpedance::default()).unwrap()
    }

    #[test]
    fn test_s_to_z_matched() {
        // A matched load (S = 0) has Z = z0
        let z = matched(1).z();
        assert_relative_eq!(z[[0, 0, 0]].re, 50.0, epsilon = 1e-10);
        assert_relative_eq!(z[[0, 0, 0]].im, 0.0, epsilon = 1e-10);
        assert_relative_eq!(z[[0, 1, 1]].re, 50.0, epsilon = 1e-10);
    }

    #[test]
    fn test_y_of_ideal_short_is_nan() {
        let mut ntwk = matched(2);
        ntwk.s[[1, 0, 0]] = Complex64::new(-1.0, 0.0);
        ntwk.s[[1, 1, 1]] = Complex64::new(-1.0, 0.0);
        let y = ntwk.y();
        assert_relative_eq!(y[[0, 0, 0]].re, 0.02, epsilon = 1e-12);
        assert!(y[[1, 0, 0]].re.is_nan());
    }

    #[test]
    fn test_s_db_and_deg() {
        let mut ntwk = matched(1);
        ntwk.s[[0, 1, 0]] = Complex64::new(0.0, 0.1);
        let db = ntwk.s_db();
        let deg = ntwk.s_deg();
        assert_relative_eq!(db[[0, 1, 0]], -20.0, epsilon = 1e-10);
        assert_relative_eq!(deg[[0, 1, 0]], 90.0, epsilon = 1e-10);
        assert_eq!(db[[0, 0, 0]], f64::NEG_INFINITY);
        assert_eq!(deg[[0, 0, 0]], 0.0);
        assert_relative_eq!(ntwk.s_mag()[[0, 1, 0]], 0.1, epsilon = 1e-12);
    }
}

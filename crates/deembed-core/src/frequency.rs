//! Frequency module - represents a frequency sweep
//!
//! A sweep is an ordered, strictly increasing list of non-negative
//! frequencies in Hz, one per measurement row.

use thiserror::Error;

/// Frequency sweep validation errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FrequencyError {
    #[error("frequency at index {index} is not a finite non-negative value: {value}")]
    InvalidValue { index: usize, value: f64 },

    #[error("frequency sweep is not strictly increasing at index {index} ({previous} Hz -> {value} Hz)")]
    NotIncreasing {
        index: usize,
        previous: f64,
        value: f64,
    },
}

/// Frequency unit enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrequencyUnit {
    #[default]
    Hz,
    KHz,
    MHz,
    GHz,
    THz,
}

impl FrequencyUnit {
    /// Get the multiplier to convert to Hz
    pub fn multiplier(&self) -> f64 {
        match self {
            FrequencyUnit::Hz => 1.0,
            FrequencyUnit::KHz => 1e3,
            FrequencyUnit::MHz => 1e6,
            FrequencyUnit::GHz => 1e9,
            FrequencyUnit::THz => 1e12,
        }
    }

    /// Parse from string (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "hz" => Some(FrequencyUnit::Hz),
            "khz" => Some(FrequencyUnit::KHz),
            "mhz" => Some(FrequencyUnit::MHz),
            "ghz" => Some(FrequencyUnit::GHz),
            "thz" => Some(FrequencyUnit::THz),
            _ => None,
        }
    }

    /// Upper-case label used in Touchstone option lines
    pub fn label(&self) -> &'static str {
        match self {
            FrequencyUnit::Hz => "HZ",
            FrequencyUnit::KHz => "KHZ",
            FrequencyUnit::MHz => "MHZ",
            FrequencyUnit::GHz => "GHZ",
            FrequencyUnit::THz => "THZ",
        }
    }
}

/// Sweep type enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SweepType {
    #[default]
    Linear,
    Log,
}

/// A frequency sweep
#[derive(Debug, Clone, PartialEq)]
pub struct Frequency {
    /// Frequency vector in Hz
    f: Vec<f64>,
    /// Display unit
    unit: FrequencyUnit,
}

impl Frequency {
    /// Create a new Frequency with start/stop/npoints
    ///
    /// # Example
    /// ```
    /// use deembed_core::frequency::{Frequency, FrequencyUnit, SweepType};
    /// let freq = Frequency::new(1.0, 10.0, 10, FrequencyUnit::GHz, SweepType::Linear);
    /// assert_eq!(freq.npoints(), 10);
    /// ```
    pub fn new(
        start: f64,
        stop: f64,
        npoints: usize,
        unit: FrequencyUnit,
        sweep_type: SweepType,
    ) -> Self {
        let mult = unit.multiplier();
        let start_hz = start * mult;
        let stop_hz = stop * mult;

        let f = match (npoints, sweep_type) {
            (0, _) => Vec::new(),
            (1, _) => vec![start_hz],
            (_, SweepType::Linear) => {
                let step = (stop_hz - start_hz) / (npoints - 1) as f64;
                (0..npoints).map(|i| start_hz + i as f64 * step).collect()
            }
            (_, SweepType::Log) => {
                let log_start = start_hz.ln();
                let log_stop = stop_hz.ln();
                let log_step = (log_stop - log_start) / (npoints - 1) as f64;
                (0..npoints)
                    .map(|i| (log_start + i as f64 * log_step).exp())
                    .collect()
            }
        };

        Self { f, unit }
    }

    /// Create from a frequency vector in Hz
    ///
    /// Fails unless every value is finite and non-negative and the sweep is
    /// strictly increasing.
    pub fn from_hz(f: Vec<f64>) -> Result<Self, FrequencyError> {
        Self::from_hz_with_unit(f, FrequencyUnit::Hz)
    }

    /// Create from a frequency vector in Hz with a display unit
    pub fn from_hz_with_unit(f: Vec<f64>, unit: FrequencyUnit) -> Result<Self, FrequencyError> {
        for (index, &value) in f.iter().enumerate() {
            if !value.is_finite() || value < 0.0 {
                return Err(FrequencyError::InvalidValue { index, value });
            }
            if index > 0 && value <= f[index - 1] {
                return Err(FrequencyError::NotIncreasing {
                    index,
                    previous: f[index - 1],
                    value,
                });
            }
        }
        Ok(Self { f, unit })
    }

    /// Get frequency vector in Hz
    #[inline]
    pub fn f(&self) -> &[f64] {
        &self.f
    }

    /// Get frequency vector in the display unit
    pub fn f_scaled(&self) -> Vec<f64> {
        let mult = self.unit.multiplier();
        self.f.iter().map(|&x| x / mult).collect()
    }

    /// Get the number of frequency points
    #[inline]
    pub fn npoints(&self) -> usize {
        self.f.len()
    }

    /// True when the sweep has no points
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.f.is_empty()
    }

    /// Get the start frequency in Hz
    #[inline]
    pub fn start(&self) -> f64 {
        self.f.first().copied().unwrap_or(0.0)
    }

    /// Get the stop frequency in Hz
    #[inline]
    pub fn stop(&self) -> f64 {
        self.f.last().copied().unwrap_or(0.0)
    }

    /// Get the display unit
    #[inline]
    pub fn unit(&self) -> FrequencyUnit {
        self.unit
    }

    /// Return a copy with another display unit
    pub fn with_unit(mut self, unit: FrequencyUnit) -> Self {
        self.unit = unit;
        self
    }

    /// First index at which `other` departs from this sweep
    ///
    /// Two values match when `|a - b| <= rel_tol * max(|a|, |b|)`. When one
    /// sweep is a prefix of the other, the length of the shorter one is
    /// returned. `None` means the sweeps are aligned.
    pub fn first_mismatch(&self, other: &Frequency, rel_tol: f64) -> Option<usize> {
        let common = self.npoints().min(other.npoints());
        let diverged = self.f[..common]
            .iter()
            .zip(&other.f[..common])
            .position(|(&a, &b)| !frequencies_match(a, b, rel_tol));

        match diverged {
            Some(index) => Some(index),
            None if self.npoints() != other.npoints() => Some(common),
            None => None,
        }
    }
}

/// Relative comparison of two frequencies in Hz
#[inline]
pub fn frequencies_match(a: f64, b: f64, rel_tol: f64) -> bool {
    (a - b).abs() <= rel_tol * a.abs().max(b.abs())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_create_linear_sweep() {
        let freq = Frequency::new(1.0, 10.0, 10, FrequencyUnit::GHz, SweepType::Linear);

        assert_eq!(freq.npoints(), 10);
        assert_relative_eq!(freq.start(), 1e9, epsilon = 1.0);
        assert_relative_eq!(freq.stop(), 10e9, epsilon = 1.0);

        let f_scaled = freq.f_scaled();
        assert_relative_eq!(f_scaled[0], 1.0, epsilon = 1e-10);
        assert_relative_eq!(f_scaled[9], 10.0, epsilon = 1e-10);
    }

    #[test]
    fn test_create_log_sweep() {
        let freq = Frequency::new(1.0, 10.0, 10, FrequencyUnit::GHz, SweepType::Log);

        assert_relative_eq!(freq.start(), 1e9, epsilon = 1.0);
        assert_relative_eq!(freq.stop(), 10e9, epsilon = 1.0);

        let f = freq.f();
        let ratios: Vec<f64> = f.windows(2).map(|w| w[1] / w[0]).collect();
        for r in &ratios[1..] {
            assert_relative_eq!(*r, ratios[0], epsilon = 1e-10);
        }
    }

    #[test]
    fn test_from_hz_validates() {
        assert!(Frequency::from_hz(vec![0.0, 1e9, 2e9]).is_ok());
        assert!(Frequency::from_hz(Vec::new()).is_ok());

        assert_eq!(
            Frequency::from_hz(vec![1e9, 1e9]),
            Err(FrequencyError::NotIncreasing {
                index: 1,
                previous: 1e9,
                value: 1e9
            })
        );
        assert!(matches!(
            Frequency::from_hz(vec![-1.0]),
            Err(FrequencyError::InvalidValue { index: 0, .. })
        ));
        assert!(matches!(
            Frequency::from_hz(vec![1.0, f64::NAN]),
            Err(FrequencyError::InvalidValue { index: 1, .. })
        ));
    }

    #[test]
    fn test_first_mismatch() {
        let a = Frequency::new(1.0, 100.0, 100, FrequencyUnit::MHz, SweepType::Linear);
        let b = Frequency::new(1.0, 99.0, 99, FrequencyUnit::MHz, SweepType::Linear);
        assert_eq!(a.first_mismatch(&a.clone(), 1e-9), None);
        assert_eq!(a.first_mismatch(&b, 1e-9), Some(99));
        assert_eq!(b.first_mismatch(&a, 1e-9), Some(99));

        let mut shifted = a.f().to_vec();
        shifted[42] += 1.0e3;
        let c = Frequency::from_hz(shifted).unwrap();
        assert_eq!(a.first_mismatch(&c, 1e-9), Some(42));

        // sub-tolerance jitter is accepted
        let jittered: Vec<f64> = a.f().iter().map(|f| f * (1.0 + 1e-12)).collect();
        let d = Frequency::from_hz(jittered).unwrap();
        assert_eq!(a.first_mismatch(&d, 1e-9), None);
    }

    #[test]
    fn test_frequency_unit_parse() {
        assert_eq!(FrequencyUnit::parse("ghz"), Some(FrequencyUnit::GHz));
        assert_eq!(FrequencyUnit::parse("GHZ"), Some(FrequencyUnit::GHz));
        assert_eq!(FrequencyUnit::parse("MHz"), Some(FrequencyUnit::MHz));
        assert_eq!(FrequencyUnit::parse("invalid"), None);
        assert_eq!(FrequencyUnit::KHz.label(), "KHZ");
    }
}

//! Run configuration

use serde::{Deserialize, Serialize};

use super::error::DeembedError;
use crate::constants::{
    DEFAULT_CONDITION_WARN_THRESHOLD, DEFAULT_FREQUENCY_TOL, DEFAULT_Z0_OHMS,
    MAX_CONDITION_WARN_THRESHOLD,
};
use crate::math::transforms::ReferenceImpedance;

/// What to do when an inversion is singular at some frequency point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "kebab-case")]
pub enum SingularityPolicy {
    /// Fail the whole sweep, reporting the lowest failing index
    #[default]
    Abort,
    /// Write a NaN matrix at failing points and report them after the run
    SkipWithSentinel,
}

/// Options of one de-embedding run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeembedConfig {
    #[serde(alias = "referenceImpedanceOhms")]
    pub reference_impedance_ohms: f64,
    #[serde(alias = "singularityPolicy")]
    pub singularity_policy: SingularityPolicy,
    #[serde(alias = "conditionNumberWarnThreshold")]
    pub condition_number_warn_threshold: f64,
    /// Relative tolerance when matching frequency sweeps
    #[serde(alias = "frequencyTolerance")]
    pub frequency_tolerance: f64,
    /// Spread frequency points over the rayon pool
    pub parallel: bool,
}

impl Default for DeembedConfig {
    fn default() -> Self {
        Self {
            reference_impedance_ohms: DEFAULT_Z0_OHMS,
            singularity_policy: SingularityPolicy::default(),
            condition_number_warn_threshold: DEFAULT_CONDITION_WARN_THRESHOLD,
            frequency_tolerance: DEFAULT_FREQUENCY_TOL,
            parallel: true,
        }
    }
}

impl DeembedConfig {
    pub fn with_policy(mut self, policy: SingularityPolicy) -> Self {
        self.singularity_policy = policy;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Reference impedance on both ports
    pub fn reference_impedance(&self) -> Result<ReferenceImpedance, DeembedError> {
        Ok(ReferenceImpedance::new(self.reference_impedance_ohms)?)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<(), DeembedError> {
        self.reference_impedance()?;

        let threshold = self.condition_number_warn_threshold;
        if threshold.is_nan() || threshold < 1.0 || threshold >= MAX_CONDITION_WARN_THRESHOLD {
            return Err(DeembedError::InvalidConfig(format!(
                "condition number threshold must be in [1, {:e}), got {}",
                MAX_CONDITION_WARN_THRESHOLD, threshold
            )));
        }

        let tol = self.frequency_tolerance;
        if !tol.is_finite() || tol < 0.0 {
            return Err(DeembedError::InvalidConfig(format!(
                "frequency tolerance must be finite and non-negative, got {}",
                tol
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::transforms::InvalidReferenceImpedance;

    #[test]
    fn test_defaults() {
        let cfg = DeembedConfig::default();
        assert_eq!(cfg.reference_impedance_ohms, 50.0);
        assert_eq!(cfg.singularity_policy, SingularityPolicy::Abort);
        assert_eq!(cfg.condition_number_warn_threshold, 1e12);
        assert!(cfg.parallel);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_camel_case_json() {
        let json = r#"{"referenceImpedanceOhms": 75, "singularityPolicy": "skip-with-sentinel"}"#;
        let cfg: DeembedConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.reference_impedance_ohms, 75.0);
        assert_eq!(cfg.singularity_policy, SingularityPolicy::SkipWithSentinel);
        assert_eq!(cfg.condition_number_warn_threshold, 1e12);
    }

    #[test]
    fn test_snake_case_toml() {
        let toml_str = r#"
            reference_impedance_ohms = 25.0
            singularity_policy = "abort"
            condition_number_warn_threshold = 1e9
            parallel = false
        "#;
        let cfg: DeembedConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.reference_impedance_ohms, 25.0);
        assert_eq!(cfg.condition_number_warn_threshold, 1e9);
        assert!(!cfg.parallel);
        assert_eq!(cfg.frequency_tolerance, 1e-9);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut cfg = DeembedConfig {
            reference_impedance_ohms: 0.0,
            ..Default::default()
        };
        assert_eq!(
            cfg.validate(),
            Err(DeembedError::InvalidReferenceImpedance(
                InvalidReferenceImpedance(0.0)
            ))
        );

        cfg.reference_impedance_ohms = 50.0;
        cfg.condition_number_warn_threshold = 0.5;
        assert!(matches!(cfg.validate(), Err(DeembedError::InvalidConfig(_))));

        cfg.condition_number_warn_threshold = 1e14;
        assert!(matches!(cfg.validate(), Err(DeembedError::InvalidConfig(_))));
        cfg.condition_number_warn_threshold = MAX_CONDITION_WARN_THRESHOLD;
        assert!(matches!(cfg.validate(), Err(DeembedError::InvalidConfig(_))));
        cfg.condition_number_warn_threshold = 4e12;
        assert!(cfg.validate().is_ok());

        cfg.condition_number_warn_threshold = 1e12;
        cfg.frequency_tolerance = -1.0;
        assert!(matches!(cfg.validate(), Err(DeembedError::InvalidConfig(_))));
    }
}

//! Open/short de-embedding
//!
//! Removes shunt parasitics in the admittance domain and series parasitics
//! in the impedance domain. For every frequency point `k`:
//!
//! ```text
//! Y_x  = s2y(S_x[k], Z0)                for x in dut, short, open
//! Z_do = (Y_dut   - Y_open)^-1
//! Z_so = (Y_short - Y_open)^-1
//! S[k] = z2s(Z_do - Z_so, Z0)
//! ```
//!
//! Points are independent, so the sweep is a map over frequency indices
//! that may run on the rayon pool. Results are collected in index order.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ndarray::{Array2, Array3};
use num_complex::Complex64;
use rayon::prelude::*;

use super::config::{DeembedConfig, SingularityPolicy};
use super::error::{DeembedError, IllConditioned, InversionStage, SingularPoint};
use crate::constants::NPORTS;
use crate::math::matrix_ops::{invert_2x2, is_finite, nan_matrix, SingularMatrix};
use crate::math::transforms::{s2y, z2s, ReferenceImpedance};
use crate::network::Network;

/// Cooperative cancellation flag shared with a running sweep
///
/// Once cancelled, points that have not started are skipped.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// De-embedded matrix of one point with the condition number of every
/// inversion, in algorithm order
#[derive(Debug, Clone, PartialEq)]
pub struct PointResult {
    pub s: Array2<Complex64>,
    pub conditions: [(InversionStage, f64); 6],
}

/// Result of a de-embedding run
#[derive(Debug, Clone)]
pub struct DeembedOutcome {
    /// De-embedded DUT, index-aligned with the input sweep
    pub network: Network,
    /// Inversions above the condition number threshold
    pub warnings: Vec<IllConditioned>,
    /// Points replaced by NaN matrices (skip-with-sentinel only)
    pub sentinels: Vec<SingularPoint>,
}

impl DeembedOutcome {
    /// Indices of the sentinel points
    pub fn sentinel_indices(&self) -> Vec<usize> {
        self.sentinels.iter().map(|p| p.index).collect()
    }
}

/// De-embed one frequency point
///
/// Pure function of the three measured matrices and `z0`. On failure the
/// stage that could not be inverted is returned with the rejected matrix.
pub fn deembed_point(
    s_dut: &Array2<Complex64>,
    s_short: &Array2<Complex64>,
    s_open: &Array2<Complex64>,
    z0: &ReferenceImpedance,
) -> Result<PointResult, (InversionStage, SingularMatrix)> {
    let at = |stage: InversionStage| move |e: SingularMatrix| (stage, e);

    let y_dut = s2y(s_dut, z0).map_err(at(InversionStage::DutToY))?;
    let y_short = s2y(s_short, z0).map_err(at(InversionStage::ShortToY))?;
    let y_open = s2y(s_open, z0).map_err(at(InversionStage::OpenToY))?;

    // Shunt parasitics add in Y
    let y_dut_open = &y_dut.matrix - &y_open.matrix;
    let y_short_open = &y_short.matrix - &y_open.matrix;

    let z_dut_open = invert_2x2(&y_dut_open).map_err(at(InversionStage::DutOpenInverse))?;
    let z_short_open =
        invert_2x2(&y_short_open).map_err(at(InversionStage::ShortOpenInverse))?;

    // Series parasitics add in Z
    let z_dut = &z_dut_open.matrix - &z_short_open.matrix;
    let s = z2s(&z_dut, z0).map_err(at(InversionStage::ZToS))?;

    if !is_finite(&s.matrix) {
        return Err((
            InversionStage::ZToS,
            SingularMatrix {
                determinant: f64::NAN,
                scale: f64::NAN,
            },
        ));
    }

    Ok(PointResult {
        s: s.matrix,
        conditions: [
            (InversionStage::DutToY, y_dut.condition),
            (InversionStage::ShortToY, y_short.condition),
            (InversionStage::OpenToY, y_open.condition),
            (InversionStage::DutOpenInverse, z_dut_open.condition),
            (InversionStage::ShortOpenInverse, z_short_open.condition),
            (InversionStage::ZToS, s.condition),
        ],
    })
}

/// First frequency index where two structures disagree
fn check_aligned(
    reference: &Network,
    reference_id: &str,
    other: &Network,
    other_id: &str,
    rel_tol: f64,
) -> Result<(), DeembedError> {
    let Some(index) = reference.frequency.first_mismatch(&other.frequency, rel_tol) else {
        return Ok(());
    };

    let reason = match (reference.f().get(index), other.f().get(index)) {
        (Some(a), Some(b)) => format!("{} Hz vs {} Hz", a, b),
        _ => format!("length {} vs {}", reference.nfreq(), other.nfreq()),
    };

    Err(DeembedError::FrequencyMismatch {
        index,
        reference: reference.name_or(reference_id).to_string(),
        other: other.name_or(other_id).to_string(),
        reason,
    })
}

fn check_z0(
    network: &Network,
    structure: &str,
    z0: &ReferenceImpedance,
) -> Result<(), DeembedError> {
    if network.z0 == *z0 {
        Ok(())
    } else {
        Err(DeembedError::ReferenceImpedanceMismatch {
            structure: network.name_or(structure).to_string(),
            expected: z0.ohms(),
            found: network.z0.ohms(),
        })
    }
}

/// Open/short calibration built from the two reference structures
#[derive(Debug, Clone)]
pub struct OpenShort {
    open: Network,
    short: Network,
    config: DeembedConfig,
    z0: ReferenceImpedance,
}

impl OpenShort {
    /// Validate the configuration and the open/short pair
    pub fn new(open: Network, short: Network, config: DeembedConfig) -> Result<Self, DeembedError> {
        config.validate()?;
        let z0 = config.reference_impedance()?;

        check_z0(&open, "open", &z0)?;
        check_z0(&short, "short", &z0)?;
        check_aligned(&open, "open", &short, "short", config.frequency_tolerance)?;

        Ok(Self {
            open,
            short,
            config,
            z0,
        })
    }

    /// De-embed a DUT measurement
    pub fn apply(&self, dut: &Network) -> Result<DeembedOutcome, DeembedError> {
        self.apply_with_cancel(dut, &CancelToken::new())
    }

    /// De-embed a DUT measurement, stopping early once `cancel` is set
    pub fn apply_with_cancel(
        &self,
        dut: &Network,
        cancel: &CancelToken,
    ) -> Result<DeembedOutcome, DeembedError> {
        let tol = self.config.frequency_tolerance;
        check_z0(dut, "dut", &self.z0)?;
        check_aligned(dut, "dut", &self.short, "short", tol)?;
        check_aligned(dut, "dut", &self.open, "open", tol)?;

        let nfreq = dut.nfreq();
        let point = |k: usize| {
            if cancel.is_cancelled() {
                return None;
            }
            Some(deembed_point(
                &dut.s_at(k).to_owned(),
                &self.short.s_at(k).to_owned(),
                &self.open.s_at(k).to_owned(),
                &self.z0,
            ))
        };

        let results: Vec<_> = if self.config.parallel {
            (0..nfreq).into_par_iter().map(&point).collect()
        } else {
            (0..nfreq).map(&point).collect()
        };

        let completed = results.iter().filter(|r| r.is_some()).count();
        if completed < nfreq {
            tracing::info!(completed, total = nfreq, "de-embedding cancelled");
            return Err(DeembedError::Cancelled { completed });
        }

        let threshold = self.config.condition_number_warn_threshold;
        let mut s = Array3::<Complex64>::zeros((nfreq, NPORTS, NPORTS));
        let mut warnings = Vec::new();
        let mut sentinels = Vec::new();

        for (k, result) in results.into_iter().flatten().enumerate() {
            let frequency_hz = dut.f()[k];
            match result {
                Ok(point) => {
                    for (stage, condition) in point.conditions {
                        if condition > threshold {
                            tracing::warn!(
                                index = k,
                                frequency_hz,
                                condition,
                                stage = %stage,
                                "ill-conditioned inversion"
                            );
                            warnings.push(IllConditioned {
                                index: k,
                                frequency_hz,
                                stage,
                                condition,
                            });
                        }
                    }
                    s.slice_mut(ndarray::s![k, .., ..]).assign(&point.s);
                }
                Err((stage, err)) => {
                    let singular = SingularPoint {
                        index: k,
                        frequency_hz,
                        stage,
                        determinant: err.determinant,
                    };
                    match self.config.singularity_policy {
                        SingularityPolicy::Abort => return Err(singular.into()),
                        SingularityPolicy::SkipWithSentinel => {
                            tracing::warn!(
                                index = k,
                                frequency_hz,
                                stage = %stage,
                                "singular point replaced by NaN sentinel"
                            );
                            s.slice_mut(ndarray::s![k, .., ..]).assign(&nan_matrix());
                            sentinels.push(singular);
                        }
                    }
                }
            }
        }

        tracing::debug!(
            points = nfreq,
            warnings = warnings.len(),
            sentinels = sentinels.len(),
            "open/short de-embedding complete"
        );

        let mut comments = dut.comments.clone();
        comments.push(format!(
            "open/short de-embedded using '{}' and '{}'",
            self.open.name_or("open"),
            self.short.name_or("short")
        ));

        Ok(DeembedOutcome {
            network: Network {
                frequency: dut.frequency.clone(),
                s,
                z0: self.z0,
                name: dut.name.clone(),
                comments,
            },
            warnings,
            sentinels,
        })
    }
}

/// De-embed `dut` with the given short and open structures
///
/// # Example
/// ```
/// use deembed_core::calibration::{deembed, DeembedConfig};
/// use deembed_core::frequency::Frequency;
/// use deembed_core::math::transforms::ReferenceImpedance;
/// use deembed_core::Network;
/// use ndarray::Array3;
/// use num_complex::Complex64;
///
/// let freq = Frequency::from_hz(vec![1e9]).unwrap();
/// let z0 = ReferenceImpedance::default();
/// let net = |v: f64| {
///     let mut s = Array3::<Complex64>::zeros((1, 2, 2));
///     s[[0, 0, 0]] = Complex64::new(v, 0.0);
///     s[[0, 1, 1]] = Complex64::new(v, 0.0);
///     Network::new(freq.clone(), s, z0).unwrap()
/// };
///
/// let out = deembed(&net(0.1), &net(-0.9), &net(0.99), &DeembedConfig::default()).unwrap();
/// assert_eq!(out.network.nfreq(), 1);
/// ```
pub fn deembed(
    dut: &Network,
    short: &Network,
    open: &Network,
    config: &DeembedConfig,
) -> Result<DeembedOutcome, DeembedError> {
    check_aligned(dut, "dut", short, "short", config.frequency_tolerance)?;
    check_aligned(dut, "dut", open, "open", config.frequency_tolerance)?;
    OpenShort::new(open.clone(), short.clone(), config.clone())?.apply(dut)
}

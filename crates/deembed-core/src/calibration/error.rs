//! De-embedding errors and warnings

use std::fmt;

use thiserror::Error;

use crate::math::transforms::InvalidReferenceImpedance;

/// Inversion performed by the open/short algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InversionStage {
    /// `(I + S_dut)^-1` in S to Y
    DutToY,
    /// `(I + S_short)^-1` in S to Y
    ShortToY,
    /// `(I + S_open)^-1` in S to Y
    OpenToY,
    /// `(Y_dut - Y_open)^-1`
    DutOpenInverse,
    /// `(Y_short - Y_open)^-1`
    ShortOpenInverse,
    /// `(Z_dut + Z0)^-1` in Z to S
    ZToS,
}

impl fmt::Display for InversionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            InversionStage::DutToY => "dut S->Y",
            InversionStage::ShortToY => "short S->Y",
            InversionStage::OpenToY => "open S->Y",
            InversionStage::DutOpenInverse => "(Y_dut - Y_open) inverse",
            InversionStage::ShortOpenInverse => "(Y_short - Y_open) inverse",
            InversionStage::ZToS => "Z->S",
        };
        f.write_str(s)
    }
}

/// A frequency point whose inversion was singular
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SingularPoint {
    pub index: usize,
    pub frequency_hz: f64,
    pub stage: InversionStage,
    /// |det| of the rejected matrix, NaN when it held non-finite values
    pub determinant: f64,
}

/// Non-fatal: an inversion succeeded with a large condition number
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IllConditioned {
    pub index: usize,
    pub frequency_hz: f64,
    pub stage: InversionStage,
    pub condition: f64,
}

impl fmt::Display for IllConditioned {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "index {} ({} Hz): {} condition number {:e}",
            self.index, self.frequency_hz, self.stage, self.condition
        )
    }
}

/// De-embedding errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DeembedError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    InvalidReferenceImpedance(#[from] InvalidReferenceImpedance),

    #[error("Structure '{structure}' uses reference impedance {found:?} ohm, run uses {expected:?} ohm")]
    ReferenceImpedanceMismatch {
        structure: String,
        expected: [f64; 2],
        found: [f64; 2],
    },

    #[error("Frequency mismatch between '{reference}' and '{other}' at index {index}: {reason}")]
    FrequencyMismatch {
        index: usize,
        reference: String,
        other: String,
        reason: String,
    },

    #[error("Singular network at index {index} ({frequency_hz} Hz): {stage} failed (|det| = {determinant:e})")]
    SingularNetwork {
        index: usize,
        frequency_hz: f64,
        stage: InversionStage,
        determinant: f64,
    },

    #[error("Cancelled after {completed} frequency points")]
    Cancelled { completed: usize },
}

impl From<SingularPoint> for DeembedError {
    fn from(p: SingularPoint) -> Self {
        DeembedError::SingularNetwork {
            index: p.index,
            frequency_hz: p.frequency_hz,
            stage: p.stage,
            determinant: p.determinant,
        }
    }
}

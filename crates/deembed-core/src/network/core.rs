//! Core Network struct and constructors
//!
//! Contains the two-port network data structure: a named Scattering
//! Sequence with its Frequency Sweep and reference impedance.

use ndarray::{Array2, Array3, ArrayView2};
use num_complex::Complex64;
use thiserror::Error;

use crate::constants::NPORTS;
use crate::frequency::Frequency;
use crate::math::transforms::ReferenceImpedance;

/// Network construction errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NetworkError {
    #[error("S-parameter array must have shape [nfreq, 2, 2], got {0:?}")]
    NotTwoPort(Vec<usize>),

    #[error("{frequencies} frequency points but {matrices} S-parameter matrices")]
    LengthMismatch { frequencies: usize, matrices: usize },
}

/// A two-port electrical network
#[derive(Debug, Clone, PartialEq)]
pub struct Network {
    /// Frequency data
    pub frequency: Frequency,
    /// S-parameter data [nfreq, 2, 2]
    pub s: Array3<Complex64>,
    /// Reference impedance
    pub z0: ReferenceImpedance,
    /// Network name
    pub name: Option<String>,
    /// Comments
    pub comments: Vec<String>,
}

impl Network {
    /// Create a new Network from S-parameters
    ///
    /// `s` must be `[nfreq, 2, 2]` with one matrix per frequency point.
    pub fn new(
        frequency: Frequency,
        s: Array3<Complex64>,
        z0: ReferenceImpedance,
    ) -> Result<Self, NetworkError> {
        let shape = s.shape();
        if shape[1] != NPORTS || shape[2] != NPORTS {
            return Err(NetworkError::NotTwoPort(shape.to_vec()));
        }
        if shape[0] != frequency.npoints() {
            return Err(NetworkError::LengthMismatch {
                frequencies: frequency.npoints(),
                matrices: shape[0],
            });
        }

        Ok(Self {
            frequency,
            s,
            z0,
            name: None,
            comments: Vec::new(),
        })
    }

    /// Create from one 2x2 matrix per frequency point
    pub fn from_matrices(
        frequency: Frequency,
        matrices: &[Array2<Complex64>],
        z0: ReferenceImpedance,
    ) -> Result<Self, NetworkError> {
        if let Some(bad) = matrices.iter().find(|m| m.shape() != [NPORTS, NPORTS]) {
            return Err(NetworkError::NotTwoPort(bad.shape().to_vec()));
        }
        let s = Array3::from_shape_fn((matrices.len(), NPORTS, NPORTS), |(f, i, j)| {
            matrices[f][[i, j]]
        });
        Self::new(frequency, s, z0)
    }

    /// Set the network name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Name, or `fallback` when unnamed
    pub fn name_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.name.as_deref().unwrap_or(fallback)
    }

    /// S-parameter matrix at frequency index `f`
    #[inline]
    pub fn s_at(&self, f: usize) -> ArrayView2<'_, Complex64> {
        self.s.index_axis(ndarray::Axis(0), f)
    }

    /// Get the number of ports
    #[inline]
    pub fn nports(&self) -> usize {
        self.s.shape()[1]
    }

    /// Get the number of frequency points
    #[inline]
    pub fn nfreq(&self) -> usize {
        self.s.shape()[0]
    }
}

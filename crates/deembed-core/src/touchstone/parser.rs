//! Touchstone file parser
//!
//! Implements parsing of two-port Touchstone v1 (`.s2p`) files. S, Y and Z
//! parameter files are accepted; Y and Z data are denormalized with the
//! option-line reference and converted to S on load.

use ndarray::Array3;
use num_complex::Complex64;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use thiserror::Error;

use crate::constants::NPORTS;
use crate::frequency::{Frequency, FrequencyError, FrequencyUnit};
use crate::math::conversions::{dbdeg_2_reim, magdeg_2_reim};
use crate::math::matrix_ops::{mat2, SingularMatrix};
use crate::math::transforms::{y2s, z2s, InvalidReferenceImpedance, ReferenceImpedance};

/// Values per two-port data point: frequency plus four complex pairs
const VALUES_PER_POINT: usize = 1 + 2 * NPORTS * NPORTS;

/// Touchstone parsing errors
#[derive(Error, Debug)]
pub enum TouchstoneError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Invalid option line: {0}")]
    InvalidOption(String),

    #[error("Invalid file extension: expected .s2p")]
    InvalidExtension,

    #[error("{param:?} data at point {point} cannot be converted to S: {source}")]
    Conversion {
        param: ParameterType,
        point: usize,
        source: SingularMatrix,
    },

    #[error("Incomplete data: {0} trailing values do not form a full frequency point")]
    Incomplete(usize),

    #[error("Invalid frequency sweep: {0}")]
    Frequency(#[from] FrequencyError),

    #[error(transparent)]
    ReferenceImpedance(#[from] InvalidReferenceImpedance),

    #[error("Touchstone v1 has one reference impedance, got {0:?} ohm per port")]
    UnequalReferenceImpedance([f64; NPORTS]),
}

/// S-parameter data format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SParamFormat {
    #[default]
    RI, // Real-Imaginary
    MA, // Magnitude-Angle (degrees)
    DB, // dB-Angle (degrees)
}

impl SParamFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "RI" => Some(SParamFormat::RI),
            "MA" => Some(SParamFormat::MA),
            "DB" => Some(SParamFormat::DB),
            _ => None,
        }
    }

    /// Decode one value pair into a complex number
    pub fn decode(&self, a: f64, b: f64) -> Complex64 {
        match self {
            SParamFormat::RI => Complex64::new(a, b),
            SParamFormat::MA => magdeg_2_reim(a, b),
            SParamFormat::DB => dbdeg_2_reim(a, b),
        }
    }
}

/// Network parameter type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParameterType {
    #[default]
    S,
    Y,
    Z,
}

impl ParameterType {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "S" => Some(ParameterType::S),
            "Y" => Some(ParameterType::Y),
            "Z" => Some(ParameterType::Z),
            _ => None,
        }
    }
}

/// Contents of the `#` option line
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OptionLine {
    pub unit: FrequencyUnit,
    pub param_type: ParameterType,
    pub format: SParamFormat,
    pub z0: f64,
}

impl Default for OptionLine {
    fn default() -> Self {
        // Touchstone v1 defaults: # GHZ S MA R 50
        Self {
            unit: FrequencyUnit::GHz,
            param_type: ParameterType::S,
            format: SParamFormat::MA,
            z0: 50.0,
        }
    }
}

/// Parsed two-port Touchstone data, always stored as S-parameters
#[derive(Debug, Clone)]
pub struct Touchstone {
    /// Frequency data
    pub frequency: Frequency,
    /// S-parameter data [nfreq, 2, 2]
    pub s: Array3<Complex64>,
    /// Reference impedance from the option line
    pub z0: ReferenceImpedance,
    /// Comments from the file
    pub comments: Vec<String>,
    /// Format used when writing
    pub format: SParamFormat,
}

impl Touchstone {
    /// Parse a Touchstone file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, TouchstoneError> {
        let path = path.as_ref();

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or(TouchstoneError::InvalidExtension)?;
        if !ext.eq_ignore_ascii_case("s2p") {
            return Err(TouchstoneError::InvalidExtension);
        }

        let file = File::open(path)?;
        Self::parse(BufReader::new(file))
    }

    /// Parse from string content
    ///
    /// # Example
    /// ```
    /// use deembed_core::touchstone::Touchstone;
    /// let content = "# GHz S RI R 50\n1.0 0.1 0.0 0.9 0.0 0.9 0.0 0.1 0.0";
    /// let ts = Touchstone::parse_str(content).unwrap();
    /// assert_eq!(ts.nfreq(), 1);
    /// ```
    pub fn parse_str(content: &str) -> Result<Self, TouchstoneError> {
        Self::parse(std::io::Cursor::new(content))
    }

    /// Parse from a reader
    fn parse<R: BufRead>(reader: R) -> Result<Self, TouchstoneError> {
        let mut options: Option<OptionLine> = None;
        let mut comments = Vec::new();
        let mut values: Vec<f64> = Vec::new();

        for (idx, line_result) in reader.lines().enumerate() {
            let line = line_result?;
            let line_no = idx + 1;

            // Strip trailing comments, keep their text
            let (data, comment) = match line.split_once('!') {
                Some((data, comment)) => (data, Some(comment.trim())),
                None => (line.as_str(), None),
            };
            if let Some(comment) = comment.filter(|c| !c.is_empty()) {
                comments.push(comment.to_string());
            }

            let trimmed = data.trim();
            if trimmed.is_empty() {
                continue;
            }

            if trimmed.starts_with('#') {
                // Only the first option line counts
                if options.is_none() {
                    options = Some(Self::parse_option_line(trimmed)?);
                }
                continue;
            }

            if trimmed.starts_with('[') {
                return Err(TouchstoneError::Parse {
                    line: line_no,
                    message: "Touchstone 2.0 keywords are not supported".to_string(),
                });
            }

            for token in trimmed.split_whitespace() {
                let v = token.parse::<f64>().map_err(|_| TouchstoneError::Parse {
                    line: line_no,
                    message: format!("invalid number '{}'", token),
                })?;
                values.push(v);
            }
        }

        let options = options.unwrap_or_default();
        Self::assemble(options, values, comments)
    }

    /// Parse the option line (# GHZ S RI R 50)
    pub fn parse_option_line(line: &str) -> Result<OptionLine, TouchstoneError> {
        let body = line.strip_prefix('#').unwrap_or(line);
        let parts: Vec<&str> = body.split_whitespace().collect();
        let mut options = OptionLine::default();

        let mut i = 0;
        while i < parts.len() {
            let part = parts[i];

            if let Some(unit) = FrequencyUnit::parse(part) {
                options.unit = unit;
            } else if let Some(fmt) = SParamFormat::parse(part) {
                options.format = fmt;
            } else if let Some(pt) = ParameterType::parse(part) {
                options.param_type = pt;
            } else if part.eq_ignore_ascii_case("R") {
                let value = parts.get(i + 1).and_then(|v| v.parse::<f64>().ok()).ok_or_else(
                    || TouchstoneError::InvalidOption(format!("missing value after R in '{}'", line)),
                )?;
                options.z0 = value;
                i += 1;
            } else {
                return Err(TouchstoneError::InvalidOption(format!(
                    "unknown token '{}' in '{}'",
                    part, line
                )));
            }

            i += 1;
        }

        Ok(options)
    }

    fn assemble(
        options: OptionLine,
        values: Vec<f64>,
        comments: Vec<String>,
    ) -> Result<Self, TouchstoneError> {
        let remainder = values.len() % VALUES_PER_POINT;
        if remainder != 0 {
            return Err(TouchstoneError::Incomplete(remainder));
        }

        let z0 = ReferenceImpedance::new(options.z0)?;
        let mult = options.unit.multiplier();
        let nfreq = values.len() / VALUES_PER_POINT;
        let mut f = Vec::with_capacity(nfreq);
        let mut s = Array3::<Complex64>::zeros((nfreq, NPORTS, NPORTS));

        for (k, point) in values.chunks_exact(VALUES_PER_POINT).enumerate() {
            f.push(point[0] * mult);

            // Two-port order: 11, 21, 12, 22
            let p = |n: usize| options.format.decode(point[1 + 2 * n], point[2 + 2 * n]);
            let m = mat2(p(0), p(2), p(1), p(3));

            let m = match options.param_type {
                ParameterType::S => m,
                ParameterType::Z => z2s(&m.mapv(|v| v * options.z0), &z0)
                    .map_err(|source| TouchstoneError::Conversion {
                        param: ParameterType::Z,
                        point: k,
                        source,
                    })?
                    .matrix,
                ParameterType::Y => y2s(&m.mapv(|v| v / options.z0), &z0)
                    .map_err(|source| TouchstoneError::Conversion {
                        param: ParameterType::Y,
                        point: k,
                        source,
                    })?
                    .matrix,
            };
            s.slice_mut(ndarray::s![k, .., ..]).assign(&m);
        }

        let frequency = Frequency::from_hz_with_unit(f, options.unit)?;

        Ok(Self {
            frequency,
            s,
            z0,
            comments,
            format: options.format,
        })
    }

    /// Get the number of frequency points
    pub fn nfreq(&self) -> usize {
        self.s.shape()[0]
    }
}

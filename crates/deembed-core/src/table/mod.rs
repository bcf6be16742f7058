//! Tabular measurement files
//!
//! CSV layout: a `Freq(Hz)` column followed by dB/degree pairs for S11,
//! S21, S12 and S22. Instrument preamble lines before the header are
//! skipped and extra columns are ignored.

use thiserror::Error;

use crate::frequency::FrequencyError;

pub mod merge;
pub mod reader;
pub mod writer;

pub use merge::{write_merged, MergeGroup};
pub use reader::{parse_table, read_table};
pub use writer::{write_comparison, write_table, ComparisonSummary};

/// Name of the frequency column
pub const FREQ_COLUMN: &str = "Freq(Hz)";

/// S-parameter names in column order with their (row, column) index
pub const PARAMS: [(&str, usize, usize); 4] =
    [("S11", 0, 0), ("S21", 1, 0), ("S12", 0, 1), ("S22", 1, 1)];

/// dB and degree column names of one S-parameter
pub fn param_columns(param: &str) -> (String, String) {
    (format!("{}(dB)", param), format!("{}(deg)", param))
}

/// Table I/O errors
#[derive(Error, Debug)]
pub enum TableError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Missing expected columns: {0:?}")]
    MissingColumns(Vec<String>),

    #[error("Line {line}: expected at least {expected} columns, found {found}")]
    ShortRow {
        line: u64,
        expected: usize,
        found: usize,
    },

    #[error("Line {line}, column '{column}': invalid number '{value}'")]
    InvalidNumber {
        line: u64,
        column: String,
        value: String,
    },

    #[error("Invalid frequency sweep: {0}")]
    Frequency(#[from] FrequencyError),

    #[error("Cannot compare networks: frequency grids ({raw} and {deembedded} points) differ at index {index}")]
    Misaligned {
        index: usize,
        raw: usize,
        deembedded: usize,
    },
}

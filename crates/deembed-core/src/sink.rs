//! Result sinks
//!
//! A [`ResultSink`] persists a de-embedded network. File sinks write the
//! CSV table layout, two-port Touchstone, or a raw vs de-embedded
//! comparison table.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::frequency::FrequencyUnit;
use crate::network::Network;
use crate::table::{write_comparison, write_table, ComparisonSummary, TableError};
use crate::touchstone::{SParamFormat, TouchstoneError};

/// Sink errors
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("{}: {source}", path.display())]
    Table {
        path: PathBuf,
        #[source]
        source: TableError,
    },

    #[error("{}: {source}", path.display())]
    Touchstone {
        path: PathBuf,
        #[source]
        source: TouchstoneError,
    },
}

/// Persists de-embedded networks
pub trait ResultSink {
    fn persist(&mut self, network: &Network) -> Result<(), SinkError>;
}

/// Collects results in memory
impl ResultSink for Vec<Network> {
    fn persist(&mut self, network: &Network) -> Result<(), SinkError> {
        self.push(network.clone());
        Ok(())
    }
}

fn create(path: &Path) -> Result<BufWriter<File>, SinkError> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|e| SinkError::Table {
            path: path.to_path_buf(),
            source: e.into(),
        })
}

/// Writes the dB/degree CSV table
#[derive(Debug, Clone)]
pub struct TableSink {
    pub path: PathBuf,
}

impl TableSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ResultSink for TableSink {
    fn persist(&mut self, network: &Network) -> Result<(), SinkError> {
        let writer = create(&self.path)?;
        write_table(network, writer).map_err(|source| SinkError::Table {
            path: self.path.clone(),
            source,
        })?;
        tracing::info!(path = %self.path.display(), points = network.nfreq(), "wrote table");
        Ok(())
    }
}

/// Writes a two-port Touchstone file with frequencies in Hz
#[derive(Debug, Clone)]
pub struct TouchstoneSink {
    pub path: PathBuf,
    pub format: SParamFormat,
}

impl TouchstoneSink {
    /// Sink writing dB/angle data
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            format: SParamFormat::DB,
        }
    }

    pub fn with_format(mut self, format: SParamFormat) -> Self {
        self.format = format;
        self
    }
}

impl ResultSink for TouchstoneSink {
    fn persist(&mut self, network: &Network) -> Result<(), SinkError> {
        let mut ts = network.to_touchstone(self.format);
        ts.frequency = ts.frequency.with_unit(FrequencyUnit::Hz);
        ts.write(&self.path).map_err(|source| SinkError::Touchstone {
            path: self.path.clone(),
            source,
        })?;
        tracing::info!(path = %self.path.display(), points = network.nfreq(), "wrote touchstone");
        Ok(())
    }
}

/// Writes the raw measurement next to each persisted result
#[derive(Debug, Clone)]
pub struct ComparisonSink {
    pub path: PathBuf,
    raw: Network,
    summary: Option<ComparisonSummary>,
}

impl ComparisonSink {
    pub fn new(path: impl Into<PathBuf>, raw: Network) -> Self {
        Self {
            path: path.into(),
            raw,
            summary: None,
        }
    }

    /// Summary of the last persisted comparison
    pub fn summary(&self) -> Option<&ComparisonSummary> {
        self.summary.as_ref()
    }
}

impl ResultSink for ComparisonSink {
    fn persist(&mut self, network: &Network) -> Result<(), SinkError> {
        let writer = create(&self.path)?;
        let summary = write_comparison(&self.raw, network, writer).map_err(|source| {
            SinkError::Table {
                path: self.path.clone(),
                source,
            }
        })?;
        tracing::info!(
            path = %self.path.display(),
            max_delta_s21_db = summary.max_delta_s21_db(),
            "wrote comparison"
        );
        self.summary = Some(summary);
        Ok(())
    }
}

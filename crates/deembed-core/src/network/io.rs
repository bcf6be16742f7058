//! Network I/O functions
//!
//! Provides methods for reading and writing a Network as Touchstone or as
//! a dB/degree CSV table.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use super::core::Network;
use crate::frequency::FrequencyUnit;
use crate::math::transforms::ReferenceImpedance;
use crate::table::{read_table, write_table, TableError};
use crate::touchstone::{SParamFormat, Touchstone, TouchstoneError};

impl From<Touchstone> for Network {
    fn from(ts: Touchstone) -> Self {
        Network {
            frequency: ts.frequency,
            s: ts.s,
            z0: ts.z0,
            name: None,
            comments: ts.comments,
        }
    }
}

impl Network {
    /// Read a two-port Touchstone file
    ///
    /// The network is named after the file stem.
    pub fn from_touchstone<P: AsRef<Path>>(path: P) -> Result<Self, TouchstoneError> {
        let path = path.as_ref();
        let ntwk = Network::from(Touchstone::from_file(path)?);
        Ok(match path.file_stem().and_then(|s| s.to_str()) {
            Some(stem) => ntwk.with_name(stem),
            None => ntwk,
        })
    }

    /// Parse Touchstone content
    pub fn from_touchstone_str(content: &str) -> Result<Self, TouchstoneError> {
        Ok(Network::from(Touchstone::parse_str(content)?))
    }

    /// Convert Network to Touchstone data in the given format
    pub fn to_touchstone(&self, format: SParamFormat) -> Touchstone {
        Touchstone {
            frequency: self.frequency.clone(),
            s: self.s.clone(),
            z0: self.z0,
            comments: self.comments.clone(),
            format,
        }
    }

    /// Write the network to a Touchstone file
    ///
    /// # Example
    /// ```no_run
    /// use deembed_core::touchstone::SParamFormat;
    /// use deembed_core::Network;
    ///
    /// let ntwk = Network::from_touchstone("input.s2p")?;
    /// ntwk.write_touchstone("output.s2p", SParamFormat::DB)?;
    /// # Ok::<(), deembed_core::touchstone::TouchstoneError>(())
    /// ```
    pub fn write_touchstone<P: AsRef<Path>>(
        &self,
        path: P,
        format: SParamFormat,
    ) -> Result<(), TouchstoneError> {
        self.to_touchstone(format).write(path)
    }

    /// Touchstone text with frequencies in Hz
    pub fn to_touchstone_contents(&self, format: SParamFormat) -> String {
        let mut ts = self.to_touchstone(format);
        ts.frequency = ts.frequency.with_unit(FrequencyUnit::Hz);
        ts.to_string()
    }

    /// Read a dB/degree CSV table
    pub fn from_table<P: AsRef<Path>>(path: P, z0: ReferenceImpedance) -> Result<Self, TableError> {
        read_table(path, z0)
    }

    /// Write a dB/degree CSV table
    pub fn write_table<P: AsRef<Path>>(&self, path: P) -> Result<(), TableError> {
        let file = File::create(path)?;
        write_table(self, BufWriter::new(file))
    }
}

//! Touchstone file writer
//!
//! Writes two-port S-parameter data to Touchstone v1 files.

use num_complex::Complex64;
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use super::parser::{SParamFormat, Touchstone, TouchstoneError};
use crate::math::conversions::{complex_2_db, complex_2_degree, complex_2_magnitude};

impl fmt::Display for Touchstone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buf = Vec::new();
        if self.write_to(&mut buf).is_err() {
            return Err(fmt::Error);
        }
        write!(f, "{}", String::from_utf8_lossy(&buf))
    }
}

impl Touchstone {
    /// Write to a Touchstone file
    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<(), TouchstoneError> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.write_to(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Write to a writer
    ///
    /// Fails when the ports have different reference impedances, which the
    /// single `R` value of the option line cannot carry.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), TouchstoneError> {
        let z0 = self.z0.ohms();
        if z0[0] != z0[1] {
            return Err(TouchstoneError::UnequalReferenceImpedance(z0));
        }

        for comment in &self.comments {
            writeln!(writer, "! {}", comment)?;
        }
        writeln!(
            writer,
            "# {} S {} R {}",
            self.frequency.unit().label(),
            match self.format {
                SParamFormat::RI => "RI",
                SParamFormat::MA => "MA",
                SParamFormat::DB => "DB",
            },
            z0[0]
        )?;

        let f_scaled = self.frequency.f_scaled();
        for (k, freq) in f_scaled.iter().enumerate() {
            write!(writer, "{}", freq)?;
            // Two-port order: 11, 21, 12, 22
            for (i, j) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
                let (a, b) = self.encode(self.s[[k, i, j]]);
                write!(writer, " {} {}", a, b)?;
            }
            writeln!(writer)?;
        }

        Ok(())
    }

    fn encode(&self, v: Complex64) -> (f64, f64) {
        match self.format {
            SParamFormat::RI => (v.re, v.im),
            SParamFormat::MA => (complex_2_magnitude(v), complex_2_degree(v)),
            SParamFormat::DB => (complex_2_db(v), complex_2_degree(v)),
        }
    }
}

//! CSV measurement writer

use std::io::Write;

use super::{param_columns, TableError, FREQ_COLUMN, PARAMS};
use crate::constants::DEFAULT_FREQUENCY_TOL;
use crate::math::conversions::reim_2_dbdeg;
use crate::network::Network;

/// Summary of a raw vs de-embedded comparison
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComparisonSummary {
    /// Number of compared frequency points
    pub points: usize,
    /// Largest finite |dB(deembedded) - dB(raw)| per parameter, in `PARAMS` order
    pub max_delta_db: [f64; 4],
}

impl ComparisonSummary {
    /// Largest |ΔS21| in dB
    pub fn max_delta_s21_db(&self) -> f64 {
        self.max_delta_db[1]
    }
}

/// Write a network as a dB/degree table
///
/// Zero-magnitude entries are written as `-inf` dB.
pub fn write_table<W: Write>(network: &Network, writer: W) -> Result<(), TableError> {
    let mut wtr = csv::Writer::from_writer(writer);

    let mut header = vec![FREQ_COLUMN.to_string()];
    for (param, _, _) in PARAMS {
        let (db, deg) = param_columns(param);
        header.push(db);
        header.push(deg);
    }
    wtr.write_record(&header)?;

    for (k, freq) in network.f().iter().enumerate() {
        let mut row = Vec::with_capacity(header.len());
        row.push(freq.to_string());
        for (_, i, j) in PARAMS {
            let (db, deg) = reim_2_dbdeg(network.s[[k, i, j]]);
            row.push(db.to_string());
            row.push(deg.to_string());
        }
        wtr.write_record(&row)?;
    }

    wtr.flush()?;
    Ok(())
}

/// Write raw and de-embedded data side by side
///
/// Each parameter gets `raw_`, `deembedded_` and `delta_` dB columns plus
/// the two phase columns. Both networks must share the frequency grid.
pub fn write_comparison<W: Write>(
    raw: &Network,
    deembedded: &Network,
    writer: W,
) -> Result<ComparisonSummary, TableError> {
    if let Some(index) = raw
        .frequency
        .first_mismatch(&deembedded.frequency, DEFAULT_FREQUENCY_TOL)
    {
        return Err(TableError::Misaligned {
            index,
            raw: raw.nfreq(),
            deembedded: deembedded.nfreq(),
        });
    }

    let mut wtr = csv::Writer::from_writer(writer);

    let mut header = vec![FREQ_COLUMN.to_string()];
    for (param, _, _) in PARAMS {
        let (db, deg) = param_columns(param);
        header.push(format!("raw_{}", db));
        header.push(format!("raw_{}", deg));
        header.push(format!("deembedded_{}", db));
        header.push(format!("deembedded_{}", deg));
        header.push(format!("delta_{}", db));
    }
    wtr.write_record(&header)?;

    let mut summary = ComparisonSummary {
        points: raw.nfreq(),
        max_delta_db: [0.0; 4],
    };

    for (k, freq) in raw.f().iter().enumerate() {
        let mut row = Vec::with_capacity(header.len());
        row.push(freq.to_string());
        for (n, (_, i, j)) in PARAMS.into_iter().enumerate() {
            let (raw_db, raw_deg) = reim_2_dbdeg(raw.s[[k, i, j]]);
            let (de_db, de_deg) = reim_2_dbdeg(deembedded.s[[k, i, j]]);
            let delta = de_db - raw_db;
            if delta.is_finite() {
                summary.max_delta_db[n] = summary.max_delta_db[n].max(delta.abs());
            }
            row.push(raw_db.to_string());
            row.push(raw_deg.to_string());
            row.push(de_db.to_string());
            row.push(de_deg.to_string());
            row.push(delta.to_string());
        }
        wtr.write_record(&row)?;
    }

    wtr.flush()?;
    Ok(summary)
}

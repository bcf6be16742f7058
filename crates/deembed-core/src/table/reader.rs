//! CSV measurement reader

use ndarray::Array3;
use num_complex::Complex64;
use std::path::Path;

use super::{param_columns, TableError, FREQ_COLUMN, PARAMS};
use crate::constants::NPORTS;
use crate::frequency::Frequency;
use crate::math::conversions::dbdeg_2_reim;
use crate::math::transforms::ReferenceImpedance;
use crate::network::Network;

/// Positional layout: frequency then four dB/degree pairs
const POSITIONAL_COLUMNS: usize = 9;

/// Where the table body starts inside the file
struct Layout {
    /// Byte offset of the first line handed to the CSV reader
    offset: usize,
    /// 1-based line number of that line
    first_line: u64,
    /// True when the first line is a header
    has_header: bool,
}

/// Read a measurement table from disk
///
/// The network is named after the file stem. Bytes that are not valid
/// UTF-8 (Latin-1 instrument preambles) are replaced before parsing.
pub fn read_table<P: AsRef<Path>>(path: P, z0: ReferenceImpedance) -> Result<Network, TableError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    let network = parse_table(&String::from_utf8_lossy(&bytes), z0)?;

    Ok(match path.file_stem().and_then(|s| s.to_str()) {
        Some(stem) => network.with_name(stem),
        None => network,
    })
}

/// Parse a measurement table from its text
///
/// # Example
/// ```
/// use deembed_core::math::transforms::ReferenceImpedance;
/// use deembed_core::table::parse_table;
///
/// let csv = "Freq(Hz),S11(dB),S11(deg),S21(dB),S21(deg),S12(dB),S12(deg),S22(dB),S22(deg)\n\
///            1e9,-20,45,-0.5,-10,-0.5,-10,-22,30\n";
/// let ntwk = parse_table(csv, ReferenceImpedance::default()).unwrap();
/// assert_eq!(ntwk.nfreq(), 1);
/// ```
pub fn parse_table(content: &str, z0: ReferenceImpedance) -> Result<Network, TableError> {
    let Some(layout) = locate_body(content) else {
        let frequency = Frequency::from_hz(Vec::new())?;
        let s = Array3::<Complex64>::zeros((0, NPORTS, NPORTS));
        return Ok(network(frequency, s, z0));
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(layout.has_header)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content[layout.offset..].as_bytes());

    let (columns, names) = if layout.has_header {
        named_columns(reader.headers()?)?
    } else {
        positional_columns()
    };
    let needed = columns.iter().max().map_or(0, |m| m + 1);

    let mut f = Vec::new();
    let mut rows: Vec<[f64; POSITIONAL_COLUMNS - 1]> = Vec::new();

    for result in reader.records() {
        let record = result?;
        let line = layout.first_line - 1 + record.position().map_or(1, |p| p.line());

        if record.iter().all(|field| field.is_empty()) {
            continue;
        }
        if record.len() < needed {
            return Err(TableError::ShortRow {
                line,
                expected: needed,
                found: record.len(),
            });
        }

        let mut values = [0.0; POSITIONAL_COLUMNS];
        for (slot, (&col, name)) in columns.iter().zip(&names).enumerate() {
            let field = &record[col];
            values[slot] = field.parse::<f64>().map_err(|_| TableError::InvalidNumber {
                line,
                column: name.clone(),
                value: field.to_string(),
            })?;
        }

        f.push(values[0]);
        let mut pairs = [0.0; POSITIONAL_COLUMNS - 1];
        pairs.copy_from_slice(&values[1..]);
        rows.push(pairs);
    }

    let frequency = Frequency::from_hz(f)?;
    let mut s = Array3::<Complex64>::zeros((rows.len(), NPORTS, NPORTS));
    for (k, row) in rows.iter().enumerate() {
        for (n, &(_, i, j)) in PARAMS.iter().enumerate() {
            s[[k, i, j]] = dbdeg_2_reim(row[2 * n], row[2 * n + 1]);
        }
    }

    Ok(network(frequency, s, z0))
}

fn network(frequency: Frequency, s: Array3<Complex64>, z0: ReferenceImpedance) -> Network {
    Network {
        frequency,
        s,
        z0,
        name: None,
        comments: Vec::new(),
    }
}

/// Find the header line, or the first numeric row when there is no header
fn locate_body(content: &str) -> Option<Layout> {
    let mut offset = 0;
    for (idx, line) in content.split_inclusive('\n').enumerate() {
        let trimmed = line.trim();
        let first_field = trimmed.split(',').next().unwrap_or("").trim();

        if first_field.eq_ignore_ascii_case(FREQ_COLUMN) {
            return Some(Layout {
                offset,
                first_line: idx as u64 + 1,
                has_header: true,
            });
        }
        if !first_field.is_empty() && first_field.parse::<f64>().is_ok() {
            return Some(Layout {
                offset,
                first_line: idx as u64 + 1,
                has_header: false,
            });
        }
        offset += line.len();
    }
    None
}

fn named_columns(headers: &csv::StringRecord) -> Result<(Vec<usize>, Vec<String>), TableError> {
    let mut names = vec![FREQ_COLUMN.to_string()];
    for (param, _, _) in PARAMS {
        let (db, deg) = param_columns(param);
        names.push(db);
        names.push(deg);
    }

    let mut columns = Vec::with_capacity(names.len());
    let mut missing = Vec::new();
    for name in &names {
        match headers.iter().position(|h| h.eq_ignore_ascii_case(name)) {
            Some(idx) => columns.push(idx),
            None => missing.push(name.clone()),
        }
    }

    if missing.is_empty() {
        Ok((columns, names))
    } else {
        Err(TableError::MissingColumns(missing))
    }
}

fn positional_columns() -> (Vec<usize>, Vec<String>) {
    let columns: Vec<usize> = (0..POSITIONAL_COLUMNS).collect();
    let names = columns.iter().map(|c| format!("#{}", c + 1)).collect();
    (columns, names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const HEADER: &str =
        "Freq(Hz),S11(dB),S11(deg),S21(dB),S21(deg),S12(dB),S12(deg),S22(dB),S22(deg)";

    #[test]
    fn test_named_columns_with_preamble() {
        let content = format!(
            "!Agilent Technologies,E5071C\n!Date: today\n\n{}\n\
             1000000000,-20,90,-6,0,-6,0,-40,-90\n\
             2000000000,-20,180,-6,45,-6,45,-40,0\n",
            HEADER
        );
        let ntwk = parse_table(&content, ReferenceImpedance::default()).unwrap();

        assert_eq!(ntwk.f(), &[1e9, 2e9]);
        assert_relative_eq!(ntwk.s[[0, 0, 0]].im, 0.1, epsilon = 1e-12);
        assert_relative_eq!(ntwk.s[[0, 1, 1]].im, -0.01, epsilon = 1e-12);
        assert_relative_eq!(ntwk.s[[1, 0, 0]].re, -0.1, epsilon = 1e-12);
        assert_relative_eq!(ntwk.s[[0, 1, 0]].re, 0.501_187_233_627_272_2, epsilon = 1e-12);
    }

    #[test]
    fn test_latin1_preamble_is_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("open_4.csv");
        let mut bytes = b"!Instrument: 50 \xB0C \xA9 vendor\n".to_vec();
        bytes.extend_from_slice(HEADER.as_bytes());
        bytes.extend_from_slice(b"\n1e9,-20,90,-6,0,-6,0,-40,-90\n");
        std::fs::write(&path, bytes).unwrap();

        let ntwk = read_table(&path, ReferenceImpedance::default()).unwrap();
        assert_eq!(ntwk.name.as_deref(), Some("open_4"));
        assert_eq!(ntwk.f(), &[1e9]);
        assert_relative_eq!(ntwk.s[[0, 0, 0]].im, 0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_columns_located_by_name_and_extras_ignored() {
        let content = "Freq(Hz),Extra,S21(dB),S21(deg),S11(dB),S11(deg),S12(dB),S12(deg),S22(dB),S22(deg),Note\n\
                       5e8,7,0,0,-20,0,-60,0,-20,180,x\n";
        let ntwk = parse_table(content, ReferenceImpedance::default()).unwrap();
        assert_relative_eq!(ntwk.s[[0, 1, 0]].re, 1.0, epsilon = 1e-12);
        assert_relative_eq!(ntwk.s[[0, 0, 0]].re, 0.1, epsilon = 1e-12);
        assert_relative_eq!(ntwk.s[[0, 0, 1]].re, 0.001, epsilon = 1e-12);
        assert_relative_eq!(ntwk.s[[0, 1, 1]].re, -0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_positional_without_header() {
        let content = "1e9,0,0,-20,0,-20,0,0,180,ignored\n2e9,0,0,-20,0,-20,0,0,180,ignored\n";
        let ntwk = parse_table(content, ReferenceImpedance::default()).unwrap();
        assert_eq!(ntwk.nfreq(), 2);
        assert_relative_eq!(ntwk.s[[1, 1, 1]].re, -1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_missing_columns() {
        let content = "Freq(Hz),S11(dB),S11(deg)\n1e9,0,0\n";
        let err = parse_table(content, ReferenceImpedance::default()).unwrap_err();
        match err {
            TableError::MissingColumns(missing) => {
                assert_eq!(missing.len(), 6);
                assert_eq!(missing[0], "S21(dB)");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_number_reports_line() {
        let content = format!("!preamble\n{}\n1e9,0,0,0,0,0,0,0,0\n2e9,0,0,bad,0,0,0,0,0\n", HEADER);
        let err = parse_table(&content, ReferenceImpedance::default()).unwrap_err();
        match err {
            TableError::InvalidNumber {
                line,
                column,
                value,
            } => {
                assert_eq!(line, 4);
                assert_eq!(column, "S21(dB)");
                assert_eq!(value, "bad");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_short_row() {
        let content = format!("{}\n1e9,0,0,0\n", HEADER);
        let err = parse_table(&content, ReferenceImpedance::default()).unwrap_err();
        assert!(matches!(err, TableError::ShortRow { line: 2, .. }));
    }

    #[test]
    fn test_non_increasing_frequency() {
        let content = format!("{}\n2e9,0,0,0,0,0,0,0,0\n1e9,0,0,0,0,0,0,0,0\n", HEADER);
        let err = parse_table(&content, ReferenceImpedance::default()).unwrap_err();
        assert!(matches!(err, TableError::Frequency(_)));
    }

    #[test]
    fn test_header_only_is_empty() {
        let ntwk = parse_table(&format!("{}\n", HEADER), ReferenceImpedance::default()).unwrap();
        assert_eq!(ntwk.nfreq(), 0);
        let ntwk = parse_table("", ReferenceImpedance::default()).unwrap();
        assert_eq!(ntwk.nfreq(), 0);
    }
}

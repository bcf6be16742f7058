//! Measurement sources
//!
//! A [`MeasurementSource`] hands the engine a complete [`Network`] per
//! structure identifier. File sources accept the CSV table layout and
//! two-port Touchstone files; directories of measurements are grouped into
//! sets by [`discover_sets`].

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::math::transforms::ReferenceImpedance;
use crate::network::Network;
use crate::table::{read_table, TableError};
use crate::touchstone::TouchstoneError;

/// Set name for files without a trailing number
pub const DEFAULT_SET: &str = "default";

/// Source errors
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Unknown structure '{0}'")]
    UnknownStructure(String),

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

    #[error("Cannot list {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Role of a measured structure within a set
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StructureRole {
    Dut,
    Open,
    Short,
    Thru,
    Long,
}

impl StructureRole {
    pub const ALL: [StructureRole; 5] = [
        StructureRole::Dut,
        StructureRole::Open,
        StructureRole::Short,
        StructureRole::Thru,
        StructureRole::Long,
    ];

    /// Lower-case keyword used in file names and column prefixes
    pub fn keyword(&self) -> &'static str {
        match self {
            StructureRole::Dut => "dut",
            StructureRole::Open => "open",
            StructureRole::Short => "short",
            StructureRole::Thru => "thru",
            StructureRole::Long => "long",
        }
    }

    /// Detect the role from a file stem (case-insensitive)
    ///
    /// The earliest keyword in the stem wins, so `open_short_cal` is an open.
    pub fn detect(stem: &str) -> Option<Self> {
        let lower = stem.to_lowercase();
        Self::ALL
            .into_iter()
            .filter_map(|role| lower.find(role.keyword()).map(|pos| (pos, role)))
            .min_by_key(|&(pos, _)| pos)
            .map(|(_, role)| role)
    }

    /// True for the roles consumed by open/short de-embedding
    pub fn is_open_short(&self) -> bool {
        matches!(
            self,
            StructureRole::Dut | StructureRole::Open | StructureRole::Short
        )
    }
}

impl fmt::Display for StructureRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Supplies structures by identifier
pub trait MeasurementSource {
    /// Load the structure named `id`
    ///
    /// The returned network carries complex S-parameters; any dB/degree or
    /// magnitude/angle encoding has already been decoded.
    fn load_structure(&self, id: &str) -> Result<Network, SourceError>;
}

/// In-memory source keyed by identifier
impl MeasurementSource for BTreeMap<String, Network> {
    fn load_structure(&self, id: &str) -> Result<Network, SourceError> {
        self.get(id)
            .cloned()
            .ok_or_else(|| SourceError::UnknownStructure(id.to_string()))
    }
}

/// File-backed source mapping identifiers to paths
#[derive(Debug, Clone, Default)]
pub struct FileSource {
    /// Reference impedance for CSV tables, which do not carry one
    pub z0: ReferenceImpedance,
    pub paths: BTreeMap<String, PathBuf>,
}

impl FileSource {
    pub fn new(z0: ReferenceImpedance) -> Self {
        Self {
            z0,
            paths: BTreeMap::new(),
        }
    }

    pub fn with(mut self, id: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.paths.insert(id.into(), path.into());
        self
    }
}

impl MeasurementSource for FileSource {
    fn load_structure(&self, id: &str) -> Result<Network, SourceError> {
        let path = self
            .paths
            .get(id)
            .ok_or_else(|| SourceError::UnknownStructure(id.to_string()))?;
        load_file(path, self.z0)
    }
}

/// Load one measurement file
///
/// `.s2p` files are read as Touchstone and keep their own reference
/// impedance; everything else is read as a CSV table with `z0`.
pub fn load_file<P: AsRef<Path>>(path: P, z0: ReferenceImpedance) -> Result<Network, SourceError> {
    let path = path.as_ref();
    let is_touchstone = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("s2p"));

    let network = if is_touchstone {
        Network::from_touchstone(path).map_err(|source| SourceError::Touchstone {
            path: path.to_path_buf(),
            source,
        })?
    } else {
        read_table(path, z0).map_err(|source| SourceError::Table {
            path: path.to_path_buf(),
            source,
        })?
    };

    tracing::debug!(path = %path.display(), points = network.nfreq(), "loaded structure");
    Ok(network)
}

/// Files of one measurement set, by role
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementSet {
    pub id: String,
    pub files: BTreeMap<StructureRole, PathBuf>,
}

impl MeasurementSet {
    /// True when open, short and DUT are all present
    pub fn is_complete(&self) -> bool {
        [StructureRole::Dut, StructureRole::Open, StructureRole::Short]
            .iter()
            .all(|role| self.files.contains_key(role))
    }

    /// Roles required for de-embedding that are absent
    pub fn missing(&self) -> Vec<StructureRole> {
        StructureRole::ALL
            .into_iter()
            .filter(|r| r.is_open_short() && !self.files.contains_key(r))
            .collect()
    }

    /// File source over this set, keyed by role keyword
    pub fn source(&self, z0: ReferenceImpedance) -> FileSource {
        self.files
            .iter()
            .fold(FileSource::new(z0), |src, (role, path)| {
                src.with(role.keyword(), path.clone())
            })
    }
}

/// Set identifier: trailing digits of the stem, or [`DEFAULT_SET`]
fn set_id(stem: &str) -> String {
    let digits = stem.len() - stem.trim_end_matches(|c: char| c.is_ascii_digit()).len();
    if digits == 0 {
        DEFAULT_SET.to_string()
    } else {
        stem[stem.len() - digits..].to_string()
    }
}

fn is_measurement(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv") || e.eq_ignore_ascii_case("s2p"))
}

/// Group the measurement files of a directory into sets
///
/// Files are classified by role keyword and grouped by the number at the
/// end of the stem (`short_3.csv` belongs to set `3`). Files with no role
/// keyword are skipped. When a set has two files for the same role the
/// first in name order is kept.
pub fn discover_sets<P: AsRef<Path>>(dir: P) -> Result<Vec<MeasurementSet>, SourceError> {
    let dir = dir.as_ref();
    let io_err = |source: std::io::Error| SourceError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if path.is_file() && is_measurement(&path) {
            paths.push(path);
        }
    }
    paths.sort();

    let mut sets: BTreeMap<String, BTreeMap<StructureRole, PathBuf>> = BTreeMap::new();
    for path in paths {
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let Some(role) = StructureRole::detect(stem) else {
            tracing::debug!(path = %path.display(), "no structure keyword, skipping");
            continue;
        };

        let files = sets.entry(set_id(stem)).or_default();
        if let Some(kept) = files.get(&role) {
            tracing::warn!(
                role = %role,
                kept = %kept.display(),
                ignored = %path.display(),
                "duplicate structure in set"
            );
            continue;
        }
        files.insert(role, path);
    }

    Ok(sets
        .into_iter()
        .map(|(id, files)| MeasurementSet { id, files })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_role_detection() {
        assert_eq!(StructureRole::detect("Open_1"), Some(StructureRole::Open));
        assert_eq!(StructureRole::detect("meas_SHORT"), Some(StructureRole::Short));
        assert_eq!(StructureRole::detect("dut-7"), Some(StructureRole::Dut));
        assert_eq!(StructureRole::detect("long_12"), Some(StructureRole::Long));
        assert_eq!(StructureRole::detect("open_short_cal"), Some(StructureRole::Open));
        assert_eq!(StructureRole::detect("calibration"), None);
        assert_eq!(StructureRole::Thru.to_string(), "thru");
    }

    #[test]
    fn test_set_id() {
        assert_eq!(set_id("short_3"), "3");
        assert_eq!(set_id("open12"), "12");
        assert_eq!(set_id("dut"), DEFAULT_SET);
    }

    #[test]
    fn test_discover_sets() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "open_1.csv",
            "short_1.csv",
            "dut_1.csv",
            "open_2.csv",
            "dut_2.s2p",
            "thru_2.csv",
            "notes.txt",
            "misc_3.csv",
        ] {
            fs::write(dir.path().join(name), "").unwrap();
        }

        let sets = discover_sets(dir.path()).unwrap();
        assert_eq!(sets.len(), 2);

        assert_eq!(sets[0].id, "1");
        assert!(sets[0].is_complete());

        assert_eq!(sets[1].id, "2");
        assert!(!sets[1].is_complete());
        assert_eq!(sets[1].missing(), vec![StructureRole::Short]);
        assert!(sets[1].files.contains_key(&StructureRole::Thru));
    }

    #[test]
    fn test_in_memory_source() {
        let src: BTreeMap<String, Network> = BTreeMap::new();
        assert!(matches!(
            src.load_structure("open"),
            Err(SourceError::UnknownStructure(_))
        ));
    }

    #[test]
    fn test_file_source_reports_path() {
        let src = FileSource::default().with("dut", "/nonexistent/dut.csv");
        let err = src.load_structure("dut").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/dut.csv"));
    }
}

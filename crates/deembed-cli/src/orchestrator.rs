//! Wires measurement sources, the de-embedding engine and result sinks.

use anyhow::{Context, Result};
use deembed_core::calibration::{DeembedConfig, OpenShort};
use deembed_core::sink::{ComparisonSink, ResultSink, TableSink, TouchstoneSink};
use deembed_core::source::{
    discover_sets, load_file, FileSource, MeasurementSet, MeasurementSource, StructureRole,
};
use deembed_core::table::{write_merged, MergeGroup};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

/// Files of a single de-embedding run.
#[derive(Clone, Debug)]
pub struct RunRequest {
    pub dut: PathBuf,
    pub short: PathBuf,
    pub open: PathBuf,
    pub output: PathBuf,
    pub compare: Option<PathBuf>,
    /// Write Touchstone even when the output extension is not `.s2p`
    pub touchstone: bool,
}

/// Result of one de-embedding run.
#[derive(Clone, Debug, Serialize)]
pub struct RunReport {
    pub id: String,
    pub points: usize,
    pub warnings: usize,
    pub sentinels: Vec<usize>,
    pub max_delta_s21_db: Option<f64>,
    pub output: PathBuf,
}

/// Outcome of one set in a batch.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SetOutcome {
    Completed(RunReport),
    Failed { id: String, error: String },
    Skipped { id: String, missing: Vec<String> },
}

/// Result of a batch run.
#[derive(Clone, Debug, Default, Serialize)]
pub struct BatchReport {
    pub sets: Vec<SetOutcome>,
}

impl BatchReport {
    pub fn failures(&self) -> usize {
        self.sets
            .iter()
            .filter(|s| matches!(s, SetOutcome::Failed { .. }))
            .count()
    }
}

fn wants_touchstone(path: &Path, forced: bool) -> bool {
    forced
        || path
            .extension()
            .is_some_and(|e| e.eq_ignore_ascii_case("s2p"))
}

/// Runs de-embedding jobs with one configuration.
pub struct Orchestrator {
    config: DeembedConfig,
}

impl Orchestrator {
    /// Create an orchestrator after validating the configuration.
    pub fn new(config: DeembedConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// De-embed one DUT with its open and short structures.
    pub fn run(&self, request: &RunRequest) -> Result<RunReport> {
        let source = FileSource::new(self.config.reference_impedance()?)
            .with("dut", &request.dut)
            .with("short", &request.short)
            .with("open", &request.open);
        let load = |id: &str| {
            tracing::info!("Loading {} from {:?}", id, source.paths.get(id));
            source.load_structure(id).context("Failed to load measurement")
        };

        let dut = load("dut")?;
        let cal = OpenShort::new(load("open")?, load("short")?, self.config.clone())?;
        let outcome = cal
            .apply(&dut)
            .with_context(|| format!("De-embedding {:?} failed", request.dut))?;

        if wants_touchstone(&request.output, request.touchstone) {
            TouchstoneSink::new(&request.output).persist(&outcome.network)?;
        } else {
            TableSink::new(&request.output).persist(&outcome.network)?;
        }

        let max_delta_s21_db = match &request.compare {
            Some(path) => {
                let mut sink = ComparisonSink::new(path, dut.clone());
                sink.persist(&outcome.network)?;
                sink.summary().map(|s| s.max_delta_s21_db())
            }
            None => None,
        };

        Ok(RunReport {
            id: dut.name_or("dut").to_string(),
            points: outcome.network.nfreq(),
            warnings: outcome.warnings.len(),
            sentinels: outcome.sentinel_indices(),
            max_delta_s21_db,
            output: request.output.clone(),
        })
    }

    fn run_set(&self, set: &MeasurementSet, output_dir: &Path) -> Result<RunReport> {
        let path_of = |role: StructureRole| -> Result<PathBuf> {
            set.files
                .get(&role)
                .cloned()
                .with_context(|| format!("Set {} has no {} structure", set.id, role))
        };

        let request = RunRequest {
            dut: path_of(StructureRole::Dut)?,
            short: path_of(StructureRole::Short)?,
            open: path_of(StructureRole::Open)?,
            output: output_dir.join(format!("deembedded_{}.csv", set.id)),
            compare: Some(output_dir.join(format!("compare_{}.csv", set.id))),
            touchstone: false,
        };
        let mut report = self.run(&request)?;
        report.id = set.id.clone();
        Ok(report)
    }

    /// De-embed every complete set in `input_dir`.
    ///
    /// A failing set is recorded and does not stop the others.
    pub fn run_batch(&self, input_dir: &Path, output_dir: &Path) -> Result<BatchReport> {
        let sets = discover_sets(input_dir)
            .with_context(|| format!("Failed to scan {:?}", input_dir))?;
        std::fs::create_dir_all(output_dir)
            .with_context(|| format!("Failed to create {:?}", output_dir))?;

        let mut report = BatchReport::default();
        for set in &sets {
            if !set.is_complete() {
                let missing: Vec<String> = set.missing().iter().map(|r| r.to_string()).collect();
                tracing::warn!(set = %set.id, ?missing, "Skipping incomplete set");
                report.sets.push(SetOutcome::Skipped {
                    id: set.id.clone(),
                    missing,
                });
                continue;
            }

            match self.run_set(set, output_dir) {
                Ok(run) => {
                    tracing::info!(set = %set.id, points = run.points, "Set complete");
                    report.sets.push(SetOutcome::Completed(run));
                }
                Err(e) => {
                    tracing::error!(set = %set.id, "Set failed: {:#}", e);
                    report.sets.push(SetOutcome::Failed {
                        id: set.id.clone(),
                        error: format!("{:#}", e),
                    });
                }
            }
        }

        Ok(report)
    }

    /// Write the merged table of every set in `input_dir`; returns the row count.
    pub fn merge(&self, input_dir: &Path, output: &Path) -> Result<usize> {
        let z0 = self.config.reference_impedance()?;
        let sets = discover_sets(input_dir)
            .with_context(|| format!("Failed to scan {:?}", input_dir))?;

        let mut groups = Vec::with_capacity(sets.len());
        for set in &sets {
            let mut group = MergeGroup::new(&set.id);
            for (role, path) in &set.files {
                let network =
                    load_file(path, z0).with_context(|| format!("Failed to load {:?}", path))?;
                group = group.with(*role, network);
            }
            groups.push(group);
        }

        let file =
            File::create(output).with_context(|| format!("Failed to create {:?}", output))?;
        let rows = write_merged(&groups, BufWriter::new(file))?;
        tracing::info!("Wrote {} merged rows to {:?}", rows, output);
        Ok(rows)
    }
}

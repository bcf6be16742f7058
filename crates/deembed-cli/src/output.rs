//! Run summary formatting.

use crate::orchestrator::{BatchReport, RunReport, SetOutcome};
use crate::OutputFormat;
use anyhow::Result;
use std::io::Write;

fn sentinel_list(sentinels: &[usize]) -> String {
    if sentinels.is_empty() {
        "none".to_string()
    } else {
        sentinels
            .iter()
            .map(|i| i.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn write_run_text<W: Write>(w: &mut W, report: &RunReport) -> Result<()> {
    writeln!(w, "De-embedded {}", report.id)?;
    writeln!(w, "  Points:      {}", report.points)?;
    writeln!(w, "  Warnings:    {}", report.warnings)?;
    writeln!(w, "  Sentinels:   {}", sentinel_list(&report.sentinels))?;
    if let Some(delta) = report.max_delta_s21_db {
        writeln!(w, "  Max |dS21|:  {:.4} dB", delta)?;
    }
    writeln!(w, "  Output:      {}", report.output.display())?;
    Ok(())
}

/// Write the summary of a single run.
pub fn write_run<W: Write>(w: &mut W, report: &RunReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => write_run_text(w, report)?,
        OutputFormat::Json => writeln!(w, "{}", serde_json::to_string_pretty(report)?)?,
    }
    Ok(())
}

/// Write the summary of a batch.
pub fn write_batch<W: Write>(w: &mut W, report: &BatchReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            for outcome in &report.sets {
                match outcome {
                    SetOutcome::Completed(run) => write_run_text(w, run)?,
                    SetOutcome::Failed { id, error } => writeln!(w, "Set {} failed: {}", id, error)?,
                    SetOutcome::Skipped { id, missing } => {
                        writeln!(w, "Set {} skipped: missing {}", id, missing.join(", "))?
                    }
                }
            }
            let completed = report
                .sets
                .iter()
                .filter(|s| matches!(s, SetOutcome::Completed(_)))
                .count();
            writeln!(
                w,
                "{} sets: {} completed, {} failed",
                report.sets.len(),
                completed,
                report.failures()
            )?;
        }
        OutputFormat::Json => writeln!(w, "{}", serde_json::to_string_pretty(report)?)?,
    }
    Ok(())
}

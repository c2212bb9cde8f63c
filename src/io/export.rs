//! CSV export for simulation step results.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::sim::types::StepResult;

/// Column header for CSV telemetry export.
const HEADER: &str = "timestep,time,subgroups,transfers,delivered_kwh,unmet_demand_kwh,\
                       converter_shortfall_kwh,stored_kwh,step_satisfaction_pct,\
                       running_equilibrium_pct,demand_met";

/// Exports simulation results to a CSV file at the given path.
///
/// Writes a header row followed by one data row per step. Produces
/// deterministic output for identical inputs.
///
/// # Arguments
///
/// * `results` - Complete simulation step results
/// * `path` - Output file path
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_csv(results: &[StepResult], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    write_csv(results, io::BufWriter::new(file))
}

fn optional(value: Option<f32>) -> String {
    value.map(|v| format!("{v:.4}")).unwrap_or_default()
}

/// Writes simulation results as CSV to any writer.
///
/// Percentages that were not sampled are written as empty fields.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_csv(results: &[StepResult], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(HEADER.split(',').map(str::trim))?;

    for r in results {
        wtr.write_record(&[
            r.timestep.to_string(),
            r.time.to_string(),
            r.subgroups.to_string(),
            r.transfers.to_string(),
            format!("{:.4}", r.delivered_kwh),
            format!("{:.4}", r.unmet_demand_kwh),
            format!("{:.4}", r.converter_shortfall_kwh),
            format!("{:.4}", r.stored_kwh),
            optional(r.step_satisfaction),
            optional(r.running_equilibrium),
            r.demand_met().to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

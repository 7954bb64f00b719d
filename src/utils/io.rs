use crate::error::Result;
use crate::experiments::ExperimentReport;
use crate::extraction::Extraction;
use log::{error, info};
use serde::Serialize;
use std::fs;
use std::path::Path;

pub fn export_timeline_to_json(extraction: &Extraction, output_path: &Path) -> Result<()> {
    info!(
        "Exporting timeline with {} intervals and {} rejected rows to JSON: {:?}",
        extraction.timeline.interval_count(),
        extraction.rejected.len(),
        output_path
    );
    write_json(extraction, output_path)
}

pub fn export_experiments_to_json(report: &ExperimentReport, output_path: &Path) -> Result<()> {
    info!(
        "Exporting {} experiments as of {} to JSON: {:?}",
        report.experiments.len(),
        report.as_of,
        output_path
    );
    write_json(report, output_path)
}

fn write_json<T: Serialize>(value: &T, output_path: &Path) -> Result<()> {
    let json = match serde_json::to_string_pretty(value) {
        Ok(json) => json,
        Err(e) => {
            error!("Failed to serialize to JSON: {}", e);
            return Err(e.into());
        }
    };

    match fs::write(output_path, &json) {
        Ok(_) => {
            info!(
                "Successfully wrote {} bytes to {:?}",
                json.len(),
                output_path
            );
            Ok(())
        }
        Err(e) => {
            error!("Failed to write JSON to file {:?}: {}", output_path, e);
            Err(e.into())
        }
    }
}

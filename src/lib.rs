pub mod config;
pub mod error;
pub mod experiments;
pub mod extraction;
pub mod parsers;
pub mod sheet;
pub mod timeline;
pub mod utils;

pub use config::ExtractorConfig;
pub use error::{Result, TimelineError};
pub use experiments::{Experiment, ExperimentFilter, ExperimentReport, ExperimentSummary};
pub use extraction::{Extraction, RowError, extract_timeline};
pub use timeline::{Bucket, Interval, Timeline};

use chrono::NaiveDate;
use log::{debug, info};
use sheet::{EXPERIMENTS_TABLE, Sheet, WEEKLY_TABLE, Workbook};
use std::path::Path;

/// Load the weekly grid from a CSV file, or from `Weekly.csv` when `input`
/// is a workbook directory.
pub fn load_weekly_sheet(input: &Path) -> Result<Sheet> {
    if input.is_dir() {
        let workbook = Workbook::open(input)?;
        debug!("Workbook has {} tables", workbook.table_count());
        workbook.table(WEEKLY_TABLE)
    } else {
        Sheet::from_path(input)
    }
}

pub fn process_weekly_sheet(input: &Path, config: &ExtractorConfig) -> Result<Extraction> {
    info!(
        "Processing weekly sheet at: {:?} with {} threads",
        input, config.num_threads
    );
    let sheet = load_weekly_sheet(input)?;
    extract_timeline(&sheet, config)
}

pub fn analyze_weekly_sheet(
    input: &Path,
    output_path: &Path,
    config: &ExtractorConfig,
) -> Result<Extraction> {
    info!("Starting weekly sheet analysis");
    debug!("Input path: {:?}, Output path: {:?}", input, output_path);

    let extraction = process_weekly_sheet(input, config)?;

    info!("Exporting timeline to JSON at {:?}", output_path);
    utils::io::export_timeline_to_json(&extraction, output_path)?;

    info!(
        "Analysis complete: {} intervals across {} lanes",
        extraction.timeline.interval_count(),
        extraction.timeline.lane_count()
    );

    Ok(extraction)
}

/// Load and coerce the Experiments table of a workbook directory.
pub fn load_experiments_table(dir: &Path, config: &ExtractorConfig) -> Result<Vec<Experiment>> {
    let workbook = Workbook::open(dir)?;
    let sheet = workbook.table(EXPERIMENTS_TABLE)?;
    experiments::load_experiments(&sheet, &config.date_formats)
}

pub fn process_experiments(
    dir: &Path,
    config: &ExtractorConfig,
    today: NaiveDate,
) -> Result<ExperimentReport> {
    info!("Processing experiments in {:?} as of {}", dir, today);
    let filter = ExperimentFilter::from_selections(&config.experiment_filters)?;
    let experiments = load_experiments_table(dir, config)?;
    Ok(ExperimentReport::new(&experiments, &filter, today))
}

pub fn analyze_experiments(
    dir: &Path,
    output_path: &Path,
    config: &ExtractorConfig,
    today: NaiveDate,
) -> Result<ExperimentReport> {
    let report = process_experiments(dir, config, today)?;
    utils::io::export_experiments_to_json(&report, output_path)?;
    info!(
        "Experiments analysis complete: {} experiments, {} running",
        report.summary.total,
        report.summary.stage_count(experiments::RUNNING)
    );
    Ok(report)
}

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

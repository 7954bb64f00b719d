//! The "Experiments" table: one row per experiment with its dates and stage.
//!
//! Rows are coerced into [`Experiment`] records. Start and end dates go
//! through the same format list as bucket headers, and a bad date is an
//! error naming the line and column.

pub mod filter;
pub mod summary;

pub use filter::ExperimentFilter;
pub use summary::{ExperimentSummary, ValueCount, YearMonthCount};

use crate::error::Result;
use crate::parsers::coerce_date;
use crate::sheet::Sheet;
use chrono::{Datelike, NaiveDate};
use log::{debug, info};
use serde::{Deserialize, Serialize};

pub const INITIATIVE_COLUMN: &str = "INITIATIVE";
pub const CITY_COLUMN: &str = "CITY";
pub const METRIC_COLUMN: &str = "PRIMARY METRIC";
pub const SUB_DOMAIN_COLUMN: &str = "SUB DOMAIN";
pub const STAGE_COLUMN: &str = "STAGE";
pub const START_DATE_COLUMN: &str = "START DATE";
pub const END_DATE_COLUMN: &str = "END DATE";

pub const RUNNING: &str = "Running";
pub const COMPLETED: &str = "Completed";
pub const PAUSED: &str = "Paused";

/// Display order of experiment stages. Unlisted stages sort after these.
pub const STAGE_ORDER: [&str; 3] = [RUNNING, COMPLETED, PAUSED];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Experiment {
    pub source_line: u64,
    pub initiative: String,
    pub city: String,
    pub primary_metric: String,
    pub sub_domain: String,
    pub stage: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl Experiment {
    pub fn year(&self) -> i32 {
        self.start_date.year()
    }

    pub fn month(&self) -> u32 {
        self.start_date.month()
    }

    /// Days between start and end date.
    pub fn duration_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days()
    }

    /// Days left until the end date, only for running experiments. Negative
    /// once the end date has passed.
    pub fn days_remaining(&self, today: NaiveDate) -> Option<i64> {
        if self.stage == RUNNING {
            Some((self.end_date - today).num_days())
        } else {
            None
        }
    }

    pub fn is_running(&self) -> bool {
        self.stage == RUNNING
    }
}

fn stage_rank(stage: &str) -> usize {
    STAGE_ORDER
        .iter()
        .position(|known| *known == stage)
        .unwrap_or(STAGE_ORDER.len())
}

/// Stable sort into Running, Completed, Paused, then anything else.
pub fn sort_by_stage(experiments: &mut [Experiment]) {
    experiments.sort_by_key(|experiment| stage_rank(&experiment.stage));
}

/// Coerce every row of the Experiments table, ordered by stage.
pub fn load_experiments(sheet: &Sheet, date_formats: &[String]) -> Result<Vec<Experiment>> {
    let initiative = sheet.column_index(INITIATIVE_COLUMN)?;
    let city = sheet.column_index(CITY_COLUMN)?;
    let metric = sheet.column_index(METRIC_COLUMN)?;
    let sub_domain = sheet.column_index(SUB_DOMAIN_COLUMN)?;
    let stage = sheet.column_index(STAGE_COLUMN)?;
    let start = sheet.column_index(START_DATE_COLUMN)?;
    let end = sheet.column_index(END_DATE_COLUMN)?;

    let mut experiments = Vec::with_capacity(sheet.row_count());
    for row in sheet.rows() {
        let date_at = |column: usize, name: &str| {
            coerce_date(
                row.cell(column),
                date_formats,
                &format!("'{}' at line {}", name, row.line),
            )
        };

        experiments.push(Experiment {
            source_line: row.line,
            initiative: row.cell(initiative).trim().to_string(),
            city: row.cell(city).trim().to_string(),
            primary_metric: row.cell(metric).trim().to_string(),
            sub_domain: row.cell(sub_domain).trim().to_string(),
            stage: row.cell(stage).trim().to_string(),
            start_date: date_at(start, START_DATE_COLUMN)?,
            end_date: date_at(end, END_DATE_COLUMN)?,
        });
    }

    sort_by_stage(&mut experiments);
    debug!(
        "{} of {} experiments are running",
        experiments.iter().filter(|e| e.is_running()).count(),
        experiments.len()
    );
    info!(
        "Loaded {} experiments from '{}'",
        experiments.len(),
        sheet.name()
    );
    Ok(experiments)
}

/// An experiment with the fields the dashboard derives from its dates.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ExperimentEntry {
    #[serde(flatten)]
    pub experiment: Experiment,
    pub year: i32,
    pub month: u32,
    pub duration_days: i64,
    pub days_remaining: Option<i64>,
}

impl ExperimentEntry {
    pub fn new(experiment: &Experiment, today: NaiveDate) -> Self {
        ExperimentEntry {
            year: experiment.year(),
            month: experiment.month(),
            duration_days: experiment.duration_days(),
            days_remaining: experiment.days_remaining(today),
            experiment: experiment.clone(),
        }
    }
}

/// Filtered experiments in stage order, with their summary, as of `as_of`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ExperimentReport {
    pub as_of: NaiveDate,
    pub experiments: Vec<ExperimentEntry>,
    pub summary: ExperimentSummary,
}

impl ExperimentReport {
    pub fn new(experiments: &[Experiment], filter: &ExperimentFilter, today: NaiveDate) -> Self {
        let kept = filter.apply(experiments);
        debug!(
            "Experiment filter kept {} of {} rows",
            kept.len(),
            experiments.len()
        );
        ExperimentReport {
            as_of: today,
            summary: ExperimentSummary::from_experiments(&kept, today),
            experiments: kept
                .into_iter()
                .map(|experiment| ExperimentEntry::new(experiment, today))
                .collect(),
        }
    }
}

use crate::error::{Result, TimelineError};
use crate::experiments::ExperimentFilter;
use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Layout and parsing options for a weekly status grid.
///
/// The defaults describe the production "Weekly" sheet: three identity
/// columns (initiative, city, platform), bucket headers carrying `WEEK`,
/// and an initiative column that is only filled on the first row of each
/// merged block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Number of leading columns joined into the entity key.
    pub identity_columns: usize,
    /// Regular expression a header must match to be treated as a bucket.
    pub bucket_marker: String,
    /// Column whose blanks are filled from the row above, if any.
    pub fill_forward_column: Option<String>,
    pub key_delimiter: String,
    /// `chrono` format strings, tried in order.
    pub date_formats: Vec<String>,
    /// Months subtracted from the earliest start to get the window start.
    pub lookback_months: u32,
    pub num_threads: usize,
    /// Column name to selected value. A value of `All` disables the filter.
    pub filters: BTreeMap<String, String>,
    /// Filters for the experiments table, keyed by column name or `YEAR`.
    pub experiment_filters: BTreeMap<String, String>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        ExtractorConfig {
            identity_columns: 3,
            bucket_marker: "WEEK".to_string(),
            fill_forward_column: Some("INITIATIVE".to_string()),
            key_delimiter: "-".to_string(),
            date_formats: default_date_formats(),
            lookback_months: 3,
            num_threads: num_cpus::get(),
            filters: BTreeMap::new(),
            experiment_filters: BTreeMap::new(),
        }
    }
}

fn default_date_formats() -> Vec<String> {
    ["%Y-%m-%d", "%d %b %Y", "%d-%b-%Y", "%b %d %Y", "%b %d, %Y"]
        .iter()
        .map(|f| f.to_string())
        .collect()
}

impl ExtractorConfig {
    pub fn from_path(path: &Path) -> Result<Self> {
        debug!("Loading extractor config from {:?}", path);
        let raw = fs::read_to_string(path)?;
        let config: ExtractorConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_num_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = num_threads;
        self
    }

    pub fn with_filter(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(column.into(), value.into());
        self
    }

    pub fn with_experiment_filter(
        mut self,
        column: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.experiment_filters.insert(column.into(), value.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.date_formats.is_empty() {
            return Err(TimelineError::Config(
                "at least one date format is required".to_string(),
            ));
        }
        if self.num_threads == 0 {
            return Err(TimelineError::Config(
                "num_threads must be greater than zero".to_string(),
            ));
        }
        if self.bucket_marker.is_empty() {
            return Err(TimelineError::Config(
                "bucket_marker must not be empty".to_string(),
            ));
        }
        self.marker()?;
        ExperimentFilter::from_selections(&self.experiment_filters)?;
        Ok(())
    }

    pub fn marker(&self) -> Result<Regex> {
        Regex::new(&self.bucket_marker).map_err(|e| {
            TimelineError::Config(format!(
                "invalid bucket_marker '{}': {}",
                self.bucket_marker, e
            ))
        })
    }
}

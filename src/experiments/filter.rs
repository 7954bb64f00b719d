use crate::error::{Result, TimelineError};
use crate::experiments::{
    CITY_COLUMN, Experiment, INITIATIVE_COLUMN, METRIC_COLUMN, STAGE_COLUMN, SUB_DOMAIN_COLUMN,
};
use crate::sheet::ALL;
use chrono::NaiveDate;
use std::collections::BTreeMap;

pub const YEAR_KEY: &str = "YEAR";

/// Attribute filters of the experiments table. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExperimentFilter {
    pub city: Option<String>,
    pub primary_metric: Option<String>,
    pub initiative: Option<String>,
    pub stage: Option<String>,
    pub sub_domain: Option<String>,
    pub year: Option<i32>,
    /// Inclusive bounds on the start date.
    pub start_from: Option<NaiveDate>,
    pub start_to: Option<NaiveDate>,
}

fn selection(value: impl Into<String>) -> Option<String> {
    let value = value.into();
    (value != ALL).then_some(value)
}

impl ExperimentFilter {
    pub fn new() -> Self {
        ExperimentFilter::default()
    }

    /// Builds a filter from column name to value pairs, as found in config.
    /// `YEAR` takes a number; [`ALL`] leaves a field unset.
    pub fn from_selections(selections: &BTreeMap<String, String>) -> Result<Self> {
        let mut filter = ExperimentFilter::new();
        for (key, value) in selections {
            match key.as_str() {
                CITY_COLUMN => filter.city = selection(value.as_str()),
                METRIC_COLUMN => filter.primary_metric = selection(value.as_str()),
                INITIATIVE_COLUMN => filter.initiative = selection(value.as_str()),
                STAGE_COLUMN => filter.stage = selection(value.as_str()),
                SUB_DOMAIN_COLUMN => filter.sub_domain = selection(value.as_str()),
                YEAR_KEY if value == ALL => filter.year = None,
                YEAR_KEY => {
                    let year = value.trim().parse::<i32>().map_err(|_| {
                        TimelineError::Config(format!("invalid experiment year '{}'", value))
                    })?;
                    filter.year = Some(year);
                }
                other => {
                    return Err(TimelineError::Config(format!(
                        "unknown experiment filter '{}'",
                        other
                    )));
                }
            }
        }
        Ok(filter)
    }

    pub fn city(mut self, value: impl Into<String>) -> Self {
        self.city = selection(value);
        self
    }

    pub fn primary_metric(mut self, value: impl Into<String>) -> Self {
        self.primary_metric = selection(value);
        self
    }

    pub fn initiative(mut self, value: impl Into<String>) -> Self {
        self.initiative = selection(value);
        self
    }

    pub fn stage(mut self, value: impl Into<String>) -> Self {
        self.stage = selection(value);
        self
    }

    pub fn sub_domain(mut self, value: impl Into<String>) -> Self {
        self.sub_domain = selection(value);
        self
    }

    pub fn year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn start_between(mut self, from: NaiveDate, to: NaiveDate) -> Self {
        self.start_from = Some(from);
        self.start_to = Some(to);
        self
    }

    pub fn matches(&self, experiment: &Experiment) -> bool {
        fn field(wanted: &Option<String>, actual: &str) -> bool {
            wanted.as_deref().is_none_or(|wanted| wanted == actual)
        }

        field(&self.city, &experiment.city)
            && field(&self.primary_metric, &experiment.primary_metric)
            && field(&self.initiative, &experiment.initiative)
            && field(&self.stage, &experiment.stage)
            && field(&self.sub_domain, &experiment.sub_domain)
            && self.year.is_none_or(|year| experiment.year() == year)
            && self.start_from.is_none_or(|from| experiment.start_date >= from)
            && self.start_to.is_none_or(|to| experiment.start_date <= to)
    }

    pub fn apply<'a>(&self, experiments: &'a [Experiment]) -> Vec<&'a Experiment> {
        experiments.iter().filter(|e| self.matches(e)).collect()
    }
}

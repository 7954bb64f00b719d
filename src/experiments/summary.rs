use crate::experiments::{Experiment, STAGE_ORDER};
use chrono::{Month, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValueCount {
    pub value: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct YearMonthCount {
    pub year: i32,
    pub month: u32,
    /// e.g. `2024 - Mar`
    pub label: String,
    pub count: usize,
}

/// Headline numbers and breakdowns for a set of experiments.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ExperimentSummary {
    pub total: usize,
    /// Known stages first, in display order, each present even at zero.
    pub stage_counts: Vec<ValueCount>,
    pub sub_domain_counts: Vec<ValueCount>,
    pub metric_counts: Vec<ValueCount>,
    pub year_month_counts: Vec<YearMonthCount>,
    /// Latest end date among running experiments, days from `today`.
    pub max_days_remaining: Option<i64>,
}

impl ExperimentSummary {
    pub fn from_experiments(experiments: &[&Experiment], today: NaiveDate) -> Self {
        let mut stage_totals: BTreeMap<&str, usize> = BTreeMap::new();
        for experiment in experiments {
            *stage_totals.entry(experiment.stage.as_str()).or_insert(0) += 1;
        }
        let mut stage_counts: Vec<ValueCount> = STAGE_ORDER
            .iter()
            .map(|stage| ValueCount {
                value: stage.to_string(),
                count: stage_totals.remove(stage).unwrap_or(0),
            })
            .collect();
        stage_counts.extend(stage_totals.into_iter().map(|(value, count)| ValueCount {
            value: value.to_string(),
            count,
        }));

        let mut by_month: BTreeMap<(i32, u32), usize> = BTreeMap::new();
        for experiment in experiments {
            *by_month
                .entry((experiment.year(), experiment.month()))
                .or_insert(0) += 1;
        }
        let year_month_counts = by_month
            .into_iter()
            .map(|((year, month), count)| YearMonthCount {
                year,
                month,
                label: year_month_label(year, month),
                count,
            })
            .collect();

        ExperimentSummary {
            total: experiments.len(),
            stage_counts,
            sub_domain_counts: value_counts(experiments.iter().map(|e| e.sub_domain.as_str())),
            metric_counts: value_counts(experiments.iter().map(|e| e.primary_metric.as_str())),
            year_month_counts,
            max_days_remaining: experiments
                .iter()
                .filter_map(|e| e.days_remaining(today))
                .max(),
        }
    }

    pub fn stage_count(&self, stage: &str) -> usize {
        self.stage_counts
            .iter()
            .find(|count| count.value == stage)
            .map_or(0, |count| count.count)
    }
}

fn year_month_label(year: i32, month: u32) -> String {
    let name = u8::try_from(month)
        .ok()
        .and_then(|m| Month::try_from(m).ok())
        .map(|m| m.name()[..3].to_string())
        .unwrap_or_else(|| month.to_string());
    format!("{} - {}", year, name)
}

/// Most frequent first, ties by value. Blank values are skipped.
fn value_counts<'a>(values: impl Iterator<Item = &'a str>) -> Vec<ValueCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for value in values.filter(|v| !v.is_empty()) {
        *counts.entry(value).or_insert(0) += 1;
    }
    let mut counts: Vec<ValueCount> = counts
        .into_iter()
        .map(|(value, count)| ValueCount {
            value: value.to_string(),
            count,
        })
        .collect();
    counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExtractorConfig;
    use crate::experiments::tests::EXPERIMENTS;
    use crate::experiments::{ExperimentFilter, load_experiments};
    use crate::sheet::Sheet;

    fn experiments() -> Vec<Experiment> {
        let sheet = Sheet::from_reader("Experiments", EXPERIMENTS.as_bytes()).unwrap();
        load_experiments(&sheet, &ExtractorConfig::default().date_formats).unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn counts_stages_in_display_order() {
        let experiments = experiments();
        let all = ExperimentFilter::new().apply(&experiments);
        let summary = ExperimentSummary::from_experiments(&all, date("2024-03-20"));

        assert_eq!(summary.total, 4);
        let stages: Vec<_> = summary
            .stage_counts
            .iter()
            .map(|c| (c.value.as_str(), c.count))
            .collect();
        assert_eq!(
            stages,
            vec![("Running", 2), ("Completed", 1), ("Paused", 1)]
        );
        assert_eq!(summary.max_days_remaining, Some(12));
    }

    #[test]
    fn value_counts_sort_by_frequency() {
        let experiments = experiments();
        let all = ExperimentFilter::new().apply(&experiments);
        let summary = ExperimentSummary::from_experiments(&all, date("2024-03-20"));

        assert_eq!(summary.sub_domain_counts[0].value, "Growth");
        assert_eq!(summary.sub_domain_counts[0].count, 2);
        assert_eq!(summary.metric_counts[0].value, "Conversion");
        let tail: Vec<_> = summary.metric_counts[1..]
            .iter()
            .map(|c| c.value.as_str())
            .collect();
        assert_eq!(tail, vec!["CTR", "Retention"]);
    }

    #[test]
    fn year_month_counts_are_chronological() {
        let experiments = experiments();
        let all = ExperimentFilter::new().apply(&experiments);
        let summary = ExperimentSummary::from_experiments(&all, date("2024-03-20"));

        let labels: Vec<_> = summary
            .year_month_counts
            .iter()
            .map(|c| (c.label.as_str(), c.count))
            .collect();
        assert_eq!(
            labels,
            vec![("2023 - Nov", 1), ("2024 - Jan", 1), ("2024 - Mar", 2)]
        );
    }

    #[test]
    fn filtered_summary_keeps_zero_stages() {
        let experiments = experiments();
        let paused = ExperimentFilter::new().stage("Paused").apply(&experiments);
        let summary = ExperimentSummary::from_experiments(&paused, date("2024-03-20"));
        assert_eq!(summary.total, 1);
        assert_eq!(summary.stage_count("Running"), 0);
        assert_eq!(summary.stage_count("Paused"), 1);
        assert_eq!(summary.max_days_remaining, None);
    }
}

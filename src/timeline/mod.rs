mod bucket;
mod interval;

pub use bucket::Bucket;
pub use interval::Interval;

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

/// Intervals of one extraction pass, ordered for a Gantt chart.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct Timeline {
    buckets: Vec<Bucket>,
    intervals: Vec<Interval>,
    lanes: Vec<String>,
    earliest_start: Option<NaiveDate>,
    latest_end: Option<NaiveDate>,
    window_start: Option<NaiveDate>,
}

impl Timeline {
    /// Sorts intervals by start (stable, so ties keep row order) and derives
    /// lane order and the visible date window.
    pub fn from_intervals(
        buckets: Vec<Bucket>,
        mut intervals: Vec<Interval>,
        lookback_months: u32,
    ) -> Self {
        intervals.sort_by_key(|interval| interval.start);

        let mut seen = HashSet::new();
        let lanes = intervals
            .iter()
            .filter(|interval| seen.insert(interval.entity_key.as_str()))
            .map(|interval| interval.entity_key.clone())
            .collect();

        let earliest_start = intervals.first().map(|interval| interval.start);
        let latest_end = intervals.iter().map(|interval| interval.end).max();
        let window_start = earliest_start.map(|start| {
            start
                .checked_sub_months(Months::new(lookback_months))
                .unwrap_or(NaiveDate::MIN)
        });

        Timeline {
            buckets,
            intervals,
            lanes,
            earliest_start,
            latest_end,
            window_start,
        }
    }

    pub fn buckets(&self) -> &[Bucket] {
        &self.buckets
    }

    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }

    /// Distinct entity keys in order of first appearance.
    pub fn lanes(&self) -> &[String] {
        &self.lanes
    }

    pub fn earliest_start(&self) -> Option<NaiveDate> {
        self.earliest_start
    }

    pub fn latest_end(&self) -> Option<NaiveDate> {
        self.latest_end
    }

    pub fn window_start(&self) -> Option<NaiveDate> {
        self.window_start
    }

    /// Visible range for the chart's time axis.
    pub fn window(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((self.window_start?, self.latest_end?))
    }

    pub fn intervals_for_lane(&self, entity_key: &str) -> Vec<&Interval> {
        self.intervals
            .iter()
            .filter(|interval| interval.entity_key == entity_key)
            .collect()
    }

    pub fn intervals_by_stage(&self, stage: &str) -> Vec<&Interval> {
        self.intervals
            .iter()
            .filter(|interval| interval.stage == stage)
            .collect()
    }

    pub fn stages(&self) -> BTreeSet<&str> {
        self.intervals
            .iter()
            .map(|interval| interval.stage.as_str())
            .collect()
    }

    pub fn interval_count(&self) -> usize {
        self.intervals.len()
    }

    pub fn lane_count(&self) -> usize {
        self.lanes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn interval(key: &str, stage: &str, start: &str, end: &str, line: u64) -> Interval {
        Interval::new(
            key.to_string(),
            stage.to_string(),
            date(start),
            date(end),
            line,
        )
    }

    #[test]
    fn orders_intervals_and_lanes_by_start() {
        let timeline = Timeline::from_intervals(
            Vec::new(),
            vec![
                interval("B-Dubai-iOS", "Rollout", "2024-03-18", "2024-03-31", 3),
                interval("A-Dubai-iOS", "In Experiment", "2024-03-04", "2024-03-17", 2),
                interval("B-Dubai-iOS", "Paused", "2024-03-04", "2024-03-10", 3),
            ],
            3,
        );

        let starts: Vec<_> = timeline.intervals().iter().map(|i| i.start).collect();
        assert_eq!(
            starts,
            vec![date("2024-03-04"), date("2024-03-04"), date("2024-03-18")]
        );
        // Equal starts keep their input order.
        assert_eq!(timeline.intervals()[0].entity_key, "A-Dubai-iOS");
        assert_eq!(timeline.lanes(), ["A-Dubai-iOS", "B-Dubai-iOS"]);
        assert_eq!(timeline.intervals_for_lane("B-Dubai-iOS").len(), 2);
        assert_eq!(timeline.intervals_by_stage("Rollout").len(), 1);
        assert_eq!(timeline.stages().len(), 3);
    }

    #[test]
    fn window_uses_calendar_month_lookback() {
        let timeline = Timeline::from_intervals(
            Vec::new(),
            vec![interval("A", "Rollout", "2024-03-04", "2024-04-14", 2)],
            3,
        );

        assert_eq!(timeline.earliest_start(), Some(date("2024-03-04")));
        assert_eq!(timeline.latest_end(), Some(date("2024-04-14")));
        assert_eq!(timeline.window_start(), Some(date("2023-12-04")));
        assert_eq!(
            timeline.window(),
            Some((date("2023-12-04"), date("2024-04-14")))
        );
    }

    #[test]
    fn latest_end_is_not_tied_to_sort_order() {
        let timeline = Timeline::from_intervals(
            Vec::new(),
            vec![
                interval("A", "Rollout", "2024-01-01", "2024-06-30", 2),
                interval("B", "Paused", "2024-02-01", "2024-02-07", 3),
            ],
            0,
        );
        assert_eq!(timeline.latest_end(), Some(date("2024-06-30")));
        assert_eq!(timeline.window_start(), Some(date("2024-01-01")));
    }

    #[test]
    fn empty_timeline_has_no_window() {
        let timeline = Timeline::from_intervals(Vec::new(), Vec::new(), 3);
        assert!(timeline.is_empty());
        assert_eq!(timeline.lane_count(), 0);
        assert_eq!(timeline.window(), None);
    }

    #[test]
    fn duration_is_inclusive() {
        let single = interval("A", "Rollout", "2024-03-04", "2024-03-10", 2);
        assert_eq!(single.duration_days(), 7);
    }
}

use crate::config::ExtractorConfig;
use crate::error::{Result, TimelineError};
use crate::extraction::runs::{Row, extract_row};
use crate::parsers::parse_buckets;
use crate::sheet::{RowFilter, Sheet, fill_column};
use crate::timeline::{Bucket, Interval, Timeline};
use log::{debug, info, warn};
use rayon::prelude::*;
use serde::Serialize;
use std::borrow::Cow;
use std::collections::HashMap;

/// A row that was skipped, with enough context to find it in the sheet.
#[derive(Debug)]
pub struct RowError {
    pub source_line: u64,
    pub entity_key: String,
    pub error: TimelineError,
}

impl Serialize for RowError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("RowError", 3)?;
        state.serialize_field("source_line", &self.source_line)?;
        state.serialize_field("entity_key", &self.entity_key)?;
        state.serialize_field("error", &self.error.to_string())?;
        state.end()
    }
}

/// Result of one pass over a sheet.
#[derive(Debug, Serialize)]
pub struct Extraction {
    pub timeline: Timeline,
    pub rejected: Vec<RowError>,
}

impl Extraction {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// Per-row outcomes, in row order.
pub fn extract_rows(
    rows: &[Row],
    buckets: &[Bucket],
    delimiter: &str,
) -> Vec<Result<Vec<Interval>>> {
    rows.iter()
        .map(|row| extract_row(row, buckets, delimiter))
        .collect()
}

/// Same as [`extract_rows`], spread across a dedicated pool of `num_threads`
/// workers. Output order matches the input.
pub fn extract_rows_parallel(
    rows: &[Row],
    buckets: &[Bucket],
    delimiter: &str,
    num_threads: usize,
) -> Result<Vec<Result<Vec<Interval>>>> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build()?;

    Ok(pool.install(|| {
        rows.par_iter()
            .map(|row| extract_row(row, buckets, delimiter))
            .collect()
    }))
}

/// Run the whole weekly-grid pipeline: parse buckets, carry the fill column
/// forward, apply filters, then extract intervals row by row.
///
/// Header problems abort the pass. Rows whose cells do not line up with the
/// buckets are skipped and reported in [`Extraction::rejected`].
pub fn extract_timeline(sheet: &Sheet, config: &ExtractorConfig) -> Result<Extraction> {
    config.validate()?;
    info!(
        "Extracting timeline from '{}' ({} rows) with {} threads",
        sheet.name(),
        sheet.row_count(),
        config.num_threads
    );

    let buckets = parse_buckets(sheet.headers(), config)?;
    info!("Found {} bucket columns", buckets.len());

    let sheet = match &config.fill_forward_column {
        Some(column) => Cow::Owned(fill_column(sheet, column)?),
        None => Cow::Borrowed(sheet),
    };

    let filter = RowFilter::from_selections(&config.filters);
    let selected = filter.apply(&sheet)?;
    if !filter.is_empty() {
        info!(
            "Filters {:?} kept {} of {} rows",
            filter.selections(),
            selected.len(),
            sheet.row_count()
        );
    }

    let rows: Vec<Row> = selected
        .into_iter()
        .map(|row| Row::from_sheet_row(row, &buckets, config.identity_columns))
        .collect();

    let outcomes =
        extract_rows_parallel(&rows, &buckets, &config.key_delimiter, config.num_threads)?;

    let mut intervals = Vec::new();
    let mut rejected = Vec::new();
    for (row, outcome) in rows.iter().zip(outcomes) {
        match outcome {
            Ok(row_intervals) => intervals.extend(row_intervals),
            Err(error) => {
                warn!("Skipping row at line {}: {}", row.source_line, error);
                rejected.push(RowError {
                    source_line: row.source_line,
                    entity_key: row.entity_key(&config.key_delimiter),
                    error,
                });
            }
        }
    }

    let timeline = Timeline::from_intervals(buckets, intervals, config.lookback_months);

    let mut stage_counts: HashMap<&str, usize> = HashMap::new();
    for interval in timeline.intervals() {
        *stage_counts.entry(interval.stage.as_str()).or_insert(0) += 1;
    }
    debug!("Interval counts by stage:");
    for (stage, count) in &stage_counts {
        debug!("  {}: {}", stage, count);
    }

    info!(
        "Extracted {} intervals across {} lanes ({} rows rejected)",
        timeline.interval_count(),
        timeline.lane_count(),
        rejected.len()
    );

    Ok(Extraction { timeline, rejected })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::runs::normalize_cell;
    use chrono::NaiveDate;

    const WEEKLY: &str = "INITIATIVE,CITY,PLATFORM,NOTES,\
\"WEEK 1\n2024-03-04 to 2024-03-10\",\
\"WEEK 2\n2024-03-11 to 2024-03-17\",\
\"WEEK 3\n2024-03-18 to 2024-03-24\"
Pricing,Dubai,iOS,,In Experiment,In Experiment,Awaiting Results
,Dubai,Android,,,Rollout,Rollout
Search,Cairo,Web,paused for Q2,Paused,,Paused
";

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn config() -> ExtractorConfig {
        ExtractorConfig::default().with_num_threads(2)
    }

    #[test]
    fn extracts_weekly_sheet() {
        let sheet = Sheet::from_reader("Weekly", WEEKLY.as_bytes()).unwrap();
        let extraction = extract_timeline(&sheet, &config()).unwrap();
        assert!(extraction.is_clean());

        let timeline = &extraction.timeline;
        assert_eq!(timeline.interval_count(), 5);
        assert_eq!(
            timeline.lanes(),
            ["Pricing-Dubai-iOS", "Search-Cairo-Web", "Pricing-Dubai-Android"]
        );

        let android = timeline.intervals_for_lane("Pricing-Dubai-Android");
        assert_eq!(android.len(), 1);
        assert_eq!(android[0].start, date("2024-03-11"));
        assert_eq!(android[0].end, date("2024-03-24"));

        assert_eq!(timeline.earliest_start(), Some(date("2024-03-04")));
        assert_eq!(timeline.latest_end(), Some(date("2024-03-24")));
        assert_eq!(timeline.window_start(), Some(date("2023-12-04")));
    }

    #[test]
    fn filters_apply_after_fill_forward() {
        let sheet = Sheet::from_reader("Weekly", WEEKLY.as_bytes()).unwrap();
        let config = config()
            .with_filter("CITY", "Dubai")
            .with_filter("INITIATIVE", "Pricing");
        let extraction = extract_timeline(&sheet, &config).unwrap();
        assert_eq!(extraction.timeline.lane_count(), 2);
    }

    #[test]
    fn mismatched_row_is_skipped_not_fatal() {
        let csv = "INITIATIVE,CITY,PLATFORM,\
\"WEEK 1\n2024-03-04 to 2024-03-10\",\"WEEK 2\n2024-03-11 to 2024-03-17\"
Pricing,Dubai,iOS,Rollout,Rollout
Search,Cairo,Web,Paused
";
        let sheet = Sheet::from_reader("Weekly", csv.as_bytes()).unwrap();
        let extraction = extract_timeline(&sheet, &config()).unwrap();

        assert_eq!(extraction.timeline.interval_count(), 1);
        assert_eq!(extraction.rejected.len(), 1);
        let rejected = &extraction.rejected[0];
        assert_eq!(rejected.entity_key, "Search-Cairo-Web");
        assert!(matches!(
            rejected.error,
            TimelineError::RowBucketMismatch { expected: 2, found: 1, .. }
        ));
        assert!(extraction.timeline.intervals_for_lane("Search-Cairo-Web").is_empty());
    }

    #[test]
    fn malformed_header_aborts_the_pass() {
        let csv = "INITIATIVE,CITY,PLATFORM,WEEK 1\nPricing,Dubai,iOS,Rollout\n";
        let sheet = Sheet::from_reader("Weekly", csv.as_bytes()).unwrap();
        assert!(matches!(
            extract_timeline(&sheet, &config()),
            Err(TimelineError::MalformedBucketHeader { .. })
        ));
    }

    #[test]
    fn parallel_matches_sequential() {
        let sheet = Sheet::from_reader("Weekly", WEEKLY.as_bytes()).unwrap();
        let buckets = parse_buckets(sheet.headers(), &config()).unwrap();
        let rows: Vec<Row> = (0..64)
            .map(|i| {
                let cells = ["A", "", "B"]
                    .iter()
                    .cycle()
                    .skip(i % 3)
                    .take(buckets.len())
                    .map(|c| normalize_cell(c))
                    .collect();
                Row::new(i as u64 + 2, vec![format!("Init{i}")], cells)
            })
            .collect();

        let sequential: Vec<_> = extract_rows(&rows, &buckets, "-")
            .into_iter()
            .map(|r| r.unwrap())
            .collect();
        let parallel: Vec<_> = extract_rows_parallel(&rows, &buckets, "-", 4)
            .unwrap()
            .into_iter()
            .map(|r| r.unwrap())
            .collect();
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn rejected_rows_serialize_with_message() {
        let error = RowError {
            source_line: 4,
            entity_key: "Search-Cairo-Web".to_string(),
            error: TimelineError::RowBucketMismatch {
                source_line: 4,
                entity_key: "Search-Cairo-Web".to_string(),
                expected: 2,
                found: 1,
            },
        };
        let json = serde_json::to_value(&error).unwrap();
        assert_eq!(json["source_line"], 4);
        assert!(json["error"].as_str().unwrap().contains("expected 2"));
    }
}

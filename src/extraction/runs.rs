use crate::error::{Result, TimelineError};
use crate::sheet::SheetRow;
use crate::timeline::{Bucket, Interval};
use chrono::NaiveDate;
use log::trace;

/// A stretch of consecutive buckets holding the same stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    pub stage: String,
    pub start: NaiveDate,
    /// `range_end` of the last bucket folded into the run so far.
    pub end: NaiveDate,
}

impl Run {
    fn starting_at(stage: &str, bucket: &Bucket) -> Self {
        Run {
            stage: stage.to_string(),
            start: bucket.range_start,
            end: bucket.range_end,
        }
    }

    pub fn into_interval(self, entity_key: String, source_line: u64) -> Interval {
        Interval::new(entity_key, self.stage, self.start, self.end, source_line)
    }
}

/// Scan state between buckets.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RunState {
    #[default]
    Idle,
    Open(Run),
}

impl RunState {
    /// Folds one bucket's cell into the state, returning the run it closed,
    /// if any, and the next state.
    ///
    /// An open run's `end` always trails the last bucket it absorbed, so a
    /// run closed at bucket `i` ends on `range_end` of bucket `i - 1`.
    pub fn advance(self, cell: Option<&str>, bucket: &Bucket) -> (Option<Run>, RunState) {
        match (self, cell) {
            (RunState::Idle, None) => (None, RunState::Idle),
            (RunState::Open(run), None) => (Some(run), RunState::Idle),
            (RunState::Idle, Some(stage)) => {
                (None, RunState::Open(Run::starting_at(stage, bucket)))
            }
            (RunState::Open(mut run), Some(stage)) if run.stage == stage => {
                run.end = bucket.range_end;
                (None, RunState::Open(run))
            }
            (RunState::Open(run), Some(stage)) => {
                (Some(run), RunState::Open(Run::starting_at(stage, bucket)))
            }
        }
    }

    /// The run still open once every bucket has been seen.
    pub fn finish(self) -> Option<Run> {
        match self {
            RunState::Idle => None,
            RunState::Open(run) => Some(run),
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, RunState::Open(_))
    }
}

/// Fold a row's cells over the bucket sequence.
///
/// Returns the runs closed during the scan plus the final state; a run that
/// reaches the last bucket is still open in that state.
pub fn fold_runs(buckets: &[Bucket], cells: &[Option<String>]) -> (Vec<Run>, RunState) {
    buckets.iter().zip(cells).fold(
        (Vec::new(), RunState::Idle),
        |(mut closed, state), (bucket, cell)| {
            let (finished, next) = state.advance(cell.as_deref(), bucket);
            closed.extend(finished);
            (closed, next)
        },
    )
}

/// Blank, whitespace-only and absent cells all mean "no stage".
pub fn normalize_cell(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// One grid record split into identity fields and bucket cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub source_line: u64,
    pub identity: Vec<String>,
    /// One entry per bucket, in bucket order.
    pub cells: Vec<Option<String>>,
}

impl Row {
    pub fn new(source_line: u64, identity: Vec<String>, cells: Vec<Option<String>>) -> Self {
        Row {
            source_line,
            identity,
            cells,
        }
    }

    /// Picks the identity fields and the bucket columns out of a sheet row.
    ///
    /// Cells are read up to the first bucket column the row does not have,
    /// so a short row keeps its true cell count for mismatch reporting.
    pub fn from_sheet_row(row: &SheetRow, buckets: &[Bucket], identity_columns: usize) -> Self {
        let identity = (0..identity_columns)
            .map(|column| row.cell(column).trim().to_string())
            .collect();
        let cells = buckets
            .iter()
            .map_while(|bucket| row.cells.get(bucket.column))
            .map(|cell| normalize_cell(cell))
            .collect();

        Row::new(row.line, identity, cells)
    }

    pub fn entity_key(&self, delimiter: &str) -> String {
        self.identity.join(delimiter)
    }
}

/// Emit one interval per maximal run of identical non-empty cells.
pub fn extract_row(row: &Row, buckets: &[Bucket], delimiter: &str) -> Result<Vec<Interval>> {
    let entity_key = row.entity_key(delimiter);

    if row.cells.len() != buckets.len() {
        return Err(TimelineError::RowBucketMismatch {
            source_line: row.source_line,
            entity_key,
            expected: buckets.len(),
            found: row.cells.len(),
        });
    }

    let (mut runs, state) = fold_runs(buckets, &row.cells);
    runs.extend(state.finish());

    trace!(
        "Row at line {} ('{}') produced {} intervals",
        row.source_line,
        entity_key,
        runs.len()
    );

    Ok(runs
        .into_iter()
        .map(|run| run.into_interval(entity_key.clone(), row.source_line))
        .collect())
}

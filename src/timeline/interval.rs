use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A contiguous run of one stage for one entity, ready to be drawn as a bar.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Interval {
    pub entity_key: String,
    pub stage: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub source_line: u64,
}

impl Interval {
    pub fn new(
        entity_key: String,
        stage: String,
        start: NaiveDate,
        end: NaiveDate,
        source_line: u64,
    ) -> Self {
        Interval {
            entity_key,
            stage,
            start,
            end,
            source_line,
        }
    }

    /// Inclusive length in days.
    pub fn duration_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

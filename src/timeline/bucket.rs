use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One time-boxed column of the status grid.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Bucket {
    pub label: String,
    /// Index of the column in the source header row.
    pub column: usize,
    pub range_start: NaiveDate,
    pub range_end: NaiveDate,
}

impl Bucket {
    pub fn new(
        label: String,
        column: usize,
        range_start: NaiveDate,
        range_end: NaiveDate,
    ) -> Self {
        Bucket {
            label,
            column,
            range_start,
            range_end,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.range_start <= date && date <= self.range_end
    }
}

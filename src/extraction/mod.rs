pub mod processor;
pub mod runs;

pub use processor::{Extraction, RowError, extract_rows, extract_rows_parallel, extract_timeline};
pub use runs::{Row, Run, RunState, extract_row, fold_runs, normalize_cell};

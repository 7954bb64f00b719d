use std::io;

use thiserror::Error;

/// Errors raised while loading a status grid or turning it into a timeline.
#[derive(Debug, Error)]
pub enum TimelineError {
    #[error("malformed bucket header '{label}' in column {column}: {reason}")]
    MalformedBucketHeader {
        column: usize,
        label: String,
        reason: String,
    },
    #[error(
        "row at line {source_line} ('{entity_key}') has {found} bucket cells, expected {expected}"
    )]
    RowBucketMismatch {
        source_line: u64,
        entity_key: String,
        expected: usize,
        found: usize,
    },
    #[error("cannot parse date '{value}' in {context}")]
    DateParse { value: String, context: String },
    #[error("invalid sheet layout: {0}")]
    InvalidLayout(String),
    #[error("unknown column '{0}'")]
    UnknownColumn(String),
    #[error("table '{0}' not found in workbook")]
    TableNotFound(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

pub type Result<T> = std::result::Result<T, TimelineError>;

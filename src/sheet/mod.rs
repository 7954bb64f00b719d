mod fill;
pub mod filter;
mod workbook;

pub use fill::{fill_column, fill_forward};
pub use filter::{ALL, RowFilter, filter_options};
pub use workbook::{EXPERIMENTS_TABLE, WEEKLY_TABLE, Workbook};

use crate::error::{Result, TimelineError};
use csv::ReaderBuilder;
use log::{debug, info};
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// One data record of a sheet, with the line it started on in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetRow {
    pub line: u64,
    pub cells: Vec<String>,
}

impl SheetRow {
    pub fn new(line: u64, cells: Vec<String>) -> Self {
        SheetRow { line, cells }
    }

    /// Cell text, with missing trailing cells read as blank.
    pub fn cell(&self, column: usize) -> &str {
        self.cells.get(column).map(String::as_str).unwrap_or("")
    }

    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|cell| cell.trim().is_empty())
    }
}

/// A table of untyped string cells under a unique header row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sheet {
    name: String,
    headers: Vec<String>,
    rows: Vec<SheetRow>,
}

impl Sheet {
    /// Builds a sheet from raw header text. Duplicate headers are made unique
    /// and blank rows are dropped.
    pub fn new(name: impl Into<String>, headers: Vec<String>, rows: Vec<SheetRow>) -> Self {
        let name = name.into();
        let total = rows.len();
        let rows: Vec<SheetRow> = rows.into_iter().filter(|row| !row.is_blank()).collect();
        if rows.len() < total {
            debug!(
                "Dropped {} blank rows from sheet '{}'",
                total - rows.len(),
                name
            );
        }

        Sheet {
            name,
            headers: dedupe_headers(&headers),
            rows,
        }
    }

    /// Reads CSV where the first record is the header row.
    pub fn from_reader<R: Read>(name: impl Into<String>, reader: R) -> Result<Self> {
        let name = name.into();
        let mut rdr = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        let mut headers: Option<Vec<String>> = None;
        let mut rows = Vec::new();
        for record in rdr.records() {
            let record = record?;
            let cells: Vec<String> = record.iter().map(str::to_string).collect();
            if headers.is_none() {
                headers = Some(cells);
                continue;
            }
            let line = record.position().map(|pos| pos.line()).unwrap_or(0);
            rows.push(SheetRow::new(line, cells));
        }

        let headers = headers.ok_or_else(|| {
            TimelineError::InvalidLayout(format!("sheet '{}' has no header row", name))
        })?;

        Ok(Sheet::new(name, headers, rows))
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let name = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("sheet")
            .to_string();
        info!("Reading sheet '{}' from {:?}", name, path);
        let file = File::open(path)?;
        Sheet::from_reader(name, file)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[SheetRow] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, column: &str) -> Result<usize> {
        self.headers
            .iter()
            .position(|header| header == column)
            .ok_or_else(|| TimelineError::UnknownColumn(column.to_string()))
    }

    /// Values of one column, top to bottom.
    pub fn column_values(&self, column: &str) -> Result<Vec<&str>> {
        let index = self.column_index(column)?;
        Ok(self.rows.iter().map(|row| row.cell(index)).collect())
    }

    pub(crate) fn with_rows(&self, rows: Vec<SheetRow>) -> Sheet {
        Sheet {
            name: self.name.clone(),
            headers: self.headers.clone(),
            rows,
        }
    }
}

/// Appends `_1`, `_2`, ... to repeated headers, leaving the first occurrence
/// unchanged. A suffix already used by another header is skipped, so every
/// returned name is distinct.
pub fn dedupe_headers(headers: &[String]) -> Vec<String> {
    let mut emitted: HashSet<String> = HashSet::with_capacity(headers.len());
    let mut counters: HashMap<&str, usize> = HashMap::new();
    let mut names = Vec::with_capacity(headers.len());
    for header in headers {
        let name = if emitted.contains(header) {
            let count = counters.entry(header.as_str()).or_insert(0);
            let mut candidate = header.clone();
            while emitted.contains(&candidate) {
                *count += 1;
                candidate = format!("{}_{}", header, count);
            }
            candidate
        } else {
            header.clone()
        };
        emitted.insert(name.clone());
        names.push(name);
    }
    names
}

use crate::error::{Result, TimelineError};
use crate::sheet::Sheet;
use log::{info, trace, warn};
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub const EXPERIMENTS_TABLE: &str = "Experiments";
pub const WEEKLY_TABLE: &str = "Weekly";

/// Named tables exported from one spreadsheet, one CSV file per table.
///
/// Tables are only read when asked for, so a broken export of one table does
/// not stop another from loading.
#[derive(Debug, Clone, Default)]
pub struct Workbook {
    tables: BTreeMap<String, PathBuf>,
}

impl Workbook {
    /// Registers every `*.csv` file directly under `dir`, named by file stem.
    pub fn open(dir: &Path) -> Result<Self> {
        info!("Scanning workbook directory {:?}", dir);
        if !dir.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("workbook directory {:?} does not exist", dir),
            )
            .into());
        }

        let mut tables = BTreeMap::new();
        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Failed to read workbook entry in {:?}: {}", dir, e);
                    continue;
                }
            };

            let path = entry.path();
            if !entry.file_type().is_file() {
                continue;
            }

            let is_csv = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
            if !is_csv {
                trace!("Skipping non-CSV file: {:?}", path);
                continue;
            }

            let Some(name) = path.file_stem().and_then(|stem| stem.to_str()) else {
                warn!("Skipping table with non UTF-8 name: {:?}", path);
                continue;
            };
            if tables.contains_key(name) {
                warn!("Duplicate table '{}' at {:?}, ignoring", name, path);
                continue;
            }
            trace!("Found table '{}' at {:?}", name, path);
            tables.insert(name.to_string(), path.to_path_buf());
        }

        info!("Workbook has {} tables", tables.len());
        Ok(Workbook { tables })
    }

    /// Reads the named table from disk.
    pub fn table(&self, name: &str) -> Result<Sheet> {
        let path = self
            .tables
            .get(name)
            .ok_or_else(|| TimelineError::TableNotFound(name.to_string()))?;
        let sheet = Sheet::from_path(path)?;
        info!(
            "Loaded table '{}' with {} rows",
            sheet.name(),
            sheet.row_count()
        );
        Ok(sheet)
    }

    pub fn contains_table(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }
}

//! Attribute filters for the weekly view.
//!
//! The dashboard narrows the grid by city and then by initiative. Selecting
//! [`ALL`] for a column turns its filter off.

use crate::error::Result;
use crate::sheet::{Sheet, SheetRow};
use std::collections::{BTreeMap, BTreeSet};

pub const ALL: &str = "All";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowFilter {
    selections: Vec<(String, String)>,
}

impl RowFilter {
    pub fn new() -> Self {
        RowFilter::default()
    }

    pub fn from_selections(selections: &BTreeMap<String, String>) -> Self {
        selections
            .iter()
            .fold(RowFilter::new(), |filter, (column, value)| {
                filter.with(column.clone(), value.clone())
            })
    }

    /// Adds a `column == value` condition. [`ALL`] is ignored.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        let value = value.into();
        if value != ALL {
            self.selections.push((column.into(), value));
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.selections.is_empty()
    }

    pub fn selections(&self) -> &[(String, String)] {
        &self.selections
    }

    /// Rows matching every selection, in sheet order.
    pub fn apply<'a>(&self, sheet: &'a Sheet) -> Result<Vec<&'a SheetRow>> {
        let mut conditions = Vec::with_capacity(self.selections.len());
        for (column, value) in &self.selections {
            conditions.push((sheet.column_index(column)?, value.as_str()));
        }

        Ok(sheet
            .rows()
            .iter()
            .filter(|row| {
                conditions
                    .iter()
                    .all(|(index, value)| row.cell(*index).trim() == *value)
            })
            .collect())
    }
}

/// Options for a filter widget on `column`.
///
/// Without a restriction the list is [`ALL`] followed by the sorted distinct
/// values. With `within = (other_column, value)` only rows matching it are
/// considered; if that value is itself [`ALL`], the list carries no [`ALL`]
/// entry, mirroring how the initiative picker behaves when every city is
/// selected.
pub fn filter_options(
    sheet: &Sheet,
    column: &str,
    within: Option<(&str, &str)>,
) -> Result<Vec<String>> {
    let index = sheet.column_index(column)?;

    let (rows, include_all) = match within {
        None => (sheet.rows().iter().collect::<Vec<_>>(), true),
        Some((_, value)) if value == ALL => (sheet.rows().iter().collect(), false),
        Some((other, value)) => (RowFilter::new().with(other, value).apply(sheet)?, true),
    };

    let distinct: BTreeSet<&str> = rows
        .iter()
        .map(|row| row.cell(index).trim())
        .filter(|value| !value.is_empty())
        .collect();

    let mut options = Vec::with_capacity(distinct.len() + 1);
    if include_all {
        options.push(ALL.to_string());
    }
    options.extend(distinct.into_iter().map(str::to_string));
    Ok(options)
}

use crate::error::Result;
use crate::sheet::{Sheet, SheetRow};
use log::{debug, warn};

/// Replace each blank value with the nearest non-blank value above it.
///
/// Blanks before the first non-blank value have nothing to copy and stay
/// blank.
pub fn fill_forward<'a, I>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    values
        .into_iter()
        .scan(None::<&'a str>, |last, value| {
            let value = value.trim();
            if !value.is_empty() {
                *last = Some(value);
            }
            Some((*last).unwrap_or("").to_string())
        })
        .collect()
}

/// Returns a copy of `sheet` with `column` filled forward.
pub fn fill_column(sheet: &Sheet, column: &str) -> Result<Sheet> {
    let index = sheet.column_index(column)?;
    let filled = fill_forward(sheet.rows().iter().map(|row| row.cell(index)));

    let unfilled = filled.iter().take_while(|value| value.is_empty()).count();
    if unfilled > 0 {
        warn!(
            "{} leading rows of '{}' have no {} value to carry forward",
            unfilled,
            sheet.name(),
            column
        );
    }

    let rows = sheet
        .rows()
        .iter()
        .zip(filled)
        .map(|(row, value)| {
            let mut cells = row.cells.clone();
            if cells.len() <= index {
                cells.resize(index + 1, String::new());
            }
            cells[index] = value;
            SheetRow::new(row.line, cells)
        })
        .collect();

    debug!("Filled column '{}' forward in '{}'", column, sheet.name());
    Ok(sheet.with_rows(rows))
}

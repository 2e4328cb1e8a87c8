//! Train/test split by calendar year
//!
//! Rows whose date-column year falls before the cutoff form the training
//! table; the remainder is held out for scoring. Row order within each side
//! is preserved.

use anyhow::{bail, Context, Result};
use chrono::Datelike;
use lagpipe_frame::{Table, Value};

/// Split `table` on the year of `date_column`: years `< cutoff_year` train,
/// the rest test.
pub fn split_by_year(table: &Table, date_column: &str, cutoff_year: i32) -> Result<(Table, Table)> {
    let column = table
        .require_column(date_column)
        .with_context(|| format!("split column '{date_column}' not found"))?;

    let mut train_rows = Vec::new();
    let mut test_rows = Vec::new();
    for (row, value) in column.values.iter().enumerate() {
        let Value::Date(date) = value else {
            bail!("split column '{date_column}' has a non-date value at row {row}");
        };
        if date.year() < cutoff_year {
            train_rows.push(row);
        } else {
            test_rows.push(row);
        }
    }

    Ok((
        table.select_rows(&train_rows),
        table.select_rows(&test_rows),
    ))
}

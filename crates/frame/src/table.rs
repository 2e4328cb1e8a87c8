//! Fully materialized tables
//!
//! Whole-table passes (imputation fit, joins, train/test splits, model
//! feature extraction) operate on a `Table`; the chunked transform never
//! does. Converting back to chunks assigns each real chunk its global
//! `start_row` so the stream can feed the lag engine.

use crate::chunk::{Chunk, Column};
use crate::error::Result;
use crate::value::Value;

/// An ordered set of equal-length columns holding every row of a dataset
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
}

impl Table {
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        // Reuse chunk validation for the rectangular/unique-name invariants.
        let chunk = Chunk::new(columns)?;
        Ok(Self {
            columns: chunk.into_columns(),
        })
    }

    /// Concatenate ordered real chunks into one table. Later chunks must
    /// carry (at least) the first chunk's columns.
    pub fn from_chunks(chunks: &[Chunk]) -> Result<Self> {
        let Some(first) = chunks.first() else {
            return Self::new(Vec::new());
        };
        let mut columns: Vec<Column> = first
            .columns()
            .iter()
            .map(|c| Column::new(c.name.clone(), c.values.clone()))
            .collect();
        for chunk in &chunks[1..] {
            for col in &mut columns {
                let incoming = chunk.require_column(&col.name)?;
                col.values.extend(incoming.values.iter().cloned());
            }
        }
        Self::new(columns)
    }

    /// Split the table into real chunks of at most `chunk_size` rows,
    /// each stamped with its global start row.
    pub fn to_chunks(&self, chunk_size: usize) -> Vec<Chunk> {
        assert!(chunk_size > 0, "chunk_size must be positive");
        let rows = self.row_count();
        let mut chunks = Vec::new();
        let mut start = 0usize;
        while start < rows {
            let end = (start + chunk_size).min(rows);
            let columns = self
                .columns
                .iter()
                .map(|c| Column::new(c.name.clone(), c.values[start..end].to_vec()))
                .collect();
            // Columns are already validated; slicing preserves the invariants.
            let chunk = Chunk::new(columns)
                .expect("sliced columns stay rectangular")
                .with_start_row(start);
            chunks.push(chunk);
            start = end;
        }
        chunks
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, Column::len)
    }

    pub fn is_empty(&self) -> bool {
        self.row_count() == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn require_column(&self, name: &str) -> Result<&Column> {
        self.column(name)
            .ok_or_else(|| crate::error::FrameError::MissingColumn(name.to_string()))
    }

    pub fn push_column(&mut self, column: Column) -> Result<()> {
        let mut chunk = Chunk::new(std::mem::take(&mut self.columns))?;
        let outcome = chunk.push_column(column);
        self.columns = chunk.into_columns();
        outcome
    }

    /// Project the given rows (in the given order) into a new table
    pub fn select_rows(&self, indices: &[usize]) -> Self {
        let columns = self
            .columns
            .iter()
            .map(|c| {
                Column::new(
                    c.name.clone(),
                    indices.iter().map(|&i| c.values[i].clone()).collect(),
                )
            })
            .collect();
        Self { columns }
    }

    /// Cell access; panics on out-of-range indices (caller validates)
    pub fn cell(&self, column: usize, row: usize) -> &Value {
        &self.columns[column].values[row]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(vals: &[f64]) -> Table {
        Table::new(vec![Column::new(
            "x",
            vals.iter().map(|v| Value::Number(*v)).collect(),
        )])
        .unwrap()
    }

    #[test]
    fn test_to_chunks_assigns_start_rows() {
        let t = table(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let chunks = t.to_chunks(2);
        assert_eq!(chunks.len(), 3);
        assert_eq!(
            chunks.iter().map(Chunk::start_row).collect::<Vec<_>>(),
            vec![0, 2, 4]
        );
        assert_eq!(chunks[2].row_count(), 1);
    }

    #[test]
    fn test_chunk_round_trip() {
        let t = table(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        for size in [1, 2, 3, 5, 10] {
            let rebuilt = Table::from_chunks(&t.to_chunks(size)).unwrap();
            assert_eq!(rebuilt, t);
        }
    }

    #[test]
    fn test_select_rows_reorders() {
        let t = table(&[10.0, 20.0, 30.0]);
        let picked = t.select_rows(&[2, 0]);
        assert_eq!(
            picked.column("x").unwrap().values,
            vec![Value::Number(30.0), Value::Number(10.0)]
        );
    }
}

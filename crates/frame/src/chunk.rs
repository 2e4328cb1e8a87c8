//! Chunks: bounded, ordered slices of the row stream
//!
//! A chunk stores its rows column-wise. Real chunks carry `start_row`, the
//! global index of their first row among all real rows seen so far; the lag
//! engine uses it to refuse out-of-order delivery. Probe chunks exist only so
//! schema inference can observe column types and are excluded from state
//! mutation and from the materialized result.

use crate::error::{FrameError, Result};
use crate::value::Value;

/// A named column of cell values
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<Value>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// An ordered set of equal-length columns plus stream-position metadata
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    columns: Vec<Column>,
    is_probe: bool,
    start_row: usize,
}

impl Chunk {
    /// Build a real chunk, validating that columns are rectangular and
    /// uniquely named.
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        Self::build(columns, false)
    }

    /// Build a schema-probe chunk
    pub fn probe(columns: Vec<Column>) -> Result<Self> {
        Self::build(columns, true)
    }

    fn build(columns: Vec<Column>, is_probe: bool) -> Result<Self> {
        if let Some(first) = columns.first() {
            let expected = first.len();
            for col in &columns {
                if col.len() != expected {
                    return Err(FrameError::RaggedColumns {
                        column: col.name.clone(),
                        expected,
                        actual: col.len(),
                    });
                }
            }
        }
        for (i, col) in columns.iter().enumerate() {
            if columns[..i].iter().any(|c| c.name == col.name) {
                return Err(FrameError::DuplicateColumn(col.name.clone()));
            }
        }
        Ok(Self {
            columns,
            is_probe,
            start_row: 0,
        })
    }

    /// Attach the global index of this chunk's first row
    pub fn with_start_row(mut self, start_row: usize) -> Self {
        self.start_row = start_row;
        self
    }

    pub fn is_probe(&self) -> bool {
        self.is_probe
    }

    pub fn start_row(&self) -> usize {
        self.start_row
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

    pub fn into_columns(self) -> Vec<Column> {
        self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Column access that surfaces absence as an error
    pub fn require_column(&self, name: &str) -> Result<&Column> {
        self.column(name)
            .ok_or_else(|| FrameError::MissingColumn(name.to_string()))
    }

    /// Append a derived column, preserving the rectangular invariant
    pub fn push_column(&mut self, column: Column) -> Result<()> {
        if !self.columns.is_empty() && column.len() != self.row_count() {
            return Err(FrameError::RaggedColumns {
                column: column.name,
                expected: self.row_count(),
                actual: column.values.len(),
            });
        }
        if self.column(&column.name).is_some() {
            return Err(FrameError::DuplicateColumn(column.name));
        }
        self.columns.push(column);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num_col(name: &str, vals: &[f64]) -> Column {
        Column::new(name, vals.iter().map(|v| Value::Number(*v)).collect())
    }

    #[test]
    fn test_rectangular_validation() {
        let err = Chunk::new(vec![
            num_col("a", &[1.0, 2.0]),
            num_col("b", &[1.0]),
        ])
        .unwrap_err();
        assert!(matches!(err, FrameError::RaggedColumns { .. }));
    }

    #[test]
    fn test_duplicate_column_rejected() {
        let err = Chunk::new(vec![num_col("a", &[1.0]), num_col("a", &[2.0])]).unwrap_err();
        assert!(matches!(err, FrameError::DuplicateColumn(name) if name == "a"));
    }

    #[test]
    fn test_push_column_checks_length() {
        let mut chunk = Chunk::new(vec![num_col("a", &[1.0, 2.0])]).unwrap();
        let err = chunk.push_column(num_col("b", &[1.0])).unwrap_err();
        assert!(matches!(err, FrameError::RaggedColumns { .. }));

        chunk.push_column(num_col("b", &[3.0, 4.0])).unwrap();
        assert_eq!(chunk.column_names(), vec!["a", "b"]);
    }

    #[test]
    fn test_probe_flag_and_start_row() {
        let probe = Chunk::probe(vec![num_col("a", &[1.0])]).unwrap();
        assert!(probe.is_probe());

        let real = Chunk::new(vec![num_col("a", &[1.0])])
            .unwrap()
            .with_start_row(7);
        assert!(!real.is_probe());
        assert_eq!(real.start_row(), 7);
    }
}

//! CSV persistence for transformed chunks
//!
//! Writes the header from the first chunk it sees, then appends rows in
//! arrival order. The driver never hands probe chunks to a sink, so the
//! header always reflects the lag-augmented real-chunk shape.

use lagpipe_engine::error::{EngineError, Result};
use lagpipe_engine::ChunkSink;
use lagpipe_frame::Chunk;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Appending CSV writer implementing `ChunkSink`
pub struct CsvSink {
    writer: BufWriter<File>,
    header: Option<Vec<String>>,
    rows_written: usize,
}

impl CsvSink {
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::create(path.as_ref())?;
        Ok(Self {
            writer: BufWriter::new(file),
            header: None,
            rows_written: 0,
        })
    }

    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    /// Flush buffered output; call once after the run completes
    pub fn finish(mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

impl ChunkSink for CsvSink {
    fn write_chunk(&mut self, chunk: Chunk) -> Result<()> {
        let names: Vec<String> = chunk
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect();
        match &self.header {
            None => {
                writeln!(self.writer, "{}", names.join(","))?;
                self.header = Some(names);
            }
            Some(expected) if *expected == names => {}
            Some(expected) => {
                return Err(EngineError::SchemaMismatch(format!(
                    "sink columns changed: expected {expected:?}, got {names:?}"
                )));
            }
        }

        for row in 0..chunk.row_count() {
            let mut line = String::new();
            for (i, column) in chunk.columns().iter().enumerate() {
                if i > 0 {
                    line.push(',');
                }
                line.push_str(&column.values[row].to_string());
            }
            writeln!(self.writer, "{line}")?;
        }
        self.rows_written += chunk.row_count();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::read_table;
    use lagpipe_frame::{Column, Table, Value};
    use tempfile::tempdir;

    #[test]
    fn test_write_and_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.csv");

        let table = Table::new(vec![
            Column::new("cnt", vec![Value::Number(10.0), Value::Number(20.0)]),
            Column::new(
                "season",
                vec![
                    Value::Categorical("spring".into()),
                    Value::Categorical("winter".into()),
                ],
            ),
        ])
        .unwrap();

        let mut sink = CsvSink::create(&path).unwrap();
        for chunk in table.to_chunks(1) {
            sink.write_chunk(chunk).unwrap();
        }
        assert_eq!(sink.rows_written(), 2);
        sink.finish().unwrap();

        let reloaded = read_table(&path).unwrap();
        assert_eq!(reloaded, table);
    }

    #[test]
    fn test_schema_change_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let mut sink = CsvSink::create(&path).unwrap();

        let a = Chunk::new(vec![Column::new("a", vec![Value::Number(1.0)])]).unwrap();
        let b = Chunk::new(vec![Column::new("b", vec![Value::Number(1.0)])]).unwrap();
        sink.write_chunk(a).unwrap();
        assert!(matches!(
            sink.write_chunk(b).unwrap_err(),
            EngineError::SchemaMismatch(_)
        ));
    }
}

//! Chunk stream endpoints
//!
//! Sources yield chunks strictly in stream order, with probe chunks (if any)
//! first. Sinks append output chunks in the order produced and never reorder.
//! The in-memory implementations back the tests and small in-process runs;
//! file-backed implementations live in the pipeline crate.

use crate::error::Result;
use lagpipe_frame::{Chunk, Table};
use std::collections::VecDeque;

/// Ordered producer of chunks
pub trait ChunkSource {
    /// Next chunk in stream order, or `None` when the stream is exhausted.
    /// An error is fatal for the run.
    fn next_chunk(&mut self) -> Result<Option<Chunk>>;
}

impl<T: ChunkSource + ?Sized> ChunkSource for Box<T> {
    fn next_chunk(&mut self) -> Result<Option<Chunk>> {
        (**self).next_chunk()
    }
}

/// Ordered consumer of output chunks
pub trait ChunkSink {
    /// Append one chunk to persisted output
    fn write_chunk(&mut self, chunk: Chunk) -> Result<()>;
}

/// Source over a pre-built sequence of chunks
pub struct MemorySource {
    chunks: VecDeque<Chunk>,
}

impl MemorySource {
    pub fn new(chunks: Vec<Chunk>) -> Self {
        Self {
            chunks: chunks.into(),
        }
    }

    /// Chunk a table and prepend an optional probe holding its first
    /// `probe_rows` rows.
    pub fn from_table(table: &Table, chunk_size: usize, probe_rows: usize) -> Result<Self> {
        let mut chunks = Vec::new();
        if probe_rows > 0 && !table.is_empty() {
            let rows: Vec<usize> = (0..probe_rows.min(table.row_count())).collect();
            let head = table.select_rows(&rows);
            chunks.push(Chunk::probe(head.columns().to_vec())?);
        }
        chunks.extend(table.to_chunks(chunk_size));
        Ok(Self::new(chunks))
    }
}

impl ChunkSource for MemorySource {
    fn next_chunk(&mut self) -> Result<Option<Chunk>> {
        Ok(self.chunks.pop_front())
    }
}

/// Sink collecting output chunks in memory
#[derive(Default)]
pub struct MemorySink {
    chunks: Vec<Chunk>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// Concatenate everything written so far into one table
    pub fn into_table(self) -> Result<Table> {
        Ok(Table::from_chunks(&self.chunks)?)
    }
}

impl ChunkSink for MemorySink {
    fn write_chunk(&mut self, chunk: Chunk) -> Result<()> {
        self.chunks.push(chunk);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lagpipe_frame::{Column, Value};

    fn table(vals: &[f64]) -> Table {
        Table::new(vec![Column::new(
            "x",
            vals.iter().map(|v| Value::Number(*v)).collect(),
        )])
        .unwrap()
    }

    #[test]
    fn test_from_table_emits_probe_first() {
        let t = table(&[1.0, 2.0, 3.0, 4.0]);
        let mut source = MemorySource::from_table(&t, 2, 2).unwrap();

        let probe = source.next_chunk().unwrap().unwrap();
        assert!(probe.is_probe());
        assert_eq!(probe.row_count(), 2);

        // Probe rows are replayed: real chunks cover the whole table.
        let mut rows = 0;
        while let Some(chunk) = source.next_chunk().unwrap() {
            assert!(!chunk.is_probe());
            assert_eq!(chunk.start_row(), rows);
            rows += chunk.row_count();
        }
        assert_eq!(rows, 4);
    }

    #[test]
    fn test_no_probe_when_disabled() {
        let t = table(&[1.0, 2.0]);
        let mut source = MemorySource::from_table(&t, 10, 0).unwrap();
        assert!(!source.next_chunk().unwrap().unwrap().is_probe());
        assert!(source.next_chunk().unwrap().is_none());
    }
}

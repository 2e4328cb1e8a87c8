//! Chunked CSV ingestion
//!
//! Streams a headered CSV through a buffered reader, coercing each cell into
//! a typed `Value`, and yields bounded chunks so arbitrarily large files
//! never have to fit in memory. When configured with `probe_rows > 0` the
//! source first emits those leading rows as one schema-probe chunk, then
//! replays them (buffered, not re-read) at the start of the real stream.
//!
//! Cells are coerced in order: empty or `NA` → missing, integer/float →
//! number, `YYYY-MM-DD` → date, anything else → categorical. Fields are
//! comma-split without quoting support, matching the datasets this pipeline
//! targets.

use anyhow::Context;
use chrono::NaiveDate;
use lagpipe_engine::error::{EngineError, Result};
use lagpipe_engine::ChunkSource;
use lagpipe_frame::{Chunk, Column, Table, Value};
use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;

/// Coerce one CSV cell into a typed value
pub fn coerce_cell(cell: &str) -> Value {
    let cell = cell.trim();
    if cell.is_empty() || cell == "NA" {
        return Value::Missing;
    }
    if let Ok(n) = cell.parse::<f64>() {
        return Value::Number(n);
    }
    if let Ok(d) = NaiveDate::parse_from_str(cell, "%Y-%m-%d") {
        return Value::Date(d);
    }
    Value::Categorical(cell.to_string())
}

/// Chunking knobs for one CSV read
#[derive(Debug, Clone, Copy)]
pub struct CsvReadConfig {
    /// Rows per real chunk
    pub chunk_size: usize,
    /// Leading rows emitted first as one schema-probe chunk (0 disables)
    pub probe_rows: usize,
}

impl Default for CsvReadConfig {
    fn default() -> Self {
        Self {
            chunk_size: 10_000,
            probe_rows: 10,
        }
    }
}

/// Streaming chunk source over one CSV file
#[derive(Debug)]
pub struct CsvSource {
    header: Vec<String>,
    lines: Lines<BufReader<File>>,
    config: CsvReadConfig,
    /// Probe rows buffered for replay into the real stream
    replay: VecDeque<Vec<Value>>,
    probe_emitted: bool,
    rows_emitted: usize,
    line_number: usize,
}

impl CsvSource {
    pub fn open(path: impl AsRef<Path>, config: CsvReadConfig) -> Result<Self> {
        if config.chunk_size == 0 {
            return Err(EngineError::UpstreamSourceFailure(
                "chunk size must be positive".to_string(),
            ));
        }
        let file = File::open(path.as_ref())?;
        let mut lines = BufReader::new(file).lines();
        let header_line = match lines.next() {
            Some(line) => line?,
            None => {
                return Err(EngineError::UpstreamSourceFailure(format!(
                    "{}: empty file, no header",
                    path.as_ref().display()
                )))
            }
        };
        let header: Vec<String> = header_line.split(',').map(|s| s.trim().to_string()).collect();
        Ok(Self {
            header,
            lines,
            config,
            replay: VecDeque::new(),
            probe_emitted: false,
            rows_emitted: 0,
            line_number: 1,
        })
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Read and coerce the next data row, if any
    fn read_row(&mut self) -> Result<Option<Vec<Value>>> {
        loop {
            let Some(line) = self.lines.next() else {
                return Ok(None);
            };
            let line = line?;
            self.line_number += 1;
            if line.trim().is_empty() {
                continue;
            }
            let cells: Vec<&str> = line.split(',').collect();
            if cells.len() != self.header.len() {
                return Err(EngineError::UpstreamSourceFailure(format!(
                    "line {}: expected {} fields, got {}",
                    self.line_number,
                    self.header.len(),
                    cells.len()
                )));
            }
            return Ok(Some(cells.into_iter().map(coerce_cell).collect()));
        }
    }

    /// Assemble row-major rows into a column-major chunk
    fn rows_to_columns(&self, rows: &[Vec<Value>]) -> Vec<Column> {
        self.header
            .iter()
            .enumerate()
            .map(|(i, name)| {
                Column::new(
                    name.clone(),
                    rows.iter().map(|row| row[i].clone()).collect(),
                )
            })
            .collect()
    }
}

impl ChunkSource for CsvSource {
    fn next_chunk(&mut self) -> Result<Option<Chunk>> {
        if !self.probe_emitted && self.config.probe_rows > 0 {
            self.probe_emitted = true;
            let mut rows = Vec::new();
            while rows.len() < self.config.probe_rows {
                match self.read_row()? {
                    Some(row) => rows.push(row),
                    None => break,
                }
            }
            if !rows.is_empty() {
                let columns = self.rows_to_columns(&rows);
                self.replay.extend(rows);
                return Ok(Some(Chunk::probe(columns)?));
            }
            return Ok(None);
        }

        let mut rows = Vec::new();
        while rows.len() < self.config.chunk_size {
            if let Some(row) = self.replay.pop_front() {
                rows.push(row);
                continue;
            }
            match self.read_row()? {
                Some(row) => rows.push(row),
                None => break,
            }
        }
        if rows.is_empty() {
            return Ok(None);
        }

        let columns = self.rows_to_columns(&rows);
        let chunk = Chunk::new(columns)?.with_start_row(self.rows_emitted);
        self.rows_emitted += rows.len();
        Ok(Some(chunk))
    }
}

/// Materialize a whole CSV file as one table. Used for small side inputs
/// (join lookups) and for reloading a transformed dataset for training.
pub fn read_table(path: impl AsRef<Path>) -> anyhow::Result<Table> {
    let path = path.as_ref();
    let config = CsvReadConfig {
        chunk_size: usize::MAX,
        probe_rows: 0,
    };
    let mut source = CsvSource::open(path, config)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let mut chunks = Vec::new();
    while let Some(chunk) = source
        .next_chunk()
        .with_context(|| format!("failed to read {}", path.display()))?
    {
        chunks.push(chunk);
    }
    if chunks.is_empty() {
        // Header-only file: preserve the schema with zero rows.
        let columns = source
            .header()
            .iter()
            .map(|name| Column::new(name.clone(), Vec::new()))
            .collect();
        return Ok(Table::new(columns)?);
    }
    Ok(Table::from_chunks(&chunks)?)
}

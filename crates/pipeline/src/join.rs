//! Keyed left join against a small lookup table
//!
//! The lookup table is materialized into a hash map keyed by the display form
//! of its key cells; the main stream is joined chunk by chunk, appending the
//! lookup's non-key columns. Unmatched rows get `Missing` cells, and rows of
//! a duplicated lookup key resolve to the first occurrence.

use lagpipe_engine::error::{EngineError, Result};
use lagpipe_engine::ChunkSource;
use lagpipe_frame::{Chunk, Column, Table, Value};
use std::collections::HashMap;
use tracing::warn;

/// Prepared join against one lookup table
#[derive(Debug, Clone)]
pub struct Joiner {
    keys: Vec<String>,
    /// Lookup columns appended to the main stream, in lookup order
    append_names: Vec<String>,
    rows: HashMap<Vec<String>, Vec<Value>>,
}

impl Joiner {
    pub fn build(lookup: &Table, keys: &[String]) -> Result<Self> {
        if keys.is_empty() {
            return Err(EngineError::SchemaMismatch(
                "join requires at least one key column".to_string(),
            ));
        }
        for key in keys {
            lookup.require_column(key)?;
        }
        let append_names: Vec<String> = lookup
            .column_names()
            .into_iter()
            .filter(|name| !keys.iter().any(|k| k == name))
            .map(str::to_string)
            .collect();

        let mut rows: HashMap<Vec<String>, Vec<Value>> =
            HashMap::with_capacity(lookup.row_count());
        for row in 0..lookup.row_count() {
            let key: Vec<String> = keys
                .iter()
                .filter_map(|k| lookup.column(k).map(|c| c.values[row].to_string()))
                .collect();
            let values: Vec<Value> = append_names
                .iter()
                .filter_map(|name| lookup.column(name).map(|c| c.values[row].clone()))
                .collect();
            if rows.contains_key(&key) {
                warn!(?key, "duplicate lookup key, keeping first occurrence");
                continue;
            }
            rows.insert(key, values);
        }

        Ok(Self {
            keys: keys.to_vec(),
            append_names,
            rows,
        })
    }

    pub fn appended_columns(&self) -> &[String] {
        &self.append_names
    }

    /// Join one chunk, preserving probe/position metadata
    pub fn join_chunk(&self, chunk: Chunk) -> Result<Chunk> {
        for key in &self.keys {
            chunk.require_column(key)?;
        }
        for name in &self.append_names {
            if chunk.column(name).is_some() {
                return Err(EngineError::SchemaMismatch(format!(
                    "join would duplicate column '{name}'"
                )));
            }
        }

        let rows = chunk.row_count();
        let mut appended: Vec<Vec<Value>> = vec![Vec::with_capacity(rows); self.append_names.len()];
        for row in 0..rows {
            let key: Vec<String> = self
                .keys
                .iter()
                .filter_map(|k| chunk.column(k).map(|c| c.values[row].to_string()))
                .collect();
            match self.rows.get(&key) {
                Some(values) => {
                    for (slot, value) in appended.iter_mut().zip(values) {
                        slot.push(value.clone());
                    }
                }
                None => {
                    for slot in appended.iter_mut() {
                        slot.push(Value::Missing);
                    }
                }
            }
        }

        let mut out = chunk;
        for (name, values) in self.append_names.iter().zip(appended) {
            out.push_column(Column::new(name.clone(), values))?;
        }
        Ok(out)
    }

    pub fn join_table(&self, table: &Table) -> Result<Table> {
        let chunk = Chunk::new(table.columns().to_vec())?;
        let joined = self.join_chunk(chunk)?;
        Ok(Table::new(joined.into_columns())?)
    }
}

/// `ChunkSource` adapter that joins every chunk it forwards
pub struct JoiningSource<S> {
    inner: S,
    joiner: Joiner,
}

impl<S: ChunkSource> JoiningSource<S> {
    pub fn new(inner: S, joiner: Joiner) -> Self {
        Self { inner, joiner }
    }
}

impl<S: ChunkSource> ChunkSource for JoiningSource<S> {
    fn next_chunk(&mut self) -> Result<Option<Chunk>> {
        match self.inner.next_chunk()? {
            Some(chunk) => Ok(Some(self.joiner.join_chunk(chunk)?)),
            None => Ok(None),
        }
    }
}

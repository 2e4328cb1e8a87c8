//! Missing-value imputation
//!
//! Fit-then-apply: one pass over the raw stream accumulates per-column
//! statistics, `finish` freezes them into an `ImputePlan`, and the plan fills
//! `Missing` cells either table-at-a-time or on the fly through the
//! `ImputingSource` adapter. Numeric columns take the mean of their present
//! values; categorical and date columns take the mode, with ties broken by
//! first appearance in the stream.

use lagpipe_engine::error::Result;
use lagpipe_engine::ChunkSource;
use lagpipe_frame::{Chunk, Column, Table, Value};
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Default)]
struct ColumnStats {
    sum: f64,
    numeric_count: usize,
    /// Non-numeric occurrences in first-seen order: (display key, value, count)
    occurrences: Vec<(String, Value, usize)>,
    missing: usize,
}

impl ColumnStats {
    fn observe(&mut self, value: &Value) {
        match value {
            Value::Missing => self.missing += 1,
            Value::Number(n) => {
                self.sum += n;
                self.numeric_count += 1;
            }
            other => {
                let key = other.to_string();
                match self.occurrences.iter_mut().find(|(k, _, _)| *k == key) {
                    Some(entry) => entry.2 += 1,
                    None => self.occurrences.push((key, other.clone(), 1)),
                }
            }
        }
    }

    fn fill_value(&self) -> Option<Value> {
        if self.numeric_count > 0 {
            return Some(Value::Number(self.sum / self.numeric_count as f64));
        }
        self.occurrences
            .iter()
            .max_by_key(|(_, _, count)| *count)
            .map(|(_, value, _)| value.clone())
    }
}

/// Accumulates column statistics over an ordered stream of chunks
#[derive(Debug, Default)]
pub struct ImputeAccumulator {
    stats: BTreeMap<String, ColumnStats>,
}

impl ImputeAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe_chunk(&mut self, chunk: &Chunk) {
        for column in chunk.columns() {
            let stats = self.stats.entry(column.name.clone()).or_default();
            for value in &column.values {
                stats.observe(value);
            }
        }
    }

    /// Drain a source to exhaustion, then freeze the plan
    pub fn fit_source<S: ChunkSource>(mut source: S) -> Result<ImputePlan> {
        let mut acc = Self::new();
        while let Some(chunk) = source.next_chunk()? {
            acc.observe_chunk(&chunk);
        }
        Ok(acc.finish())
    }

    pub fn finish(self) -> ImputePlan {
        let fills: BTreeMap<String, Value> = self
            .stats
            .iter()
            .filter(|(_, stats)| stats.missing > 0)
            .filter_map(|(name, stats)| stats.fill_value().map(|v| (name.clone(), v)))
            .collect();
        debug!(columns = fills.len(), "impute plan fitted");
        ImputePlan { fills }
    }
}

/// Frozen per-column fill values
#[derive(Debug, Clone)]
pub struct ImputePlan {
    fills: BTreeMap<String, Value>,
}

impl ImputePlan {
    /// Fit a plan over a materialized table
    pub fn fit(table: &Table) -> Self {
        let mut acc = ImputeAccumulator::new();
        for column in table.columns() {
            let stats = acc.stats.entry(column.name.clone()).or_default();
            for value in &column.values {
                stats.observe(value);
            }
        }
        acc.finish()
    }

    pub fn fill_for(&self, column: &str) -> Option<&Value> {
        self.fills.get(column)
    }

    /// Fill missing cells in one chunk, preserving probe/position metadata
    pub fn apply_chunk(&self, chunk: Chunk) -> Result<Chunk> {
        let is_probe = chunk.is_probe();
        let start_row = chunk.start_row();
        let columns: Vec<Column> = chunk
            .into_columns()
            .into_iter()
            .map(|mut column| {
                if let Some(fill) = self.fills.get(&column.name) {
                    for value in &mut column.values {
                        if value.is_missing() {
                            *value = fill.clone();
                        }
                    }
                }
                column
            })
            .collect();
        let rebuilt = if is_probe {
            Chunk::probe(columns)?
        } else {
            Chunk::new(columns)?.with_start_row(start_row)
        };
        Ok(rebuilt)
    }

    pub fn apply_table(&self, table: &Table) -> Result<Table> {
        let columns = table
            .columns()
            .iter()
            .map(|c| {
                let mut column = Column::new(c.name.clone(), c.values.clone());
                if let Some(fill) = self.fills.get(&column.name) {
                    for value in &mut column.values {
                        if value.is_missing() {
                            *value = fill.clone();
                        }
                    }
                }
                column
            })
            .collect();
        Ok(Table::new(columns)?)
    }
}

/// `ChunkSource` adapter that imputes every chunk it forwards
pub struct ImputingSource<S> {
    inner: S,
    plan: ImputePlan,
}

impl<S: ChunkSource> ImputingSource<S> {
    pub fn new(inner: S, plan: ImputePlan) -> Self {
        Self { inner, plan }
    }
}

impl<S: ChunkSource> ChunkSource for ImputingSource<S> {
    fn next_chunk(&mut self) -> Result<Option<Chunk>> {
        match self.inner.next_chunk()? {
            Some(chunk) => Ok(Some(self.plan.apply_chunk(chunk)?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lagpipe_engine::MemorySource;

    fn raw_table() -> Table {
        Table::new(vec![
            Column::new(
                "temp",
                vec![
                    Value::Number(0.2),
                    Value::Missing,
                    Value::Number(0.6),
                ],
            ),
            Column::new(
                "weather",
                vec![
                    Value::Categorical("clear".into()),
                    Value::Categorical("clear".into()),
                    Value::Missing,
                ],
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_mean_fill_for_numeric() {
        let plan = ImputePlan::fit(&raw_table());
        assert_eq!(plan.fill_for("temp"), Some(&Value::Number(0.4)));
    }

    #[test]
    fn test_mode_fill_for_categorical() {
        let plan = ImputePlan::fit(&raw_table());
        assert_eq!(
            plan.fill_for("weather"),
            Some(&Value::Categorical("clear".into()))
        );
    }

    #[test]
    fn test_mode_tie_breaks_by_first_seen() {
        let table = Table::new(vec![Column::new(
            "w",
            vec![
                Value::Categorical("mist".into()),
                Value::Categorical("rain".into()),
                Value::Missing,
            ],
        )])
        .unwrap();
        let plan = ImputePlan::fit(&table);
        assert_eq!(plan.fill_for("w"), Some(&Value::Categorical("mist".into())));
    }

    #[test]
    fn test_fully_observed_column_gets_no_fill() {
        let plan = ImputePlan::fit(&raw_table());
        assert_eq!(plan.fill_for("nonexistent"), None);
    }

    #[test]
    fn test_imputing_source_fills_stream() {
        let table = raw_table();
        let plan = ImputePlan::fit(&table);
        let source = MemorySource::new(table.to_chunks(2));
        let mut imputing = ImputingSource::new(source, plan);

        let mut values = Vec::new();
        while let Some(chunk) = imputing.next_chunk().unwrap() {
            values.extend(chunk.column("temp").unwrap().values.clone());
        }
        assert_eq!(
            values,
            vec![
                Value::Number(0.2),
                Value::Number(0.4),
                Value::Number(0.6)
            ]
        );
    }

    #[test]
    fn test_apply_preserves_probe_metadata() {
        let plan = ImputePlan::fit(&raw_table());
        let probe = Chunk::probe(vec![Column::new("temp", vec![Value::Missing])]).unwrap();
        let out = plan.apply_chunk(probe).unwrap();
        assert!(out.is_probe());
        assert_eq!(out.column("temp").unwrap().values[0], Value::Number(0.4));
    }
}

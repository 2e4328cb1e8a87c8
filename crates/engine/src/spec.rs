//! Lag configuration
//!
//! A `LagSpec` is immutable once built: the constructor rejects bad offset
//! sets before any chunk is processed, so the per-chunk path never has to
//! re-validate configuration.

use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Validated lag-feature configuration: one source column, one or more
/// distinct positive offsets, and an output-naming rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LagSpec {
    source_column: String,
    offsets: Vec<usize>,
    output_names: BTreeMap<usize, String>,
}

impl LagSpec {
    /// Build a spec with the default naming rule `<sourceColumn>_<offset>`.
    pub fn new(source_column: impl Into<String>, offsets: Vec<usize>) -> Result<Self> {
        let source_column = source_column.into();
        if source_column.is_empty() {
            return Err(EngineError::InvalidLagSpec(
                "source column name is empty".to_string(),
            ));
        }
        if offsets.is_empty() {
            return Err(EngineError::InvalidLagSpec(
                "no lag offsets configured".to_string(),
            ));
        }
        for (i, &k) in offsets.iter().enumerate() {
            if k == 0 {
                return Err(EngineError::InvalidLagSpec(
                    "offsets must be positive".to_string(),
                ));
            }
            if offsets[..i].contains(&k) {
                return Err(EngineError::InvalidLagSpec(format!(
                    "duplicate offset {k}"
                )));
            }
        }
        let output_names = offsets
            .iter()
            .map(|&k| (k, format!("{source_column}_{k}")))
            .collect();
        Ok(Self {
            source_column,
            offsets,
            output_names,
        })
    }

    /// Override the output column name for one configured offset.
    pub fn with_output_name(mut self, offset: usize, name: impl Into<String>) -> Result<Self> {
        if !self.offsets.contains(&offset) {
            return Err(EngineError::InvalidLagSpec(format!(
                "offset {offset} is not configured"
            )));
        }
        self.output_names.insert(offset, name.into());
        Ok(self)
    }

    pub fn source_column(&self) -> &str {
        &self.source_column
    }

    /// Offsets in configuration order
    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    pub fn max_offset(&self) -> usize {
        self.offsets.iter().copied().max().unwrap_or(0)
    }

    /// Output column name for one offset
    pub fn output_name(&self, offset: usize) -> &str {
        // Constructor guarantees every configured offset has an entry.
        &self.output_names[&offset]
    }
}

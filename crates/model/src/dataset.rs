//! Feature matrix extraction
//!
//! Turns a materialized table into the row-major `f64` matrix the trainer
//! consumes. Encoding is fitted on the training table and reused on held-out
//! rows so categorical codes stay consistent across the split: categorical
//! levels map to their index in the sorted level set, dates to days since the
//! common era, numbers pass through. Missing cells are an error here —
//! imputation is an upstream stage.

use crate::error::{ModelError, Result};
use lagpipe_frame::{Table, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

/// Encoded training or scoring data
#[derive(Debug, Clone)]
pub struct Dataset {
    pub features: Vec<Vec<f64>>,
    pub targets: Vec<f64>,
    pub feature_names: Vec<String>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn feature_count(&self) -> usize {
        self.feature_names.len()
    }
}

/// Column encoding fitted on the training table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetEncoder {
    feature_columns: Vec<String>,
    target_column: String,
    /// Sorted level sets for categorical feature columns
    levels: BTreeMap<String, Vec<String>>,
}

impl DatasetEncoder {
    /// Learn the level sets of every categorical feature column.
    pub fn fit(
        table: &Table,
        feature_columns: &[String],
        target_column: impl Into<String>,
    ) -> Result<Self> {
        let mut levels = BTreeMap::new();
        for name in feature_columns {
            let column = table.require_column(name)?;
            let mut seen: Vec<String> = Vec::new();
            for value in &column.values {
                if let Value::Categorical(level) = value {
                    if !seen.contains(level) {
                        seen.push(level.clone());
                    }
                }
            }
            if !seen.is_empty() {
                seen.sort();
                levels.insert(name.clone(), seen);
            }
        }
        Ok(Self {
            feature_columns: feature_columns.to_vec(),
            target_column: target_column.into(),
            levels,
        })
    }

    pub fn feature_columns(&self) -> &[String] {
        &self.feature_columns
    }

    /// Encode one table with the fitted mapping. Levels never seen during
    /// `fit` land in a shared overflow code one past the known levels.
    pub fn encode(&self, table: &Table) -> Result<Dataset> {
        let rows = table.row_count();
        if rows == 0 {
            return Err(ModelError::EmptyDataset);
        }

        let mut features = vec![Vec::with_capacity(self.feature_columns.len()); rows];
        for name in &self.feature_columns {
            let column = table.require_column(name)?;
            for (row, value) in column.values.iter().enumerate() {
                features[row].push(self.encode_cell(name, value, row)?);
            }
        }

        let target = table.require_column(&self.target_column)?;
        let mut targets = Vec::with_capacity(rows);
        for (row, value) in target.values.iter().enumerate() {
            match value.as_number() {
                Some(n) => targets.push(n),
                None => {
                    return Err(ModelError::MissingValue {
                        column: self.target_column.clone(),
                        row,
                    })
                }
            }
        }

        Ok(Dataset {
            features,
            targets,
            feature_names: self.feature_columns.clone(),
        })
    }

    fn encode_cell(&self, column: &str, value: &Value, row: usize) -> Result<f64> {
        match value {
            Value::Number(n) => Ok(*n),
            Value::Date(_) => Ok(value
                .as_date_ordinal()
                .map(|d| d as f64)
                .unwrap_or_default()),
            Value::Categorical(level) => {
                let known = self.levels.get(column).map(Vec::as_slice).unwrap_or(&[]);
                match known.binary_search(level) {
                    Ok(code) => Ok(code as f64),
                    Err(_) => {
                        warn!(column, level = %level, "unseen categorical level, using overflow code");
                        Ok(known.len() as f64)
                    }
                }
            }
            Value::Missing => Err(ModelError::MissingValue {
                column: column.to_string(),
                row,
            }),
        }
    }
}

//! Scalar cell values
//!
//! Every cell in the pipeline is one of four shapes. All rows in a run share
//! one schema, so a column's values are expected (but not forced) to be
//! homogeneous apart from `Missing` holes that imputation fills upstream.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single cell value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Numeric value (integers are stored as whole floats)
    Number(f64),
    /// Categorical level
    Categorical(String),
    /// Calendar date
    Date(NaiveDate),
    /// Absent cell, awaiting imputation
    Missing,
}

impl Value {
    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    /// Numeric view of the value, if it has one
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Days since the common era, for dates
    pub fn as_date_ordinal(&self) -> Option<i64> {
        match self {
            Value::Date(d) => Some(i64::from(d.num_days_from_ce())),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => {
                // Whole numbers print without a fractional part so CSV
                // output round-trips through integer coercion.
                if n.fract() == 0.0 && n.abs() < 9e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{n}")
                }
            }
            Value::Categorical(s) => write!(f, "{s}"),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::Missing => Ok(()),
        }
    }
}

//! Regression error metrics
//!
//! MAE, RMSE, and RAE (relative absolute error: total absolute error divided
//! by the total absolute deviation of the actuals from their own mean, so 1.0
//! means "no better than predicting the mean").

use crate::error::{ModelError, Result};
use serde::{Deserialize, Serialize};

/// Evaluation summary for one scored set
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RegressionReport {
    pub mae: f64,
    pub rmse: f64,
    pub rae: f64,
}

/// Compare predictions against actual values, in matching order.
pub fn evaluate(predicted: &[f64], actual: &[f64]) -> Result<RegressionReport> {
    if predicted.len() != actual.len() {
        return Err(ModelError::LengthMismatch {
            predicted: predicted.len(),
            actual: actual.len(),
        });
    }
    if actual.is_empty() {
        return Err(ModelError::EmptyDataset);
    }

    let n = actual.len() as f64;
    let mut abs_sum = 0.0;
    let mut sq_sum = 0.0;
    for (p, a) in predicted.iter().zip(actual) {
        let err = p - a;
        abs_sum += err.abs();
        sq_sum += err * err;
    }

    let mean = actual.iter().sum::<f64>() / n;
    let deviation: f64 = actual.iter().map(|a| (a - mean).abs()).sum();

    // Constant actuals leave RAE undefined; infinity for any error at all,
    // zero for a perfect fit.
    let rae = if deviation > 0.0 {
        abs_sum / deviation
    } else if abs_sum > 0.0 {
        f64::INFINITY
    } else {
        0.0
    };

    Ok(RegressionReport {
        mae: abs_sum / n,
        rmse: (sq_sum / n).sqrt(),
        rae,
    })
}

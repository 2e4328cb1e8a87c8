//! Gradient-boosted regression forest
//!
//! Squared-error boosting: the model starts from the target mean, then each
//! tree fits the residual gradients (gradient = prediction − target, constant
//! unit hessian) and contributes its output scaled by the learning rate.
//! Training is deterministic for a given dataset ordering.

use crate::cart::{CartBuilder, Tree, TreeConfig};
use crate::dataset::Dataset;
use crate::error::{ModelError, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Boosting configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ForestConfig {
    pub num_trees: usize,
    pub max_depth: usize,
    pub min_samples_leaf: usize,
    pub learning_rate: f64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            num_trees: 64,
            max_depth: 6,
            min_samples_leaf: 8,
            learning_rate: 0.1,
        }
    }
}

/// Trained regression model
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Forest {
    pub trees: Vec<Tree>,
    pub bias: f64,
    pub learning_rate: f64,
    pub feature_names: Vec<String>,
}

impl Forest {
    /// Score one feature vector
    pub fn predict_row(&self, features: &[f64]) -> f64 {
        let mut sum = self.bias;
        for tree in &self.trees {
            sum += self.learning_rate * tree.eval(features);
        }
        sum
    }

    /// Score many rows in input order
    pub fn predict(&self, features: &[Vec<f64>]) -> Vec<f64> {
        features.iter().map(|row| self.predict_row(row)).collect()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Fits a `Forest` to an encoded dataset
pub struct ForestTrainer {
    config: ForestConfig,
}

impl ForestTrainer {
    pub fn new(config: ForestConfig) -> Self {
        Self { config }
    }

    pub fn train(&self, dataset: &Dataset) -> Result<Forest> {
        if dataset.is_empty() {
            return Err(ModelError::EmptyDataset);
        }

        let n = dataset.len();
        let bias = dataset.targets.iter().sum::<f64>() / n as f64;
        let mut predictions = vec![bias; n];
        let hessians = vec![1.0; n];

        let mut trees = Vec::with_capacity(self.config.num_trees);
        for tree_idx in 0..self.config.num_trees {
            let gradients: Vec<f64> = predictions
                .iter()
                .zip(&dataset.targets)
                .map(|(pred, target)| pred - target)
                .collect();

            let tree_config = TreeConfig {
                max_depth: self.config.max_depth,
                min_samples_leaf: self.config.min_samples_leaf,
            };
            let tree =
                CartBuilder::new(&dataset.features, &gradients, &hessians, tree_config).build();

            for (pred, row) in predictions.iter_mut().zip(&dataset.features) {
                *pred += self.config.learning_rate * tree.eval(row);
            }

            debug!(tree = tree_idx + 1, nodes = tree.nodes.len(), "tree fitted");
            trees.push(tree);
        }

        Ok(Forest {
            trees,
            bias,
            learning_rate: self.config.learning_rate,
            feature_names: dataset.feature_names.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::evaluate;

    fn linear_dataset() -> Dataset {
        // target = 3x + noiseless offset; plenty of distinct split points
        let features: Vec<Vec<f64>> = (0..24).map(|i| vec![i as f64]).collect();
        let targets: Vec<f64> = (0..24).map(|i| 3.0 * i as f64 + 5.0).collect();
        Dataset {
            features,
            targets,
            feature_names: vec!["x".to_string()],
        }
    }

    fn small_config() -> ForestConfig {
        ForestConfig {
            num_trees: 30,
            max_depth: 3,
            min_samples_leaf: 1,
            learning_rate: 0.3,
        }
    }

    #[test]
    fn test_boosting_beats_the_mean() {
        let dataset = linear_dataset();
        let forest = ForestTrainer::new(small_config()).train(&dataset).unwrap();

        let predictions = forest.predict(&dataset.features);
        let fitted = evaluate(&predictions, &dataset.targets).unwrap();

        let mean = dataset.targets.iter().sum::<f64>() / dataset.targets.len() as f64;
        let baseline = evaluate(&vec![mean; dataset.len()], &dataset.targets).unwrap();

        assert!(
            fitted.mae < baseline.mae / 2.0,
            "boosting should cut MAE well below the mean baseline: {} vs {}",
            fitted.mae,
            baseline.mae
        );
    }

    #[test]
    fn test_predictions_track_feature_ordering() {
        let dataset = linear_dataset();
        let forest = ForestTrainer::new(small_config()).train(&dataset).unwrap();
        assert!(forest.predict_row(&[2.0]) < forest.predict_row(&[21.0]));
    }

    #[test]
    fn test_training_is_deterministic() {
        let dataset = linear_dataset();
        let a = ForestTrainer::new(small_config()).train(&dataset).unwrap();
        let b = ForestTrainer::new(small_config()).train(&dataset).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_json_round_trip() {
        let dataset = linear_dataset();
        let forest = ForestTrainer::new(small_config()).train(&dataset).unwrap();
        let restored = Forest::from_json(&forest.to_json().unwrap()).unwrap();
        assert_eq!(forest, restored);
    }

    #[test]
    fn test_empty_dataset_rejected() {
        let dataset = Dataset {
            features: vec![],
            targets: vec![],
            feature_names: vec![],
        };
        let err = ForestTrainer::new(ForestConfig::default())
            .train(&dataset)
            .unwrap_err();
        assert!(matches!(err, ModelError::EmptyDataset));
    }
}

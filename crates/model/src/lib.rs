//! Regression collaborator for the lag pipeline
//!
//! Consumes the lag-augmented feature table, fits a gradient-boosted forest
//! of CART regression trees, and scores held-out rows.
//!
//! Modules:
//! - `dataset`: numeric encoding of tabular columns into feature matrices
//! - `cart`: exact-greedy regression tree construction
//! - `forest`: the boosting loop, prediction, and JSON model format
//! - `metrics`: MAE / RMSE / RAE evaluation

pub mod cart;
pub mod dataset;
pub mod error;
pub mod forest;
pub mod metrics;

pub use cart::{CartBuilder, Node, Tree, TreeConfig, MAX_TREE_DEPTH};
pub use dataset::{Dataset, DatasetEncoder};
pub use error::ModelError;
pub use forest::{Forest, ForestConfig, ForestTrainer};
pub use metrics::{evaluate, RegressionReport};

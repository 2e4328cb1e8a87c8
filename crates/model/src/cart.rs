//! CART regression tree construction
//!
//! Exact-greedy splitting over gradient/hessian sums: a split's gain is
//! G_left²/H_left + G_right²/H_right − G_parent²/H_parent and a leaf's value
//! is −G/H. Candidate thresholds are midpoints between consecutive distinct
//! feature values, so evaluation with `<=` reproduces the training partition
//! exactly. Ties keep the first candidate found, which makes construction
//! deterministic for a given input ordering.

use serde::{Deserialize, Serialize};

/// Deepest tree the builder will grow. A full binary tree at this depth has
/// 2^16 − 1 nodes, the largest count whose indices still fit the `u16` child
/// links in `Node`; configured depths above it are clamped.
pub const MAX_TREE_DEPTH: usize = 15;

/// Stopping parameters for a single tree
#[derive(Clone, Debug)]
pub struct TreeConfig {
    pub max_depth: usize,
    pub min_samples_leaf: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: 6,
            min_samples_leaf: 8,
        }
    }
}

/// A decision tree node (internal or leaf)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Node {
    /// Feature index to compare (internal nodes)
    pub feature_index: u16,
    /// Split threshold; rows with value <= threshold go left
    pub threshold: f64,
    /// Index of left child node
    pub left: u16,
    /// Index of right child node
    pub right: u16,
    /// Leaf value (None for internal nodes)
    pub value: Option<f64>,
}

impl Node {
    fn leaf(value: f64) -> Self {
        Self {
            feature_index: 0,
            threshold: 0.0,
            left: 0,
            right: 0,
            value: Some(value),
        }
    }
}

/// A single regression tree
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

impl Tree {
    /// Evaluate the tree on one feature vector. Malformed trees and
    /// out-of-range feature indices evaluate to 0.0 rather than panicking.
    pub fn eval(&self, features: &[f64]) -> f64 {
        let mut idx = 0usize;
        loop {
            let Some(node) = self.nodes.get(idx) else {
                return 0.0;
            };
            if let Some(value) = node.value {
                return value;
            }
            let Some(&feature_value) = features.get(node.feature_index as usize) else {
                return 0.0;
            };
            idx = if feature_value <= node.threshold {
                node.left as usize
            } else {
                node.right as usize
            };
        }
    }
}

struct SplitCandidate {
    feature_idx: usize,
    threshold: f64,
    gain: f64,
}

/// Builds one regression tree over borrowed training data
pub struct CartBuilder<'a> {
    config: TreeConfig,
    features: &'a [Vec<f64>],
    gradients: &'a [f64],
    hessians: &'a [f64],
    feature_count: usize,
}

impl<'a> CartBuilder<'a> {
    pub fn new(
        features: &'a [Vec<f64>],
        gradients: &'a [f64],
        hessians: &'a [f64],
        config: TreeConfig,
    ) -> Self {
        assert_eq!(features.len(), gradients.len());
        assert_eq!(features.len(), hessians.len());
        let feature_count = features.first().map_or(0, Vec::len);
        let config = TreeConfig {
            max_depth: config.max_depth.min(MAX_TREE_DEPTH),
            ..config
        };
        Self {
            config,
            features,
            gradients,
            hessians,
            feature_count,
        }
    }

    pub fn build(&self) -> Tree {
        let mut nodes = Vec::new();
        let indices: Vec<usize> = (0..self.features.len()).collect();
        self.build_node(&indices, 0, &mut nodes);
        Tree { nodes }
    }

    fn build_node(&self, indices: &[usize], depth: usize, nodes: &mut Vec<Node>) -> u16 {
        let current_idx = nodes.len() as u16;
        let leaf_value = self.leaf_value(indices);

        if depth >= self.config.max_depth || indices.len() < 2 * self.config.min_samples_leaf {
            nodes.push(Node::leaf(leaf_value));
            return current_idx;
        }

        let Some(split) = self.find_best_split(indices) else {
            nodes.push(Node::leaf(leaf_value));
            return current_idx;
        };

        let (left_indices, right_indices) =
            self.partition(indices, split.feature_idx, split.threshold);
        if left_indices.len() < self.config.min_samples_leaf
            || right_indices.len() < self.config.min_samples_leaf
        {
            nodes.push(Node::leaf(leaf_value));
            return current_idx;
        }

        // Reserve the internal node, then fill child links after recursion.
        nodes.push(Node {
            feature_index: split.feature_idx as u16,
            threshold: split.threshold,
            left: 0,
            right: 0,
            value: None,
        });

        let left_idx = self.build_node(&left_indices, depth + 1, nodes);
        let right_idx = self.build_node(&right_indices, depth + 1, nodes);
        nodes[current_idx as usize].left = left_idx;
        nodes[current_idx as usize].right = right_idx;

        current_idx
    }

    fn find_best_split(&self, indices: &[usize]) -> Option<SplitCandidate> {
        let mut best: Option<SplitCandidate> = None;

        for feature_idx in 0..self.feature_count {
            for threshold in self.candidate_thresholds(indices, feature_idx) {
                let (left, right) = self.partition(indices, feature_idx, threshold);
                if left.len() < self.config.min_samples_leaf
                    || right.len() < self.config.min_samples_leaf
                {
                    continue;
                }

                let gain = self.split_gain(&left, &right, indices);
                let better = match &best {
                    None => gain > 0.0,
                    Some(current) => gain > current.gain,
                };
                if better {
                    best = Some(SplitCandidate {
                        feature_idx,
                        threshold,
                        gain,
                    });
                }
            }
        }

        best
    }

    /// Midpoints between consecutive distinct values of one feature
    fn candidate_thresholds(&self, indices: &[usize], feature_idx: usize) -> Vec<f64> {
        let mut values: Vec<f64> = indices
            .iter()
            .map(|&i| self.features[i][feature_idx])
            .collect();
        values.sort_by(|a, b| a.total_cmp(b));
        values.dedup();
        values.windows(2).map(|w| (w[0] + w[1]) / 2.0).collect()
    }

    fn partition(
        &self,
        indices: &[usize],
        feature_idx: usize,
        threshold: f64,
    ) -> (Vec<usize>, Vec<usize>) {
        let mut left = Vec::new();
        let mut right = Vec::new();
        for &idx in indices {
            if self.features[idx][feature_idx] <= threshold {
                left.push(idx);
            } else {
                right.push(idx);
            }
        }
        (left, right)
    }

    fn split_gain(&self, left: &[usize], right: &[usize], parent: &[usize]) -> f64 {
        let score = |idx: &[usize]| {
            let (g, h) = self.sums(idx);
            if h > 0.0 {
                (g * g) / h
            } else {
                0.0
            }
        };
        score(left) + score(right) - score(parent)
    }

    fn sums(&self, indices: &[usize]) -> (f64, f64) {
        let mut g = 0.0;
        let mut h = 0.0;
        for &idx in indices {
            g += self.gradients[idx];
            h += self.hessians[idx];
        }
        (g, h)
    }

    /// Optimal leaf value −G/H
    fn leaf_value(&self, indices: &[usize]) -> f64 {
        let (g, h) = self.sums(indices);
        if h > 0.0 {
            -g / h
        } else {
            0.0
        }
    }
}

//! Random forest classifier over bootstrap-sampled decision trees

use crate::error::{FraudError, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Split candidates are drawn from this fixed prefix of feature indices.
const CANDIDATE_FEATURES: usize = 3;

/// A decision tree node. Internal nodes exclusively own their children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TreeNode {
    Leaf {
        prediction: f64,
    },
    Node {
        feature: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

impl TreeNode {
    /// Descend to a leaf by comparing features against node thresholds.
    fn traverse(&self, features: &[f64]) -> f64 {
        match self {
            TreeNode::Leaf { prediction } => *prediction,
            TreeNode::Node {
                feature,
                threshold,
                left,
                right,
            } => {
                if features[*feature] <= *threshold {
                    left.traverse(features)
                } else {
                    right.traverse(features)
                }
            }
        }
    }
}

/// Bootstrap-aggregated forest of depth-limited decision trees.
#[derive(Debug)]
pub struct RandomForestClassifier {
    num_trees: usize,
    max_depth: usize,
    trees: Vec<TreeNode>,
    rng: StdRng,
}

impl RandomForestClassifier {
    pub fn new(num_trees: usize, max_depth: usize) -> Self {
        Self {
            num_trees,
            max_depth,
            trees: Vec::new(),
            rng: StdRng::from_entropy(),
        }
    }

    /// Forest with a fixed seed for reproducible bootstrap samples.
    pub fn with_seed(num_trees: usize, max_depth: usize, seed: u64) -> Self {
        Self {
            num_trees,
            max_depth,
            trees: Vec::new(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn trees(&self) -> &[TreeNode] {
        &self.trees
    }

    /// Install persisted trees, replacing any trained state.
    pub fn set_trees(&mut self, trees: Vec<TreeNode>) {
        self.trees = trees;
    }

    /// Train the forest; returns the number of trees built.
    pub fn train(&mut self, features: &[Vec<f64>], labels: &[u8]) -> Result<usize> {
        if features.is_empty() || labels.is_empty() {
            return Err(FraudError::Training("no training data".to_string()));
        }
        if features.len() != labels.len() {
            return Err(FraudError::Training(format!(
                "{} feature rows vs {} labels",
                features.len(),
                labels.len()
            )));
        }

        self.trees.clear();
        let n = features.len();

        for _ in 0..self.num_trees {
            // Bootstrap sample: n draws with replacement.
            let indices: Vec<usize> = (0..n).map(|_| self.rng.gen_range(0..n)).collect();
            let sampled_features: Vec<Vec<f64>> =
                indices.iter().map(|&i| features[i].clone()).collect();
            let sampled_labels: Vec<u8> = indices.iter().map(|&i| labels[i]).collect();

            let tree = build_tree(&sampled_features, &sampled_labels, 0, self.max_depth);
            self.trees.push(tree);
        }

        debug!(num_trees = self.trees.len(), "Random forest trained");
        Ok(self.trees.len())
    }

    /// Mean of all trees' leaf outputs, a vote fraction in [0, 1]; 0.5 with
    /// no trees.
    pub fn predict(&self, features: &[f64]) -> f64 {
        if self.trees.is_empty() {
            return 0.5;
        }
        let total: f64 = self.trees.iter().map(|t| t.traverse(features)).sum();
        total / self.trees.len() as f64
    }
}

fn build_tree(features: &[Vec<f64>], labels: &[u8], depth: usize, max_depth: usize) -> TreeNode {
    let single_class = labels.iter().all(|&l| l == labels[0]);
    if depth >= max_depth || features.is_empty() || (!labels.is_empty() && single_class) {
        return majority_leaf(labels);
    }

    let num_features = features[0].len();
    let mut best: Option<(usize, f64)> = None;
    let mut best_gain = 0.0;

    for feature_idx in 0..CANDIDATE_FEATURES.min(num_features) {
        let column: Vec<f64> = features.iter().map(|row| row[feature_idx]).collect();
        let threshold = column.iter().sum::<f64>() / column.len() as f64;

        let left_labels: Vec<u8> = labels
            .iter()
            .zip(&column)
            .filter(|(_, &v)| v <= threshold)
            .map(|(&l, _)| l)
            .collect();
        let right_labels: Vec<u8> = labels
            .iter()
            .zip(&column)
            .filter(|(_, &v)| v > threshold)
            .map(|(&l, _)| l)
            .collect();

        if left_labels.is_empty() || right_labels.is_empty() {
            continue;
        }

        let gain = information_gain(labels, &left_labels, &right_labels);
        if gain > best_gain {
            best_gain = gain;
            best = Some((feature_idx, threshold));
        }
    }

    let Some((feature, threshold)) = best else {
        return majority_leaf(labels);
    };

    let mut left_features = Vec::new();
    let mut left_labels = Vec::new();
    let mut right_features = Vec::new();
    let mut right_labels = Vec::new();
    for (row, &label) in features.iter().zip(labels) {
        if row[feature] <= threshold {
            left_features.push(row.clone());
            left_labels.push(label);
        } else {
            right_features.push(row.clone());
            right_labels.push(label);
        }
    }

    TreeNode::Node {
        feature,
        threshold,
        left: Box::new(build_tree(&left_features, &left_labels, depth + 1, max_depth)),
        right: Box::new(build_tree(&right_features, &right_labels, depth + 1, max_depth)),
    }
}

/// Majority label; ties and empty nodes resolve to 0.
fn majority_leaf(labels: &[u8]) -> TreeNode {
    let positives: usize = labels.iter().map(|&l| l as usize).sum();
    let prediction = if positives as f64 > labels.len() as f64 / 2.0 {
        1.0
    } else {
        0.0
    };
    TreeNode::Leaf { prediction }
}

fn information_gain(parent: &[u8], left: &[u8], right: &[u8]) -> f64 {
    let left_weight = left.len() as f64 / parent.len() as f64;
    let right_weight = right.len() as f64 / parent.len() as f64;

    entropy(parent) - (left_weight * entropy(left) + right_weight * entropy(right))
}

/// Label-set impurity. Deliberately not the logarithmic entropy; gain
/// comparisons, and with them the tree shapes and any persisted model,
/// depend on this exact arithmetic.
fn entropy(labels: &[u8]) -> f64 {
    if labels.is_empty() {
        return 0.0;
    }
    let pos: usize = labels.iter().map(|&l| l as usize).sum();
    let neg = labels.len() - pos;
    if pos == 0 || neg == 0 {
        return 0.0;
    }

    let p_pos = pos as f64 / labels.len() as f64;
    let p_neg = neg as f64 / labels.len() as f64;

    -(p_pos * (p_pos + 1e-10) + p_neg * (p_neg + 1e-10))
}

//! CART regression tree

use crate::error::{GradeMlError, Result};
use ndarray::{Array1, Array2};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TreeNode {
    Leaf {
        value: f64,
        n_samples: usize,
    },
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
        n_samples: usize,
    },
}

/// Regression tree with variance-reduction splits (MSE criterion).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTreeRegressor {
    root: Option<TreeNode>,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Number of features sampled per split; None scans all of them.
    pub max_features: Option<usize>,
    n_features: usize,
    /// Seed for the per-split feature subsample, when max_features is set.
    pub random_state: Option<u64>,
}

impl Default for DecisionTreeRegressor {
    fn default() -> Self {
        Self::new()
    }
}

impl DecisionTreeRegressor {
    pub fn new() -> Self {
        Self {
            root: None,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            n_features: 0,
            random_state: None,
        }
    }

    pub fn with_max_depth(mut self, depth: Option<usize>) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_min_samples_split(mut self, min_samples: usize) -> Self {
        self.min_samples_split = min_samples.max(2);
        self
    }

    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples.max(1);
        self
    }

    pub fn with_max_features(mut self, max_features: Option<usize>) -> Self {
        self.max_features = max_features;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Grow the tree on a feature matrix and target vector.
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        let n_samples = x.nrows();

        if n_samples != y.len() {
            return Err(GradeMlError::Shape {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }
        if n_samples == 0 {
            return Err(GradeMlError::Fit("empty training set".to_string()));
        }

        self.n_features = x.ncols();
        let indices: Vec<usize> = (0..n_samples).collect();
        self.root = Some(self.build_node(x, y, &indices, 0));
        Ok(self)
    }

    fn build_node(&self, x: &Array2<f64>, y: &Array1<f64>, indices: &[usize], depth: usize) -> TreeNode {
        let n_samples = indices.len();
        let y_subset: Vec<f64> = indices.iter().map(|&i| y[i]).collect();

        let should_stop = n_samples < self.min_samples_split
            || self.max_depth.map_or(false, |d| depth >= d)
            || is_constant(&y_subset);

        if should_stop {
            return TreeNode::Leaf {
                value: mean(&y_subset),
                n_samples,
            };
        }

        let Some((feature_idx, threshold)) = self.find_best_split(x, y, indices, depth) else {
            return TreeNode::Leaf {
                value: mean(&y_subset),
                n_samples,
            };
        };

        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| x[[i, feature_idx]] <= threshold);

        if left_indices.len() < self.min_samples_leaf || right_indices.len() < self.min_samples_leaf {
            return TreeNode::Leaf {
                value: mean(&y_subset),
                n_samples,
            };
        }

        let left = Box::new(self.build_node(x, y, &left_indices, depth + 1));
        let right = Box::new(self.build_node(x, y, &right_indices, depth + 1));

        TreeNode::Split {
            feature_idx,
            threshold,
            left,
            right,
            n_samples,
        }
    }

    /// Feature subset to scan at this node. Deterministic per (seed, depth,
    /// node size) so refits reproduce the same tree.
    fn candidate_features(&self, indices: &[usize], depth: usize) -> Vec<usize> {
        let n_try = self.max_features.unwrap_or(self.n_features).min(self.n_features).max(1);
        if n_try >= self.n_features {
            return (0..self.n_features).collect();
        }

        use rand::seq::SliceRandom;
        use rand::SeedableRng;
        let seed = self
            .random_state
            .unwrap_or(0)
            .wrapping_mul(31)
            .wrapping_add(depth as u64)
            .wrapping_mul(31)
            .wrapping_add(indices.len() as u64);
        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(seed);
        let mut features: Vec<usize> = (0..self.n_features).collect();
        features.shuffle(&mut rng);
        features.truncate(n_try);
        features
    }

    fn find_best_split(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        depth: usize,
    ) -> Option<(usize, f64)> {
        let y_subset: Vec<f64> = indices.iter().map(|&i| y[i]).collect();
        let parent_impurity = variance(&y_subset);
        let features = self.candidate_features(indices, depth);

        // Each feature sweeps its sorted values once, keeping running sums so
        // the left/right variances come out of the prefix statistics
        let per_feature: Vec<Option<(usize, f64, f64)>> = features
            .into_par_iter()
            .map(|feature_idx| {
                let mut order: Vec<(f64, f64)> = indices
                    .iter()
                    .map(|&i| (x[[i, feature_idx]], y[i]))
                    .collect();
                order.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

                let n = order.len();
                let total_sum: f64 = order.iter().map(|(_, yi)| yi).sum();
                let total_sq_sum: f64 = order.iter().map(|(_, yi)| yi * yi).sum();

                let mut left_count = 0usize;
                let mut left_sum = 0.0f64;
                let mut left_sq_sum = 0.0f64;
                let mut best_gain = 0.0f64;
                let mut best_threshold = 0.0f64;

                for k in 0..n - 1 {
                    let (value, yi) = order[k];
                    left_count += 1;
                    left_sum += yi;
                    left_sq_sum += yi * yi;

                    // Only distinct adjacent values form a boundary
                    let next_value = order[k + 1].0;
                    if next_value <= value {
                        continue;
                    }

                    let right_count = n - left_count;
                    if left_count < self.min_samples_leaf || right_count < self.min_samples_leaf {
                        continue;
                    }

                    // Var = E[y²] - E[y]²
                    let left_var = left_sq_sum / left_count as f64
                        - (left_sum / left_count as f64).powi(2);
                    let right_sum = total_sum - left_sum;
                    let right_sq_sum = total_sq_sum - left_sq_sum;
                    let right_var = right_sq_sum / right_count as f64
                        - (right_sum / right_count as f64).powi(2);

                    let weighted = (left_count as f64 * left_var
                        + right_count as f64 * right_var)
                        / n as f64;
                    let gain = parent_impurity - weighted;

                    if gain > best_gain {
                        best_gain = gain;
                        best_threshold = (value + next_value) / 2.0;
                    }
                }

                if best_gain > 0.0 {
                    Some((feature_idx, best_threshold, best_gain))
                } else {
                    None
                }
            })
            .collect();

        per_feature
            .into_iter()
            .flatten()
            .max_by(|a, b| a.2.partial_cmp(&b.2).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(feature_idx, threshold, _)| (feature_idx, threshold))
    }

    /// Predict targets for a feature matrix.
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let root = self.root.as_ref().ok_or(GradeMlError::NotFitted)?;

        let predictions: Vec<f64> = (0..x.nrows())
            .map(|i| {
                let row = x.row(i).to_vec();
                predict_row(root, &row)
            })
            .collect();

        Ok(Array1::from_vec(predictions))
    }

    pub fn depth(&self) -> usize {
        self.root.as_ref().map_or(0, node_depth)
    }
}

fn predict_row(node: &TreeNode, row: &[f64]) -> f64 {
    match node {
        TreeNode::Leaf { value, .. } => *value,
        TreeNode::Split {
            feature_idx,
            threshold,
            left,
            right,
            ..
        } => {
            if row[*feature_idx] <= *threshold {
                predict_row(left, row)
            } else {
                predict_row(right, row)
            }
        }
    }
}

fn node_depth(node: &TreeNode) -> usize {
    match node {
        TreeNode::Leaf { .. } => 1,
        TreeNode::Split { left, right, .. } => 1 + node_depth(left).max(node_depth(right)),
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64
}

fn is_constant(values: &[f64]) -> bool {
    values
        .first()
        .map_or(true, |&first| values.iter().all(|&v| (v - first).abs() < 1e-12))
}

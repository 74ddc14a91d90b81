//! K-fold cross-validation and exhaustive grid search

use crate::error::{GradeMlError, Result};
use crate::models::{
    DecisionTreeRegressor, GradientBoostingRegressor, LinearRegression,
    RandomForestRegressor, TrainedModel,
};
use ndarray::{Array1, Array2};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::Serialize;

/// One train/validation split of the training rows.
#[derive(Debug, Clone)]
pub struct Fold {
    pub train_indices: Vec<usize>,
    pub val_indices: Vec<usize>,
}

/// Shuffled k-fold splitter with a fixed seed.
#[derive(Debug, Clone, Copy)]
pub struct KFold {
    pub n_splits: usize,
    pub seed: u64,
}

impl KFold {
    pub fn new(n_splits: usize, seed: u64) -> Self {
        Self { n_splits, seed }
    }

    /// Partition `0..n_samples` into folds. Earlier folds absorb the
    /// remainder, so fold sizes differ by at most one.
    pub fn split(&self, n_samples: usize) -> Result<Vec<Fold>> {
        if self.n_splits < 2 {
            return Err(GradeMlError::Data(
                "n_splits must be at least 2".to_string(),
            ));
        }
        if n_samples < self.n_splits {
            return Err(GradeMlError::Data(format!(
                "n_samples ({}) must be >= n_splits ({})",
                n_samples, self.n_splits
            )));
        }

        let mut indices: Vec<usize> = (0..n_samples).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        indices.shuffle(&mut rng);

        let base = n_samples / self.n_splits;
        let remainder = n_samples % self.n_splits;

        let mut folds = Vec::with_capacity(self.n_splits);
        let mut current = 0;
        for fold_idx in 0..self.n_splits {
            let fold_size = if fold_idx < remainder { base + 1 } else { base };
            let val_indices = indices[current..current + fold_size].to_vec();
            let train_indices: Vec<usize> = indices[..current]
                .iter()
                .chain(indices[current + fold_size..].iter())
                .copied()
                .collect();
            folds.push(Fold {
                train_indices,
                val_indices,
            });
            current += fold_size;
        }

        Ok(folds)
    }
}

/// One point of a family's hyperparameter grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CandidateParams {
    Linear {
        fit_intercept: bool,
    },
    Tree {
        max_depth: Option<usize>,
        min_samples_split: usize,
        min_samples_leaf: usize,
    },
    Forest {
        n_estimators: usize,
        max_depth: Option<usize>,
        min_samples_split: usize,
    },
    Boosting {
        n_estimators: usize,
        max_depth: usize,
        learning_rate: f64,
    },
}

impl CandidateParams {
    /// Fit a fresh estimator with these hyperparameters.
    pub fn fit(&self, x: &Array2<f64>, y: &Array1<f64>, seed: u64) -> Result<TrainedModel> {
        match *self {
            CandidateParams::Linear { fit_intercept } => {
                let mut model = LinearRegression::new().with_fit_intercept(fit_intercept);
                model.fit(x, y)?;
                Ok(TrainedModel::LinearRegression(model))
            }
            CandidateParams::Tree {
                max_depth,
                min_samples_split,
                min_samples_leaf,
            } => {
                let mut model = DecisionTreeRegressor::new()
                    .with_max_depth(max_depth)
                    .with_min_samples_split(min_samples_split)
                    .with_min_samples_leaf(min_samples_leaf);
                model.fit(x, y)?;
                Ok(TrainedModel::DecisionTree(model))
            }
            CandidateParams::Forest {
                n_estimators,
                max_depth,
                min_samples_split,
            } => {
                let mut model = RandomForestRegressor::new(n_estimators)
                    .with_max_depth(max_depth)
                    .with_min_samples_split(min_samples_split)
                    .with_random_state(seed);
                model.fit(x, y)?;
                Ok(TrainedModel::RandomForest(model))
            }
            CandidateParams::Boosting {
                n_estimators,
                max_depth,
                learning_rate,
            } => {
                let mut model = GradientBoostingRegressor::new(n_estimators)
                    .with_max_depth(max_depth)
                    .with_learning_rate(learning_rate)
                    .with_random_state(seed);
                model.fit(x, y)?;
                Ok(TrainedModel::GradientBoosting(model))
            }
        }
    }

    /// Hyperparameters as a JSON object, for the log and the report.
    pub fn describe(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// A model family: display name plus its full hyperparameter grid.
#[derive(Debug, Clone)]
pub struct FamilySpec {
    pub name: &'static str,
    pub grid: Vec<CandidateParams>,
}

/// The four families searched by the trainer, in training order.
pub fn model_families() -> Vec<FamilySpec> {
    let linear = [true, false]
        .iter()
        .map(|&fit_intercept| CandidateParams::Linear { fit_intercept })
        .collect();

    let mut tree = Vec::new();
    for &max_depth in &[None, Some(5), Some(10), Some(15)] {
        for &min_samples_split in &[2usize, 5, 10] {
            for &min_samples_leaf in &[1usize, 2, 4] {
                tree.push(CandidateParams::Tree {
                    max_depth,
                    min_samples_split,
                    min_samples_leaf,
                });
            }
        }
    }

    let mut forest = Vec::new();
    for &n_estimators in &[50usize, 100, 200] {
        for &max_depth in &[None, Some(10), Some(20)] {
            for &min_samples_split in &[2usize, 5, 10] {
                forest.push(CandidateParams::Forest {
                    n_estimators,
                    max_depth,
                    min_samples_split,
                });
            }
        }
    }

    let mut boosting = Vec::new();
    for &n_estimators in &[50usize, 100, 200] {
        for &max_depth in &[3usize, 5, 7] {
            for &learning_rate in &[0.01, 0.1, 0.2] {
                boosting.push(CandidateParams::Boosting {
                    n_estimators,
                    max_depth,
                    learning_rate,
                });
            }
        }
    }

    vec![
        FamilySpec {
            name: "Linear Regression",
            grid: linear,
        },
        FamilySpec {
            name: "Decision Tree",
            grid: tree,
        },
        FamilySpec {
            name: "Random Forest",
            grid: forest,
        },
        FamilySpec {
            name: "Gradient Boosting",
            grid: boosting,
        },
    ]
}

/// Winning candidate of one family's search, refit on the full training
/// partition.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub model: TrainedModel,
    pub params: CandidateParams,
    /// Mean negative MSE across folds.
    pub cv_score: f64,
}

/// Exhaustive grid search scored by k-fold mean negative MSE.
#[derive(Debug, Clone, Copy)]
pub struct GridSearch {
    pub n_folds: usize,
    pub seed: u64,
}

impl GridSearch {
    pub fn new(n_folds: usize, seed: u64) -> Self {
        Self { n_folds, seed }
    }

    /// Score every grid point, pick the best, refit it on all training rows.
    /// Candidates are scored in parallel; the argmax walks the grid in order
    /// with a strict comparison, so ties keep the first candidate.
    pub fn run(
        &self,
        spec: &FamilySpec,
        x: &Array2<f64>,
        y: &Array1<f64>,
    ) -> Result<SearchOutcome> {
        if spec.grid.is_empty() {
            return Err(GradeMlError::Fit(format!(
                "empty grid for family '{}'",
                spec.name
            )));
        }

        let folds = KFold::new(self.n_folds, self.seed).split(x.nrows())?;

        let scores: Result<Vec<f64>> = spec
            .grid
            .par_iter()
            .map(|candidate| self.score_candidate(candidate, x, y, &folds))
            .collect();
        let scores = scores?;

        let mut best_idx = 0;
        for (idx, &score) in scores.iter().enumerate() {
            if score > scores[best_idx] {
                best_idx = idx;
            }
        }

        let params = spec.grid[best_idx].clone();
        let model = params.fit(x, y, self.seed)?;

        Ok(SearchOutcome {
            model,
            params,
            cv_score: scores[best_idx],
        })
    }

    fn score_candidate(
        &self,
        candidate: &CandidateParams,
        x: &Array2<f64>,
        y: &Array1<f64>,
        folds: &[Fold],
    ) -> Result<f64> {
        let mut fold_scores = Vec::with_capacity(folds.len());

        for fold in folds {
            let x_train = crate::data::take_rows(x, &fold.train_indices);
            let y_train = crate::data::take_values(y, &fold.train_indices);
            let x_val = crate::data::take_rows(x, &fold.val_indices);
            let y_val = crate::data::take_values(y, &fold.val_indices);

            let model = candidate.fit(&x_train, &y_train, self.seed)?;
            let pred = model.predict(&x_val)?;

            let mse = y_val
                .iter()
                .zip(pred.iter())
                .map(|(t, p)| (t - p).powi(2))
                .sum::<f64>()
                / y_val.len() as f64;
            fold_scores.push(-mse);
        }

        Ok(fold_scores.iter().sum::<f64>() / fold_scores.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array1, Array2};

    #[test]
    fn test_kfold_exact_partition() {
        let folds = KFold::new(5, 42).split(103).unwrap();
        assert_eq!(folds.len(), 5);

        let mut all_val: Vec<usize> =
            folds.iter().flat_map(|f| f.val_indices.clone()).collect();
        all_val.sort_unstable();
        assert_eq!(all_val, (0..103).collect::<Vec<_>>());

        // Sizes differ by at most one
        let sizes: Vec<usize> = folds.iter().map(|f| f.val_indices.len()).collect();
        assert_eq!(sizes.iter().sum::<usize>(), 103);
        assert!(sizes.iter().max().unwrap() - sizes.iter().min().unwrap() <= 1);
    }

    #[test]
    fn test_kfold_train_val_disjoint() {
        let folds = KFold::new(5, 42).split(50).unwrap();
        for fold in &folds {
            for idx in &fold.val_indices {
                assert!(!fold.train_indices.contains(idx));
            }
            assert_eq!(fold.train_indices.len() + fold.val_indices.len(), 50);
        }
    }

    #[test]
    fn test_kfold_deterministic() {
        let a = KFold::new(5, 42).split(40).unwrap();
        let b = KFold::new(5, 42).split(40).unwrap();
        for (fa, fb) in a.iter().zip(b.iter()) {
            assert_eq!(fa.val_indices, fb.val_indices);
        }
    }

    #[test]
    fn test_kfold_too_few_samples() {
        assert!(KFold::new(5, 42).split(3).is_err());
    }

    #[test]
    fn test_family_grid_sizes() {
        let families = model_families();
        assert_eq!(families.len(), 4);
        assert_eq!(families[0].name, "Linear Regression");
        assert_eq!(families[0].grid.len(), 2);
        assert_eq!(families[1].grid.len(), 36); // 4 * 3 * 3
        assert_eq!(families[2].grid.len(), 27); // 3 * 3 * 3
        assert_eq!(families[3].grid.len(), 27); // 3 * 3 * 3
    }

    fn linear_data(n: usize) -> (Array2<f64>, Array1<f64>) {
        let x = Array2::from_shape_fn((n, 1), |(i, _)| i as f64);
        let y = Array1::from_shape_fn(n, |i| 2.0 * i as f64 + 1.0);
        (x, y)
    }

    #[test]
    fn test_grid_search_picks_good_linear_fit() {
        let (x, y) = linear_data(30);
        let spec = FamilySpec {
            name: "Linear Regression",
            grid: vec![
                CandidateParams::Linear {
                    fit_intercept: true,
                },
                CandidateParams::Linear {
                    fit_intercept: false,
                },
            ],
        };

        let outcome = GridSearch::new(5, 42).run(&spec, &x, &y).unwrap();
        // Data has intercept 1.0, so fitting one must win
        assert_eq!(
            outcome.params,
            CandidateParams::Linear {
                fit_intercept: true
            }
        );
        assert!(outcome.cv_score <= 0.0);
        assert!(outcome.cv_score > -1e-6);
    }

    #[test]
    fn test_tie_keeps_first_candidate() {
        let (x, y) = linear_data(20);
        // Identical candidates score identically; strict argmax keeps index 0
        let spec = FamilySpec {
            name: "Linear Regression",
            grid: vec![
                CandidateParams::Linear {
                    fit_intercept: true,
                },
                CandidateParams::Linear {
                    fit_intercept: true,
                },
            ],
        };

        let outcome = GridSearch::new(5, 42).run(&spec, &x, &y).unwrap();
        assert_eq!(
            outcome.params,
            spec.grid[0]
        );
    }

    #[test]
    fn test_describe_is_json_object() {
        let params = CandidateParams::Boosting {
            n_estimators: 100,
            max_depth: 3,
            learning_rate: 0.1,
        };
        let value = params.describe();
        assert_eq!(value["n_estimators"], 100);
        assert_eq!(value["learning_rate"], 0.1);
    }
}

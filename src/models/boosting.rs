//! Gradient-boosted regression trees

use super::tree::DecisionTreeRegressor;
use crate::error::{GradeMlError, Result};
use ndarray::{Array1, Array2, Axis};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Boosted ensemble for squared loss: starts from the target mean and
/// sequentially fits shallow trees to the current residuals, shrunk by the
/// learning rate. Optional row subsampling per boosting round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientBoostingRegressor {
    trees: Vec<DecisionTreeRegressor>,
    initial_prediction: f64,
    is_fitted: bool,
    pub n_estimators: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
    pub min_samples_leaf: usize,
    pub subsample: f64,
    pub random_state: Option<u64>,
}

impl Default for GradientBoostingRegressor {
    fn default() -> Self {
        Self::new(100)
    }
}

impl GradientBoostingRegressor {
    pub fn new(n_estimators: usize) -> Self {
        Self {
            trees: Vec::new(),
            initial_prediction: 0.0,
            is_fitted: false,
            n_estimators,
            learning_rate: 0.1,
            max_depth: 3,
            min_samples_leaf: 1,
            subsample: 1.0,
            random_state: None,
        }
    }

    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth.max(1);
        self
    }

    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples.max(1);
        self
    }

    pub fn with_subsample(mut self, subsample: f64) -> Self {
        self.subsample = subsample.clamp(0.1, 1.0);
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Fit the boosting chain.
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
        if self.n_estimators == 0 {
            return Err(GradeMlError::Fit("n_estimators must be positive".to_string()));
        }
        if self.learning_rate <= 0.0 {
            return Err(GradeMlError::Fit(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            )));
        }

        self.initial_prediction = y.mean().unwrap_or(0.0);
        let mut current = Array1::from_elem(n_samples, self.initial_prediction);

        let base_seed = self.random_state.unwrap_or(42);
        let n_subsample = ((n_samples as f64) * self.subsample).round() as usize;
        let n_subsample = n_subsample.clamp(1, n_samples);

        self.trees = Vec::with_capacity(self.n_estimators);

        for round in 0..self.n_estimators {
            let residuals = y - &current;

            // Row subsample for this round, seeded per round
            let row_indices: Vec<usize> = if n_subsample < n_samples {
                let mut rng =
                    ChaCha8Rng::seed_from_u64(base_seed.wrapping_add(round as u64));
                let mut all: Vec<usize> = (0..n_samples).collect();
                all.shuffle(&mut rng);
                all.truncate(n_subsample);
                all.sort_unstable();
                all
            } else {
                (0..n_samples).collect()
            };

            let x_round = x.select(Axis(0), &row_indices);
            let r_round =
                Array1::from_vec(row_indices.iter().map(|&i| residuals[i]).collect());

            let mut tree = DecisionTreeRegressor::new()
                .with_max_depth(Some(self.max_depth))
                .with_min_samples_leaf(self.min_samples_leaf)
                .with_random_state(base_seed.wrapping_add(round as u64));
            tree.fit(&x_round, &r_round)?;

            let update = tree.predict(x)?;
            current = &current + &(update * self.learning_rate);
            self.trees.push(tree);
        }

        self.is_fitted = true;
        Ok(self)
    }

    /// Predict as base value plus shrunk tree contributions.
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if !self.is_fitted {
            return Err(GradeMlError::NotFitted);
        }

        let mut predictions = Array1::from_elem(x.nrows(), self.initial_prediction);
        for tree in &self.trees {
            let update = tree.predict(x)?;
            predictions = &predictions + &(update * self.learning_rate);
        }
        Ok(predictions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn toy_data() -> (Array2<f64>, Array1<f64>) {
        let x = array![[1.0], [2.0], [3.0], [4.0], [5.0], [6.0], [7.0], [8.0]];
        let y = array![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
        (x, y)
    }

    #[test]
    fn test_reduces_training_error_over_mean() {
        let (x, y) = toy_data();
        let mut model = GradientBoostingRegressor::new(50).with_random_state(42);
        model.fit(&x, &y).unwrap();

        let pred = model.predict(&x).unwrap();
        let mean = y.mean().unwrap();
        let mse_model: f64 =
            pred.iter().zip(y.iter()).map(|(p, t)| (p - t).powi(2)).sum::<f64>()
                / y.len() as f64;
        let mse_mean: f64 =
            y.iter().map(|t| (t - mean).powi(2)).sum::<f64>() / y.len() as f64;
        assert!(mse_model < mse_mean);
    }

    #[test]
    fn test_single_round_shrinks_toward_mean() {
        let (x, y) = toy_data();
        let mut model = GradientBoostingRegressor::new(1)
            .with_learning_rate(0.1)
            .with_random_state(42);
        model.fit(&x, &y).unwrap();

        let pred = model.predict(&x).unwrap();
        let mean = y.mean().unwrap();
        // One shrunk step cannot reach the extremes
        assert!(pred[0] > y[0] && pred[0] < mean + 1.0);
    }

    #[test]
    fn test_deterministic_for_seed() {
        let (x, y) = toy_data();
        let mut a = GradientBoostingRegressor::new(20)
            .with_subsample(0.75)
            .with_random_state(11);
        a.fit(&x, &y).unwrap();
        let mut b = GradientBoostingRegressor::new(20)
            .with_subsample(0.75)
            .with_random_state(11);
        b.fit(&x, &y).unwrap();
        assert_eq!(a.predict(&x).unwrap(), b.predict(&x).unwrap());
    }

    #[test]
    fn test_predict_before_fit() {
        let model = GradientBoostingRegressor::new(10);
        assert!(matches!(
            model.predict(&array![[1.0]]),
            Err(GradeMlError::NotFitted)
        ));
    }

    #[test]
    fn test_invalid_learning_rate() {
        let (x, y) = toy_data();
        let mut model = GradientBoostingRegressor::new(10);
        model.learning_rate = 0.0;
        assert!(model.fit(&x, &y).is_err());
    }
}

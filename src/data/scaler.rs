//! Feature standardization

use crate::error::{GradeMlError, Result};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Z-score scaler over a feature matrix: (x - mean) / std, with per-feature
/// statistics taken from the training partition only. Population std
/// (ddof = 0); zero-variance features get scale 1.0 so they pass through
/// centered.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Option<Array1<f64>>,
    scale: Option<Array1<f64>>,
}

impl StandardScaler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute per-feature mean and std.
    pub fn fit(&mut self, x: &Array2<f64>) -> Result<&mut Self> {
        if x.nrows() == 0 {
            return Err(GradeMlError::Fit(
                "cannot fit scaler on empty matrix".to_string(),
            ));
        }

        let mean = x
            .mean_axis(Axis(0))
            .ok_or_else(|| GradeMlError::Fit("cannot compute feature means".to_string()))?;

        let n = x.nrows() as f64;
        let scale = Array1::from_shape_fn(x.ncols(), |j| {
            let var = x
                .column(j)
                .iter()
                .map(|v| (v - mean[j]).powi(2))
                .sum::<f64>()
                / n;
            let std = var.sqrt();
            if std == 0.0 {
                1.0
            } else {
                std
            }
        });

        self.mean = Some(mean);
        self.scale = Some(scale);
        Ok(self)
    }

    /// Apply the fitted statistics to a matrix with the same feature count.
    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let (mean, scale) = match (&self.mean, &self.scale) {
            (Some(mean), Some(scale)) => (mean, scale),
            _ => return Err(GradeMlError::NotFitted),
        };

        if x.ncols() != mean.len() {
            return Err(GradeMlError::Shape {
                expected: format!("{} features", mean.len()),
                actual: format!("{} features", x.ncols()),
            });
        }

        Ok(Array2::from_shape_fn(x.dim(), |(i, j)| {
            (x[[i, j]] - mean[j]) / scale[j]
        }))
    }

    /// Fit and transform in one step.
    pub fn fit_transform(&mut self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.fit(x)?;
        self.transform(x)
    }

    /// Fitted per-feature means.
    pub fn mean(&self) -> Option<&Array1<f64>> {
        self.mean.as_ref()
    }

    /// Fitted per-feature scales.
    pub fn scale(&self) -> Option<&Array1<f64>> {
        self.scale.as_ref()
    }

    /// Persist the fitted scaler as a bincode blob.
    pub fn save(&self, path: &Path) -> Result<()> {
        let bytes = bincode::serialize(self)?;
        fs::write(path, bytes)?;
        Ok(())
    }

    /// Load a previously saved scaler.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)?;
        Ok(bincode::deserialize(&bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_train_partition_standardized() {
        let x = array![[1.0, 10.0], [2.0, 20.0], [3.0, 30.0], [4.0, 40.0]];
        let mut scaler = StandardScaler::new();
        let scaled = scaler.fit_transform(&x).unwrap();

        for j in 0..2 {
            let col: Vec<f64> = scaled.column(j).to_vec();
            let mean = col.iter().sum::<f64>() / col.len() as f64;
            let var = col.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / col.len() as f64;
            assert!(mean.abs() < 1e-10, "mean of feature {} = {}", j, mean);
            assert!((var - 1.0).abs() < 1e-10, "var of feature {} = {}", j, var);
        }
    }

    #[test]
    fn test_constant_feature_passes_through_centered() {
        let x = array![[5.0], [5.0], [5.0]];
        let mut scaler = StandardScaler::new();
        let scaled = scaler.fit_transform(&x).unwrap();
        assert!(scaled.iter().all(|v| v.abs() < 1e-12));
    }

    #[test]
    fn test_transform_uses_train_statistics() {
        let train = array![[0.0], [2.0]];
        let test = array![[4.0]];
        let mut scaler = StandardScaler::new();
        scaler.fit(&train).unwrap();
        let scaled = scaler.transform(&test).unwrap();
        // mean 1, std 1 -> (4 - 1) / 1
        assert!((scaled[[0, 0]] - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_shape_mismatch() {
        let train = array![[1.0, 2.0], [3.0, 4.0]];
        let bad = array![[1.0], [2.0]];
        let mut scaler = StandardScaler::new();
        scaler.fit(&train).unwrap();
        assert!(matches!(
            scaler.transform(&bad),
            Err(GradeMlError::Shape { .. })
        ));
    }

    #[test]
    fn test_not_fitted() {
        let scaler = StandardScaler::new();
        let x = array![[1.0]];
        assert!(matches!(
            scaler.transform(&x),
            Err(GradeMlError::NotFitted)
        ));
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("scaler.pkl");

        let x = array![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]];
        let mut scaler = StandardScaler::new();
        scaler.fit(&x).unwrap();
        scaler.save(&path).unwrap();

        let loaded = StandardScaler::load(&path).unwrap();
        assert_eq!(loaded.mean().unwrap(), scaler.mean().unwrap());
        assert_eq!(loaded.scale().unwrap(), scaler.scale().unwrap());
    }
}

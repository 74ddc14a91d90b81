//! Regression metrics

use crate::error::{GradeMlError, Result};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Test-set metrics for one model. Serialized field names match the
/// evaluation report keys.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionMetrics {
    #[serde(rename = "RMSE")]
    pub rmse: f64,
    #[serde(rename = "MAE")]
    pub mae: f64,
    #[serde(rename = "R2")]
    pub r2: f64,
}

impl RegressionMetrics {
    /// Compute RMSE, MAE and R² of predictions against the truth.
    /// R² is 0.0 when the target has no variance.
    pub fn compute(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<Self> {
        if y_true.len() != y_pred.len() {
            return Err(GradeMlError::Shape {
                expected: format!("{} predictions", y_true.len()),
                actual: format!("{} predictions", y_pred.len()),
            });
        }
        if y_true.is_empty() {
            return Err(GradeMlError::Data(
                "cannot compute metrics on empty arrays".to_string(),
            ));
        }

        let n = y_true.len() as f64;
        let mse = y_true
            .iter()
            .zip(y_pred.iter())
            .map(|(t, p)| (t - p).powi(2))
            .sum::<f64>()
            / n;
        let mae = y_true
            .iter()
            .zip(y_pred.iter())
            .map(|(t, p)| (t - p).abs())
            .sum::<f64>()
            / n;

        let y_mean = y_true.mean().unwrap_or(0.0);
        let ss_res: f64 = y_true
            .iter()
            .zip(y_pred.iter())
            .map(|(t, p)| (t - p).powi(2))
            .sum();
        let ss_tot: f64 = y_true.iter().map(|t| (t - y_mean).powi(2)).sum();
        let r2 = if ss_tot > 0.0 { 1.0 - ss_res / ss_tot } else { 0.0 };

        Ok(Self {
            rmse: mse.sqrt(),
            mae,
            r2,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_perfect_prediction() {
        let y = array![1.0, 2.0, 3.0];
        let m = RegressionMetrics::compute(&y, &y.clone()).unwrap();
        assert_eq!(m.rmse, 0.0);
        assert_eq!(m.mae, 0.0);
        assert_eq!(m.r2, 1.0);
    }

    #[test]
    fn test_known_values() {
        let y_true = array![0.0, 0.0, 0.0, 0.0];
        let y_pred = array![1.0, -1.0, 1.0, -1.0];
        let m = RegressionMetrics::compute(&y_true, &y_pred).unwrap();
        assert!((m.rmse - 1.0).abs() < 1e-12);
        assert!((m.mae - 1.0).abs() < 1e-12);
        // Constant target: R² pinned to 0
        assert_eq!(m.r2, 0.0);
    }

    #[test]
    fn test_bounds() {
        let y_true = array![1.0, 5.0, 2.0, 8.0];
        let y_pred = array![2.0, 4.0, 3.0, 7.5];
        let m = RegressionMetrics::compute(&y_true, &y_pred).unwrap();
        assert!(m.rmse >= 0.0);
        assert!(m.mae >= 0.0);
        assert!(m.r2 <= 1.0);
    }

    #[test]
    fn test_length_mismatch() {
        let y_true = array![1.0, 2.0];
        let y_pred = array![1.0];
        assert!(matches!(
            RegressionMetrics::compute(&y_true, &y_pred),
            Err(GradeMlError::Shape { .. })
        ));
    }

    #[test]
    fn test_json_keys() {
        let m = RegressionMetrics {
            rmse: 1.5,
            mae: 1.0,
            r2: 0.8,
        };
        let json = serde_json::to_value(&m).unwrap();
        assert!(json.get("RMSE").is_some());
        assert!(json.get("MAE").is_some());
        assert!(json.get("R2").is_some());
    }
}

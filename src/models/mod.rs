//! Regression model families

pub mod boosting;
pub mod forest;
pub mod linear;
pub mod tree;

use crate::error::Result;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub use boosting::GradientBoostingRegressor;
pub use forest::RandomForestRegressor;
pub use linear::LinearRegression;
pub use tree::DecisionTreeRegressor;

/// A fitted model of any family, dispatching predict over the variants.
/// Serializable so the whole model persists as one bincode blob.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TrainedModel {
    LinearRegression(LinearRegression),
    DecisionTree(DecisionTreeRegressor),
    RandomForest(RandomForestRegressor),
    GradientBoosting(GradientBoostingRegressor),
}

impl TrainedModel {
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        match self {
            TrainedModel::LinearRegression(model) => model.predict(x),
            TrainedModel::DecisionTree(model) => model.predict(x),
            TrainedModel::RandomForest(model) => model.predict(x),
            TrainedModel::GradientBoosting(model) => model.predict(x),
        }
    }

    /// Serialize to a bincode blob.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Deserialize from a bincode blob.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(bincode::deserialize(bytes)?)
    }

    /// Write the serialized model to disk.
    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_bytes()?)?;
        Ok(())
    }

    /// Read a serialized model from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)?;
        Self::from_bytes(&bytes)
    }
}

/// "Random Forest" -> "random_forest" (artifact file stems).
pub fn snake_case_name(family: &str) -> String {
    family.to_lowercase().replace(' ', "_")
}

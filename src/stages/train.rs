//! Stage 3: grid-searched training of all families

use crate::data::ProcessedData;
use crate::error::Result;
use crate::logging::RunLogger;
use crate::models::{snake_case_name, TrainedModel};
use crate::run::RunDirs;
use crate::search::{model_families, CandidateParams, GridSearch};

const CV_FOLDS: usize = 5;

/// One fitted family: name, winning hyperparameters, refit model and its
/// cross-validation score.
#[derive(Debug, Clone)]
pub struct TrainedEntry {
    pub name: String,
    pub params: CandidateParams,
    pub model: TrainedModel,
    pub cv_score: f64,
}

/// Ordered by training sequence; the evaluator iterates in this order.
pub type ModelRegistry = Vec<TrainedEntry>;

/// Grid-search and fit every family on the training partition, persisting
/// each winner under the run's models directory.
pub fn run(
    data: &ProcessedData,
    dirs: &RunDirs,
    logger: &RunLogger,
    seed: u64,
) -> Result<ModelRegistry> {
    logger.log("===== STARTING MODEL TRAINING =====");
    logger.log(&format!(
        "Training on {} rows, {} features",
        data.x_train.nrows(),
        data.x_train.ncols()
    ));

    let search = GridSearch::new(CV_FOLDS, seed);
    let mut registry = ModelRegistry::new();

    for family in model_families() {
        logger.log(&format!(
            "Training {} ({} candidates, {}-fold CV)",
            family.name,
            family.grid.len(),
            CV_FOLDS
        ));

        let outcome = search.run(&family, &data.x_train, &data.y_train)?;

        logger.log(&format!(
            "Best parameters for {}: {}",
            family.name,
            outcome.params.describe()
        ));
        logger.log(&format!(
            "Best CV score for {} (neg MSE): {:.4}",
            family.name, outcome.cv_score
        ));

        let model_path = dirs
            .models
            .join(format!("{}.pkl", snake_case_name(family.name)));
        outcome.model.save(&model_path)?;
        logger.log(&format!("Saved {}", model_path.display()));

        registry.push(TrainedEntry {
            name: family.name.to_string(),
            params: outcome.params,
            model: outcome.model,
            cv_score: outcome.cv_score,
        });
    }

    logger.log("Model training completed successfully");
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ProcessedData;
    use crate::logging::RunLogger;
    use crate::run::RunDirs;
    use crate::search::FamilySpec;
    use ndarray::{Array1, Array2};
    use polars::prelude::*;
    use tempfile::TempDir;

    fn small_data(n: usize) -> ProcessedData {
        let x = Array2::from_shape_fn((n, 2), |(i, j)| (i * (j + 1)) as f64);
        let y = Array1::from_shape_fn(n, |i| 3.0 * i as f64 + 2.0);
        let df = DataFrame::new(vec![Column::new("G3".into(), vec![0.0; n])]).unwrap();
        ProcessedData {
            x_train: x.clone(),
            x_test: x.clone(),
            x_train_scaled: x.clone(),
            x_test_scaled: x,
            y_train: y.clone(),
            y_test: y,
            feature_names: vec!["f0".to_string(), "f1".to_string()],
            original: df,
        }
    }

    #[test]
    fn test_single_family_search_persists_model() {
        // Full four-family training is covered by the integration test;
        // here, one small family keeps the runtime down.
        let tmp = TempDir::new().unwrap();
        let dirs = RunDirs::create(tmp.path()).unwrap();
        let logger = RunLogger::open(&dirs.log_file()).unwrap();
        let data = small_data(40);

        let spec = FamilySpec {
            name: "Linear Regression",
            grid: vec![
                crate::search::CandidateParams::Linear {
                    fit_intercept: true,
                },
                crate::search::CandidateParams::Linear {
                    fit_intercept: false,
                },
            ],
        };
        let outcome = GridSearch::new(5, 42)
            .run(&spec, &data.x_train, &data.y_train)
            .unwrap();

        let path = dirs.models.join("linear_regression.pkl");
        outcome.model.save(&path).unwrap();
        assert!(path.exists());

        let loaded = TrainedModel::load(&path).unwrap();
        assert_eq!(
            loaded.predict(&data.x_test).unwrap(),
            outcome.model.predict(&data.x_test).unwrap()
        );
        let _ = logger;
    }

    #[test]
    fn test_registry_order_is_training_order() {
        let families = model_families();
        let names: Vec<&str> = families.iter().map(|f| f.name).collect();
        assert_eq!(
            names,
            vec![
                "Linear Regression",
                "Decision Tree",
                "Random Forest",
                "Gradient Boosting"
            ]
        );
    }
}

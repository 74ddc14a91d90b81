//! Stage 4: test-set evaluation and best-model selection

use crate::data::ProcessedData;
use crate::error::{GradeMlError, Result};
use crate::logging::RunLogger;
use crate::metrics::RegressionMetrics;
use crate::models::snake_case_name;
use crate::plots;
use crate::run::RunDirs;
use crate::stages::train::ModelRegistry;
use std::fs;

/// Metrics of one family on the test partition.
#[derive(Debug, Clone)]
pub struct FamilyResult {
    pub name: String,
    pub metrics: RegressionMetrics,
}

/// Evaluate every trained model on the test partition, render its
/// predicted-vs-actual scatter, write `evaluation_results.json`, and persist
/// the lowest-RMSE model as the canonical best. Iteration follows training
/// order and the comparison is strict, so ties keep the earlier model.
pub fn run(
    registry: &ModelRegistry,
    data: &ProcessedData,
    dirs: &RunDirs,
    logger: &RunLogger,
) -> Result<(String, Vec<FamilyResult>)> {
    logger.log("===== STARTING MODEL EVALUATION =====");

    if registry.is_empty() {
        return Err(GradeMlError::Data("no trained models to evaluate".to_string()));
    }

    let mut results = Vec::with_capacity(registry.len());
    let mut best_idx = 0;
    let mut best_rmse = f64::INFINITY;

    for (idx, entry) in registry.iter().enumerate() {
        let predictions = entry.model.predict(&data.x_test)?;
        let metrics = RegressionMetrics::compute(&data.y_test, &predictions)?;

        logger.log(&format!(
            "{}: RMSE = {:.4}, MAE = {:.4}, R2 = {:.4}",
            entry.name, metrics.rmse, metrics.mae, metrics.r2
        ));

        let scatter_path = dirs
            .plots
            .join(format!("{}_predictions.png", snake_case_name(&entry.name)));
        let actual = data.y_test.to_vec();
        let predicted = predictions.to_vec();
        plots::prediction_scatter(
            &actual,
            &predicted,
            &format!("{}: Predicted vs Actual", entry.name),
            &scatter_path,
        )?;

        if metrics.rmse < best_rmse {
            best_rmse = metrics.rmse;
            best_idx = idx;
        }

        results.push(FamilyResult {
            name: entry.name.clone(),
            metrics,
        });
    }

    let report_path = dirs.logs.join("evaluation_results.json");
    let mut report = serde_json::Map::new();
    for result in &results {
        report.insert(
            result.name.clone(),
            serde_json::to_value(result.metrics)?,
        );
    }
    fs::write(
        &report_path,
        serde_json::to_string_pretty(&serde_json::Value::Object(report))?,
    )?;
    logger.log(&format!("Saved {}", report_path.display()));

    let best = &registry[best_idx];
    let best_path = dirs.canonical_models.join("best_model.pkl");
    best.model.save(&best_path)?;
    logger.log(&format!(
        "Best model: {} (RMSE = {:.4}), saved to {}",
        best.name, best_rmse, best_path.display()
    ));

    logger.log("Model evaluation completed successfully");
    Ok((best.name.clone(), results))
}

//! Student-performance regression pipeline.
//!
//! Loads a tabular CSV with a numeric `G3` target, cleans and encodes it,
//! trains four regression model families with exhaustive grid search and
//! 5-fold cross-validation, evaluates them on a held-out split, and persists
//! the best model. Batch, single run, flat-file artifacts.

pub mod data;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod plots;
pub mod run;
pub mod search;
pub mod stages;

pub use error::{GradeMlError, Result};

use logging::RunLogger;
use run::RunDirs;
use std::path::Path;

/// Target column of the student dataset.
pub const TARGET_COLUMN: &str = "G3";

/// Outcome of a full pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineSummary {
    pub best_model: String,
    pub run_dir: std::path::PathBuf,
    pub results: Vec<stages::FamilyResult>,
}

/// Run all four stages in order. The first failing stage aborts the run.
pub fn run_pipeline(data_path: &Path, output_root: &Path, seed: u64) -> Result<PipelineSummary> {
    let dirs = RunDirs::create(output_root)?;
    let logger = RunLogger::open(&dirs.log_file())?;

    let data = stages::preprocess::run(data_path, &dirs, &logger, seed)?;
    stages::visualize::run(&data, &dirs, &logger)?;
    let registry = stages::train::run(&data, &dirs, &logger, seed)?;
    let (best_model, results) = stages::evaluate::run(&registry, &data, &dirs, &logger)?;

    logger.log(&format!(
        "Pipeline finished. Best model: {}. Artifacts in {}",
        best_model,
        dirs.root.display()
    ));

    Ok(PipelineSummary {
        best_model,
        run_dir: dirs.root,
        results,
    })
}

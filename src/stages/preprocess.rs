//! Stage 1: load, clean, encode, split, scale

use crate::data::{
    self, columns_to_array2, column_to_vec, train_test_split, Imputer, OneHotEncoder,
    ProcessedData, StandardScaler,
};
use crate::error::Result;
use crate::logging::RunLogger;
use crate::run::RunDirs;
use crate::TARGET_COLUMN;
use ndarray::Array1;
use std::path::Path;

const TEST_RATIO: f64 = 0.2;

/// Run preprocessing end to end and return the typed data bundle.
pub fn run(
    data_path: &Path,
    dirs: &RunDirs,
    logger: &RunLogger,
    seed: u64,
) -> Result<ProcessedData> {
    logger.log("===== STARTING DATA PREPROCESSING =====");

    logger.log(&format!("Loading data from {}", data_path.display()));
    let original = data::load_csv(data_path)?;
    data::validate_schema(&original, TARGET_COLUMN)?;
    logger.log(&format!(
        "Data loaded successfully with shape: ({}, {})",
        original.height(),
        original.width()
    ));

    // Fill statistics come from all rows, ahead of the split
    logger.log("Handling missing values (numeric mean / categorical mode)");
    let mut imputer = Imputer::new();
    let filled = imputer.fit_transform(&original)?;

    logger.log("One-hot encoding categorical features (dropping first level)");
    let mut encoder = OneHotEncoder::new();
    let encoded = encoder.fit_transform(&filled)?;

    let feature_names: Vec<String> = encoded
        .get_column_names()
        .into_iter()
        .filter(|name| name.as_str() != TARGET_COLUMN)
        .map(|name| name.to_string())
        .collect();
    logger.log(&format!("Feature matrix has {} columns", feature_names.len()));

    let x = columns_to_array2(&encoded, &feature_names)?;
    let y = Array1::from_vec(column_to_vec(&encoded, TARGET_COLUMN)?);

    logger.log(&format!(
        "Splitting data: {:.0}% test, seed {}",
        TEST_RATIO * 100.0,
        seed
    ));
    let (train_idx, test_idx) = train_test_split(x.nrows(), TEST_RATIO, seed)?;
    let x_train = data::take_rows(&x, &train_idx);
    let x_test = data::take_rows(&x, &test_idx);
    let y_train = data::take_values(&y, &train_idx);
    let y_test = data::take_values(&y, &test_idx);
    logger.log(&format!(
        "Train set: {} rows, test set: {} rows",
        x_train.nrows(),
        x_test.nrows()
    ));

    logger.log("Scaling features (fit on train partition only)");
    let mut scaler = StandardScaler::new();
    let x_train_scaled = scaler.fit_transform(&x_train)?;
    let x_test_scaled = scaler.transform(&x_test)?;

    let run_scaler_path = dirs.models.join("scaler.pkl");
    scaler.save(&run_scaler_path)?;
    let canonical_scaler_path = dirs.canonical_models.join("scaler.pkl");
    scaler.save(&canonical_scaler_path)?;
    logger.log(&format!("Scaler saved to {}", run_scaler_path.display()));

    logger.log("Data preprocessing completed successfully");

    Ok(ProcessedData {
        x_train,
        x_test,
        x_train_scaled,
        x_test_scaled,
        y_train,
        y_test,
        feature_names,
        original,
    })
}

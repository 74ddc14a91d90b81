//! Data loading, cleaning and partitioning

pub mod encoder;
pub mod imputer;
pub mod loader;
pub mod scaler;
pub mod split;

use crate::error::{GradeMlError, Result};
use ndarray::{Array1, Array2, Axis};
use polars::prelude::*;

pub use encoder::OneHotEncoder;
pub use imputer::Imputer;
pub use loader::{load_csv, validate_schema};
pub use scaler::StandardScaler;
pub use split::train_test_split;

/// Everything later stages need: raw and standardized feature matrices for
/// both partitions, the targets, the feature order, and the untouched input
/// frame for diagnostics.
#[derive(Debug, Clone)]
pub struct ProcessedData {
    pub x_train: Array2<f64>,
    pub x_test: Array2<f64>,
    pub x_train_scaled: Array2<f64>,
    pub x_test_scaled: Array2<f64>,
    pub y_train: Array1<f64>,
    pub y_test: Array1<f64>,
    pub feature_names: Vec<String>,
    pub original: DataFrame,
}

/// Extract the named columns of a DataFrame into a row-major matrix,
/// casting each column to f64. Column order defines feature order.
pub fn columns_to_array2(df: &DataFrame, columns: &[String]) -> Result<Array2<f64>> {
    let n_rows = df.height();
    let n_cols = columns.len();

    let mut col_values: Vec<Vec<f64>> = Vec::with_capacity(n_cols);
    for name in columns {
        col_values.push(column_to_vec(df, name)?);
    }

    Ok(Array2::from_shape_fn((n_rows, n_cols), |(r, c)| {
        col_values[c][r]
    }))
}

/// Extract one column as a dense f64 vector. Nulls are an error here; the
/// imputer runs before any matrix extraction.
pub fn column_to_vec(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    let series = df
        .column(name)
        .map_err(|_| GradeMlError::Schema(format!("column '{}' not found", name)))?
        .as_materialized_series()
        .clone();

    let ca = series
        .cast(&DataType::Float64)
        .map_err(|e| GradeMlError::Data(format!("column '{}' is not numeric: {}", name, e)))?
        .f64()
        .map_err(|e| GradeMlError::Data(e.to_string()))?
        .clone();

    ca.into_iter()
        .enumerate()
        .map(|(i, opt)| {
            opt.ok_or_else(|| {
                GradeMlError::Data(format!("null in column '{}' at row {}", name, i))
            })
        })
        .collect()
}

/// Select rows of a matrix by index.
pub fn take_rows(x: &Array2<f64>, indices: &[usize]) -> Array2<f64> {
    x.select(Axis(0), indices)
}

/// Select elements of a vector by index.
pub fn take_values(y: &Array1<f64>, indices: &[usize]) -> Array1<f64> {
    Array1::from_vec(indices.iter().map(|&i| y[i]).collect())
}

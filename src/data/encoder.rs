//! One-hot encoding of categorical columns

use crate::error::{GradeMlError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// One-hot encoder over string columns.
///
/// Levels are sorted per column and the first level is dropped, so a column
/// with k levels expands to k-1 indicator columns named `<col>_<level>`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OneHotEncoder {
    // (column name, sorted levels), in source column order
    levels: Vec<(String, Vec<String>)>,
    is_fitted: bool,
}

impl OneHotEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the sorted level set of every string column.
    pub fn fit(&mut self, df: &DataFrame) -> Result<&mut Self> {
        self.levels.clear();

        for column in df.get_columns() {
            let series = column.as_materialized_series();
            if series.dtype() != &DataType::String {
                continue;
            }

            let ca = series
                .str()
                .map_err(|e| GradeMlError::Data(e.to_string()))?;

            let mut levels: Vec<String> = ca
                .into_iter()
                .flatten()
                .map(|s| s.to_string())
                .collect();
            levels.sort();
            levels.dedup();

            if levels.is_empty() {
                return Err(GradeMlError::Data(format!(
                    "categorical column '{}' has no values",
                    series.name()
                )));
            }

            self.levels.push((series.name().to_string(), levels));
        }

        self.is_fitted = true;
        Ok(self)
    }

    /// Replace each fitted string column with its indicator columns.
    /// Indicators are appended after the remaining columns, grouped by
    /// source column.
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(GradeMlError::NotFitted);
        }

        let mut result = df.clone();

        for (col_name, levels) in &self.levels {
            let series = result
                .column(col_name.as_str())
                .map_err(|e| GradeMlError::Data(e.to_string()))?
                .as_materialized_series()
                .clone();
            let ca = series
                .str()
                .map_err(|e| GradeMlError::Data(e.to_string()))?;

            let values: Vec<Option<&str>> = ca.into_iter().collect();

            result = result
                .drop(col_name.as_str())
                .map_err(|e| GradeMlError::Data(e.to_string()))?;

            // drop-first: indicators for levels[1..] only
            for level in levels.iter().skip(1) {
                let indicator: Vec<f64> = values
                    .iter()
                    .map(|opt| match opt {
                        Some(v) if *v == level.as_str() => 1.0,
                        _ => 0.0,
                    })
                    .collect();
                let name = format!("{}_{}", col_name, level);
                result = result
                    .with_column(Series::new(name.into(), indicator))
                    .map_err(|e| GradeMlError::Data(e.to_string()))?
                    .clone();
            }
        }

        Ok(result)
    }

    /// Fit and transform in one step.
    pub fn fit_transform(&mut self, df: &DataFrame) -> Result<DataFrame> {
        self.fit(df)?;
        self.transform(df)
    }

    /// Names of the fitted categorical columns, in source order.
    pub fn categorical_columns(&self) -> Vec<&str> {
        self.levels.iter().map(|(name, _)| name.as_str()).collect()
    }
}

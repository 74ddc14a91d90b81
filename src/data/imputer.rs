//! Missing-value imputation

use crate::error::{GradeMlError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

fn is_numeric(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Column-wise imputer: numeric columns are filled with their mean, string
/// columns with their mode. Fill values are computed by `fit` and reused by
/// `transform`, so the statistics can come from a different frame than the
/// one being filled.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Imputer {
    numeric_fill: HashMap<String, f64>,
    categorical_fill: HashMap<String, String>,
    is_fitted: bool,
}

impl Imputer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute per-column fill values over all rows of `df`.
    pub fn fit(&mut self, df: &DataFrame) -> Result<&mut Self> {
        for column in df.get_columns() {
            let series = column.as_materialized_series();
            let name = series.name().to_string();

            if is_numeric(series.dtype()) {
                let ca = series
                    .cast(&DataType::Float64)
                    .map_err(|e| GradeMlError::Data(e.to_string()))?
                    .f64()
                    .map_err(|e| GradeMlError::Data(e.to_string()))?
                    .clone();
                // mean() skips nulls
                let mean = ca.mean().unwrap_or(0.0);
                self.numeric_fill.insert(name, mean);
            } else if series.dtype() == &DataType::String {
                let mode = string_mode(series)?;
                self.categorical_fill.insert(name, mode);
            }
        }

        self.is_fitted = true;
        Ok(self)
    }

    /// Replace nulls with the fitted fill values. Numeric columns come back
    /// as Float64.
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(GradeMlError::NotFitted);
        }

        let mut result = df.clone();

        for column in df.get_columns() {
            let series = column.as_materialized_series();
            let name = series.name().to_string();

            let filled = if let Some(&fill) = self.numeric_fill.get(&name) {
                let ca = series
                    .cast(&DataType::Float64)
                    .map_err(|e| GradeMlError::Data(e.to_string()))?
                    .f64()
                    .map_err(|e| GradeMlError::Data(e.to_string()))?
                    .clone();
                let values: Vec<f64> = ca.into_iter().map(|opt| opt.unwrap_or(fill)).collect();
                Some(Series::new(series.name().clone(), values))
            } else if let Some(fill) = self.categorical_fill.get(&name) {
                let ca = series
                    .str()
                    .map_err(|e| GradeMlError::Data(e.to_string()))?;
                let values: Vec<String> = ca
                    .into_iter()
                    .map(|opt| opt.unwrap_or(fill.as_str()).to_string())
                    .collect();
                Some(Series::new(series.name().clone(), values))
            } else {
                None
            };

            if let Some(filled) = filled {
                result = result
                    .with_column(filled)
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

    /// Fill value computed for a numeric column, if any.
    pub fn numeric_fill(&self, column: &str) -> Option<f64> {
        self.numeric_fill.get(column).copied()
    }
}

/// Most frequent non-null value; ties broken by the lexicographically
/// smallest value so the result is deterministic.
fn string_mode(series: &Series) -> Result<String> {
    let ca = series
        .str()
        .map_err(|e| GradeMlError::Data(e.to_string()))?;

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for value in ca.into_iter().flatten() {
        *counts.entry(value).or_insert(0) += 1;
    }

    counts
        .into_iter()
        .max_by(|(a_val, a_count), (b_val, b_count)| {
            a_count.cmp(b_count).then(b_val.cmp(a_val))
        })
        .map(|(value, _)| value.to_string())
        .ok_or_else(|| {
            GradeMlError::Data(format!(
                "column '{}' has no non-null values to impute from",
                series.name()
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_mean_fill() {
        let df = DataFrame::new(vec![Column::new(
            "age".into(),
            &[Some(10.0), None, Some(20.0)],
        )])
        .unwrap();

        let mut imputer = Imputer::new();
        let filled = imputer.fit_transform(&df).unwrap();

        let col = filled.column("age").unwrap().f64().unwrap();
        assert_eq!(col.null_count(), 0);
        assert!((col.get(1).unwrap() - 15.0).abs() < 1e-12);
        // mean over originally-non-null values unchanged
        assert!((imputer.numeric_fill("age").unwrap() - 15.0).abs() < 1e-12);
    }

    #[test]
    fn test_categorical_mode_fill() {
        let df = DataFrame::new(vec![Column::new(
            "school".into(),
            &[Some("GP"), Some("GP"), None, Some("MS")],
        )])
        .unwrap();

        let mut imputer = Imputer::new();
        let filled = imputer.fit_transform(&df).unwrap();

        let col = filled.column("school").unwrap().str().unwrap();
        assert_eq!(col.null_count(), 0);
        assert_eq!(col.get(2).unwrap(), "GP");
    }

    #[test]
    fn test_mode_tie_is_deterministic() {
        let df = DataFrame::new(vec![Column::new(
            "sex".into(),
            &[Some("M"), Some("F"), None],
        )])
        .unwrap();

        let mut imputer = Imputer::new();
        let filled = imputer.fit_transform(&df).unwrap();
        // "F" and "M" both appear once; smallest wins
        assert_eq!(
            filled.column("sex").unwrap().str().unwrap().get(2).unwrap(),
            "F"
        );
    }

    #[test]
    fn test_transform_before_fit() {
        let df = DataFrame::new(vec![Column::new("a".into(), &[1.0, 2.0])]).unwrap();
        let imputer = Imputer::new();
        assert!(matches!(
            imputer.transform(&df),
            Err(GradeMlError::NotFitted)
        ));
    }
}

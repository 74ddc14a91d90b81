//! Stage 2: diagnostic charts and the correlation export

use crate::data::ProcessedData;
use crate::error::{GradeMlError, Result};
use crate::logging::RunLogger;
use crate::plots;
use crate::run::RunDirs;
use crate::TARGET_COLUMN;
use polars::prelude::*;
use std::collections::HashMap;
use std::fs::File;

/// Render the target histogram, correlation heatmap and per-category mean
/// target bar charts, and export the correlation matrix as CSV. Side
/// effects only.
pub fn run(data: &ProcessedData, dirs: &RunDirs, logger: &RunLogger) -> Result<()> {
    logger.log("===== STARTING DATA VISUALIZATION =====");
    let df = &data.original;

    let target = numeric_column_options(df, TARGET_COLUMN)?;
    let target_values: Vec<f64> = target.iter().copied().flatten().collect();

    let hist_path = dirs.plots.join(format!("{}_distribution.png", TARGET_COLUMN));
    plots::histogram(
        &target_values,
        20,
        &format!("Distribution of {}", TARGET_COLUMN),
        TARGET_COLUMN,
        &hist_path,
    )?;
    logger.log(&format!("Saved {}", hist_path.display()));

    let (names, matrix) = correlation_matrix(df)?;

    let csv_path = dirs.logs.join("correlation_matrix.csv");
    write_correlation_csv(&names, &matrix, &csv_path)?;
    logger.log(&format!("Saved {}", csv_path.display()));

    let heatmap_path = dirs.plots.join("correlation_heatmap.png");
    plots::correlation_heatmap(&names, &matrix, "Feature Correlation", &heatmap_path)?;
    logger.log(&format!("Saved {}", heatmap_path.display()));

    for column in df.get_columns() {
        let series = column.as_materialized_series();
        if series.dtype() != &DataType::String {
            continue;
        }
        let name = series.name().to_string();
        let means = mean_target_by_category(series, &target)?;

        let bar_path = dirs.plots.join(format!("{}_by_{}.png", TARGET_COLUMN, name));
        plots::bar_chart(
            &means,
            &format!("Mean {} by {}", TARGET_COLUMN, name),
            &format!("Mean {}", TARGET_COLUMN),
            &bar_path,
        )?;
        logger.log(&format!("Saved {}", bar_path.display()));
    }

    logger.log("Data visualization completed successfully");
    Ok(())
}

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

fn numeric_column_options(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let series = df
        .column(name)
        .map_err(|_| GradeMlError::Schema(format!("column '{}' not found", name)))?
        .as_materialized_series()
        .clone();
    let ca = series
        .cast(&DataType::Float64)
        .map_err(|e| GradeMlError::Data(e.to_string()))?
        .f64()
        .map_err(|e| GradeMlError::Data(e.to_string()))?
        .clone();
    Ok(ca.into_iter().collect())
}

/// Pearson correlation over the numeric columns, pairwise over rows where
/// both values are present. Degenerate pairs (fewer than two complete rows,
/// or a constant column) get 0.0; the diagonal is 1.0.
fn correlation_matrix(df: &DataFrame) -> Result<(Vec<String>, Vec<Vec<f64>>)> {
    let mut names = Vec::new();
    let mut columns: Vec<Vec<Option<f64>>> = Vec::new();

    for column in df.get_columns() {
        let series = column.as_materialized_series();
        if is_numeric(series.dtype()) {
            names.push(series.name().to_string());
            columns.push(numeric_column_options(df, series.name().as_str())?);
        }
    }

    if names.is_empty() {
        return Err(GradeMlError::Data(
            "no numeric columns to correlate".to_string(),
        ));
    }

    let n = names.len();
    let mut matrix = vec![vec![0.0; n]; n];
    for i in 0..n {
        matrix[i][i] = 1.0;
        for j in (i + 1)..n {
            let r = pearson(&columns[i], &columns[j]);
            matrix[i][j] = r;
            matrix[j][i] = r;
        }
    }

    Ok((names, matrix))
}

fn pearson(a: &[Option<f64>], b: &[Option<f64>]) -> f64 {
    let pairs: Vec<(f64, f64)> = a
        .iter()
        .zip(b.iter())
        .filter_map(|(x, y)| match (x, y) {
            (Some(x), Some(y)) => Some((*x, *y)),
            _ => None,
        })
        .collect();

    if pairs.len() < 2 {
        return 0.0;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in &pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return 0.0;
    }
    cov / (var_x.sqrt() * var_y.sqrt())
}

fn write_correlation_csv(
    names: &[String],
    matrix: &[Vec<f64>],
    path: &std::path::Path,
) -> Result<()> {
    let mut columns: Vec<Column> = Vec::with_capacity(names.len() + 1);
    columns.push(Column::new("column".into(), names.to_vec()));
    for (j, name) in names.iter().enumerate() {
        let values: Vec<f64> = matrix.iter().map(|row| row[j]).collect();
        columns.push(Column::new(name.as_str().into(), values));
    }
    let mut out = DataFrame::new(columns).map_err(|e| GradeMlError::Data(e.to_string()))?;

    let mut file = File::create(path)?;
    CsvWriter::new(&mut file)
        .finish(&mut out)
        .map_err(|e| GradeMlError::Data(e.to_string()))?;
    Ok(())
}

/// Mean target per category level, sorted by descending mean.
fn mean_target_by_category(
    series: &Series,
    target: &[Option<f64>],
) -> Result<Vec<(String, f64)>> {
    let ca = series
        .str()
        .map_err(|e| GradeMlError::Data(e.to_string()))?;

    let mut sums: HashMap<String, (f64, usize)> = HashMap::new();
    for (level, y) in ca.into_iter().zip(target.iter()) {
        if let (Some(level), Some(y)) = (level, y) {
            let entry = sums.entry(level.to_string()).or_insert((0.0, 0));
            entry.0 += y;
            entry.1 += 1;
        }
    }

    if sums.is_empty() {
        return Err(GradeMlError::Data(format!(
            "no complete rows for category column '{}'",
            series.name()
        )));
    }

    let mut means: Vec<(String, f64)> = sums
        .into_iter()
        .map(|(level, (sum, count))| (level, sum / count as f64))
        .collect();
    means.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
    Ok(means)
}

//! PNG chart rendering

use crate::error::{GradeMlError, Result};
use plotters::prelude::*;
use std::path::Path;

const CHART_SIZE: (u32, u32) = (800, 600);

fn plot_err<E: std::fmt::Display>(err: E) -> GradeMlError {
    GradeMlError::Plot(err.to_string())
}

/// Histogram of a numeric sample.
pub fn histogram(
    values: &[f64],
    bins: usize,
    title: &str,
    x_desc: &str,
    path: &Path,
) -> Result<()> {
    if values.is_empty() || bins == 0 {
        return Err(GradeMlError::Plot(
            "histogram needs values and at least one bin".to_string(),
        ));
    }

    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for &v in values {
        min = min.min(v);
        max = max.max(v);
    }
    if min == max {
        min -= 0.5;
        max += 0.5;
    }

    let bin_width = (max - min) / bins as f64;
    let mut counts = vec![0usize; bins];
    for &v in values {
        let idx = (((v - min) / bin_width) as usize).min(bins - 1);
        counts[idx] += 1;
    }
    let max_count = *counts.iter().max().unwrap_or(&1) as f64;

    let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(min..max, 0f64..max_count * 1.1)
        .map_err(plot_err)?;

    chart
        .configure_mesh()
        .x_desc(x_desc)
        .y_desc("Count")
        .draw()
        .map_err(plot_err)?;

    chart
        .draw_series(counts.iter().enumerate().map(|(i, &count)| {
            let x0 = min + i as f64 * bin_width;
            let x1 = x0 + bin_width;
            Rectangle::new([(x0, 0.0), (x1, count as f64)], BLUE.mix(0.6).filled())
        }))
        .map_err(plot_err)?;

    root.present().map_err(plot_err)?;
    Ok(())
}

/// Correlation heatmap. `matrix` is square in the order of `names`, with
/// values in [-1, 1]; positive cells shade red, negative blue.
pub fn correlation_heatmap(
    names: &[String],
    matrix: &[Vec<f64>],
    title: &str,
    path: &Path,
) -> Result<()> {
    let n = names.len();
    if n == 0 || matrix.len() != n || matrix.iter().any(|row| row.len() != n) {
        return Err(GradeMlError::Plot(
            "heatmap needs a square matrix matching the label count".to_string(),
        ));
    }

    let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(80)
        .y_label_area_size(100)
        .build_cartesian_2d(0f64..n as f64, 0f64..n as f64)
        .map_err(plot_err)?;

    let x_names = names.to_vec();
    let y_names = names.to_vec();
    chart
        .configure_mesh()
        .disable_x_mesh()
        .disable_y_mesh()
        .x_labels(n)
        .y_labels(n)
        .x_label_formatter(&move |x| {
            let idx = *x as usize;
            x_names.get(idx).cloned().unwrap_or_default()
        })
        .y_label_formatter(&move |y| {
            let idx = *y as usize;
            y_names.get(idx).cloned().unwrap_or_default()
        })
        .draw()
        .map_err(plot_err)?;

    chart
        .draw_series((0..n).flat_map(|i| {
            (0..n).map(move |j| (i, j))
        }).map(|(i, j)| {
            let v = matrix[i][j].clamp(-1.0, 1.0);
            let intensity = (v.abs() * 255.0) as u8;
            let color = if v >= 0.0 {
                RGBColor(255, 255 - intensity, 255 - intensity)
            } else {
                RGBColor(255 - intensity, 255 - intensity, 255)
            };
            Rectangle::new(
                [(j as f64, i as f64), (j as f64 + 1.0, i as f64 + 1.0)],
                color.filled(),
            )
        }))
        .map_err(plot_err)?;

    root.present().map_err(plot_err)?;
    Ok(())
}

/// Vertical bar chart over labeled categories.
pub fn bar_chart(
    categories: &[(String, f64)],
    title: &str,
    y_desc: &str,
    path: &Path,
) -> Result<()> {
    if categories.is_empty() {
        return Err(GradeMlError::Plot("bar chart needs categories".to_string()));
    }

    let n = categories.len();
    let max_value = categories
        .iter()
        .map(|(_, v)| *v)
        .fold(f64::NEG_INFINITY, f64::max)
        .max(0.0);

    let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(60)
        .y_label_area_size(50)
        .build_cartesian_2d(0f64..n as f64, 0f64..max_value * 1.1 + f64::EPSILON)
        .map_err(plot_err)?;

    let labels: Vec<String> = categories.iter().map(|(name, _)| name.clone()).collect();
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(n)
        .x_label_formatter(&move |x| {
            let idx = *x as usize;
            labels.get(idx).cloned().unwrap_or_default()
        })
        .y_desc(y_desc)
        .draw()
        .map_err(plot_err)?;

    chart
        .draw_series(categories.iter().enumerate().map(|(i, (_, value))| {
            Rectangle::new(
                [(i as f64 + 0.15, 0.0), (i as f64 + 0.85, *value)],
                GREEN.mix(0.7).filled(),
            )
        }))
        .map_err(plot_err)?;

    root.present().map_err(plot_err)?;
    Ok(())
}

/// Predicted-vs-actual scatter with the identity line.
pub fn prediction_scatter(
    actual: &[f64],
    predicted: &[f64],
    title: &str,
    path: &Path,
) -> Result<()> {
    if actual.is_empty() || actual.len() != predicted.len() {
        return Err(GradeMlError::Plot(
            "scatter needs equal-length non-empty samples".to_string(),
        ));
    }

    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for &v in actual.iter().chain(predicted.iter()) {
        min = min.min(v);
        max = max.max(v);
    }
    let pad = ((max - min) * 0.05).max(0.5);
    let (lo, hi) = (min - pad, max + pad);

    let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(lo..hi, lo..hi)
        .map_err(plot_err)?;

    chart
        .configure_mesh()
        .x_desc("Actual")
        .y_desc("Predicted")
        .draw()
        .map_err(plot_err)?;

    chart
        .draw_series(LineSeries::new(vec![(lo, lo), (hi, hi)], &RED))
        .map_err(plot_err)?;

    chart
        .draw_series(
            actual
                .iter()
                .zip(predicted.iter())
                .map(|(&a, &p)| Circle::new((a, p), 3, BLUE.mix(0.6).filled())),
        )
        .map_err(plot_err)?;

    root.present().map_err(plot_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_histogram_writes_png() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hist.png");
        let values: Vec<f64> = (0..100).map(|i| (i % 20) as f64).collect();

        histogram(&values, 20, "Distribution", "value", &path).unwrap();
        assert!(path.exists());
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }

    #[test]
    fn test_scatter_writes_png() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("scatter.png");
        let actual = vec![1.0, 2.0, 3.0, 4.0];
        let predicted = vec![1.1, 1.9, 3.2, 3.8];

        prediction_scatter(&actual, &predicted, "Predictions", &path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_heatmap_rejects_ragged_matrix() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("heat.png");
        let names = vec!["a".to_string(), "b".to_string()];
        let matrix = vec![vec![1.0, 0.5]];

        assert!(correlation_heatmap(&names, &matrix, "Corr", &path).is_err());
    }

    #[test]
    fn test_empty_inputs_rejected() {
        let dir = TempDir::new().unwrap();
        assert!(histogram(&[], 10, "t", "x", &dir.path().join("a.png")).is_err());
        assert!(bar_chart(&[], "t", "y", &dir.path().join("b.png")).is_err());
    }
}

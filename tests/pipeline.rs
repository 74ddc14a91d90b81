//! End-to-end pipeline scenarios on a synthetic student table.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const FAMILIES: [&str; 4] = [
    "linear_regression",
    "decision_tree",
    "random_forest",
    "gradient_boosting",
];

/// 395 rows in the shape of the student dataset: categorical school / sex /
/// address, numeric age / studytime / absences / G1 / G2, numeric G3 target.
/// A few cells are left empty to exercise imputation.
fn write_student_csv(dir: &Path) -> PathBuf {
    let path = dir.join("student.csv");
    let mut file = fs::File::create(&path).unwrap();
    writeln!(file, "school,sex,address,age,studytime,absences,G1,G2,G3").unwrap();

    for i in 0..395usize {
        let school = if i % 3 == 0 { "GP" } else { "MS" };
        let sex = if i % 2 == 0 { "F" } else { "M" };
        let address = if i % 5 == 0 { "R" } else { "U" };
        let age = 15 + (i % 6);
        let studytime = 1 + (i % 4);
        let absences = (i * 7) % 30;
        let g1 = (studytime * 3 + (30 - absences) / 3 + i % 4).min(20);
        let g2 = (g1 + (i % 3)).min(20);
        let g3 = (g1 + g2) / 2;

        // sprinkle missing values
        let absences_field = if i % 57 == 0 {
            String::new()
        } else {
            absences.to_string()
        };
        let address_field = if i % 101 == 0 { "" } else { address };

        writeln!(
            file,
            "{},{},{},{},{},{},{},{},{}",
            school, sex, address_field, age, studytime, absences_field, g1, g2, g3
        )
        .unwrap();
    }
    path
}

#[test]
fn full_pipeline_produces_all_artifacts() {
    let tmp = TempDir::new().unwrap();
    let csv = write_student_csv(tmp.path());
    let output_root = tmp.path().join("out");
    fs::create_dir_all(&output_root).unwrap();

    let summary = grademl::run_pipeline(&csv, &output_root, 42).unwrap();

    assert!(summary.run_dir.is_dir());
    assert!(summary
        .run_dir
        .file_name()
        .unwrap()
        .to_string_lossy()
        .starts_with("training_results_"));

    let models_dir = summary.run_dir.join("models");
    let plots_dir = summary.run_dir.join("plots");
    let logs_dir = summary.run_dir.join("logs");

    // one model file per family, plus the scaler
    for family in FAMILIES {
        assert!(
            models_dir.join(format!("{}.pkl", family)).exists(),
            "missing model file for {}",
            family
        );
        assert!(
            plots_dir.join(format!("{}_predictions.png", family)).exists(),
            "missing prediction scatter for {}",
            family
        );
    }
    assert!(models_dir.join("scaler.pkl").exists());

    // canonical artifacts overwritten at the output root
    assert!(output_root.join("models/scaler.pkl").exists());
    assert!(output_root.join("models/best_model.pkl").exists());

    // diagnostic charts
    assert!(plots_dir.join("G3_distribution.png").exists());
    assert!(plots_dir.join("correlation_heatmap.png").exists());
    for col in ["school", "sex", "address"] {
        assert!(
            plots_dir.join(format!("G3_by_{}.png", col)).exists(),
            "missing bar chart for {}",
            col
        );
    }

    // logs
    assert!(logs_dir.join("correlation_matrix.csv").exists());
    let log_text = fs::read_to_string(logs_dir.join("training_log.txt")).unwrap();
    assert!(log_text.contains("STARTING MODEL TRAINING"));

    // evaluation report: exactly four entries with the three metric keys
    let report: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(logs_dir.join("evaluation_results.json")).unwrap(),
    )
    .unwrap();
    let report = report.as_object().unwrap();
    assert_eq!(report.len(), 4);
    for (name, metrics) in report {
        let rmse = metrics["RMSE"].as_f64().unwrap();
        let r2 = metrics["R2"].as_f64().unwrap();
        assert!(metrics.get("MAE").is_some(), "{} missing MAE", name);
        assert!(rmse >= 0.0, "{} RMSE negative", name);
        assert!(r2 <= 1.0, "{} R2 above 1", name);
    }

    // best_model.pkl is byte-identical to the winning family's model file
    let best_snake = summary.best_model.to_lowercase().replace(' ', "_");
    let family_bytes = fs::read(models_dir.join(format!("{}.pkl", best_snake))).unwrap();
    let best_bytes = fs::read(output_root.join("models/best_model.pkl")).unwrap();
    assert_eq!(family_bytes, best_bytes);

    // the report's winner matches the summary
    let min_rmse_name = report
        .iter()
        .min_by(|a, b| {
            a.1["RMSE"]
                .as_f64()
                .unwrap()
                .partial_cmp(&b.1["RMSE"].as_f64().unwrap())
                .unwrap()
        })
        .map(|(name, _)| name.clone())
        .unwrap();
    assert_eq!(min_rmse_name, summary.best_model);
}

#[test]
fn malformed_data_path_fails_before_training() {
    let tmp = TempDir::new().unwrap();
    let output_root = tmp.path().join("out");
    fs::create_dir_all(&output_root).unwrap();

    let result = grademl::run_pipeline(
        Path::new("/nonexistent/student.csv"),
        &output_root,
        42,
    );
    assert!(result.is_err());

    // no model artifacts were written
    assert!(!output_root.join("models/best_model.pkl").exists());
    for entry in fs::read_dir(&output_root).unwrap() {
        let entry = entry.unwrap();
        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with("training_results_") {
            let models = entry.path().join("models");
            assert_eq!(fs::read_dir(models).unwrap().count(), 0);
        }
    }
}

#[test]
fn reruns_with_same_seed_train_identical_models() {
    let tmp = TempDir::new().unwrap();
    let csv = write_student_csv(tmp.path());

    let out_a = tmp.path().join("a");
    let out_b = tmp.path().join("b");
    fs::create_dir_all(&out_a).unwrap();
    fs::create_dir_all(&out_b).unwrap();

    let a = grademl::run_pipeline(&csv, &out_a, 42).unwrap();
    let b = grademl::run_pipeline(&csv, &out_b, 42).unwrap();

    assert_eq!(a.best_model, b.best_model);
    for family in FAMILIES {
        let bytes_a = fs::read(a.run_dir.join(format!("models/{}.pkl", family))).unwrap();
        let bytes_b = fs::read(b.run_dir.join(format!("models/{}.pkl", family))).unwrap();
        assert_eq!(bytes_a, bytes_b, "{} differs between identical runs", family);
    }

    // scaler parameters identical as well
    let scaler_a = fs::read(out_a.join("models/scaler.pkl")).unwrap();
    let scaler_b = fs::read(out_b.join("models/scaler.pkl")).unwrap();
    assert_eq!(scaler_a, scaler_b);
}

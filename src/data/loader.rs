//! CSV loading

use crate::error::{GradeMlError, Result};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;

/// Load a CSV file with a header row into a DataFrame.
pub fn load_csv(path: &Path) -> Result<DataFrame> {
    let file = File::open(path)
        .map_err(|e| GradeMlError::Data(format!("cannot open {}: {}", path.display(), e)))?;

    let reader = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(100))
        .into_reader_with_file_handle(file);

    reader
        .finish()
        .map_err(|e| GradeMlError::Data(e.to_string()))
}

/// Check that the target column exists and that at least one other column is
/// present to use as a feature.
pub fn validate_schema(df: &DataFrame, target: &str) -> Result<()> {
    if df.column(target).is_err() {
        return Err(GradeMlError::Schema(format!(
            "target column '{}' not found",
            target
        )));
    }
    if df.width() < 2 {
        return Err(GradeMlError::Schema(
            "no feature columns besides the target".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", contents).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_csv_basic() {
        let file = write_csv("school,age,G3\nGP,17,12\nMS,16,9\n");
        let df = load_csv(file.path()).unwrap();
        assert_eq!(df.shape(), (2, 3));
        assert!(df.column("G3").is_ok());
    }

    #[test]
    fn test_load_csv_missing_file() {
        let err = load_csv(Path::new("/nonexistent/student.csv")).unwrap_err();
        assert!(matches!(err, GradeMlError::Data(_)));
    }

    #[test]
    fn test_validate_schema_missing_target() {
        let file = write_csv("a,b\n1,2\n");
        let df = load_csv(file.path()).unwrap();
        let err = validate_schema(&df, "G3").unwrap_err();
        assert!(matches!(err, GradeMlError::Schema(_)));
    }

    #[test]
    fn test_validate_schema_no_features() {
        let file = write_csv("G3\n10\n");
        let df = load_csv(file.path()).unwrap();
        assert!(validate_schema(&df, "G3").is_err());
    }
}

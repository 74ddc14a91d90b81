//! Run output directory layout

use crate::error::Result;
use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};

/// Directory layout for one pipeline run.
///
/// Each run owns a timestamped `training_results_<ts>/` tree with `models/`,
/// `plots/` and `logs/` subdirectories. A canonical top-level `models/`
/// directory is overwritten by every run so downstream consumers always find
/// the latest scaler and best model at a fixed path.
#[derive(Debug, Clone)]
pub struct RunDirs {
    pub root: PathBuf,
    pub models: PathBuf,
    pub plots: PathBuf,
    pub logs: PathBuf,
    pub canonical_models: PathBuf,
}

impl RunDirs {
    /// Create the directory tree for a new run under `output_root`.
    pub fn create(output_root: &Path) -> Result<Self> {
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let root = output_root.join(format!("training_results_{}", timestamp));
        Self::create_at(output_root, root)
    }

    fn create_at(output_root: &Path, root: PathBuf) -> Result<Self> {
        let dirs = Self {
            models: root.join("models"),
            plots: root.join("plots"),
            logs: root.join("logs"),
            canonical_models: output_root.join("models"),
            root,
        };
        fs::create_dir_all(&dirs.models)?;
        fs::create_dir_all(&dirs.plots)?;
        fs::create_dir_all(&dirs.logs)?;
        fs::create_dir_all(&dirs.canonical_models)?;
        Ok(dirs)
    }

    /// Path of the run log file.
    pub fn log_file(&self) -> PathBuf {
        self.logs.join("training_log.txt")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_creates_full_layout() {
        let tmp = TempDir::new().unwrap();
        let dirs = RunDirs::create(tmp.path()).unwrap();

        assert!(dirs.root.is_dir());
        assert!(dirs.models.is_dir());
        assert!(dirs.plots.is_dir());
        assert!(dirs.logs.is_dir());
        assert!(dirs.canonical_models.is_dir());
        assert!(dirs
            .root
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("training_results_"));
    }

    #[test]
    fn test_canonical_models_is_top_level() {
        let tmp = TempDir::new().unwrap();
        let dirs = RunDirs::create(tmp.path()).unwrap();
        assert_eq!(dirs.canonical_models, tmp.path().join("models"));
    }
}

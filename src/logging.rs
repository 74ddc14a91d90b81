//! Per-run log sink

use crate::error::Result;
use chrono::Local;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

/// Appends timestamped lines to the run's `training_log.txt` and mirrors
/// them to the tracing subscriber. One logger per run, shared by reference
/// across all stages.
pub struct RunLogger {
    file: Mutex<File>,
}

impl RunLogger {
    /// Open (or create) the log file in append mode.
    pub fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    /// Log a message with a `[YYYY-mm-dd HH:MM:SS]` prefix.
    pub fn log(&self, message: &str) {
        let line = format!("[{}] {}", Local::now().format("%Y-%m-%d %H:%M:%S"), message);
        tracing::info!("{}", message);
        if let Ok(mut file) = self.file.lock() {
            // A failed log write never aborts the run
            let _ = writeln!(file, "{}", line);
            let _ = file.flush();
        }
    }
}

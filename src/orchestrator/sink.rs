//! Pass record sinks

use crate::types::{MirrorError, PassResult};
use chrono::{DateTime, Utc};
use indicatif::{HumanBytes, HumanDuration};
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

/// One line of pass history
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PassRecord {
    pub timestamp: DateTime<Utc>,

    #[serde(flatten)]
    pub result: PassResult,

    /// Top-level failure that aborted the pass
    pub error: Option<String>,

    /// Path the failure refers to, when it names one
    pub path: Option<PathBuf>,
}

impl PassRecord {
    pub fn completed(result: PassResult) -> Self {
        Self {
            timestamp: Utc::now(),
            result,
            error: None,
            path: None,
        }
    }

    pub fn skipped() -> Self {
        Self::completed(PassResult::skipped())
    }

    pub fn failed(error: &MirrorError) -> Self {
        Self {
            timestamp: Utc::now(),
            result: PassResult::default(),
            error: Some(error.to_string()),
            path: error.path().map(Path::to_path_buf),
        }
    }

    pub fn is_skipped(&self) -> bool {
        self.result.skipped
    }
}

/// Receives one record per attempted pass, including skipped ticks.
pub trait PassSink: Send + Sync {
    fn record(&self, record: &PassRecord);
}

/// Writes a human-readable summary through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl PassSink for TracingSink {
    fn record(&self, record: &PassRecord) {
        let result = &record.result;

        if let Some(error) = &record.error {
            match &record.path {
                Some(path) => tracing::error!(error = %error, path = %path.display(), "pass aborted"),
                None => tracing::error!(error = %error, "pass aborted"),
            }
            return;
        }

        if result.skipped {
            tracing::info!("previous pass still running; tick skipped (consider a larger interval)");
            return;
        }

        let summary = format!(
            "{} copied ({}), {} removed, {} dirs created, {} dirs removed in {}",
            result.files_copied,
            HumanBytes(result.bytes_copied),
            result.files_removed,
            result.dirs_created,
            result.dirs_removed,
            HumanDuration(result.duration),
        );

        if result.specials_skipped > 0 {
            tracing::info!(
                specials_skipped = result.specials_skipped,
                "symlinks and special files in the source were not mirrored"
            );
        }

        if result.failures > 0 || result.walk_issues > 0 {
            tracing::warn!(
                failures = result.failures,
                walk_issues = result.walk_issues,
                "pass finished with problems: {}",
                summary
            );
        } else {
            tracing::info!("pass finished: {}", summary);
        }
    }
}

/// Appends each record as one JSON line
#[derive(Debug)]
pub struct JsonLinesSink {
    file: Mutex<File>,
}

impl JsonLinesSink {
    /// Open `path` for appending, creating it if needed
    pub fn create(path: &Path) -> Result<Self, MirrorError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| MirrorError::write(path, e))?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    fn append(&self, record: &PassRecord) -> Result<(), MirrorError> {
        let line = serde_json::to_string(record).map_err(std::io::Error::from)?;
        let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        writeln!(file, "{}", line)?;
        Ok(())
    }
}

impl PassSink for JsonLinesSink {
    fn record(&self, record: &PassRecord) {
        if let Err(err) = self.append(record) {
            tracing::error!(error = %err, "could not write pass report");
        }
    }
}

/// Forwards every record to each inner sink in order
#[derive(Default, Clone)]
pub struct MultiSink {
    sinks: Vec<Arc<dyn PassSink>>,
}

impl MultiSink {
    pub fn new(sinks: Vec<Arc<dyn PassSink>>) -> Self {
        Self { sinks }
    }

    pub fn push(&mut self, sink: Arc<dyn PassSink>) {
        self.sinks.push(sink);
    }
}

impl PassSink for MultiSink {
    fn record(&self, record: &PassRecord) {
        for sink in &self.sinks {
            sink.record(record);
        }
    }
}

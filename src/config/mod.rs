//! Configuration management

use crate::executor::pool::default_worker_count;
use crate::types::MirrorError;
use clap::Parser;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Shortest accepted interval between passes
pub const MIN_INTERVAL: Duration = Duration::from_secs(5);

/// Interval used when neither the CLI nor the config file sets one
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(60);

/// Keep a destination folder an exact copy of a source folder
#[derive(Parser, Debug)]
#[command(name = "replica", version, about)]
pub struct Cli {
    /// Source directory to mirror
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Destination directory kept identical to the source
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Also write logs to this file
    #[arg(short = 'l', long = "log")]
    pub log: Option<PathBuf>,

    /// Seconds between passes (minimum 5)
    #[arg(short = 'p', long = "period")]
    pub period: Option<u64>,

    /// Concurrent file workers per pass
    #[arg(short = 'w', long = "workers")]
    pub workers: Option<usize>,

    /// TOML file with defaults; command-line flags take precedence
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Append one JSON line per pass to this file
    #[arg(long = "report")]
    pub report: Option<PathBuf>,

    /// Run a single pass and exit
    #[arg(long)]
    pub once: bool,
}

/// On-disk configuration; every key is optional
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub source: Option<PathBuf>,
    pub destination: Option<PathBuf>,
    pub interval_secs: Option<u64>,
    pub workers: Option<usize>,
    pub log_file: Option<PathBuf>,
    pub report_file: Option<PathBuf>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, MirrorError> {
        let text = fs::read_to_string(path).map_err(|e| {
            MirrorError::Config(format!("cannot read config file {}: {}", path.display(), e))
        })?;
        toml::from_str(&text).map_err(|e| {
            MirrorError::Config(format!("invalid config file {}: {}", path.display(), e))
        })
    }
}

/// Global configuration for replica
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Source directory
    pub source: PathBuf,

    /// Destination directory
    pub destination: PathBuf,

    /// Time between pass starts
    pub interval: Duration,

    /// Worker pool size for each pass
    pub workers: usize,

    /// Optional log file, in addition to stdout
    pub log_file: Option<PathBuf>,

    /// Optional JSON-lines pass report
    pub report_file: Option<PathBuf>,

    /// Single pass instead of the periodic loop
    pub once: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: PathBuf::new(),
            destination: PathBuf::new(),
            interval: DEFAULT_INTERVAL,
            workers: default_worker_count(),
            log_file: None,
            report_file: None,
            once: false,
        }
    }
}

impl Config {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), MirrorError> {
        let source = existing_dir(&self.source, "Source")?;
        let destination = existing_dir(&self.destination, "Destination")?;

        if source == destination {
            return Err(MirrorError::Config(
                "Source and destination cannot be the same directory".to_string(),
            ));
        }
        if destination.starts_with(&source) {
            return Err(MirrorError::Config(format!(
                "Destination {:?} is inside source {:?}",
                self.destination, self.source
            )));
        }
        if source.starts_with(&destination) {
            return Err(MirrorError::Config(format!(
                "Source {:?} is inside destination {:?}",
                self.source, self.destination
            )));
        }

        if self.interval < MIN_INTERVAL {
            return Err(MirrorError::Config(format!(
                "Interval must be at least {} seconds, got {}",
                MIN_INTERVAL.as_secs(),
                self.interval.as_secs_f64()
            )));
        }

        if self.workers == 0 {
            return Err(MirrorError::Config(
                "Worker count must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

fn existing_dir(path: &Path, label: &str) -> Result<PathBuf, MirrorError> {
    if path.as_os_str().is_empty() {
        return Err(MirrorError::Config(format!("{} path is required", label)));
    }
    if !path.is_dir() {
        return Err(MirrorError::Config(format!(
            "{} path is not an existing directory: {:?}",
            label, path
        )));
    }
    path.canonicalize().map_err(|e| {
        MirrorError::Config(format!("{} path cannot be resolved {:?}: {}", label, path, e))
    })
}

impl TryFrom<Cli> for Config {
    type Error = MirrorError;

    fn try_from(cli: Cli) -> Result<Self, Self::Error> {
        let file = match &cli.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };
        let defaults = Config::default();

        let config = Config {
            source: cli.input.or(file.source).unwrap_or_default(),
            destination: cli.output.or(file.destination).unwrap_or_default(),
            interval: cli
                .period
                .or(file.interval_secs)
                .map(Duration::from_secs)
                .unwrap_or(defaults.interval),
            workers: cli.workers.or(file.workers).unwrap_or(defaults.workers),
            log_file: cli.log.or(file.log_file),
            report_file: cli.report.or(file.report_file),
            once: cli.once,
        };

        config.validate()?;
        Ok(config)
    }
}

//! Error types for replica

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error types for mirroring operations
#[derive(Debug, Error)]
pub enum MirrorError {
    /// Standard IO error (automatically converted via #[from])
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// A sync root is missing or unreadable. Aborts the pass.
    #[error("Cannot access root {}: {source}", path.display())]
    Access {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A single file could not be read (hashing or copy source)
    #[error("Read failed for {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A single destination entry could not be written or removed
    #[error("Write failed for {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Worker pool or runtime failure
    #[error("Worker pool error: {0}")]
    Pool(String),
}

impl MirrorError {
    pub fn access(path: &Path, source: std::io::Error) -> Self {
        MirrorError::Access {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn read(path: &Path, source: std::io::Error) -> Self {
        MirrorError::Read {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn write(path: &Path, source: std::io::Error) -> Self {
        MirrorError::Write {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Check if this error is a configuration error
    pub fn is_config_error(&self) -> bool {
        matches!(self, MirrorError::Config(_))
    }

    /// Path the error refers to, if any
    pub fn path(&self) -> Option<&Path> {
        match self {
            MirrorError::Access { path, .. }
            | MirrorError::Read { path, .. }
            | MirrorError::Write { path, .. } => Some(path),
            _ => None,
        }
    }
}

//! PathEntry - A single file or directory in a tree snapshot

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Kind of filesystem entry tracked by the walker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
    /// Symbolic link, socket, FIFO or device. Never followed or copied.
    Special,
}

/// Represents one entry in a tree snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathEntry {
    /// Relative path from sync root
    pub path: PathBuf,

    /// File or directory
    pub kind: EntryKind,

    /// File size in bytes (always 0 for directories and special entries)
    pub size: u64,
}

impl PathEntry {
    /// Create a file entry
    pub fn file(path: impl Into<PathBuf>, size: u64) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::File,
            size,
        }
    }

    /// Create a directory entry
    pub fn directory(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::Directory,
            size: 0,
        }
    }

    /// Create an entry for a symlink or special file
    pub fn special(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::Special,
            size: 0,
        }
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    pub fn is_special(&self) -> bool {
        self.kind == EntryKind::Special
    }
}

//! File comparison logic

use crate::hash::compute_hash;
use crate::types::MirrorError;
use std::path::{Path, PathBuf};

/// Outcome of comparing the source and destination copies of one file
#[derive(Debug)]
pub enum Comparison {
    Identical,
    Different,
    /// At least one side could not be hashed; treated as changed
    Unreadable(MirrorError),
}

impl Comparison {
    pub fn needs_copy(&self) -> bool {
        !matches!(self, Comparison::Identical)
    }
}

/// Decides whether a file present on both sides has the same contents.
///
/// Called concurrently from the worker pool, once per relative path that is a
/// file in both snapshots.
pub trait ContentComparer: Send + Sync {
    fn compare(&self, relative: &Path) -> Comparison;
}

/// Compares files by BLAKE3 digest of their full contents.
///
/// No metadata shortcut: both sides are always hashed.
#[derive(Debug, Clone)]
pub struct DigestComparer {
    source_root: PathBuf,
    dest_root: PathBuf,
}

impl DigestComparer {
    pub fn new(source_root: impl Into<PathBuf>, dest_root: impl Into<PathBuf>) -> Self {
        Self {
            source_root: source_root.into(),
            dest_root: dest_root.into(),
        }
    }
}

impl ContentComparer for DigestComparer {
    fn compare(&self, relative: &Path) -> Comparison {
        let source = match compute_hash(&self.source_root.join(relative)) {
            Ok(digest) => digest,
            Err(err) => return Comparison::Unreadable(err),
        };
        let dest = match compute_hash(&self.dest_root.join(relative)) {
            Ok(digest) => digest,
            Err(err) => return Comparison::Unreadable(err),
        };

        if source == dest {
            Comparison::Identical
        } else {
            Comparison::Different
        }
    }
}

//! TreeSnapshot - Point-in-time view of one sync root

use super::{EntryKind, PathEntry};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// A path the walker could not read.
///
/// `path` is relative to the snapshot root. `None` means the walker could not
/// attribute the failure to a particular entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WalkIssue {
    pub path: Option<PathBuf>,
    pub message: String,
}

/// Ordered listing of every file and directory under a root
#[derive(Debug, Clone, PartialEq)]
pub struct TreeSnapshot {
    /// Map: relative_path → PathEntry
    entries: BTreeMap<PathBuf, PathEntry>,

    /// Per-path failures encountered during the walk
    issues: Vec<WalkIssue>,

    /// Scan metadata
    pub scan_duration: Duration,
    pub root_path: PathBuf,
}

impl TreeSnapshot {
    /// Create a new empty snapshot
    pub fn new(root_path: PathBuf) -> Self {
        Self {
            entries: BTreeMap::new(),
            issues: Vec::new(),
            scan_duration: Duration::from_secs(0),
            root_path,
        }
    }

    /// Insert an entry, replacing any previous entry for the same path
    pub fn insert(&mut self, entry: PathEntry) {
        self.entries.insert(entry.path.clone(), entry);
    }

    pub fn get(&self, path: &Path) -> Option<&PathEntry> {
        self.entries.get(path)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.entries.contains_key(path)
    }

    /// Kind of the entry at `path`, if present
    pub fn kind_of(&self, path: &Path) -> Option<EntryKind> {
        self.entries.get(path).map(|e| e.kind)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterator over all entries in path order
    pub fn iter(&self) -> impl Iterator<Item = (&PathBuf, &PathEntry)> {
        self.entries.iter()
    }

    pub fn paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.entries.keys()
    }

    pub fn files(&self) -> impl Iterator<Item = &PathEntry> {
        self.entries.values().filter(|e| e.is_file())
    }

    pub fn dirs(&self) -> impl Iterator<Item = &PathEntry> {
        self.entries.values().filter(|e| e.is_dir())
    }

    /// Symlinks and special files
    pub fn specials(&self) -> impl Iterator<Item = &PathEntry> {
        self.entries.values().filter(|e| e.is_special())
    }

    pub fn total_files(&self) -> usize {
        self.files().count()
    }

    pub fn total_dirs(&self) -> usize {
        self.dirs().count()
    }

    pub fn total_special(&self) -> usize {
        self.specials().count()
    }

    pub fn total_size(&self) -> u64 {
        self.files().map(|e| e.size).sum()
    }

    /// Record a walk failure. When the failure names a path, that path and
    /// everything beneath it are dropped from the listing.
    pub fn record_issue(&mut self, path: Option<PathBuf>, message: impl Into<String>) {
        if let Some(path) = &path {
            self.prune(path);
        }
        self.issues.push(WalkIssue {
            path,
            message: message.into(),
        });
    }

    pub fn issues(&self) -> &[WalkIssue] {
        &self.issues
    }

    /// True if `path` is at or beneath a path this walk failed to read.
    ///
    /// An issue the walker could not attribute to a path shadows everything.
    pub fn is_shadowed(&self, path: &Path) -> bool {
        self.issues.iter().any(|issue| match &issue.path {
            Some(unreadable) => path.starts_with(unreadable),
            None => true,
        })
    }

    pub fn set_scan_duration(&mut self, duration: Duration) {
        self.scan_duration = duration;
    }

    fn prune(&mut self, path: &Path) {
        self.entries.retain(|p, _| !p.starts_with(path));
    }
}

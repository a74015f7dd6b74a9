//! SyncAction - Actions determined by the diff planner

use std::fmt;
use std::path::{Path, PathBuf};

/// Filesystem action needed to bring the destination in line with the source.
///
/// All paths are relative to the sync roots.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SyncAction {
    /// Create a directory present in source but missing in dest
    MkDir(PathBuf),

    /// Remove a directory present in dest but missing in source
    RmDir(PathBuf),

    /// Copy a new or changed file from source to dest
    CopyFile(PathBuf),

    /// Remove a file present in dest but missing in source
    RmFile(PathBuf),
}

impl SyncAction {
    /// Relative path the action operates on
    pub fn path(&self) -> &Path {
        match self {
            SyncAction::MkDir(p)
            | SyncAction::RmDir(p)
            | SyncAction::CopyFile(p)
            | SyncAction::RmFile(p) => p,
        }
    }

    /// Short label used in logs and reports
    pub fn action_name(&self) -> &'static str {
        match self {
            SyncAction::MkDir(_) => "MkDir",
            SyncAction::RmDir(_) => "RmDir",
            SyncAction::CopyFile(_) => "CopyFile",
            SyncAction::RmFile(_) => "RmFile",
        }
    }

    /// Directory actions are cheap and order-sensitive; they never go to the pool.
    pub fn is_directory_action(&self) -> bool {
        matches!(self, SyncAction::MkDir(_) | SyncAction::RmDir(_))
    }

    pub fn is_removal(&self) -> bool {
        matches!(self, SyncAction::RmDir(_) | SyncAction::RmFile(_))
    }
}

impl fmt::Display for SyncAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.action_name(), self.path().display())
    }
}

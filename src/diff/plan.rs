//! SyncAction plan generation

use super::compare::{Comparison, ContentComparer};
use crate::executor::WorkerPool;
use crate::types::{EntryKind, MirrorError, SyncAction, TreeSnapshot};
use std::path::PathBuf;
use std::sync::Arc;

/// Ordered actions for one pass, plus aggregate statistics
#[derive(Debug, Clone, PartialEq)]
pub struct SyncPlan {
    /// Actions in execution order
    pub actions: Vec<SyncAction>,

    /// Aggregate statistics about the plan
    pub stats: PlanStats,
}

impl SyncPlan {
    /// Create a new empty plan
    pub fn new() -> Self {
        Self {
            actions: Vec::new(),
            stats: PlanStats::default(),
        }
    }

    /// Append an action and update the per-kind counters
    pub fn add_action(&mut self, action: SyncAction) {
        match &action {
            SyncAction::MkDir(_) => self.stats.mkdir_count += 1,
            SyncAction::RmDir(_) => self.stats.rmdir_count += 1,
            SyncAction::CopyFile(_) => self.stats.copy_count += 1,
            SyncAction::RmFile(_) => self.stats.rmfile_count += 1,
        }

        self.actions.push(action);
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }
}

impl Default for SyncPlan {
    fn default() -> Self {
        Self::new()
    }
}

/// Statistics about a sync plan
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PlanStats {
    pub mkdir_count: usize,
    pub rmdir_count: usize,
    pub copy_count: usize,
    pub rmfile_count: usize,

    /// Sum of source sizes of every file to copy
    pub bytes_to_copy: u64,

    /// Files present on both sides whose contents were compared
    pub files_hashed: usize,

    /// Comparisons that failed and were planned as copies
    pub hash_failures: usize,

    /// Source symlinks and special files left out of the mirror
    pub specials_skipped: usize,
}

/// Generate the action list that makes `dest` mirror `source`
///
/// Files present on both sides are compared with `comparer`, concurrently on
/// `pool`. The resulting order is:
/// 1. removals (`RmFile`/`RmDir`) deepest first
/// 2. `MkDir` shallowest first
/// 3. `CopyFile` in path order
///
/// Destination entries at or beneath a path the source walk could not read
/// are left alone.
///
/// Source symlinks and special files are never mirrored. A destination
/// symlink or special file is removed unless the source has one at the same
/// path, so nothing is ever created or copied through a link.
///
/// # Errors
/// Only a worker pool failure aborts planning. A comparison that cannot read
/// one side plans a copy.
///
/// # Example
/// ```
/// use replica::diff::{generate_sync_plan, DigestComparer};
/// use replica::executor::WorkerPool;
/// use replica::types::{PathEntry, SyncAction, TreeSnapshot};
/// use std::path::PathBuf;
/// use std::sync::Arc;
///
/// let mut src = TreeSnapshot::new(PathBuf::from("src"));
/// src.insert(PathEntry::directory("a"));
/// src.insert(PathEntry::file("a/b.txt", 1));
/// let dest = TreeSnapshot::new(PathBuf::from("dst"));
///
/// let pool = WorkerPool::new(2, 4)?;
/// let comparer = Arc::new(DigestComparer::new("src", "dst"));
/// let plan = generate_sync_plan(&src, &dest, comparer, &pool)?;
///
/// assert_eq!(
///     plan.actions,
///     vec![
///         SyncAction::MkDir(PathBuf::from("a")),
///         SyncAction::CopyFile(PathBuf::from("a/b.txt")),
///     ]
/// );
/// # Ok::<(), replica::MirrorError>(())
/// ```
pub fn generate_sync_plan(
    source: &TreeSnapshot,
    dest: &TreeSnapshot,
    comparer: Arc<dyn ContentComparer>,
    pool: &WorkerPool,
) -> Result<SyncPlan, MirrorError> {
    let mut plan = SyncPlan::new();

    // Removals: destination entries with no same-kind counterpart in the source
    let mut removals: Vec<SyncAction> = dest
        .iter()
        .filter(|(path, entry)| {
            source.kind_of(path) != Some(entry.kind) && !source.is_shadowed(path)
        })
        .map(|(path, entry)| match entry.kind {
            EntryKind::File | EntryKind::Special => SyncAction::RmFile(path.clone()),
            EntryKind::Directory => SyncAction::RmDir(path.clone()),
        })
        .collect();
    // BTreeMap order puts parents before children; reversed, children go first.
    removals.reverse();
    for action in removals {
        plan.add_action(action);
    }

    for entry in source.specials() {
        tracing::warn!(
            path = %entry.path.display(),
            "not mirroring symlink or special file"
        );
        plan.stats.specials_skipped += 1;
    }

    for entry in source.dirs() {
        if dest.kind_of(&entry.path) != Some(EntryKind::Directory) {
            plan.add_action(SyncAction::MkDir(entry.path.clone()));
        }
    }

    let mut copies: Vec<PathBuf> = Vec::new();
    let mut candidates: Vec<PathBuf> = Vec::new();
    for entry in source.files() {
        match dest.kind_of(&entry.path) {
            Some(EntryKind::File) => candidates.push(entry.path.clone()),
            _ => copies.push(entry.path.clone()),
        }
    }

    plan.stats.files_hashed = candidates.len();
    let outcomes = pool.map(candidates, move |relative| {
        let outcome = comparer.compare(&relative);
        (relative, outcome)
    })?;
    for (relative, outcome) in outcomes {
        match outcome {
            Comparison::Identical => {}
            Comparison::Different => copies.push(relative),
            Comparison::Unreadable(err) => {
                tracing::warn!(
                    path = %relative.display(),
                    error = %err,
                    "could not compare contents; copying"
                );
                plan.stats.hash_failures += 1;
                copies.push(relative);
            }
        }
    }

    copies.sort();
    for relative in copies {
        plan.stats.bytes_to_copy += source.get(&relative).map_or(0, |e| e.size);
        plan.add_action(SyncAction::CopyFile(relative));
    }

    tracing::debug!(
        actions = plan.len(),
        hashed = plan.stats.files_hashed,
        hash_failures = plan.stats.hash_failures,
        "plan generated"
    );

    Ok(plan)
}

//! Executor module for file operations

pub mod copy;
pub mod pool;

use crate::diff::SyncPlan;
use crate::types::{MirrorError, PassResult, SyncAction};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub use copy::copy_file_atomic;
pub use pool::WorkerPool;

/// Execute a sync plan
///
/// Stages run strictly one after another:
/// 1. `RmFile` actions on the worker pool
/// 2. `RmDir` actions sequentially, in plan order (deepest first)
/// 3. `MkDir` actions sequentially, in plan order (shallowest first)
/// 4. `CopyFile` actions on the worker pool
///
/// So every directory exists before anything is copied into it, and every
/// directory is emptied before it is removed. Per-action failures are logged
/// and counted in `PassResult::failures`; they never stop the plan.
///
/// # Errors
/// Only a worker pool failure aborts execution.
pub fn execute_plan(
    plan: &SyncPlan,
    source_root: &Path,
    dest_root: &Path,
    pool: &WorkerPool,
) -> Result<PassResult, MirrorError> {
    let mut result = PassResult::default();
    let source_root = Arc::new(source_root.to_path_buf());
    let dest_root = Arc::new(dest_root.to_path_buf());

    // Stage 1: file removals
    let removals = collect_paths(plan, |a| matches!(a, SyncAction::RmFile(_)));
    let removal_outcomes = {
        let dest_root = Arc::clone(&dest_root);
        pool.map(removals, move |relative| {
            let outcome = remove_file(&dest_root.join(&relative));
            (relative, outcome)
        })?
    };
    for (relative, outcome) in removal_outcomes {
        let action = SyncAction::RmFile(relative);
        match outcome {
            Ok(()) => {
                result.files_removed += 1;
                log_success(&action);
            }
            Err(err) => record_failure(&mut result, &action, &err),
        }
    }

    // Stages 2 and 3: directory scaffolding, in plan order
    let (dir_removals, dir_creations): (Vec<&SyncAction>, Vec<&SyncAction>) = plan
        .actions
        .iter()
        .filter(|a| a.is_directory_action())
        .partition(|a| a.is_removal());
    for action in dir_removals.into_iter().chain(dir_creations) {
        let target = dest_root.join(action.path());
        let outcome = match action {
            SyncAction::RmDir(_) => remove_dir(&target),
            _ => make_dir(&target),
        };
        match (action, outcome) {
            (SyncAction::RmDir(_), Ok(())) => result.dirs_removed += 1,
            (_, Ok(())) => result.dirs_created += 1,
            (_, Err(err)) => {
                record_failure(&mut result, action, &err);
                continue;
            }
        }
        log_success(action);
    }

    // Stage 4: copies
    let copies = collect_paths(plan, |a| matches!(a, SyncAction::CopyFile(_)));
    let copy_outcomes = {
        let source_root = Arc::clone(&source_root);
        let dest_root = Arc::clone(&dest_root);
        pool.map(copies, move |relative| {
            let outcome =
                copy_file_atomic(&source_root.join(&relative), &dest_root.join(&relative));
            (relative, outcome)
        })?
    };
    for (relative, outcome) in copy_outcomes {
        let action = SyncAction::CopyFile(relative);
        match outcome {
            Ok(bytes) => {
                result.files_copied += 1;
                result.bytes_copied += bytes;
                log_success(&action);
            }
            Err(err) => record_failure(&mut result, &action, &err),
        }
    }

    Ok(result)
}

fn collect_paths(plan: &SyncPlan, keep: impl Fn(&SyncAction) -> bool) -> Vec<PathBuf> {
    plan.actions
        .iter()
        .filter(|&a| keep(a))
        .map(|a| a.path().to_path_buf())
        .collect()
}

/// Remove a file; a file that is already gone counts as removed.
fn remove_file(path: &Path) -> Result<(), MirrorError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(MirrorError::write(path, e)),
    }
}

/// Remove an (already emptied) directory; a missing directory counts as removed.
fn remove_dir(path: &Path) -> Result<(), MirrorError> {
    match fs::remove_dir(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(MirrorError::write(path, e)),
    }
}

/// Create a directory whose parent exists; an existing real directory counts
/// as created. A symlink to a directory does not.
fn make_dir(path: &Path) -> Result<(), MirrorError> {
    match fs::create_dir(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::AlreadyExists && is_real_dir(path) => Ok(()),
        Err(e) => Err(MirrorError::write(path, e)),
    }
}

fn is_real_dir(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok_and(|m| m.is_dir())
}

fn log_success(action: &SyncAction) {
    tracing::info!(
        action = action.action_name(),
        path = %action.path().display(),
        "applied"
    );
}

fn record_failure(result: &mut PassResult, action: &SyncAction, error: &MirrorError) {
    result.failures += 1;
    tracing::warn!(
        action = action.action_name(),
        path = %action.path().display(),
        error = %error,
        "action failed; continuing with the rest of the plan"
    );
}

//! Sequential directory walker

use crate::types::{MirrorError, PathEntry, TreeSnapshot};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Scan a directory and build a TreeSnapshot
///
/// Walks the directory tree recursively using the `ignore` crate with every
/// ignore-file filter disabled: a mirror must see hidden files and files that
/// `.gitignore` would hide.
///
/// Symbolic links and special files (sockets, FIFOs, devices) are never
/// followed. They are recorded as `EntryKind::Special` entries so the planner
/// can leave them out of the source and still clear them from the destination.
///
/// # Errors
/// * `MirrorError::Access` if `root_path` is missing, not a directory, or unreadable
/// * Failures below the root are not errors: they are logged, recorded as
///   walk issues on the snapshot, and the affected subtree is left out
pub fn scan_directory(root_path: &Path) -> Result<TreeSnapshot, MirrorError> {
    let start_time = Instant::now();

    let metadata = fs::metadata(root_path).map_err(|e| MirrorError::access(root_path, e))?;
    if !metadata.is_dir() {
        return Err(MirrorError::access(
            root_path,
            std::io::Error::other("not a directory"),
        ));
    }
    fs::read_dir(root_path).map_err(|e| MirrorError::access(root_path, e))?;

    let mut tree = TreeSnapshot::new(root_path.to_path_buf());

    let walker = ignore::WalkBuilder::new(root_path)
        .standard_filters(false)
        .hidden(false)
        .follow_links(false)
        .build();

    for result in walker {
        let entry = match result {
            Ok(entry) => entry,
            Err(err) => {
                let relative = error_path(&err).and_then(|p| relative_to(root_path, &p));
                if relative.as_ref().is_some_and(|p| p.as_os_str().is_empty()) {
                    // The root itself became unreadable after the pre-check.
                    return Err(MirrorError::access(
                        root_path,
                        std::io::Error::other(err.to_string()),
                    ));
                }
                tracing::warn!(
                    root = %root_path.display(),
                    path = ?relative,
                    error = %err,
                    "could not read entry during walk; it is left out of this pass"
                );
                tree.record_issue(relative, err.to_string());
                continue;
            }
        };

        if entry.depth() == 0 {
            continue;
        }

        let file_type = match entry.file_type() {
            Some(ft) => ft,
            None => continue,
        };

        let relative_path = match relative_to(root_path, entry.path()) {
            Some(p) => p,
            None => {
                tracing::warn!(
                    path = %entry.path().display(),
                    "entry is outside the walked root; skipping"
                );
                continue;
            }
        };

        if file_type.is_dir() {
            tree.insert(PathEntry::directory(relative_path));
        } else if file_type.is_file() {
            match entry.metadata() {
                Ok(m) => tree.insert(PathEntry::file(relative_path, m.len())),
                Err(e) => {
                    tracing::warn!(
                        path = %entry.path().display(),
                        error = %e,
                        "could not read file metadata; it is left out of this pass"
                    );
                    tree.record_issue(Some(relative_path), e.to_string());
                }
            }
        } else {
            tracing::debug!(
                path = %entry.path().display(),
                symlink = file_type.is_symlink(),
                "special entry recorded, not followed"
            );
            tree.insert(PathEntry::special(relative_path));
        }
    }

    tree.set_scan_duration(start_time.elapsed());

    tracing::debug!(
        root = %root_path.display(),
        files = tree.total_files(),
        dirs = tree.total_dirs(),
        special = tree.total_special(),
        issues = tree.issues().len(),
        elapsed_ms = tree.scan_duration.as_millis() as u64,
        "scan complete"
    );

    Ok(tree)
}

fn relative_to(root: &Path, path: &Path) -> Option<PathBuf> {
    path.strip_prefix(root).ok().map(Path::to_path_buf)
}

/// Dig the offending path out of a (possibly nested) walk error
fn error_path(err: &ignore::Error) -> Option<PathBuf> {
    match err {
        ignore::Error::WithPath { path, .. } => Some(path.clone()),
        ignore::Error::WithDepth { err, .. } | ignore::Error::WithLineNumber { err, .. } => {
            error_path(err)
        }
        ignore::Error::Loop { child, .. } => Some(child.clone()),
        ignore::Error::Partial(errs) => errs.iter().find_map(error_path),
        _ => None,
    }
}

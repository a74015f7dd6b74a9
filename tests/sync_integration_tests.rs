//! End-to-end mirroring pass integration tests.
//!
//! Each case builds real source/destination trees, runs one pass, and checks
//! the destination afterwards.

use replica::orchestrator::{destination_guard, PassRecord, PassSink};
use replica::{run_once, MirrorError, Orchestrator};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

#[derive(Default)]
struct MemorySink(Mutex<Vec<PassRecord>>);

impl PassSink for MemorySink {
    fn record(&self, record: &PassRecord) {
        self.0.lock().expect("lock").push(record.clone());
    }
}

/// Relative path → Some(contents) for files, None for directories
fn tree_state(root: &Path) -> BTreeMap<PathBuf, Option<Vec<u8>>> {
    fn walk(root: &Path, dir: &Path, out: &mut BTreeMap<PathBuf, Option<Vec<u8>>>) {
        for entry in fs::read_dir(dir).expect("read_dir") {
            let path = entry.expect("dir entry").path();
            let relative = path.strip_prefix(root).expect("strip prefix").to_path_buf();
            if path.is_dir() {
                out.insert(relative, None);
                walk(root, &path, out);
            } else {
                out.insert(relative, Some(fs::read(&path).expect("read file")));
            }
        }
    }

    let mut out = BTreeMap::new();
    walk(root, root, &mut out);
    out
}

fn assert_mirrored(src: &Path, dst: &Path) {
    assert_eq!(tree_state(src), tree_state(dst));
}

fn roots() -> (TempDir, TempDir) {
    (
        TempDir::new().expect("create src tempdir"),
        TempDir::new().expect("create dst tempdir"),
    )
}

#[test]
fn test_copy_file() {
    let (src, dst) = roots();
    fs::write(src.path().join("file.txt"), b"Sample content").expect("write");

    let result = run_once(src.path(), dst.path()).expect("pass");

    assert_eq!(result.files_copied, 1);
    assert_eq!(result.bytes_copied, 14);
    assert_mirrored(src.path(), dst.path());
}

#[test]
fn test_delete_dir_and_file() {
    let (src, dst) = roots();
    fs::create_dir(dst.path().join("folder")).expect("mkdir");
    fs::write(dst.path().join("folder/file.txt"), b"Sample content").expect("write");

    let result = run_once(src.path(), dst.path()).expect("pass");

    assert_eq!(result.files_removed, 1);
    assert_eq!(result.dirs_removed, 1);
    assert!(!dst.path().join("folder").exists());
}

#[test]
fn test_alter_file_contents() {
    let (src, dst) = roots();
    fs::write(src.path().join("file.txt"), b"Different content").expect("write");
    fs::write(dst.path().join("file.txt"), b"Sample content").expect("write");

    run_once(src.path(), dst.path()).expect("pass");

    assert_eq!(
        fs::read(dst.path().join("file.txt")).expect("read"),
        b"Different content"
    );
}

#[test]
fn test_copy_empty_subdirs() {
    let (src, dst) = roots();
    fs::create_dir_all(src.path().join("folder/subfolder1")).expect("mkdir");
    fs::create_dir_all(src.path().join("folder/subfolder2")).expect("mkdir");
    fs::create_dir_all(src.path().join("folder2/subfolder")).expect("mkdir");

    let result = run_once(src.path(), dst.path()).expect("pass");

    assert_eq!(result.dirs_created, 5);
    assert_mirrored(src.path(), dst.path());
}

#[test]
fn test_assortment() {
    let (src, dst) = roots();
    let (i, o) = (src.path(), dst.path());

    fs::create_dir_all(i.join("folder/subfolder1")).expect("mkdir");
    fs::create_dir_all(i.join("folder/subfolder2")).expect("mkdir");
    fs::write(i.join("folder/subfolder1/subfile.txt"), b"Subfile content").expect("write");
    fs::write(i.join("file.txt"), b"Sample content").expect("write");

    fs::create_dir_all(o.join("folder/subfolder1")).expect("mkdir");
    fs::create_dir(o.join("extrafolder")).expect("mkdir");
    fs::write(o.join("folder/subfolder1/subfile.txt"), b"Different content").expect("write");
    fs::write(o.join("extrafile.txt"), b"Extra file content").expect("write");

    let result = run_once(i, o).expect("pass");

    assert!(o.join("folder/subfolder2").is_dir());
    assert!(!o.join("extrafolder").exists());
    assert!(!o.join("extrafile.txt").exists());
    assert_eq!(result.failures, 0);
    assert_mirrored(i, o);
}

#[test]
fn test_second_pass_is_a_no_op() {
    let (src, dst) = roots();
    fs::create_dir_all(src.path().join("a/b")).expect("mkdir");
    fs::write(src.path().join("a/b/c.txt"), b"c").expect("write");
    fs::write(src.path().join("d.txt"), b"d").expect("write");
    fs::write(dst.path().join("stale.txt"), b"stale").expect("write");

    let first = run_once(src.path(), dst.path()).expect("first pass");
    let second = run_once(src.path(), dst.path()).expect("second pass");

    assert!(first.total_actions() > 0);
    assert_eq!(second.total_actions(), 0);
    assert!(second.is_clean());
    assert_mirrored(src.path(), dst.path());
}

#[test]
fn test_converges_after_source_changes() {
    let (src, dst) = roots();
    fs::create_dir(src.path().join("keep")).expect("mkdir");
    fs::write(src.path().join("keep/a.txt"), b"v1").expect("write");
    fs::write(src.path().join("gone.txt"), b"soon removed").expect("write");
    run_once(src.path(), dst.path()).expect("first pass");

    fs::write(src.path().join("keep/a.txt"), b"v2").expect("rewrite");
    fs::remove_file(src.path().join("gone.txt")).expect("remove");
    fs::create_dir(src.path().join("new")).expect("mkdir");
    fs::write(src.path().join("new/b.txt"), b"b").expect("write");

    run_once(src.path(), dst.path()).expect("second pass");

    assert_mirrored(src.path(), dst.path());
}

#[test]
fn test_deletion_completeness() {
    let (src, dst) = roots();
    fs::create_dir_all(dst.path().join("x/y/z")).expect("mkdir");
    fs::write(dst.path().join("x/y/z/deep.txt"), b"deep").expect("write");
    fs::write(dst.path().join("x/one.txt"), b"one").expect("write");
    fs::write(dst.path().join(".hidden"), b"hidden").expect("write");

    run_once(src.path(), dst.path()).expect("pass");

    assert!(tree_state(dst.path()).is_empty());
}

#[test]
fn test_kind_swaps() {
    let (src, dst) = roots();
    fs::write(src.path().join("x"), b"now a file").expect("write");
    fs::create_dir(dst.path().join("x")).expect("mkdir");
    fs::write(dst.path().join("x/inner.txt"), b"old").expect("write");

    fs::create_dir(src.path().join("y")).expect("mkdir");
    fs::write(src.path().join("y/inner.txt"), b"inner").expect("write");
    fs::write(dst.path().join("y"), b"was a file").expect("write");

    let result = run_once(src.path(), dst.path()).expect("pass");

    assert_eq!(result.failures, 0);
    assert_mirrored(src.path(), dst.path());
}

#[test]
fn test_held_guard_skips_pass() {
    let (src, dst) = roots();
    fs::write(src.path().join("f.txt"), b"data").expect("write");

    let sink = Arc::new(MemorySink::default());
    let orch = Orchestrator::new(src.path(), dst.path()).with_sink(sink.clone());
    let permit = orch.guard().try_acquire().expect("acquire guard");

    let skipped = orch.run_once().expect("skip is not an error");
    assert!(skipped.skipped);
    assert!(tree_state(dst.path()).is_empty());

    drop(permit);
    let ran = orch.run_once().expect("pass");
    assert!(!ran.skipped);
    assert_mirrored(src.path(), dst.path());

    let records = sink.0.lock().expect("lock");
    assert_eq!(records.len(), 2);
    assert!(records[0].is_skipped());
    assert!(!records[1].is_skipped());
}

#[test]
fn test_missing_source_aborts_without_touching_destination() {
    let (src, dst) = roots();
    fs::write(dst.path().join("precious.txt"), b"keep me").expect("write");

    let err = run_once(&src.path().join("missing"), dst.path()).expect_err("missing source");

    assert!(matches!(err, MirrorError::Access { .. }));
    assert!(dst.path().join("precious.txt").exists());
}

#[test]
fn test_stale_part_file_is_removed() {
    let (src, dst) = roots();
    fs::write(src.path().join("f.txt"), b"data").expect("write");
    fs::write(dst.path().join(".f.txt.replica-part"), b"torn").expect("write");

    run_once(src.path(), dst.path()).expect("pass");

    assert_mirrored(src.path(), dst.path());
}

#[cfg(unix)]
#[test]
fn test_unreadable_source_dir_protects_destination() {
    use std::os::unix::fs::PermissionsExt;

    let (src, dst) = roots();
    let locked = src.path().join("locked");
    fs::create_dir(&locked).expect("mkdir");
    fs::write(locked.join("secret.txt"), b"s").expect("write");
    fs::create_dir(dst.path().join("locked")).expect("mkdir");
    fs::write(dst.path().join("locked/secret.txt"), b"s").expect("write");

    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).expect("chmod");
    // Privileged users can still read the directory; nothing to check then.
    let readable = fs::read_dir(&locked).is_ok();

    let result = run_once(src.path(), dst.path());
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).expect("restore chmod");
    let result = result.expect("pass");

    assert!(dst.path().join("locked/secret.txt").exists());
    if !readable {
        assert!(result.walk_issues >= 1);
    }
}

#[cfg(unix)]
#[test]
fn test_destination_symlinks_are_replaced_not_followed() {
    use std::os::unix::fs::symlink;

    let (src, dst) = roots();
    let outside = TempDir::new().expect("create outside tempdir");
    fs::create_dir(src.path().join("d")).expect("mkdir");
    fs::write(src.path().join("d/f.txt"), b"mirrored").expect("write");
    symlink(outside.path(), dst.path().join("d")).expect("dir symlink");
    symlink(dst.path().join("nowhere"), dst.path().join("stale_link")).expect("dangling symlink");

    let first = run_once(src.path(), dst.path()).expect("first pass");

    assert_eq!(first.failures, 0);
    assert!(!outside.path().join("f.txt").exists());
    let d_meta = fs::symlink_metadata(dst.path().join("d")).expect("d metadata");
    assert!(d_meta.is_dir());
    assert!(fs::symlink_metadata(dst.path().join("stale_link")).is_err());
    assert_mirrored(src.path(), dst.path());

    let second = run_once(src.path(), dst.path()).expect("second pass");
    assert_eq!(second.total_actions(), 0);
}

#[cfg(unix)]
#[test]
fn test_source_symlinks_are_skipped_and_counted() {
    use std::os::unix::fs::symlink;

    let (src, dst) = roots();
    fs::write(src.path().join("real.txt"), b"real").expect("write");
    symlink(src.path().join("real.txt"), src.path().join("alias.txt")).expect("symlink");

    let result = run_once(src.path(), dst.path()).expect("pass");

    assert_eq!(result.files_copied, 1);
    assert_eq!(result.specials_skipped, 1);
    assert!(fs::symlink_metadata(dst.path().join("alias.txt")).is_err());
}

#[test]
fn test_run_once_skips_while_destination_is_busy() {
    let (src, dst) = roots();
    fs::write(src.path().join("f.txt"), b"data").expect("write");

    let permit = destination_guard(&dst.path().join("."))
        .try_acquire()
        .expect("acquire destination guard");

    let skipped = run_once(src.path(), dst.path()).expect("skip is not an error");
    assert!(skipped.skipped);
    assert!(tree_state(dst.path()).is_empty());

    drop(permit);
    let ran = run_once(src.path(), dst.path()).expect("pass");
    assert!(!ran.skipped);
    assert_mirrored(src.path(), dst.path());
}

#[test]
fn test_part_lookalike_source_file_is_mirrored() {
    for workers in [1, 4] {
        let (src, dst) = roots();
        fs::write(src.path().join("f.txt"), b"real file").expect("write");
        fs::write(src.path().join(".f.txt.replica-part"), b"looks like a temp").expect("write");

        let result = Orchestrator::new(src.path(), dst.path())
            .with_workers(workers)
            .run_once()
            .expect("pass");

        assert_eq!(result.files_copied, 2);
        assert_eq!(result.failures, 0);
        assert_mirrored(src.path(), dst.path());
    }
}

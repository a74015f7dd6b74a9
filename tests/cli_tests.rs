//! Command-line behaviour tests

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn replica() -> Command {
    Command::cargo_bin("replica").expect("binary built")
}

#[test]
fn test_once_mirrors_and_exits() {
    let src = TempDir::new().expect("create src tempdir");
    let dst = TempDir::new().expect("create dst tempdir");
    fs::create_dir(src.path().join("nested")).expect("mkdir");
    fs::write(src.path().join("nested/a.txt"), b"alpha").expect("write");
    fs::write(dst.path().join("stale.txt"), b"old").expect("write");

    replica()
        .arg("-i")
        .arg(src.path())
        .arg("-o")
        .arg(dst.path())
        .arg("--once")
        .assert()
        .success();

    assert_eq!(
        fs::read(dst.path().join("nested/a.txt")).expect("read copy"),
        b"alpha"
    );
    assert!(!dst.path().join("stale.txt").exists());
}

#[test]
fn test_once_writes_log_and_report() {
    let src = TempDir::new().expect("create src tempdir");
    let dst = TempDir::new().expect("create dst tempdir");
    let side = TempDir::new().expect("create side tempdir");
    fs::write(src.path().join("a.txt"), b"alpha").expect("write");

    let log = side.path().join("replica.log");
    let report = side.path().join("passes.jsonl");

    replica()
        .arg("-i")
        .arg(src.path())
        .arg("-o")
        .arg(dst.path())
        .arg("-l")
        .arg(&log)
        .arg("--report")
        .arg(&report)
        .arg("--once")
        .assert()
        .success();

    let log_text = fs::read_to_string(&log).expect("read log");
    assert!(log_text.contains("a.txt"));

    let report_text = fs::read_to_string(&report).expect("read report");
    let line: serde_json::Value =
        serde_json::from_str(report_text.lines().next().expect("one line")).expect("json");
    assert_eq!(line["files_copied"], 1);
    assert_eq!(line["skipped"], false);
}

#[test]
fn test_missing_input_dir_fails() {
    let dst = TempDir::new().expect("create dst tempdir");

    replica()
        .arg("-i")
        .arg(dst.path().join("nope"))
        .arg("-o")
        .arg(dst.path())
        .arg("--once")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Source"));
}

#[test]
fn test_period_below_minimum_fails() {
    let src = TempDir::new().expect("create src tempdir");
    let dst = TempDir::new().expect("create dst tempdir");

    replica()
        .arg("-i")
        .arg(src.path())
        .arg("-o")
        .arg(dst.path())
        .args(["-p", "2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Interval"));
}

#[test]
fn test_same_input_and_output_fails() {
    let src = TempDir::new().expect("create src tempdir");

    replica()
        .arg("-i")
        .arg(src.path())
        .arg("-o")
        .arg(src.path())
        .arg("--once")
        .assert()
        .failure();
}

#[test]
fn test_config_file_supplies_paths() {
    let src = TempDir::new().expect("create src tempdir");
    let dst = TempDir::new().expect("create dst tempdir");
    let side = TempDir::new().expect("create side tempdir");
    fs::write(src.path().join("from_config.txt"), b"cfg").expect("write");

    let config = side.path().join("replica.toml");
    fs::write(
        &config,
        format!(
            "source = {:?}\ndestination = {:?}\nworkers = 2\n",
            src.path(),
            dst.path()
        ),
    )
    .expect("write config");

    replica()
        .arg("-c")
        .arg(&config)
        .arg("--once")
        .assert()
        .success();

    assert!(dst.path().join("from_config.txt").exists());
}

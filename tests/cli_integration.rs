//! Testes de integração para a CLI do goldfile.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

use goldfile::{npy, NdArray};

fn goldfile_bin() -> Command {
    Command::cargo_bin("goldfile").expect("binary is built")
}

fn write_array(path: &Path, values: Vec<f64>) {
    npy::save(path, &NdArray::from_vec(values)).expect("Failed to write array");
}

#[test]
fn test_version_command() {
    goldfile_bin()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("goldfile"));
}

#[test]
fn test_help_command() {
    goldfile_bin()
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("init")
                .and(predicate::str::contains("check"))
                .and(predicate::str::contains("store"))
                .and(predicate::str::contains("compare"))
                .and(predicate::str::contains("inspect")),
        );
}

#[test]
fn test_invalid_command() {
    goldfile_bin()
        .arg("invalid-command-that-does-not-exist")
        .assert()
        .failure();
}

#[test]
fn test_init_creates_config() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = temp_dir.path().join("goldfile.toml");

    goldfile_bin()
        .arg("init")
        .arg("--path")
        .arg(temp_dir.path())
        .assert()
        .success();

    let content = std::fs::read_to_string(&config_path).expect("Failed to read config");
    assert!(content.contains("[general]"));
    assert!(content.contains("[cache]"));
    assert!(content.contains("decimal = 7"));
    assert!(content.contains("[hooks]"));
}

#[test]
fn test_check_stores_then_matches() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let input = temp_dir.path().join("input.npy");
    let slot = temp_dir.path().join("golden.npy");
    write_array(&input, vec![1.0, 2.0, 3.0]);

    goldfile_bin()
        .current_dir(temp_dir.path())
        .args(["-q", "check"])
        .arg(&input)
        .arg(&slot)
        .assert()
        .success()
        .stdout(predicate::str::contains("stored"));
    assert!(slot.exists());

    goldfile_bin()
        .current_dir(temp_dir.path())
        .args(["-q", "check"])
        .arg(&input)
        .arg(&slot)
        .assert()
        .success()
        .stdout(predicate::str::contains("matches"));
}

#[test]
fn test_check_regression_exits_with_one() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let input = temp_dir.path().join("input.npy");
    let slot = temp_dir.path().join("golden.npy");
    write_array(&slot, vec![1.0, 2.0, 3.0]);
    write_array(&input, vec![1.0, 2.0, 4.0]);

    goldfile_bin()
        .current_dir(temp_dir.path())
        .args(["-q", "check"])
        .arg(&input)
        .arg(&slot)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("max abs diff 1 at index [2]"));
}

#[test]
fn test_check_decimal_flag() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let input = temp_dir.path().join("input.npy");
    let slot = temp_dir.path().join("golden.npy");
    write_array(&slot, vec![1.0]);
    write_array(&input, vec![1.001]);

    goldfile_bin()
        .current_dir(temp_dir.path())
        .args(["-q", "check", "--decimal", "2"])
        .arg(&input)
        .arg(&slot)
        .assert()
        .success();
}

#[test]
fn test_check_invalid_slot_name_exits_with_two() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let input = temp_dir.path().join("input.npy");
    let slot = temp_dir.path().join("golden.bin");
    write_array(&input, vec![1.0]);

    goldfile_bin()
        .current_dir(temp_dir.path())
        .args(["-q", "check"])
        .arg(&input)
        .arg(&slot)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Invalid slot name"));
    assert!(!slot.exists());
}

#[test]
fn test_store_overwrites_slot() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let input = temp_dir.path().join("input.npy");
    let slot = temp_dir.path().join("golden.npy");
    write_array(&slot, vec![1.0, 2.0]);
    write_array(&input, vec![5.0, 6.0, 7.0]);

    goldfile_bin()
        .current_dir(temp_dir.path())
        .args(["-q", "store"])
        .arg(&input)
        .arg(&slot)
        .assert()
        .success();

    let stored = npy::load(&slot).expect("Failed to read slot");
    assert_eq!(stored.shape(), &[3]);
}

#[test]
fn test_compare_reports_mismatch() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let expected = temp_dir.path().join("expected.npy");
    let actual = temp_dir.path().join("actual.npy");
    write_array(&expected, vec![0.0, 0.0]);
    write_array(&actual, vec![0.0, 0.5]);

    goldfile_bin()
        .current_dir(temp_dir.path())
        .args(["-q", "compare"])
        .arg(&expected)
        .arg(&actual)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("mismatched:   1"));
}

#[test]
fn test_inspect_json() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let slot = temp_dir.path().join("golden.npy");
    write_array(&slot, vec![1.0, 2.0, 3.0, 4.0]);

    let output = goldfile_bin()
        .current_dir(temp_dir.path())
        .args(["-q", "inspect", "--json"])
        .arg(&slot)
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let info: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("inspect prints JSON");
    assert_eq!(info["shape"], serde_json::json!([4]));
    assert_eq!(info["dtype"], "f64");
    assert_eq!(info["elements"], 4);
}

#[test]
fn test_invalid_config_is_rejected() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = temp_dir.path().join("custom.toml");
    std::fs::write(&config_path, "[general]\nlog_format = \"xml\"\n").unwrap();

    goldfile_bin()
        .arg("--config")
        .arg(&config_path)
        .arg("version")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("invalid configuration"));
}

//! End-to-end tests for the `dirlock` binary.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn dirlock(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_dirlock"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .unwrap_or_else(|e| panic!("failed to execute dirlock {}: {}", args.join(" "), e))
}

fn files_with_suffix(dir: &Path, suffix: &str) -> Vec<String> {
    fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .filter(|name| name.ends_with(suffix))
        .collect()
}

#[test]
fn acquire_prints_id_and_release_removes_lock() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path().to_str().unwrap();

    let out = dirlock(&["acquire", "-d", dir, "-n", "build", "-i", "1", "-w", "5"]);
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));

    let id = String::from_utf8(out.stdout).unwrap().trim().to_string();
    assert_eq!(id.len(), 32);

    let locks = files_with_suffix(temp_dir.path(), ".lock");
    assert_eq!(locks.len(), 1);
    assert!(locks[0].starts_with("build__"));
    assert!(locks[0].contains(&id));
    assert!(files_with_suffix(temp_dir.path(), ".request").is_empty());

    let listed = dirlock(&["list", "-d", dir]);
    assert!(listed.status.success());
    assert!(String::from_utf8_lossy(&listed.stdout).contains(&id));

    let out = dirlock(&["release", &id, "-d", dir]);
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    assert!(files_with_suffix(temp_dir.path(), ".lock").is_empty());
}

#[test]
fn held_lock_times_out_with_exit_code() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path().to_str().unwrap();

    let first = dirlock(&["acquire", "-d", dir, "-n", "build", "-i", "1", "-w", "5"]);
    assert!(first.status.success());

    let second = dirlock(&["acquire", "-d", dir, "-n", "build", "-i", "1", "-w", "1"]);
    assert_eq!(second.status.code(), Some(3));
    assert!(second.stdout.is_empty());
    assert!(String::from_utf8_lossy(&second.stderr).contains("Error: timed out"));

    assert_eq!(files_with_suffix(temp_dir.path(), ".lock").len(), 1);
    assert!(files_with_suffix(temp_dir.path(), ".request").is_empty());
}

#[test]
fn release_unknown_id_is_user_error() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path().to_str().unwrap();

    let out = dirlock(&["release", "nope", "-d", dir]);
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("no lock with id 'nope'"));
}

#[test]
fn config_file_supplies_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let lock_dir = temp_dir.path().join("locks");
    let config = temp_dir.path().join("dirlock.yaml");
    fs::write(
        &config,
        format!(
            "dir: {}\nname: from-file\npoll_interval_secs: 1\nmax_wait_secs: 5\n",
            lock_dir.display()
        ),
    )
    .unwrap();

    let out = dirlock(&["acquire", "--config", config.to_str().unwrap()]);
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));

    let locks = files_with_suffix(&lock_dir, ".lock");
    assert_eq!(locks.len(), 1);
    assert!(locks[0].starts_with("from-file__"));
}

#[test]
fn list_empty_directory() {
    let temp_dir = TempDir::new().unwrap();
    let out = dirlock(&["list", "-d", temp_dir.path().to_str().unwrap()]);

    assert!(out.status.success());
    assert!(String::from_utf8_lossy(&out.stdout).contains("No locks or requests"));
}

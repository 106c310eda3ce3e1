/// Integration test suite: drives the compiled `change-squash` binary.
///
/// All tests invoke the binary via subprocess. The `CARGO_BIN_EXE_change-squash` environment
/// variable is set by Cargo during `cargo test` to point to the compiled binary for the current
/// profile (debug or release).
///
/// Batches are written as JSON next to a scratch tree in a temp directory, so the existence
/// probes run against a real filesystem.
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use serde_json::{Value, json};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_change-squash"))
}

/// Run a change-squash command and assert it exits successfully.
/// Returns stdout as a String.
fn run_success(args: &[&str]) -> String {
    let out = Command::new(binary())
        .args(args)
        .output()
        .expect("failed to invoke change-squash binary");
    let stdout = String::from_utf8_lossy(&out.stdout).to_string();
    let stderr = String::from_utf8_lossy(&out.stderr).to_string();
    assert!(
        out.status.success(),
        "command {:?} failed with status {:?}\nstdout: {}\nstderr: {}",
        args,
        out.status,
        stdout,
        stderr
    );
    stdout
}

/// Run a change-squash command and assert it exits with a non-zero status.
/// Returns stderr as a String.
fn run_failure(args: &[&str]) -> String {
    let out = Command::new(binary())
        .args(args)
        .output()
        .expect("failed to invoke change-squash binary");
    assert!(
        !out.status.success(),
        "command {:?} expected to fail but exited successfully\nstdout: {}",
        args,
        String::from_utf8_lossy(&out.stdout)
    );
    String::from_utf8_lossy(&out.stderr).to_string()
}

fn record(root: &Path, rel: &str, change: &str) -> Value {
    json!({
        "entry_kind": "file",
        "root_dir": root,
        "relative_path": rel,
        "change": change,
    })
}

fn renamed(root: &Path, rel: &str, change: &str, cookie: u64) -> Value {
    let mut r = record(root, rel, change);
    r["cookie"] = json!(cookie);
    r
}

/// Write `batch` to a file in `dir` and reconcile it with `--root <root> --format json`.
fn reconcile(dir: &Path, root: &Path, batch: Vec<Value>) -> Value {
    let batch_path = dir.join("batch.json");
    fs::write(&batch_path, serde_json::to_string(&batch).unwrap()).unwrap();
    let stdout = run_success(&[
        "reconcile",
        batch_path.to_str().unwrap(),
        "--root",
        root.to_str().unwrap(),
        "--format",
        "json",
    ]);
    serde_json::from_str(stdout.trim()).expect("reconcile output is not valid JSON")
}

fn abs(root: &Path, rel: &str) -> String {
    root.join(rel).to_str().unwrap().to_string()
}

/// A scratch directory holding the batch file and a `tree/` watched root.
fn scratch() -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = dir.path().join("tree");
    fs::create_dir(&root).unwrap();
    (dir, root)
}

// ---------------------------------------------------------------------------
// reconcile
// ---------------------------------------------------------------------------

#[test]
fn test_output_has_exactly_four_keys() {
    let (dir, root) = scratch();
    let out = reconcile(dir.path(), &root, vec![]);
    let obj = out.as_object().expect("output should be an object");
    let mut keys: Vec<&String> = obj.keys().collect();
    keys.sort();
    assert_eq!(keys, ["added", "invalid_file_path", "modified", "removed"]);
}

#[test]
fn test_direct_hints_on_real_tree() {
    let (dir, root) = scratch();
    fs::write(root.join("new.txt"), "n").unwrap();
    fs::write(root.join("edited.txt"), "e").unwrap();

    let out = reconcile(
        dir.path(),
        &root,
        vec![
            record(&root, "new.txt", "created"),
            record(&root, "edited.txt", "modified_write"),
            record(&root, "gone.txt", "deleted"),
        ],
    );
    assert_eq!(out["added"], json!([abs(&root, "new.txt")]));
    assert_eq!(out["modified"], json!([abs(&root, "edited.txt")]));
    assert_eq!(out["removed"], json!([abs(&root, "gone.txt")]));
}

#[test]
fn test_editor_save_reports_one_modification() {
    let (dir, root) = scratch();
    fs::write(root.join("doc.txt"), "saved").unwrap();

    let out = reconcile(
        dir.path(),
        &root,
        vec![
            renamed(&root, "doc.txt.swp", "moved_from", 7),
            renamed(&root, "doc.txt", "moved_to", 7),
        ],
    );
    assert_eq!(out["modified"], json!([abs(&root, "doc.txt")]));
    assert_eq!(out["added"], json!([]));
    assert_eq!(out["removed"], json!([]));
}

#[test]
fn test_plain_rename_reports_remove_and_add() {
    let (dir, root) = scratch();
    fs::write(root.join("b.txt"), "moved").unwrap();

    let out = reconcile(
        dir.path(),
        &root,
        vec![
            renamed(&root, "a.txt", "moved_from", 1),
            renamed(&root, "b.txt", "moved_to", 1),
        ],
    );
    assert_eq!(out["removed"], json!([abs(&root, "a.txt")]));
    assert_eq!(out["added"], json!([abs(&root, "b.txt")]));
}

#[test]
fn test_transient_file_is_invisible() {
    let (dir, root) = scratch();
    let out = reconcile(
        dir.path(),
        &root,
        vec![
            record(&root, "blip.txt", "created"),
            record(&root, "blip.txt", "modified_write"),
            record(&root, "blip.txt", "deleted"),
        ],
    );
    for key in ["modified", "added", "removed", "invalid_file_path"] {
        assert_eq!(out[key], json!([]), "{key} should be empty");
    }
}

#[test]
fn test_invalid_encoding_is_reported_not_fatal() {
    let (dir, root) = scratch();
    fs::write(root.join("ok.txt"), "x").unwrap();

    let mut flagged = record(&root, "whatever", "created");
    flagged["invalid_encoding"] = json!(true);

    let out = reconcile(
        dir.path(),
        &root,
        vec![flagged, record(&root, "ok.txt", "modified_write")],
    );
    assert_eq!(out["invalid_file_path"].as_array().unwrap().len(), 1);
    assert_eq!(out["modified"], json!([abs(&root, "ok.txt")]));
}

#[test]
fn test_root_config_drives_silencing() {
    let (dir, root) = scratch();
    fs::write(root.join("change-squash.toml"), "ignore = ['\\.log\\z']\n").unwrap();
    fs::write(root.join(".gitignore"), "dist/\n").unwrap();
    fs::write(root.join("app.log"), "x").unwrap();
    fs::write(root.join("main.rs"), "x").unwrap();

    let out = reconcile(
        dir.path(),
        &root,
        vec![
            record(&root, "app.log", "modified_write"),
            record(&root, "dist/bundle.js", "deleted"),
            record(&root, "main.rs", "modified_write"),
        ],
    );
    assert_eq!(out["modified"], json!([abs(&root, "main.rs")]));
    assert_eq!(out["removed"], json!([]));
}

#[test]
fn test_batch_from_stdin_compact_output() {
    let (_dir, root) = scratch();
    fs::write(root.join("a.txt"), "x").unwrap();
    let batch = json!([record(&root, "a.txt", "created")]).to_string();

    let mut child = Command::new(binary())
        .args(["reconcile", "-"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn change-squash");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(batch.as_bytes())
        .unwrap();
    let out = child.wait_with_output().unwrap();
    assert!(out.status.success());
    assert_eq!(
        String::from_utf8_lossy(&out.stdout).trim(),
        format!("added {}", abs(&root, "a.txt"))
    );
}

#[test]
fn test_malformed_batch_fails_with_message() {
    let dir = tempfile::tempdir().unwrap();
    let batch_path = dir.path().join("batch.json");
    fs::write(&batch_path, "{\"not\": \"an array\"}").unwrap();
    let stderr = run_failure(&["reconcile", batch_path.to_str().unwrap()]);
    assert!(
        stderr.contains("JSON array of raw changes"),
        "stderr should explain the failure: {stderr}"
    );
}

#[test]
fn test_watch_rejects_missing_root() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent");
    let stderr = run_failure(&["watch", missing.to_str().unwrap()]);
    assert!(
        stderr.contains("does not exist"),
        "stderr should name the problem: {stderr}"
    );
}

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn docvault_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("docvault");
    path
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    // Create test files
    let files_dir = root.join("files");
    fs::create_dir_all(&files_dir).unwrap();
    fs::write(
        files_dir.join("alpha.txt"),
        "Alpha document.\n\nThis is plain text about Rust programming.\n\nIt mentions cargo and crates.",
    )
    .unwrap();
    fs::write(
        files_dir.join("beta.csv"),
        "name,topic\nbeta,machine learning\ngamma,deployment\n",
    )
    .unwrap();

    let config_content = format!(
        r#"[catalog]
path = "{root}/data/catalog.json"

[storage]
documents_root = "{root}/data/documents"
index_root = "{root}/data/index"

[chunking]
max_chars = 500
overlap_chars = 80

[embedding]
provider = "disabled"

[generation]
model = "mistral"
url = "http://localhost:11434"

[pipeline]
op_timeout_secs = 300
"#,
        root = root.display()
    );

    let config_path = config_dir.join("docvault.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_docvault(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = docvault_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run docvault binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

fn test_file(config_path: &Path, name: &str) -> String {
    config_path
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("files")
        .join(name)
        .to_str()
        .unwrap()
        .to_string()
}

#[test]
fn test_init_creates_workspace() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_docvault(&config_path, &["init"]);
    assert!(success, "init failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("initialized"));

    let root = config_path.parent().unwrap().parent().unwrap();
    assert!(root.join("data/catalog.json").exists());
    assert!(root.join("data/documents/.keep").exists());
    assert!(root.join("data/index/.keep").exists());
}

#[test]
fn test_init_idempotent() {
    let (_tmp, config_path) = setup_test_env();

    let (_, _, success1) = run_docvault(&config_path, &["init"]);
    assert!(success1, "First init failed");

    let (_, _, success2) = run_docvault(&config_path, &["init"]);
    assert!(success2, "Second init failed (not idempotent)");
}

#[test]
fn test_add_and_list() {
    let (_tmp, config_path) = setup_test_env();
    run_docvault(&config_path, &["init"]);

    let alpha = test_file(&config_path, "alpha.txt");
    let (stdout, stderr, success) = run_docvault(&config_path, &["add", &alpha]);
    assert!(success, "add failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("added:"));
    assert!(stdout.contains("1 of 1 documents added"));

    let (stdout, _, success) = run_docvault(&config_path, &["list"]);
    assert!(success);
    assert!(stdout.contains("alpha.txt"));
    assert!(stdout.contains("TEXT"));
    assert!(stdout.contains("False"));
    assert!(stdout.contains("Total documents: 1"));
}

#[test]
fn test_add_duplicate_is_rejected_not_fatal() {
    let (_tmp, config_path) = setup_test_env();
    run_docvault(&config_path, &["init"]);

    let alpha = test_file(&config_path, "alpha.txt");
    run_docvault(&config_path, &["add", &alpha]);
    let (stdout, _, success) = run_docvault(&config_path, &["add", &alpha]);
    assert!(success, "duplicate add should not be a fatal error");
    assert!(stdout.contains("rejected:"));
    assert!(stdout.contains("already exists"));
    assert!(stdout.contains("0 of 1 documents added"));

    let (stdout, _, _) = run_docvault(&config_path, &["list"]);
    assert!(stdout.contains("Total documents: 1"));
}

#[test]
fn test_add_missing_path_is_per_document_outcome() {
    let (_tmp, config_path) = setup_test_env();
    run_docvault(&config_path, &["init"]);

    let alpha = test_file(&config_path, "alpha.txt");
    let missing = test_file(&config_path, "missing.txt");
    let (stdout, _, success) = run_docvault(&config_path, &["add", &missing, &alpha]);
    assert!(success);
    assert!(stdout.contains("does not exist"));
    assert!(stdout.contains("1 of 2 documents added"));
}

#[test]
fn test_list_json_output() {
    let (_tmp, config_path) = setup_test_env();
    run_docvault(&config_path, &["init"]);

    let beta = test_file(&config_path, "beta.csv");
    run_docvault(&config_path, &["add", &beta]);

    let (stdout, _, success) = run_docvault(&config_path, &["list", "--output", "json"]);
    assert!(success);
    let records: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let records = records.as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["name"], "beta.csv");
    // Classification is structural and probes TEXT before CSV, so any
    // non-empty UTF-8 file lands on TEXT regardless of extension.
    assert_eq!(records[0]["format"], "TEXT");
    assert_eq!(records[0]["embedded"], "False");
}

#[test]
fn test_delete_by_id() {
    let (_tmp, config_path) = setup_test_env();
    run_docvault(&config_path, &["init"]);

    let alpha = test_file(&config_path, "alpha.txt");
    let (stdout, _, _) = run_docvault(&config_path, &["add", &alpha]);
    let id = extract_id(&stdout);

    let (stdout, stderr, success) = run_docvault(&config_path, &["delete", "--id", &id]);
    assert!(success, "delete failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("deleted"));

    let (stdout, _, _) = run_docvault(&config_path, &["list"]);
    assert!(stdout.contains("No documents"));
}

#[test]
fn test_delete_unknown_id_fails() {
    let (_tmp, config_path) = setup_test_env();
    run_docvault(&config_path, &["init"]);

    let (_, stderr, success) = run_docvault(&config_path, &["delete", "--id", "zz99"]);
    assert!(!success);
    assert!(stderr.contains("zz99"));
}

#[test]
fn test_delete_all_requires_yes() {
    let (_tmp, config_path) = setup_test_env();
    run_docvault(&config_path, &["init"]);

    let alpha = test_file(&config_path, "alpha.txt");
    run_docvault(&config_path, &["add", &alpha]);

    let (_, stderr, success) = run_docvault(&config_path, &["delete-all"]);
    assert!(!success);
    assert!(stderr.contains("not confirmed"));

    let (stdout, _, success) = run_docvault(&config_path, &["delete-all", "--yes"]);
    assert!(success);
    assert!(stdout.contains("1 removed"));

    let (_, stderr, success) = run_docvault(&config_path, &["delete-all", "--yes"]);
    assert!(!success, "delete-all on an empty catalog should fail");
    assert!(stderr.contains("no documents"));
}

#[test]
fn test_process_fails_with_disabled_provider() {
    let (_tmp, config_path) = setup_test_env();
    run_docvault(&config_path, &["init"]);

    let alpha = test_file(&config_path, "alpha.txt");
    let (stdout, _, _) = run_docvault(&config_path, &["add", &alpha]);
    let id = extract_id(&stdout);

    let (_, stderr, success) = run_docvault(&config_path, &["process", "--id", &id]);
    assert!(!success);
    assert!(stderr.contains("disabled"));

    // The failed run must not flip the lifecycle flag.
    let (stdout, _, _) = run_docvault(&config_path, &["list"]);
    assert!(stdout.contains("False"));
}

#[test]
fn test_query_refused_before_processing() {
    let (_tmp, config_path) = setup_test_env();
    run_docvault(&config_path, &["init"]);

    let alpha = test_file(&config_path, "alpha.txt");
    let (stdout, _, _) = run_docvault(&config_path, &["add", &alpha]);
    let id = extract_id(&stdout);

    let (_, stderr, success) =
        run_docvault(&config_path, &["query", "--id", &id, "-q", "what is this?"]);
    assert!(!success);
    assert!(stderr.contains("not been embedded"));
}

#[test]
fn test_commands_fail_without_config() {
    let (_tmp, config_path) = setup_test_env();
    let bogus = config_path.with_file_name("nope.toml");
    let (_, stderr, success) = run_docvault(&bogus, &["list"]);
    assert!(!success);
    assert!(stderr.contains("config"));
}

/// Pull the 4-char id out of an `added: <path> (id ab12)` line.
fn extract_id(add_stdout: &str) -> String {
    let line = add_stdout
        .lines()
        .find(|l| l.starts_with("added:"))
        .unwrap_or_else(|| panic!("no added line in: {}", add_stdout));
    let start = line.rfind("(id ").unwrap() + 4;
    line[start..start + 4].to_string()
}

//! Integration tests for the eg CLI.
//!
//! Run with: `cargo test --package elemgraph-cli --test cli_integration`

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use serde_json::{json, Value};
use tempfile::TempDir;

/// Helper to run eg in a specific directory with an isolated environment.
fn run_eg_in_dir(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_eg"))
        .current_dir(dir)
        .env("HOME", dir)
        .env("XDG_CONFIG_HOME", dir.join(".config"))
        .env_remove("EG_STORE_DIR")
        .env_remove("EG_NAMING_CONFIG")
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("Failed to execute eg command")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn book(name: &str, id: i64, parent: Value) -> Value {
    json!({
        "kind": "instance",
        "elem_id": format!("myAdapter.book.instance.{}", name),
        "value": { "id": id, "parent_book_id": parent },
    })
}

/// Write a two-book graph and its naming config into `dir`.
fn create_book_workspace(dir: &Path) {
    let graph = json!({
        "elements": [
            { "kind": "type", "elem_id": "myAdapter.book" },
            book("book", 456, json!({ "$ref": "myAdapter.book.instance.rootBook" })),
            book("rootBook", 123, json!("ROOT")),
        ]
    });
    fs::write(dir.join("graph.json"), graph.to_string()).unwrap();

    let naming = json!({
        "types": { "book": { "idFields": ["id", "&parent_book_id"] } }
    });
    fs::write(dir.join("naming.json"), naming.to_string()).unwrap();
}

fn stamped(name: &str, at: &str) -> Value {
    json!({
        "kind": "instance",
        "elem_id": format!("lib.book.instance.{}", name),
        "annotations": { "_changed_at": at },
    })
}

// =============================================================================
// Resolve / Refs
// =============================================================================

#[test]
fn test_resolve_writes_renamed_graph() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path();
    create_book_workspace(dir);

    let output = run_eg_in_dir(
        dir,
        &["resolve", "graph.json", "--naming", "naming.json", "--output", "out.json"],
    );
    assert!(output.status.success(), "eg resolve should succeed");
    assert!(stdout(&output).contains("Renamed 2 instances"));

    let renamed: Value = serde_json::from_str(&fs::read_to_string(dir.join("out.json")).unwrap())
        .unwrap();
    let elements = renamed["elements"].as_array().unwrap();
    assert_eq!(elements.len(), 3);
    assert_eq!(elements[1]["elem_id"], "myAdapter.book.instance.456_123_ROOT");
    assert_eq!(elements[2]["elem_id"], "myAdapter.book.instance.123_ROOT");
    assert_eq!(
        elements[1]["value"]["parent_book_id"]["$ref"],
        "myAdapter.book.instance.123_ROOT"
    );
}

#[test]
fn test_resolve_prints_to_stdout() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path();
    create_book_workspace(dir);

    let output = run_eg_in_dir(dir, &["resolve", "graph.json", "-n", "naming.json"]);
    assert!(output.status.success());

    let renamed: Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(
        renamed["elements"][2]["elem_id"],
        "myAdapter.book.instance.123_ROOT"
    );
}

#[test]
fn test_resolve_missing_graph_fails() {
    let temp = TempDir::new().unwrap();
    let output = run_eg_in_dir(temp.path(), &["resolve", "nope.json"]);
    assert!(!output.status.success());
}

#[test]
fn test_refs_lists_referrers() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path();
    create_book_workspace(dir);

    let output = run_eg_in_dir(dir, &["refs", "graph.json", "--naming", "naming.json"]);
    assert!(output.status.success());

    let out = stdout(&output);
    assert!(out.contains("myAdapter.book.instance.rootBook (1)"));
    assert!(out.contains("<- myAdapter.book.instance.book at value.parent_book_id"));
    assert!(out.contains("1 targets, 1 references"));
}

// =============================================================================
// Index
// =============================================================================

#[test]
fn test_index_apply_and_query() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path();

    let graph = json!({ "elements": [stamped("a", "2024-01-01"), stamped("b", "2024-02-01")] });
    fs::write(dir.join("graph.json"), graph.to_string()).unwrap();
    fs::write(dir.join("empty.json"), "[]").unwrap();

    let output = run_eg_in_dir(dir, &["index", "apply", "empty.json", "--graph", "graph.json"]);
    assert!(output.status.success(), "first apply should succeed");
    assert!(stdout(&output).contains("Rebuilt index from 2 elements"));
    assert!(dir.join(".self/index/changed_at_index.json").exists());
    assert!(dir.join(".self/index/index_versions.json").exists());

    let changes = json!([
        {
            "action": "modification",
            "before": stamped("b", "2024-02-01"),
            "after": stamped("b", "2024-03-01"),
        }
    ]);
    fs::write(dir.join("changes.json"), changes.to_string()).unwrap();
    let output = run_eg_in_dir(dir, &["index", "apply", "changes.json", "-g", "graph.json"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("Applied 1 changes"));

    let output = run_eg_in_dir(dir, &["index", "query", "--from", "2024-02-01"]);
    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("2024-03-01: lib.book.instance.b"));
    assert!(!out.contains("2024-01-01"));
    assert!(!out.contains("2024-02-01"));
}

#[test]
fn test_index_query_empty_store() {
    let temp = TempDir::new().unwrap();
    let output = run_eg_in_dir(temp.path(), &["index", "query"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("(no entries)"));
}

// =============================================================================
// Config
// =============================================================================

#[test]
fn test_config_show_reads_env() {
    let temp = TempDir::new().unwrap();
    let output = Command::new(env!("CARGO_BIN_EXE_eg"))
        .current_dir(temp.path())
        .env("HOME", temp.path())
        .env("XDG_CONFIG_HOME", temp.path().join(".config"))
        .env("EG_STORE_DIR", "/tmp/eg-store")
        .args(["config", "show"])
        .output()
        .expect("Failed to execute eg command");

    assert!(output.status.success());
    assert!(stdout(&output).contains("/tmp/eg-store"));
}

#[test]
fn test_config_path() {
    let temp = TempDir::new().unwrap();
    let output = run_eg_in_dir(temp.path(), &["config", "path"]);
    assert!(output.status.success());
    assert!(!stdout(&output).trim().is_empty());
}

#[test]
fn test_help() {
    let temp = TempDir::new().unwrap();
    let output = run_eg_in_dir(temp.path(), &["--help"]);
    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("resolve"));
    assert!(out.contains("index"));
}

//! Registry integration tests over the configured toolset
//!
//! Every result reaches the model as a string; failures come back as
//! `ERROR...` text instead of unwinding.

use std::fs;

use clia::cli::AppConfig;
use clia::llm::stream_events::ToolArgs;
use serde_json::json;
use tempfile::TempDir;

fn args(value: serde_json::Value) -> ToolArgs {
    value.as_object().cloned().unwrap()
}

fn config(toml: &str) -> AppConfig {
    AppConfig::from_toml(toml).unwrap()
}

#[test]
fn test_configured_registry_names() {
    let registry = config("").build_registry(false).unwrap();
    let mut names = registry.names();
    names.sort_unstable();
    assert_eq!(
        names,
        vec!["bc", "file_edit", "file_read", "read_url", "run_shell", "search_internet"]
    );
    let listing = registry.describe_for_prompt();
    for name in &names {
        assert!(listing.contains(name), "{} missing from prompt listing", name);
    }
}

#[test]
fn test_edit_then_read_through_registry() {
    let dir = TempDir::new().unwrap();
    let cfg = config("");
    let registry = cfg.build_registry(false).unwrap();
    let ctx = cfg.tool_context(dir.path());

    let wrote = registry.execute(
        "file_edit",
        &args(json!({"path": "notes/todo.txt", "mode": "write", "content": "a\nb\nc\n"})),
        &ctx,
    );
    assert!(wrote.starts_with("Wrote 6 characters to "), "{}", wrote);

    let whole = registry.execute("file_read", &args(json!({"path": "notes/todo.txt"})), &ctx);
    assert_eq!(whole, "a\nb\nc\n");

    let ranged = registry.execute(
        "file_read",
        &args(json!({"path": "notes/todo.txt", "start_line": 2, "max_lines": 1})),
        &ctx,
    );
    assert!(ranged.ends_with("(lines 2-2)\nb"), "{}", ranged);
}

#[test]
fn test_failures_become_error_text() {
    let dir = TempDir::new().unwrap();
    let cfg = config("");
    let registry = cfg.build_registry(false).unwrap();
    let ctx = cfg.tool_context(dir.path());

    assert_eq!(
        registry.execute("nope", &ToolArgs::new(), &ctx),
        "ERROR: unknown tool 'nope'"
    );
    assert_eq!(
        registry.execute("file_read", &ToolArgs::new(), &ctx),
        "ERROR: missing required argument 'path'"
    );
    assert_eq!(
        registry.execute("file_read", &args(json!({"path": "absent.txt"})), &ctx),
        "ERROR: file not found"
    );
}

#[test]
fn test_workspace_confinement_follows_unsafe_setting() {
    let outer = TempDir::new().unwrap();
    let workspace = outer.path().join("ws");
    fs::create_dir(&workspace).unwrap();
    let request = args(json!({"path": "../escape.txt", "mode": "write", "content": "x"}));

    let cfg = config("");
    let registry = cfg.build_registry(false).unwrap();
    let blocked = registry.execute("file_edit", &request, &cfg.tool_context(&workspace));
    assert_eq!(blocked, "ERROR: path '../escape.txt' is outside the workspace");
    assert!(!outer.path().join("escape.txt").exists());

    let cfg = config("[tools]\nunsafe = true\n");
    let registry = cfg.build_registry(false).unwrap();
    let allowed = registry.execute("file_edit", &request, &cfg.tool_context(&workspace));
    assert!(allowed.starts_with("Wrote 1 characters to "), "{}", allowed);
    assert_eq!(fs::read_to_string(outer.path().join("escape.txt")).unwrap(), "x");
}

#[test]
fn test_truncation_limit_from_config() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("big.txt"), "x".repeat(50)).unwrap();
    let request = args(json!({"path": "big.txt"}));

    let cfg = config("[tools]\ntruncate_limit = 10\n");
    let registry = cfg.build_registry(false).unwrap();
    let out = registry.execute("file_read", &request, &cfg.tool_context(dir.path()));
    assert_eq!(out, format!("{}\n...[truncated 40 characters]", "x".repeat(10)));

    let cfg = config("[tools]\ntruncate = false\ntruncate_limit = 10\n");
    let registry = cfg.build_registry(false).unwrap();
    let out = registry.execute("file_read", &request, &cfg.tool_context(dir.path()));
    assert_eq!(out.len(), 50);
}

//! file_edit: write, append to, or insert into a file
//!
//! Parent directories are created as needed. Confined to the workspace
//! unless unsafe mode is on.

use std::fs::{self, OpenOptions};
use std::io::Write;

use crate::execution_engine::{optional_u64, required_str, Tool, ToolContext, ToolError};
use crate::file_tools::workspace::resolve_path;
use crate::llm::stream_events::ToolArgs;

/// Edit modes accepted by file_edit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditMode {
    Write,
    Append,
    Insert,
}

impl EditMode {
    fn parse(raw: &str) -> Result<Self, ToolError> {
        match raw.trim().to_lowercase().as_str() {
            "write" => Ok(EditMode::Write),
            "append" => Ok(EditMode::Append),
            "insert" => Ok(EditMode::Insert),
            _ => Err(ToolError::InvalidArguments(
                "'mode' must be one of: write, append, insert".to_string(),
            )),
        }
    }
}

/// Insert `content` before 1-based `line`, clamped to the end of `existing`
///
/// The inserted block always ends with a newline.
pub fn insert_lines(existing: &str, line: usize, content: &str) -> String {
    let mut lines: Vec<String> = existing.split_inclusive('\n').map(str::to_string).collect();
    let at = line.saturating_sub(1).min(lines.len());

    // an unterminated last line would otherwise merge with the insertion
    if at == lines.len() {
        if let Some(last) = lines.last_mut() {
            if !last.ends_with('\n') {
                last.push('\n');
            }
        }
    }

    let mut block = content.to_string();
    if !block.ends_with('\n') {
        block.push('\n');
    }
    lines.insert(at, block);
    lines.concat()
}

#[derive(Debug, Clone, Default)]
pub struct FileEditTool;

impl Tool for FileEditTool {
    fn name(&self) -> &str {
        "file_edit"
    }

    fn description(&self) -> &str {
        "Modify files by writing, appending, or inserting text."
    }

    fn schema(&self) -> &str {
        r#"{"path": "docs/example.txt", "mode": "insert", "line": 1, "content": "Hello"}"#
    }

    fn execute(&self, args: &ToolArgs, ctx: &ToolContext) -> Result<String, ToolError> {
        let raw_path = required_str(args, "path")?;
        let mode = EditMode::parse(args.get("mode").and_then(|m| m.as_str()).unwrap_or(""))?;
        let content = args
            .get("content")
            .and_then(|c| c.as_str())
            .ok_or_else(|| {
                ToolError::InvalidArguments("missing required argument 'content'".to_string())
            })?;

        let target = resolve_path(raw_path, &ctx.workspace_root, ctx.unsafe_paths)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                ToolError::Failed(format!("failed to create parent directories: {}", e))
            })?;
        }
        let chars = content.chars().count();

        match mode {
            EditMode::Write => {
                fs::write(&target, content)?;
                Ok(format!("Wrote {} characters to {}", chars, target.display()))
            }
            EditMode::Append => {
                let mut file = OpenOptions::new().create(true).append(true).open(&target)?;
                file.write_all(content.as_bytes())?;
                Ok(format!("Appended {} characters to {}", chars, target.display()))
            }
            EditMode::Insert => {
                let line = optional_u64(args, "line")?
                    .filter(|&n| n >= 1)
                    .ok_or_else(|| {
                        ToolError::InvalidArguments(
                            "'line' must be a positive integer for insert mode".to_string(),
                        )
                    })? as usize;
                let existing = if target.exists() {
                    fs::read_to_string(&target)?
                } else {
                    String::new()
                };
                fs::write(&target, insert_lines(&existing, line, content))?;
                Ok(format!(
                    "Inserted {} characters at line {} in {}",
                    chars,
                    line,
                    target.display()
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(value: serde_json::Value) -> ToolArgs {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_insert_lines() {
        assert_eq!(insert_lines("a\nb\n", 1, "x"), "x\na\nb\n");
        assert_eq!(insert_lines("a\nb\n", 2, "x\n"), "a\nx\nb\n");
        assert_eq!(insert_lines("a\nb", 99, "x"), "a\nb\nx\n");
        assert_eq!(insert_lines("", 3, "x"), "x\n");
    }

    #[test]
    fn test_write_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ToolContext::new(dir.path());
        let out = FileEditTool
            .execute(
                &args(json!({"path": "a/b/c.txt", "mode": "write", "content": "hi"})),
                &ctx,
            )
            .unwrap();
        assert!(out.starts_with("Wrote 2 characters to "));
        assert_eq!(fs::read_to_string(dir.path().join("a/b/c.txt")).unwrap(), "hi");
    }

    #[test]
    fn test_append_and_insert() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ToolContext::new(dir.path());
        fs::write(dir.path().join("f.txt"), "one\n").unwrap();
        FileEditTool
            .execute(&args(json!({"path": "f.txt", "mode": "append", "content": "three\n"})), &ctx)
            .unwrap();
        FileEditTool
            .execute(
                &args(json!({"path": "f.txt", "mode": "insert", "line": 2, "content": "two"})),
                &ctx,
            )
            .unwrap();
        assert_eq!(
            fs::read_to_string(dir.path().join("f.txt")).unwrap(),
            "one\ntwo\nthree\n"
        );
    }

    #[test]
    fn test_bad_mode_and_missing_line() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ToolContext::new(dir.path());
        let err = FileEditTool
            .execute(&args(json!({"path": "f", "mode": "delete", "content": ""})), &ctx)
            .unwrap_err();
        assert!(err.is_usage_error());
        let err = FileEditTool
            .execute(&args(json!({"path": "f", "mode": "insert", "content": "x"})), &ctx)
            .unwrap_err();
        assert!(err.to_string().contains("'line'"));
    }

    #[test]
    fn test_escape_blocked_unless_unsafe() {
        let outer = tempfile::tempdir().unwrap();
        let inner = outer.path().join("ws");
        fs::create_dir(&inner).unwrap();
        let mut ctx = ToolContext::new(&inner);
        let request = args(json!({"path": "../out.txt", "mode": "write", "content": "x"}));
        assert!(matches!(
            FileEditTool.execute(&request, &ctx),
            Err(ToolError::OutsideWorkspace(_))
        ));
        ctx.unsafe_paths = true;
        FileEditTool.execute(&request, &ctx).unwrap();
        assert!(outer.path().join("out.txt").exists());
    }
}

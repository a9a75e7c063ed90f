//! file_read: read a file, whole or by line range
//!
//! Always confined to the workspace; unsafe mode only widens file_edit.

use std::fs;

use crate::execution_engine::{optional_u64, required_str, Tool, ToolContext, ToolError};
use crate::file_tools::workspace::resolve_path;
use crate::llm::stream_events::ToolArgs;

#[derive(Debug, Clone, Default)]
pub struct FileReadTool;

impl Tool for FileReadTool {
    fn name(&self) -> &str {
        "file_read"
    }

    fn description(&self) -> &str {
        "Read files entirely or a specific range of lines."
    }

    fn schema(&self) -> &str {
        r#"{"path": "README.md", "start_line": 1, "max_lines": 20}"#
    }

    fn execute(&self, args: &ToolArgs, ctx: &ToolContext) -> Result<String, ToolError> {
        let raw_path = required_str(args, "path")?;
        let start_line = optional_u64(args, "start_line")?.map(|n| n.max(1));
        let max_lines = optional_u64(args, "max_lines")?;
        if max_lines == Some(0) {
            return Err(ToolError::InvalidArguments(
                "'max_lines' must be positive".to_string(),
            ));
        }

        let target = resolve_path(raw_path, &ctx.workspace_root, false)?;
        if !target.exists() {
            return Err(ToolError::InvalidArguments("file not found".to_string()));
        }
        if target.is_dir() {
            return Err(ToolError::InvalidArguments(
                "path points to a directory".to_string(),
            ));
        }

        let content = fs::read_to_string(&target)
            .map_err(|e| ToolError::Failed(format!("failed to read file: {}", e)))?;

        let start = start_line.unwrap_or(1) as usize;
        if start == 1 && max_lines.is_none() {
            return Ok(content);
        }

        let selected: Vec<&str> = content
            .lines()
            .skip(start - 1)
            .take(max_lines.map(|n| n as usize).unwrap_or(usize::MAX))
            .collect();
        let last = start + selected.len() - 1;
        let header = format!("{} (lines {}-{})", target.display(), start, last);
        if selected.is_empty() {
            Ok(header)
        } else {
            Ok(format!("{}\n{}", header, selected.join("\n")))
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
    fn test_read_whole_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "one\ntwo\n").unwrap();
        let ctx = ToolContext::new(dir.path());
        let out = FileReadTool.execute(&args(json!({"path": "a.txt"})), &ctx).unwrap();
        assert_eq!(out, "one\ntwo\n");
    }

    #[test]
    fn test_read_line_range() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "l1\nl2\nl3\nl4\n").unwrap();
        let ctx = ToolContext::new(dir.path());
        let out = FileReadTool
            .execute(&args(json!({"path": "a.txt", "start_line": 2, "max_lines": 2})), &ctx)
            .unwrap();
        assert!(out.ends_with("a.txt (lines 2-3)\nl2\nl3"));
    }

    #[test]
    fn test_read_past_end_has_header_only() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "l1\n").unwrap();
        let ctx = ToolContext::new(dir.path());
        let out = FileReadTool
            .execute(&args(json!({"path": "a.txt", "start_line": 5})), &ctx)
            .unwrap();
        assert!(out.ends_with("(lines 5-4)"));
    }

    #[test]
    fn test_read_rejects_escape_even_when_unsafe() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = ToolContext::new(dir.path());
        ctx.unsafe_paths = true;
        let err = FileReadTool
            .execute(&args(json!({"path": "../x"})), &ctx)
            .unwrap_err();
        assert!(matches!(err, ToolError::OutsideWorkspace(_)));
    }

    #[test]
    fn test_read_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ToolContext::new(dir.path());
        let err = FileReadTool
            .execute(&args(json!({"path": "nope.txt"})), &ctx)
            .unwrap_err();
        assert_eq!(err.to_string(), "file not found");
    }
}

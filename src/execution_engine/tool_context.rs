//! Tool execution context
//!
//! Runtime switches (truncation, unsafe paths, timeouts) live here and are
//! threaded into every tool call, so nothing is process-global.

use std::path::PathBuf;
use std::time::Duration;

/// Default output limit in characters
pub const DEFAULT_TRUNCATE_LIMIT: usize = 4000;

/// Default shell timeout
pub const DEFAULT_SHELL_TIMEOUT_SECS: u64 = 60;

/// Settings every tool call sees
#[derive(Debug, Clone, PartialEq)]
pub struct ToolContext {
    /// Truncate tool output before it reaches the model
    pub truncate_enabled: bool,
    /// Character limit applied when truncation is enabled
    pub truncate_limit: usize,
    /// Allow file edits outside the workspace root
    pub unsafe_paths: bool,
    /// Directory file tools are confined to; shell commands run here
    pub workspace_root: PathBuf,
    pub shell_timeout: Duration,
}

impl ToolContext {
    pub fn new(workspace_root: impl Into<PathBuf>) -> Self {
        Self {
            truncate_enabled: true,
            truncate_limit: DEFAULT_TRUNCATE_LIMIT,
            unsafe_paths: false,
            workspace_root: workspace_root.into(),
            shell_timeout: Duration::from_secs(DEFAULT_SHELL_TIMEOUT_SECS),
        }
    }

    /// Apply the truncation policy to tool output
    pub fn truncate(&self, text: String) -> String {
        if !self.truncate_enabled {
            return text;
        }
        truncate_chars(text, self.truncate_limit)
    }
}

impl Default for ToolContext {
    fn default() -> Self {
        let root = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::new(root)
    }
}

/// Keep the first `limit` characters and note how many were dropped
pub fn truncate_chars(text: String, limit: usize) -> String {
    let total = text.chars().count();
    if total <= limit {
        return text;
    }
    let cut = text
        .char_indices()
        .nth(limit)
        .map(|(idx, _)| idx)
        .unwrap_or(text.len());
    format!("{}\n...[truncated {} characters]", &text[..cut], total - limit)
}

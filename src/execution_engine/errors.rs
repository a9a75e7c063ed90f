//! Execution engine errors

use std::io;

/// Tool failures
///
/// Never crosses the registry boundary: [`ToolRegistry::execute`] turns
/// every variant into an `ERROR...` string for the model.
///
/// [`ToolRegistry::execute`]: crate::execution_engine::ToolRegistry::execute
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// Arguments missing or of the wrong shape
    #[error("{0}")]
    InvalidArguments(String),

    /// Path escapes the workspace root
    #[error("path '{0}' is outside the workspace")]
    OutsideWorkspace(String),

    /// Subprocess exceeded its time budget
    #[error("command timed out")]
    Timeout,

    /// Handler failed while running
    #[error("{0}")]
    Failed(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Outbound request failed (fetch, search)
    #[error("request failed: {0}")]
    Http(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ToolError {
    /// Errors reported as `ERROR: <detail>` rather than as a run failure
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            ToolError::InvalidArguments(_)
                | ToolError::OutsideWorkspace(_)
                | ToolError::Timeout
                | ToolError::Http(_)
        )
    }
}

impl From<ureq::Error> for ToolError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(code, _) => ToolError::Http(format!("status {}", code)),
            ureq::Error::Transport(err) => ToolError::Http(err.to_string()),
        }
    }
}

/// Registry setup errors
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Tool '{0}' already registered")]
    DuplicateTool(String),
}

//! Tool approval gate
//!
//! Provides:
//! - ApprovalGate: set of tool names that run without asking
//! - ApprovalDecision: outcome of one approval check
//!
//! "Always" answers are appended to `<config_dir>/allowed_tools`, one
//! name per line, and reloaded by every later gate built on the same
//! directory. There is no revoke operation; edit the file by hand.

use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::llm::tool_call::{is_valid_tool_name, ToolCall};
use crate::ui::prompt::{ApprovalResponse, Prompter};

/// File name of the persisted approval list
pub const ALLOWED_TOOLS_FILE: &str = "allowed_tools";

/// Base text of the tool result recorded for a denied call
pub const DENIAL_MESSAGE: &str = "Tool execution denied by user.";

/// Outcome of an approval check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApprovalDecision {
    Approved,
    Denied { reason: Option<String> },
}

impl ApprovalDecision {
    pub fn is_approved(&self) -> bool {
        matches!(self, ApprovalDecision::Approved)
    }
}

/// Tool result text for a denial, with the optional user reason
pub fn denial_message(reason: Option<&str>) -> String {
    match reason.map(str::trim).filter(|r| !r.is_empty()) {
        Some(reason) => format!("{} Reason: {}", DENIAL_MESSAGE, reason),
        None => DENIAL_MESSAGE.to_string(),
    }
}

/// Approved tool names with optional durable storage
#[derive(Debug, Clone, Default)]
pub struct ApprovalGate {
    approved: HashSet<String>,
    config_dir: Option<PathBuf>,
}

impl ApprovalGate {
    /// Gate that forgets "always" answers at process exit
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Empty gate persisting into `config_dir`, without reading it
    pub fn with_storage(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            approved: HashSet::new(),
            config_dir: Some(config_dir.into()),
        }
    }

    /// Gate persisting into `config_dir`, seeded from its approval file
    ///
    /// A missing file is an empty list.
    pub fn load(config_dir: impl Into<PathBuf>) -> io::Result<Self> {
        let mut gate = Self::with_storage(config_dir);
        if let Some(path) = gate.storage_path() {
            match fs::read_to_string(&path) {
                Ok(text) => {
                    gate.approved.extend(
                        text.lines()
                            .map(str::trim)
                            .filter(|name| is_valid_tool_name(name))
                            .map(str::to_string),
                    );
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e),
            }
        }
        tracing::debug!(event = "approvals_loaded", count = gate.approved.len());
        Ok(gate)
    }

    /// Default storage directory (`<config_dir>/clia`)
    pub fn default_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("clia"))
    }

    pub fn storage_path(&self) -> Option<PathBuf> {
        self.config_dir
            .as_deref()
            .map(|dir| dir.join(ALLOWED_TOOLS_FILE))
    }

    pub fn is_approved(&self, name: &str) -> bool {
        self.approved.contains(name)
    }

    /// Approved names, sorted
    pub fn approved_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.approved.iter().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Approve `name` permanently
    ///
    /// Idempotent: a name already approved is not written again. The name
    /// stays approved in memory even when writing the file fails. Names
    /// outside the tool-name grammar are refused, so every stored line is
    /// exactly one name.
    pub fn approve_always(&mut self, name: &str) -> io::Result<()> {
        if !is_valid_tool_name(name) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid tool name {:?}", name),
            ));
        }
        if !self.approved.insert(name.to_string()) {
            return Ok(());
        }
        let Some(dir) = self.config_dir.as_deref() else {
            return Ok(());
        };
        append_name(dir, name)
    }

    /// Decide whether `call` may run, asking `prompter` when needed
    pub fn check(&mut self, call: &ToolCall, prompter: &mut dyn Prompter) -> ApprovalDecision {
        if self.is_approved(&call.name) {
            return ApprovalDecision::Approved;
        }
        match prompter.approve_tool(call) {
            ApprovalResponse::ApproveOnce => ApprovalDecision::Approved,
            ApprovalResponse::ApproveAlways => {
                if let Err(e) = self.approve_always(&call.name) {
                    tracing::warn!(event = "approval_persist_failed", tool = %call.name, error = %e);
                    prompter.notify(&format!("[warning] Failed to persist tool approval: {}", e));
                }
                ApprovalDecision::Approved
            }
            ApprovalResponse::Deny => ApprovalDecision::Denied {
                reason: prompter.denial_reason(),
            },
        }
    }
}

fn append_name(dir: &Path, name: &str) -> io::Result<()> {
    fs::create_dir_all(dir)?;
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join(ALLOWED_TOOLS_FILE))?;
    writeln!(file, "{}", name)
}

//! Session persistence
//!
//! A session file is UTF-8 JSON `{"conversation": [Message, ...]}`.
//! Bare names live in the session directory as `<name>.json`; anything
//! that looks like a path (absolute, contains a separator, or ends in
//! `.json` when saving) is used as given.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use chrono::{DateTime, Local};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::file_tools::expand_home;
use crate::llm::types::{Conversation, Message};

/// Default session directory, relative to the working directory
pub const DEFAULT_SESSION_DIR: &str = "sessions";

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Usage: {0}")]
    MissingName(&'static str),

    #[error("Invalid session name. Use letters, numbers, hyphen, or underscore.")]
    InvalidName,

    #[error("Cannot save to a directory. Provide a file path.")]
    SaveTargetIsDirectory,

    #[error("Path points to a directory, not a file.")]
    LoadTargetIsDirectory,

    #[error("Session file '{0}' not found.")]
    FileNotFound(PathBuf),

    #[error("Session '{name}' not found at {path}")]
    NotFound { name: String, path: PathBuf },

    #[error("Save directory '{0}' does not exist.")]
    DirectoryMissing(PathBuf),

    #[error("Invalid session file format.")]
    InvalidFormat,

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

/// On-disk session layout
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionFile {
    pub conversation: Vec<Message>,
}

/// Saved session listing entry
#[derive(Debug, Clone)]
pub struct SessionEntry {
    pub file_name: String,
    pub size: u64,
    pub modified: Option<DateTime<Local>>,
}

fn name_filter() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^a-zA-Z0-9_\-]").expect("session name regex must compile"))
}

/// Replace disallowed characters with `_` and trim surrounding `_`
pub fn sanitize_session_name(name: &str) -> String {
    name_filter()
        .replace_all(name.trim(), "_")
        .trim_matches('_')
        .to_string()
}

fn looks_like_path(raw: &str) -> bool {
    Path::new(raw).is_absolute() || raw.contains('/') || raw.contains('\\')
}

/// Session directory plus name-to-path rules
#[derive(Debug, Clone)]
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn named_path(&self, raw: &str) -> Result<PathBuf, SessionError> {
        let name = sanitize_session_name(raw);
        if name.is_empty() {
            return Err(SessionError::InvalidName);
        }
        Ok(self.dir.join(format!("{}.json", name)))
    }

    /// Where `/save <raw>` writes
    pub fn resolve_save_path(&self, raw: &str) -> Result<PathBuf, SessionError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(SessionError::MissingName("/save <name or path>"));
        }
        if looks_like_path(raw) || raw.ends_with(".json") {
            let mut path = expand_home(raw);
            if path.is_dir() {
                return Err(SessionError::SaveTargetIsDirectory);
            }
            if path.extension().map_or(true, |ext| ext != "json") {
                path.set_extension("json");
            }
            return Ok(path);
        }
        self.named_path(raw)
    }

    /// Which existing file `/load <raw>` or `/rm <raw>` refers to
    pub fn resolve_load_path(&self, raw: &str) -> Result<PathBuf, SessionError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(SessionError::MissingName("/load <name or path>"));
        }
        let candidate = expand_home(raw);
        if candidate.is_file() {
            return Ok(candidate);
        }
        if looks_like_path(raw) {
            if candidate.is_dir() {
                return Err(SessionError::LoadTargetIsDirectory);
            }
            return Err(SessionError::FileNotFound(candidate));
        }
        let path = self.named_path(raw)?;
        if !path.exists() {
            return Err(SessionError::NotFound {
                name: sanitize_session_name(raw),
                path,
            });
        }
        Ok(path)
    }

    /// Write `conversation` as pretty JSON, creating parent directories
    pub fn save(&self, raw: &str, conversation: &Conversation) -> Result<PathBuf, SessionError> {
        let path = self.resolve_save_path(raw)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = SessionFile {
            conversation: conversation.messages().to_vec(),
        };
        fs::write(&path, serde_json::to_string_pretty(&file)?)?;
        tracing::debug!(event = "session_saved", path = %path.display(), messages = conversation.len());
        Ok(path)
    }

    /// Read a session and adopt it under the live system prompt
    ///
    /// The stored system message is replaced (or inserted) and usage
    /// totals are recomputed from the loaded messages.
    pub fn load(
        &self,
        raw: &str,
        system_prompt: &str,
    ) -> Result<(PathBuf, Conversation), SessionError> {
        let path = self.resolve_load_path(raw)?;
        let text = fs::read_to_string(&path)?;
        let conversation = parse_session(&text, system_prompt)?;
        tracing::debug!(event = "session_loaded", path = %path.display(), messages = conversation.len());
        Ok((path, conversation))
    }

    pub fn remove(&self, raw: &str) -> Result<PathBuf, SessionError> {
        let path = self.resolve_load_path(raw)?;
        fs::remove_file(&path)?;
        tracing::debug!(event = "session_removed", path = %path.display());
        Ok(path)
    }

    /// Saved `*.json` files, sorted by name
    pub fn list(&self) -> Result<Vec<SessionEntry>, SessionError> {
        if !self.dir.exists() {
            return Err(SessionError::DirectoryMissing(self.dir.clone()));
        }
        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().map_or(true, |ext| ext != "json") {
                continue;
            }
            let metadata = entry.metadata()?;
            if !metadata.is_file() {
                continue;
            }
            entries.push(SessionEntry {
                file_name: entry.file_name().to_string_lossy().into_owned(),
                size: metadata.len(),
                modified: metadata.modified().ok().map(DateTime::<Local>::from),
            });
        }
        entries.sort_by(|a, b| a.file_name.cmp(&b.file_name));
        Ok(entries)
    }
}

/// Parse session JSON text into a conversation
pub fn parse_session(text: &str, system_prompt: &str) -> Result<Conversation, SessionError> {
    let value: JsonValue = serde_json::from_str(text)?;
    let Some(raw_messages) = value.get("conversation").filter(|v| v.is_array()) else {
        return Err(SessionError::InvalidFormat);
    };
    let messages: Vec<Message> = serde_json::from_value(raw_messages.clone())?;
    Ok(Conversation::from_messages(messages, system_prompt))
}

/// Conversation as pretty JSON (the `/context_dump` payload)
pub fn context_json(conversation: &Conversation) -> Result<String, SessionError> {
    Ok(serde_json::to_string_pretty(conversation.messages())?)
}

/// Write the context dump to `raw`, relative paths under the working directory
pub fn write_context_dump(raw: &str, conversation: &Conversation) -> Result<PathBuf, SessionError> {
    let mut path = expand_home(raw.trim());
    if !path.is_absolute() {
        path = std::env::current_dir()?.join(path);
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, context_json(conversation)?)?;
    Ok(path)
}

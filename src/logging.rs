//! Debug log
//!
//! JSON lines written through a non-blocking file appender. The level
//! filter sits behind a reload handle so `/debug on|off` can switch the
//! log at runtime; when off, nothing is recorded.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, reload, Registry};

/// Default debug log location
pub const DEFAULT_LOG_FILE: &str = "/tmp/clia.log";

#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("failed to open debug log {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to install debug log: {0}")]
    Init(String),

    #[error("failed to switch debug log: {0}")]
    Reload(String),
}

fn level_for(enabled: bool) -> LevelFilter {
    if enabled {
        LevelFilter::DEBUG
    } else {
        LevelFilter::OFF
    }
}

/// Runtime-switchable debug log
pub struct DebugLog {
    path: PathBuf,
    enabled: bool,
    handle: Option<reload::Handle<LevelFilter, Registry>>,
    _guard: Option<WorkerGuard>,
}

impl DebugLog {
    /// Install the global subscriber writing to `path`
    ///
    /// Fails if a global subscriber is already set.
    pub fn install(path: impl Into<PathBuf>, enabled: bool) -> Result<Self, LogError> {
        let path = path.into();
        let open_err = |source| LogError::Open {
            path: path.clone(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(open_err)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(open_err)?;

        let (writer, guard) = tracing_appender::non_blocking(file);
        let (filter, handle) = reload::Layer::new(level_for(enabled));
        let fmt_layer = fmt::layer()
            .json()
            .with_writer(writer)
            .with_ansi(false)
            .with_target(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .try_init()
            .map_err(|e| LogError::Init(e.to_string()))?;

        Ok(Self {
            path,
            enabled,
            handle: Some(handle),
            _guard: Some(guard),
        })
    }

    /// Log state without a subscriber (nothing is written)
    pub fn detached(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            enabled: false,
            handle: None,
            _guard: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Switch recording on or off
    pub fn set_enabled(&mut self, enabled: bool) -> Result<(), LogError> {
        if let Some(handle) = &self.handle {
            handle
                .modify(|filter| *filter = level_for(enabled))
                .map_err(|e| LogError::Reload(e.to_string()))?;
        }
        self.enabled = enabled;
        Ok(())
    }
}

//! CLI wiring: clap arguments, TOML configuration and exit codes
//!
//! Command-line flags override config file values, which override the
//! built-in defaults.

pub mod args;
pub mod config;

pub use args::Args;
pub use config::{AppConfig, ConfigError};

/// Startup failures that end the process
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Adapter(#[from] crate::llm::adapters::AdapterError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Config(_) | Error::Adapter(_) => EXIT_CONFIG_ERROR,
            Error::Io(_) => EXIT_FAILURE,
        }
    }
}

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;
pub const EXIT_CONFIG_ERROR: i32 = 2;

//! Configuration file
//!
//! TOML, every key optional. Resolution order: built-in defaults, then
//! the file, then command-line flags.
//!
//! ```toml
//! [llm]
//! provider = "ollama"
//! model = "qwen3:14b"
//! timeout_secs = 120
//!
//! [tools]
//! truncate_limit = 4000
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cli::args::Args;
use crate::execution_engine::{RegistryError, ToolContext, ToolRegistry, DEFAULT_TRUNCATE_LIMIT};
use crate::file_tools::{expand_home, FileEditTool, FileReadTool};
use crate::llm::adapters::{AdapterSettings, ChatOptions, Provider};
use crate::llm::contracts::default_system_prompt_template;
use crate::logging::DEFAULT_LOG_FILE;
use crate::os_tools::{BcTool, RunShellTool};
use crate::ui::session::DEFAULT_SESSION_DIR;
use crate::web_tools::{ReadUrlTool, SearchConfig, SearchInternetTool, SearchProvider};

const CONFIG_DIR_NAME: &str = "clia";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config file {0} not found")]
    NotFound(PathBuf),

    #[error("Failed to read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid value for {field}: {message}")]
    Invalid { field: &'static str, message: String },

    #[error("{0}")]
    Registry(#[from] RegistryError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    pub provider: String,
    pub model: String,
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    pub temperature: Option<f64>,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: Provider::Ollama.as_str().to_string(),
            model: "qwen3:14b".to_string(),
            endpoint: None,
            api_key: None,
            timeout_secs: 120,
            temperature: Some(0.7),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsSection {
    pub shell_timeout_secs: u64,
    pub truncate: bool,
    pub truncate_limit: usize,
    #[serde(rename = "unsafe")]
    pub unsafe_paths: bool,
}

impl Default for ToolsSection {
    fn default() -> Self {
        Self {
            shell_timeout_secs: 60,
            truncate: true,
            truncate_limit: DEFAULT_TRUNCATE_LIMIT,
            unsafe_paths: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSection {
    pub provider: String,
    pub google_api_key: Option<String>,
    pub google_engine_id: Option<String>,
}

impl Default for SearchSection {
    fn default() -> Self {
        Self {
            provider: "duckduckgo".to_string(),
            google_api_key: None,
            google_engine_id: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSection {
    pub dir: PathBuf,
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(DEFAULT_SESSION_DIR),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugSection {
    pub log_file: PathBuf,
}

impl Default for DebugSection {
    fn default() -> Self {
        Self {
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptSection {
    pub system_prompt_file: Option<PathBuf>,
}

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub llm: LlmSection,
    pub tools: ToolsSection,
    pub search: SearchSection,
    pub session: SessionSection,
    pub debug: DebugSection,
    pub prompt: PromptSection,
    /// Not read from the file; set by `--no-color`
    #[serde(skip)]
    pub no_color: bool,
}

impl AppConfig {
    /// `<config dir>/clia/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE))
    }

    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Load the config file
    ///
    /// An explicit path must exist. A missing file at the default
    /// location means defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(path) => {
                let path = expand_home(&path.to_string_lossy());
                if !path.exists() {
                    return Err(ConfigError::NotFound(path));
                }
                path
            }
            None => match Self::default_path() {
                Some(path) if path.exists() => path,
                _ => return Ok(Self::default()),
            },
        };
        Self::load_file(&path)
    }

    fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(event = "config_loaded", path = %path.display());
        Ok(config)
    }

    /// Apply command-line overrides
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(provider) = &args.provider {
            self.llm.provider = provider.clone();
        }
        if let Some(model) = &args.model {
            self.llm.model = model.clone();
        }
        if let Some(endpoint) = &args.endpoint {
            self.llm.endpoint = Some(endpoint.clone());
        }
        if let Some(api_key) = &args.api_key {
            self.llm.api_key = Some(api_key.clone());
        }
        if let Some(temperature) = args.temperature {
            self.llm.temperature = Some(temperature);
        }
        if let Some(timeout) = args.timeout {
            self.llm.timeout_secs = timeout;
        }
        if let Some(timeout) = args.shell_timeout {
            self.tools.shell_timeout_secs = timeout;
        }
        if let Some(dir) = &args.session_dir {
            self.session.dir = dir.clone();
        }
        if let Some(path) = &args.debug_log {
            self.debug.log_file = path.clone();
        }
        if let Some(path) = &args.system_prompt {
            self.prompt.system_prompt_file = Some(path.clone());
        }
        if args.unsafe_paths {
            self.tools.unsafe_paths = true;
        }
        if args.no_color {
            self.no_color = true;
        }
    }

    pub fn provider(&self) -> Result<Provider, ConfigError> {
        self.llm
            .provider
            .parse::<Provider>()
            .map_err(|e| ConfigError::Invalid {
                field: "llm.provider",
                message: e.to_string(),
            })
    }

    pub fn adapter_settings(&self) -> Result<AdapterSettings, ConfigError> {
        let mut settings = AdapterSettings::new(self.provider()?);
        settings.endpoint = self.llm.endpoint.clone();
        settings.api_key = self.llm.api_key.clone();
        settings.timeout_secs = self.llm.timeout_secs;
        Ok(settings)
    }

    pub fn chat_options(&self) -> ChatOptions {
        ChatOptions {
            temperature: self.llm.temperature,
            ..ChatOptions::default()
        }
    }

    pub fn search_config(&self) -> Result<SearchConfig, ConfigError> {
        let provider = self
            .search
            .provider
            .parse::<SearchProvider>()
            .map_err(|message| ConfigError::Invalid {
                field: "search.provider",
                message,
            })?;
        Ok(SearchConfig {
            provider,
            google_api_key: self.search.google_api_key.clone(),
            google_engine_id: self.search.google_engine_id.clone(),
        })
    }

    /// Tool context rooted at `workspace_root`
    pub fn tool_context(&self, workspace_root: impl Into<PathBuf>) -> ToolContext {
        let mut ctx = ToolContext::new(workspace_root);
        ctx.truncate_enabled = self.tools.truncate;
        ctx.truncate_limit = self.tools.truncate_limit;
        ctx.unsafe_paths = self.tools.unsafe_paths;
        ctx.shell_timeout = Duration::from_secs(self.tools.shell_timeout_secs);
        ctx
    }

    /// Template text: the configured file, or the built-in default
    pub fn system_prompt_template(&self) -> Result<String, ConfigError> {
        match &self.prompt.system_prompt_file {
            Some(path) => {
                let path = expand_home(&path.to_string_lossy());
                fs::read_to_string(&path).map_err(|source| ConfigError::Read { path, source })
            }
            None => Ok(default_system_prompt_template()),
        }
    }

    /// Registry with every built-in tool
    ///
    /// `echo_shell` streams run_shell output to the terminal while the
    /// command runs.
    pub fn build_registry(&self, echo_shell: bool) -> Result<ToolRegistry, ConfigError> {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(
            RunShellTool::new(self.tools.shell_timeout_secs).with_echo(echo_shell),
        ))?;
        registry.register(Box::new(BcTool))?;
        registry.register(Box::new(FileReadTool))?;
        registry.register(Box::new(FileEditTool))?;
        registry.register(Box::new(ReadUrlTool))?;
        registry.register(Box::new(SearchInternetTool::new(self.search_config()?)))?;
        Ok(registry)
    }
}

//! Adapter factory
//!
//! Creates LLM adapter instances from configuration.

use std::fmt;
use std::str::FromStr;

use crate::llm::adapters::ollama::OllamaAdapter;
use crate::llm::adapters::openai::OpenAiAdapter;
use crate::llm::adapters::{Adapter, AdapterError};

/// Supported backend providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Provider {
    #[default]
    Ollama,
    OpenAi,
    Mistral,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Ollama => "ollama",
            Provider::OpenAi => "openai",
            Provider::Mistral => "mistral",
        }
    }

    pub fn default_endpoint(&self) -> &'static str {
        match self {
            Provider::Ollama => "http://localhost:11434",
            Provider::OpenAi => "https://api.openai.com/v1",
            Provider::Mistral => "https://api.mistral.ai/v1",
        }
    }

    /// Environment variable consulted when no API key is configured
    pub fn api_key_env(&self) -> Option<&'static str> {
        match self {
            Provider::Ollama => None,
            Provider::OpenAi => Some("OPENAI_API_KEY"),
            Provider::Mistral => Some("MISTRAL_API_KEY"),
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = AdapterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ollama" => Ok(Provider::Ollama),
            "openai" => Ok(Provider::OpenAi),
            "mistral" => Ok(Provider::Mistral),
            other => Err(AdapterError::Configuration(format!(
                "Unsupported provider '{}'",
                other
            ))),
        }
    }
}

/// Everything needed to build an adapter
#[derive(Debug, Clone, PartialEq)]
pub struct AdapterSettings {
    pub provider: Provider,
    /// Endpoint override; provider default when None
    pub endpoint: Option<String>,
    /// Literal key or `env:NAME` reference
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl AdapterSettings {
    pub fn new(provider: Provider) -> Self {
        Self {
            provider,
            endpoint: None,
            api_key: None,
            timeout_secs: 120,
        }
    }

    pub fn endpoint(&self) -> &str {
        self.endpoint
            .as_deref()
            .filter(|e| !e.trim().is_empty())
            .unwrap_or_else(|| self.provider.default_endpoint())
    }

    /// API key after `env:` resolution and provider fallback variable
    pub fn resolved_api_key(&self) -> Option<String> {
        let configured = self
            .api_key
            .as_deref()
            .map(resolve_env_var)
            .filter(|k| !k.is_empty() && !k.starts_with("env:"));
        configured.or_else(|| {
            self.provider
                .api_key_env()
                .and_then(|name| std::env::var(name).ok())
                .filter(|k| !k.is_empty())
        })
    }
}

/// Create adapter from settings
///
/// OpenAI-compatible providers require an API key.
pub fn create_adapter(settings: &AdapterSettings) -> Result<Adapter, AdapterError> {
    let endpoint = settings.endpoint().to_string();
    match settings.provider {
        Provider::Ollama => Ok(Adapter::Ollama(OllamaAdapter::new(
            endpoint,
            settings.timeout_secs,
        ))),
        provider @ (Provider::OpenAi | Provider::Mistral) => {
            let api_key = settings.resolved_api_key().ok_or_else(|| {
                AdapterError::Configuration(format!(
                    "{} provider requires an API key (set api_key or {})",
                    provider,
                    provider.api_key_env().unwrap_or("an API key variable")
                ))
            })?;
            Ok(Adapter::OpenAi(OpenAiAdapter::new(
                provider.as_str(),
                endpoint,
                api_key,
                settings.timeout_secs,
            )))
        }
    }
}

/// Resolve environment variable reference
///
/// If value starts with "env:", read from environment.
/// Otherwise return value as-is.
pub fn resolve_env_var(value: &str) -> String {
    if let Some(rest) = value.strip_prefix("env:") {
        std::env::var(rest).unwrap_or_else(|_| format!("env:{}", rest))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::adapters::LlmAdapter;

    #[test]
    fn test_resolve_env_var_direct() {
        assert_eq!(resolve_env_var("direct_value"), "direct_value");
    }

    #[test]
    fn test_resolve_env_var_reference() {
        std::env::set_var("CLIA_FACTORY_TEST_VAR", "test_value");
        assert_eq!(resolve_env_var("env:CLIA_FACTORY_TEST_VAR"), "test_value");
    }

    #[test]
    fn test_resolve_env_var_missing_kept() {
        assert_eq!(
            resolve_env_var("env:CLIA_FACTORY_SURELY_UNSET"),
            "env:CLIA_FACTORY_SURELY_UNSET"
        );
    }

    #[test]
    fn test_provider_parse() {
        assert_eq!("OpenAI".parse::<Provider>().unwrap(), Provider::OpenAi);
        assert_eq!("ollama".parse::<Provider>().unwrap(), Provider::Ollama);
        assert!("glm".parse::<Provider>().is_err());
    }

    #[test]
    fn test_factory_ollama_default_endpoint() {
        let adapter = create_adapter(&AdapterSettings::new(Provider::Ollama)).unwrap();
        assert_eq!(adapter.provider_name(), "ollama");
        match adapter {
            Adapter::Ollama(a) => assert_eq!(a.base_url(), "http://localhost:11434"),
            _ => panic!("expected ollama"),
        }
    }

    #[test]
    fn test_factory_openai_with_literal_key() {
        let mut settings = AdapterSettings::new(Provider::OpenAi);
        settings.api_key = Some("sk-test".to_string());
        settings.endpoint = Some("http://proxy.local/v1".to_string());
        let adapter = create_adapter(&settings).unwrap();
        assert_eq!(adapter.provider_name(), "openai");
        match adapter {
            Adapter::OpenAi(a) => assert_eq!(a.base_url(), "http://proxy.local/v1"),
            _ => panic!("expected openai"),
        }
    }

    #[test]
    fn test_factory_mistral_env_key() {
        std::env::set_var("CLIA_FACTORY_MISTRAL_KEY", "mk");
        let mut settings = AdapterSettings::new(Provider::Mistral);
        settings.api_key = Some("env:CLIA_FACTORY_MISTRAL_KEY".to_string());
        let adapter = create_adapter(&settings).unwrap();
        assert_eq!(adapter.provider_name(), "mistral");
    }

    #[test]
    fn test_factory_unresolved_key_is_configuration_error() {
        let mut settings = AdapterSettings::new(Provider::OpenAi);
        settings.api_key = Some("env:CLIA_FACTORY_SURELY_UNSET".to_string());
        if std::env::var("OPENAI_API_KEY").is_ok() {
            return;
        }
        let result = create_adapter(&settings);
        assert!(matches!(result, Err(AdapterError::Configuration(_))));
    }
}

//! LLM adapters
//!
//! Provider-agnostic streaming interface for LLM HTTP APIs.
//! Supports Ollama (NDJSON) and OpenAI-compatible (SSE) backends.

pub mod factory;
pub mod ollama;
pub mod ollama_parse;
pub mod openai;
pub mod openai_parse;
pub mod transport;
pub mod transport_fake;
pub mod transport_types;
pub mod transport_ureq;

use serde_json::{Map, Value as JsonValue};

use crate::llm::stream_events::StreamEvent;
use crate::llm::types::Message;

// Re-export common types
pub use factory::{create_adapter, AdapterSettings, Provider};
pub use transport::{AdapterError, SyncTransport, Transport};

/// Lazy, finite sequence of decoded events for one model response
pub type EventStream = Box<dyn Iterator<Item = Result<StreamEvent, AdapterError>> + Send>;

/// Per-request generation options
///
/// Unset values are never sent to the backend.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatOptions {
    pub temperature: Option<f64>,
    /// Backend-specific extras passed through verbatim
    pub extra: Map<String, JsonValue>,
}

impl ChatOptions {
    pub fn with_temperature(temperature: f64) -> Self {
        Self {
            temperature: Some(temperature),
            extra: Map::new(),
        }
    }

    /// Options as a JSON object with null entries dropped
    pub fn to_map(&self) -> Map<String, JsonValue> {
        let mut map = Map::new();
        if let Some(temperature) = self.temperature {
            map.insert("temperature".to_string(), JsonValue::from(temperature));
        }
        for (key, value) in &self.extra {
            if !value.is_null() {
                map.insert(key.clone(), value.clone());
            }
        }
        map
    }

    pub fn is_empty(&self) -> bool {
        self.to_map().is_empty()
    }
}

/// Messages as sent to a backend: role and content only
///
/// Per-message usage stays local to the conversation.
pub fn wire_messages(messages: &[Message]) -> Vec<JsonValue> {
    messages
        .iter()
        .map(|m| serde_json::json!({"role": m.role.as_str(), "content": m.content}))
        .collect()
}

/// LLM adapter trait
///
/// All providers implement this trait.
/// The chat loop calls adapters through this uniform interface.
pub trait LlmAdapter: Send + Sync {
    /// Send the whole conversation and stream back normalized events
    ///
    /// HTTP-level failures are returned before any event is produced;
    /// in-band backend errors arrive as a terminal `ErrorEvent`.
    fn chat_stream(
        &self,
        model: &str,
        messages: &[Message],
        options: &ChatOptions,
    ) -> Result<EventStream, AdapterError>;

    /// Get provider name for logging
    fn provider_name(&self) -> &str;
}

/// Adapter enum: closed set of backends
///
/// Selected by configuration; implements LlmAdapter via delegation.
#[derive(Debug)]
pub enum Adapter {
    Ollama(ollama::OllamaAdapter),
    OpenAi(openai::OpenAiAdapter),
}

impl Adapter {
    /// Underlying transport (used by tests to inspect recorded requests)
    pub fn transport(&self) -> &Transport {
        match self {
            Adapter::Ollama(a) => a.transport(),
            Adapter::OpenAi(a) => a.transport(),
        }
    }
}

impl LlmAdapter for Adapter {
    fn chat_stream(
        &self,
        model: &str,
        messages: &[Message],
        options: &ChatOptions,
    ) -> Result<EventStream, AdapterError> {
        match self {
            Adapter::Ollama(a) => a.chat_stream(model, messages, options),
            Adapter::OpenAi(a) => a.chat_stream(model, messages, options),
        }
    }

    fn provider_name(&self) -> &str {
        match self {
            Adapter::Ollama(a) => a.provider_name(),
            Adapter::OpenAi(a) => a.provider_name(),
        }
    }
}

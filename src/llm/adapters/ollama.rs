//! Ollama adapter
//!
//! Ollama local LLM adapter using NDJSON streaming, with a fallback to the
//! older `/api/generate` endpoint.

use serde_json::Value as JsonValue;

use crate::llm::adapters::ollama_parse::{messages_to_prompt, GenerateDecoder, NdjsonDecoder};
use crate::llm::adapters::transport::{SyncTransport, Transport, UreqTransport};
use crate::llm::adapters::{wire_messages, AdapterError, ChatOptions, EventStream, LlmAdapter};
use crate::llm::think::ThinkFilter;
use crate::llm::types::Message;

/// Ollama adapter (local HTTP API)
#[derive(Debug)]
pub struct OllamaAdapter {
    /// Base URL (e.g., http://localhost:11434)
    base_url: String,
    /// HTTP transport
    transport: Transport,
}

impl OllamaAdapter {
    /// Create new Ollama adapter
    pub fn new(base_url: impl Into<String>, timeout_secs: u64) -> Self {
        Self::with_transport(
            base_url,
            Transport::Real(UreqTransport::with_timeout(timeout_secs)),
        )
    }

    /// Create adapter with custom transport (for testing)
    pub fn with_transport(base_url: impl Into<String>, transport: Transport) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            transport,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    /// Build streaming chat request body
    pub fn build_chat_request(
        &self,
        model: &str,
        messages: &[Message],
        options: &ChatOptions,
    ) -> Result<String, AdapterError> {
        let mut request = serde_json::json!({
            "model": model,
            "messages": wire_messages(messages),
            "stream": true
        });
        if !options.is_empty() {
            request["options"] = JsonValue::Object(options.to_map());
        }
        Ok(serde_json::to_string(&request)?)
    }

    /// Build streaming completion request body for the fallback endpoint
    pub fn build_generate_request(
        &self,
        model: &str,
        messages: &[Message],
        options: &ChatOptions,
    ) -> Result<String, AdapterError> {
        let mut request = serde_json::json!({
            "model": model,
            "prompt": messages_to_prompt(messages),
            "stream": true
        });
        if !options.is_empty() {
            request["options"] = JsonValue::Object(options.to_map());
        }
        Ok(serde_json::to_string(&request)?)
    }

    fn generate_stream(
        &self,
        model: &str,
        messages: &[Message],
        options: &ChatOptions,
    ) -> Result<EventStream, AdapterError> {
        let url = format!("{}/api/generate", self.base_url);
        let body = self.build_generate_request(model, messages, options)?;
        let reader = self.transport.post_stream(&url, &[], &body)?;
        Ok(Box::new(GenerateDecoder::new(reader)))
    }
}

/// A 404 from `/api/chat` that is not about a missing model
///
/// Older servers lack the chat endpoint entirely; a missing model must
/// surface to the user instead.
pub fn should_fall_back(err: &AdapterError) -> bool {
    match err {
        AdapterError::Http { status: 404, message } => {
            let lower = message.to_lowercase();
            !(lower.contains("model") && lower.contains("not found"))
        }
        _ => false,
    }
}

impl LlmAdapter for OllamaAdapter {
    fn chat_stream(
        &self,
        model: &str,
        messages: &[Message],
        options: &ChatOptions,
    ) -> Result<EventStream, AdapterError> {
        let url = format!("{}/api/chat", self.base_url);
        let body = self.build_chat_request(model, messages, options)?;

        match self.transport.post_stream(&url, &[], &body) {
            Ok(reader) => Ok(Box::new(ThinkFilter::new(NdjsonDecoder::new(reader)))),
            Err(err) if should_fall_back(&err) => {
                tracing::debug!(event = "model_fallback", url, error = %err);
                self.generate_stream(model, messages, options)
            }
            Err(err) => Err(err),
        }
    }

    fn provider_name(&self) -> &str {
        "ollama"
    }
}

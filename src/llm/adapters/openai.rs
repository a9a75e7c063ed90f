//! OpenAI adapter
//!
//! OpenAI-compatible HTTP API adapter using SSE streaming.
//! Used by both the OpenAI and Mistral providers.

use serde_json::Value as JsonValue;

use crate::llm::adapters::openai_parse::SseDecoder;
use crate::llm::adapters::transport::{SyncTransport, Transport, UreqTransport};
use crate::llm::adapters::{wire_messages, AdapterError, ChatOptions, EventStream, LlmAdapter};
use crate::llm::think::ThinkFilter;
use crate::llm::types::Message;

/// OpenAI-compatible adapter
#[derive(Debug)]
pub struct OpenAiAdapter {
    /// Provider label for logging ("openai", "mistral")
    label: String,
    /// Base URL (e.g., https://api.openai.com/v1)
    base_url: String,
    /// API key
    api_key: String,
    /// HTTP transport
    transport: Transport,
}

impl OpenAiAdapter {
    /// Create new OpenAI-compatible adapter
    pub fn new(
        label: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout_secs: u64,
    ) -> Self {
        Self::with_transport(
            label,
            base_url,
            api_key,
            Transport::Real(UreqTransport::with_timeout(timeout_secs)),
        )
    }

    /// Create adapter with custom transport (for testing)
    pub fn with_transport(
        label: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        transport: Transport,
    ) -> Self {
        Self {
            label: label.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
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
    ///
    /// Options are merged into the top level of the request.
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
        if let JsonValue::Object(ref mut fields) = request {
            for (key, value) in options.to_map() {
                fields.insert(key, value);
            }
        }
        Ok(serde_json::to_string(&request)?)
    }
}

impl LlmAdapter for OpenAiAdapter {
    fn chat_stream(
        &self,
        model: &str,
        messages: &[Message],
        options: &ChatOptions,
    ) -> Result<EventStream, AdapterError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = self.build_chat_request(model, messages, options)?;
        let auth = format!("Bearer {}", self.api_key);
        let headers = [("Authorization", auth.as_str())];

        let reader = self.transport.post_stream(&url, &headers, &body)?;
        Ok(Box::new(ThinkFilter::new(SseDecoder::new(reader))))
    }

    fn provider_name(&self) -> &str {
        &self.label
    }
}

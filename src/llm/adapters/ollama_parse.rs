//! Ollama response parsing
//!
//! NDJSON decoders for `/api/chat` and the `/api/generate` fallback, plus
//! the helpers that flatten a conversation into a single prompt.

use std::collections::VecDeque;
use std::io::BufRead;

use serde_json::Value as JsonValue;

use crate::llm::adapters::AdapterError;
use crate::llm::stream_events::{normalize_tool_args, StreamEvent};
use crate::llm::think::{THINK_CLOSE, THINK_OPEN};
use crate::llm::types::{Message, UsageCounts};

/// Read one line, trimmed; `None` at end of stream
pub(crate) fn read_trimmed_line<R: BufRead>(reader: &mut R) -> Result<Option<String>, AdapterError> {
    let mut line = String::new();
    let bytes_read = reader.read_line(&mut line)?;
    if bytes_read == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// Text of an in-band `error` field, if the payload carries one
pub(crate) fn payload_error(json: &JsonValue) -> Option<String> {
    match json.get("error")? {
        JsonValue::Null => None,
        JsonValue::Bool(false) => None,
        JsonValue::String(s) if s.is_empty() => None,
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Object(obj) => Some(match obj.get("message").and_then(|m| m.as_str()) {
            Some(message) => message.to_string(),
            None => JsonValue::Object(obj.clone()).to_string(),
        }),
        other => Some(other.to_string()),
    }
}

/// Usage from a final Ollama chunk (`prompt_eval_count` + `eval_count`)
///
/// Returns None when both counters are zero or missing.
pub fn parse_ollama_usage(json: &JsonValue) -> Option<UsageCounts> {
    let prompt = json
        .get("prompt_eval_count")
        .and_then(|v| v.as_u64())
        .unwrap_or(0);
    let completion = json.get("eval_count").and_then(|v| v.as_u64()).unwrap_or(0);
    let usage = UsageCounts::new(prompt, completion);
    if usage.total == 0 {
        None
    } else {
        Some(usage)
    }
}

/// Flatten a conversation into a completion-style prompt
///
/// ```text
/// System: ...
///
/// User: ...
///
/// Assistant:
/// ```
pub fn messages_to_prompt(messages: &[Message]) -> String {
    let mut parts: Vec<String> = messages
        .iter()
        .filter(|m| !m.content.is_empty())
        .map(|m| format!("{}: {}", m.role.prompt_label(), m.content))
        .collect();
    parts.push("Assistant:".to_string());
    parts.join("\n\n")
}

/// Decoder for `/api/chat` NDJSON streams
///
/// Dedicated `message.thinking` text is bracketed with synthesized think
/// markers so the assembled reply keeps them.
pub struct NdjsonDecoder<R: BufRead> {
    reader: R,
    pending: VecDeque<StreamEvent>,
    in_thinking: bool,
    finished: bool,
}

impl<R: BufRead> NdjsonDecoder<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            pending: VecDeque::new(),
            in_thinking: false,
            finished: false,
        }
    }

    fn close_thinking(&mut self) {
        if self.in_thinking {
            self.pending
                .push_back(StreamEvent::ThinkingDelta(format!("{}\n", THINK_CLOSE)));
            self.in_thinking = false;
        }
    }

    fn finish(&mut self, usage: Option<UsageCounts>) {
        self.close_thinking();
        if let Some(usage) = usage {
            self.pending.push_back(StreamEvent::UsageFinal(usage));
        }
        self.pending.push_back(StreamEvent::Done);
        self.finished = true;
    }

    fn handle_line(&mut self, line: &str) {
        let json: JsonValue = match serde_json::from_str(line) {
            Ok(json) => json,
            Err(e) => {
                tracing::debug!(event = "stream_skip", reason = %e, line);
                return;
            }
        };

        if let Some(message) = payload_error(&json) {
            self.pending.push_back(StreamEvent::ErrorEvent(message));
            self.finished = true;
            return;
        }

        let message = json.get("message");
        let text_field = |key: &str| {
            message
                .and_then(|m| m.get(key))
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string()
        };
        let thinking = text_field("thinking");
        let content = text_field("content");

        if !thinking.is_empty() {
            if !self.in_thinking {
                self.pending
                    .push_back(StreamEvent::ThinkingDelta(THINK_OPEN.to_string()));
                self.in_thinking = true;
            }
            self.pending.push_back(StreamEvent::ThinkingDelta(thinking));
        } else {
            self.close_thinking();
        }

        if let Some(calls) = message
            .and_then(|m| m.get("tool_calls"))
            .and_then(|c| c.as_array())
        {
            for call in calls {
                let function = call.get("function").unwrap_or(call);
                let name = function.get("name").and_then(|n| n.as_str()).unwrap_or("");
                let arguments = function.get("arguments").cloned().unwrap_or(JsonValue::Null);
                if name.is_empty() || arguments.is_null() {
                    continue;
                }
                self.pending.push_back(StreamEvent::ToolCallDelta {
                    name: name.to_string(),
                    args: normalize_tool_args(arguments),
                });
            }
        }

        if !content.is_empty() {
            self.pending.push_back(StreamEvent::ContentDelta(content));
        }

        if json.get("done").and_then(|d| d.as_bool()) == Some(true) {
            self.finish(parse_ollama_usage(&json));
        }
    }
}

impl<R: BufRead> Iterator for NdjsonDecoder<R> {
    type Item = Result<StreamEvent, AdapterError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Some(Ok(event));
            }
            if self.finished {
                return None;
            }
            match read_trimmed_line(&mut self.reader) {
                Ok(Some(line)) if line.is_empty() => continue,
                Ok(Some(line)) => self.handle_line(&line),
                // stream closed without a done marker
                Ok(None) => self.finish(None),
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

/// Decoder for the `/api/generate` fallback
///
/// Plain content only: the `response` field becomes ContentDelta.
pub struct GenerateDecoder<R: BufRead> {
    reader: R,
    pending: VecDeque<StreamEvent>,
    finished: bool,
}

impl<R: BufRead> GenerateDecoder<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            pending: VecDeque::new(),
            finished: false,
        }
    }

    fn handle_line(&mut self, line: &str) {
        let json: JsonValue = match serde_json::from_str(line) {
            Ok(json) => json,
            Err(e) => {
                tracing::debug!(event = "stream_skip", reason = %e, line);
                return;
            }
        };

        if let Some(message) = payload_error(&json) {
            self.pending.push_back(StreamEvent::ErrorEvent(message));
            self.finished = true;
            return;
        }

        if let Some(chunk) = json.get("response").and_then(|r| r.as_str()) {
            if !chunk.is_empty() {
                self.pending
                    .push_back(StreamEvent::ContentDelta(chunk.to_string()));
            }
        }

        if json.get("done").and_then(|d| d.as_bool()) == Some(true) {
            if let Some(usage) = parse_ollama_usage(&json) {
                self.pending.push_back(StreamEvent::UsageFinal(usage));
            }
            self.pending.push_back(StreamEvent::Done);
            self.finished = true;
        }
    }
}

impl<R: BufRead> Iterator for GenerateDecoder<R> {
    type Item = Result<StreamEvent, AdapterError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Some(Ok(event));
            }
            if self.finished {
                return None;
            }
            match read_trimmed_line(&mut self.reader) {
                Ok(Some(line)) if line.is_empty() => continue,
                Ok(Some(line)) => self.handle_line(&line),
                Ok(None) => {
                    self.pending.push_back(StreamEvent::Done);
                    self.finished = true;
                }
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

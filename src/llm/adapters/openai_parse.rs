//! OpenAI response parsing
//!
//! SSE decoder for `/chat/completions` streams (OpenAI, Mistral and other
//! compatible backends).

use std::collections::{BTreeMap, VecDeque};
use std::io::BufRead;

use serde_json::{Map, Value as JsonValue};

use crate::llm::adapters::ollama_parse::{payload_error, read_trimmed_line};
use crate::llm::adapters::AdapterError;
use crate::llm::stream_events::{normalize_tool_args, StreamEvent};
use crate::llm::types::UsageCounts;

/// Tool call assembled from streamed fragments
#[derive(Debug, Default)]
struct PendingToolCall {
    name: String,
    arguments: String,
}

/// Parse a top-level `usage` object
///
/// Missing `total_tokens` is derived from the other two counters.
pub fn parse_completions_usage(json: &JsonValue) -> Option<UsageCounts> {
    let usage = json.get("usage")?.as_object()?;
    let field = |key: &str| usage.get(key).and_then(|v| v.as_u64());
    let prompt = field("prompt_tokens");
    let completion = field("completion_tokens");
    let total = field("total_tokens");
    if prompt.is_none() && completion.is_none() && total.is_none() {
        return None;
    }
    let mut counts = UsageCounts::new(prompt.unwrap_or(0), completion.unwrap_or(0));
    if let Some(total) = total {
        counts.total = total;
    }
    Some(counts)
}

/// Decoder for SSE chat-completion streams
///
/// Tool-call fragments are keyed by their `index` and emitted once the
/// stream ends, followed by the last usage seen and `Done`.
pub struct SseDecoder<R: BufRead> {
    reader: R,
    pending: VecDeque<StreamEvent>,
    tool_calls: BTreeMap<u64, PendingToolCall>,
    usage: Option<UsageCounts>,
    finished: bool,
}

impl<R: BufRead> SseDecoder<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            pending: VecDeque::new(),
            tool_calls: BTreeMap::new(),
            usage: None,
            finished: false,
        }
    }

    fn finish(&mut self) {
        for (_, call) in std::mem::take(&mut self.tool_calls) {
            if call.name.is_empty() {
                continue;
            }
            let args = if call.arguments.trim().is_empty() {
                Map::new()
            } else {
                normalize_tool_args(JsonValue::String(call.arguments))
            };
            self.pending.push_back(StreamEvent::ToolCallDelta {
                name: call.name,
                args,
            });
        }
        if let Some(usage) = self.usage.take() {
            self.pending.push_back(StreamEvent::UsageFinal(usage));
        }
        self.pending.push_back(StreamEvent::Done);
        self.finished = true;
    }

    fn handle_line(&mut self, line: &str) {
        let data = line.strip_prefix("data:").map(str::trim_start).unwrap_or(line);
        if data == "[DONE]" {
            self.finish();
            return;
        }

        let json: JsonValue = match serde_json::from_str(data) {
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

        if let Some(usage) = parse_completions_usage(&json) {
            self.usage = Some(usage);
        }

        let choices = json
            .get("choices")
            .and_then(|c| c.as_array())
            .map(|c| c.as_slice())
            .unwrap_or(&[]);
        for choice in choices {
            let Some(delta) = choice.get("delta") else {
                continue;
            };
            if let Some(text) = delta.get("content").and_then(|c| c.as_str()) {
                if !text.is_empty() {
                    self.pending
                        .push_back(StreamEvent::ContentDelta(text.to_string()));
                }
            }
            if let Some(calls) = delta.get("tool_calls").and_then(|c| c.as_array()) {
                for (position, call) in calls.iter().enumerate() {
                    self.accumulate_tool_call(position as u64, call);
                }
            }
        }
    }

    fn accumulate_tool_call(&mut self, position: u64, call: &JsonValue) {
        let index = call
            .get("index")
            .and_then(|i| i.as_u64())
            .unwrap_or(position);
        let entry = self.tool_calls.entry(index).or_default();
        let Some(function) = call.get("function") else {
            return;
        };
        if let Some(name) = function.get("name").and_then(|n| n.as_str()) {
            entry.name.push_str(name);
        }
        match function.get("arguments") {
            Some(JsonValue::String(fragment)) => entry.arguments.push_str(fragment),
            Some(JsonValue::Null) | None => {}
            Some(other) => entry.arguments.push_str(&other.to_string()),
        }
    }
}

impl<R: BufRead> Iterator for SseDecoder<R> {
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
                Ok(None) => self.finish(),
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

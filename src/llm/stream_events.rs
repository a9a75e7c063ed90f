//! Normalized streaming events
//!
//! Every backend decoder produces the same event sequence regardless of
//! its wire protocol. ContentDelta and ThinkingDelta segments concatenate
//! to the full assistant text.

use serde_json::{Map, Value as JsonValue};

use crate::llm::types::UsageCounts;

/// Tool argument mapping (document order preserved)
pub type ToolArgs = Map<String, JsonValue>;

/// One decoded unit of a streamed model response
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// User-facing answer text
    ContentDelta(String),
    /// Intermediate reasoning text (think segment, markers included)
    ThinkingDelta(String),
    /// Backend-native tool call
    ToolCallDelta { name: String, args: ToolArgs },
    /// Final usage counters, emitted right before `Done`
    UsageFinal(UsageCounts),
    /// Backend-reported error; terminal for the stream
    ErrorEvent(String),
    /// End of stream
    Done,
}

impl StreamEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Done | StreamEvent::ErrorEvent(_))
    }
}

/// Normalize native tool-call arguments into a mapping
///
/// - object: used as-is
/// - string: parsed as JSON; a non-object or unparseable string is kept
///   under a single `raw` key
/// - anything else: wrapped under a `value` key
pub fn normalize_tool_args(arguments: JsonValue) -> ToolArgs {
    match arguments {
        JsonValue::Object(map) => map,
        JsonValue::String(raw) => match serde_json::from_str::<JsonValue>(&raw) {
            Ok(JsonValue::Object(map)) => map,
            _ => {
                let mut map = Map::new();
                map.insert("raw".to_string(), JsonValue::String(raw));
                map
            }
        },
        other => {
            let mut map = Map::new();
            map.insert("value".to_string(), other);
            map
        }
    }
}

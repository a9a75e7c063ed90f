//! Stream event handling
//!
//! Folds the events of one model response into a [`Reply`]: the full
//! assistant text (think segments included), native tool calls, final
//! usage, and the terminal error if the backend reported one.

use crate::llm::stream_events::StreamEvent;
use crate::llm::tool_call::{extract_tool_calls, ToolCall};
use crate::llm::types::UsageCounts;

/// Assembled model response
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reply {
    /// Concatenated content and thinking deltas, untrimmed
    pub text: String,
    /// Calls delivered by the backend's native mechanism
    pub native_calls: Vec<ToolCall>,
    pub usage: Option<UsageCounts>,
    /// In-band backend error; the response is unusable when set
    pub error: Option<String>,
    /// Whether a `Done` marker was seen
    pub done: bool,
}

impl Reply {
    /// Feed one event; returns false once the stream is finished
    pub fn absorb(&mut self, event: StreamEvent) -> bool {
        match event {
            StreamEvent::ContentDelta(text) | StreamEvent::ThinkingDelta(text) => {
                self.text.push_str(&text);
            }
            StreamEvent::ToolCallDelta { name, args } => {
                self.native_calls.push(ToolCall::new(name, args));
            }
            StreamEvent::UsageFinal(usage) => self.usage = Some(usage),
            StreamEvent::ErrorEvent(message) => {
                self.error = Some(message);
                return false;
            }
            StreamEvent::Done => {
                self.done = true;
                return false;
            }
        }
        true
    }

    /// Neither text nor native calls
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty() && self.native_calls.is_empty()
    }

    /// Content to store as the assistant message
    ///
    /// Native calls are rendered as markup after the text so a reloaded
    /// session still shows (and re-extracts) them.
    pub fn stored_content(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        let text = self.text.trim();
        if !text.is_empty() {
            parts.push(text.to_string());
        }
        parts.extend(self.native_calls.iter().map(ToolCall::render));
        parts.join("\n")
    }

    /// Calls to act on: native ones when present, else those in the text
    pub fn tool_calls(&self) -> Vec<ToolCall> {
        if !self.native_calls.is_empty() {
            return self.native_calls.clone();
        }
        extract_tool_calls(&self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};

    fn args(value: serde_json::Value) -> Map<String, serde_json::Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_absorb_concatenates_text_and_thinking() {
        let mut reply = Reply::default();
        assert!(reply.absorb(StreamEvent::ThinkingDelta("<think>plan</think>\n".into())));
        assert!(reply.absorb(StreamEvent::ContentDelta("answer".into())));
        assert!(reply.absorb(StreamEvent::UsageFinal(UsageCounts::new(1, 2))));
        assert!(!reply.absorb(StreamEvent::Done));
        assert_eq!(reply.text, "<think>plan</think>\nanswer");
        assert_eq!(reply.usage, Some(UsageCounts::new(1, 2)));
        assert!(reply.done);
    }

    #[test]
    fn test_error_event_stops() {
        let mut reply = Reply::default();
        assert!(!reply.absorb(StreamEvent::ErrorEvent("boom".into())));
        assert_eq!(reply.error.as_deref(), Some("boom"));
        assert!(!reply.done);
    }

    #[test]
    fn test_whitespace_only_is_empty() {
        let mut reply = Reply::default();
        reply.absorb(StreamEvent::ContentDelta(" \n ".into()));
        assert!(reply.is_empty());
    }

    #[test]
    fn test_native_calls_win_over_text() {
        let mut reply = Reply::default();
        reply.absorb(StreamEvent::ContentDelta(
            "<tool name=\"bc\">{\"expression\": \"1\"}</tool>".into(),
        ));
        reply.absorb(StreamEvent::ToolCallDelta {
            name: "run_shell".into(),
            args: args(json!({"command": "ls"})),
        });
        let calls = reply.tool_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].name, "run_shell");
    }

    #[test]
    fn test_stored_content_renders_native_calls() {
        let mut reply = Reply::default();
        reply.absorb(StreamEvent::ToolCallDelta {
            name: "run_shell".into(),
            args: args(json!({"command": "ls"})),
        });
        assert!(!reply.is_empty());
        let stored = reply.stored_content();
        assert_eq!(stored, "<tool name=\"run_shell\">\n{\"command\":\"ls\"}\n</tool>");
        assert_eq!(extract_tool_calls(&stored), reply.native_calls);
    }

    #[test]
    fn test_stored_content_trims_text() {
        let mut reply = Reply::default();
        reply.absorb(StreamEvent::ContentDelta("\n Here are your files. \n".into()));
        assert_eq!(reply.stored_content(), "Here are your files.");
    }
}

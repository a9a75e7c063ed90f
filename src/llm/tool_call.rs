//! Tool-call markup parser
//!
//! Extracts tool invocations embedded in assistant text:
//!
//! ```text
//! <tool name="run_shell">
//! {"command": "ls"}
//! </tool>
//! ```
//!
//! Hand-written scanner: tag prefix, name, balanced JSON object body,
//! closing tag. No regular expression, no backtracking. A body that is not
//! a valid JSON object still yields a call, flagged as malformed.

use serde_json::{Map, Value as JsonValue};

use crate::llm::stream_events::ToolArgs;

const TAG_OPEN: &str = "<tool name=\"";
const TAG_OPEN_END: &str = "\">";
const TAG_CLOSE: &str = "</tool>";

/// Tool call extracted from a model response
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    /// Tool name (e.g., "run_shell", "file_read")
    pub name: String,
    /// Arguments in document order
    pub arguments: ToolArgs,
    /// Parse failure detail when the body was not a JSON object
    pub malformed: Option<String>,
}

impl ToolCall {
    pub fn new(name: impl Into<String>, arguments: ToolArgs) -> Self {
        Self {
            name: name.into(),
            arguments,
            malformed: None,
        }
    }

    /// Call whose body failed to parse
    ///
    /// Carries a synthetic `{"error": ...}` argument mapping.
    pub fn malformed(name: impl Into<String>, detail: impl Into<String>) -> Self {
        let detail = detail.into();
        let mut arguments = Map::new();
        arguments.insert(
            "error".to_string(),
            JsonValue::String(format!("Invalid JSON arguments: {}", detail)),
        );
        Self {
            name: name.into(),
            arguments,
            malformed: Some(detail),
        }
    }

    pub fn is_malformed(&self) -> bool {
        self.malformed.is_some()
    }

    /// Arguments as compact JSON
    pub fn arguments_json(&self) -> String {
        JsonValue::Object(self.arguments.clone()).to_string()
    }

    /// Render back into the markup the extractor recognizes
    pub fn render(&self) -> String {
        format_tool_invocation(&self.name, &self.arguments)
    }
}

/// Extract every tool call from `text`, left to right, non-overlapping
///
/// Zero calls means the response is a final answer.
pub fn extract_tool_calls(text: &str) -> Vec<ToolCall> {
    let mut calls = Vec::new();
    let mut cursor = 0;
    // every complete tag ends with a closing tag at or before this offset
    let Some(last_close) = text.rfind(TAG_CLOSE) else {
        return calls;
    };

    while let Some(rel) = text[cursor..].find(TAG_OPEN) {
        let tag_start = cursor + rel;
        if tag_start > last_close {
            break;
        }
        match parse_tag_at(text, tag_start) {
            Some((call, end)) => {
                calls.push(call);
                cursor = end;
            }
            None => cursor = tag_start + TAG_OPEN.len(),
        }
    }

    calls
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'-'
}

/// Tool names are non-empty runs of `[A-Za-z0-9_-]`
pub fn is_valid_tool_name(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(is_name_byte)
}

/// Check if text contains tool-call markup
pub fn has_tool_call(text: &str) -> bool {
    !extract_tool_calls(text).is_empty()
}

/// Parse one tag starting at `start`
///
/// Returns the call and the byte offset just past `</tool>`, or None if
/// the text at `start` is not a complete tag.
fn parse_tag_at(text: &str, start: usize) -> Option<(ToolCall, usize)> {
    let mut pos = start + TAG_OPEN.len();

    let name_len = text[pos..]
        .bytes()
        .take_while(|b| is_name_byte(*b))
        .count();
    if name_len == 0 {
        return None;
    }
    let name = &text[pos..pos + name_len];
    pos += name_len;

    if !text[pos..].starts_with(TAG_OPEN_END) {
        return None;
    }
    pos += TAG_OPEN_END.len();

    let body_start = pos + leading_whitespace_len(&text[pos..]);
    if !text[body_start..].starts_with('{') {
        return None;
    }

    // Well-formed path: balanced object, optional whitespace, closing tag
    if let Some(body_len) = scan_json_object(&text[body_start..]) {
        let body_end = body_start + body_len;
        let close_at = body_end + leading_whitespace_len(&text[body_end..]);
        if text[close_at..].starts_with(TAG_CLOSE) {
            let call = parse_body(name, &text[body_start..body_end]);
            return Some((call, close_at + TAG_CLOSE.len()));
        }
    }

    // Unbalanced body or trailing junk: the body runs to the next closing tag
    let rel_close = text[body_start..].find(TAG_CLOSE)?;
    let body = text[body_start..body_start + rel_close].trim_end();
    let call = parse_body(name, body);
    Some((call, body_start + rel_close + TAG_CLOSE.len()))
}

fn parse_body(name: &str, body: &str) -> ToolCall {
    match serde_json::from_str::<JsonValue>(body) {
        Ok(JsonValue::Object(arguments)) => ToolCall::new(name, arguments),
        Ok(_) => ToolCall::malformed(name, "arguments must be a JSON object"),
        Err(e) => ToolCall::malformed(name, e.to_string()),
    }
}

fn leading_whitespace_len(text: &str) -> usize {
    text.len() - text.trim_start().len()
}

/// Length in bytes of the JSON object at the start of `text`
///
/// Tracks nesting depth outside string literals, honoring escapes.
/// Returns None when the object never closes, and stops early at a `<`
/// outside a string or a raw control character inside one, since neither
/// can occur in valid JSON.
fn scan_json_object(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, ch) in text.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            } else if ch.is_control() {
                return None;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '<' => return None,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(idx + 1);
                }
            }
            _ => {}
        }
    }

    None
}

/// Format tool result for context injection
///
/// ```text
/// <tool_result name="run_shell">
/// exit code 0
/// </tool_result>
/// ```
pub fn format_tool_result(name: &str, result: &str) -> String {
    format!("<tool_result name=\"{}\">\n{}\n</tool_result>", name, result)
}

/// Render a tool invocation as markup
pub fn format_tool_invocation(name: &str, arguments: &ToolArgs) -> String {
    let payload = JsonValue::Object(arguments.clone()).to_string();
    format!("<tool name=\"{}\">\n{}\n</tool>", name, payload)
}

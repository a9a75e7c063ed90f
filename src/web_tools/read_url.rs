//! read_url: fetch a web page as Markdown text

use std::time::Duration;

use crate::execution_engine::{required_str, Tool, ToolContext, ToolError};
use crate::llm::stream_events::ToolArgs;
use crate::web_tools::html::html_to_text;

const FETCH_TIMEOUT: Duration = Duration::from_secs(20);

/// Render a response body according to its content type
///
/// HTML (or an unknown type) is converted to Markdown; anything else is
/// returned trimmed.
pub fn render_body(content_type: Option<&str>, body: &str) -> String {
    let is_html = content_type
        .map(|ct| ct.is_empty() || ct.to_lowercase().contains("html"))
        .unwrap_or(true);
    if is_html {
        html_to_text(body)
    } else {
        body.trim().to_string()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReadUrlTool;

impl Tool for ReadUrlTool {
    fn name(&self) -> &str {
        "read_url"
    }

    fn description(&self) -> &str {
        "Fetch the text content of a webpage and return a trimmed plain-text summary."
    }

    fn schema(&self) -> &str {
        r#"{"url": "https://example.com"}"#
    }

    fn execute(&self, args: &ToolArgs, _ctx: &ToolContext) -> Result<String, ToolError> {
        let url = required_str(args, "url")?;
        let response = ureq::get(url)
            .timeout(FETCH_TIMEOUT)
            .call()
            .map_err(|e| ToolError::Http(format!("failed to fetch URL: {}", e)))?;
        let content_type = response.header("content-type").map(str::to_string);
        let body = response
            .into_string()
            .map_err(|e| ToolError::Http(format!("failed to read response: {}", e)))?;
        Ok(render_body(content_type.as_deref(), &body))
    }
}

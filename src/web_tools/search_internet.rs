//! search_internet: DuckDuckGo HTML results or Google Custom Search

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use serde_json::Value as JsonValue;

use crate::execution_engine::{required_str, Tool, ToolContext, ToolError};
use crate::llm::stream_events::ToolArgs;
use crate::web_tools::html::{decode_entities, fragment_text};

const SEARCH_TIMEOUT: Duration = Duration::from_secs(20);
const MAX_RESULTS: usize = 10;
const DUCKDUCKGO_URL: &str = "https://html.duckduckgo.com/html/";
const GOOGLE_URL: &str = "https://www.googleapis.com/customsearch/v1";
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) clia";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchProvider {
    #[default]
    DuckDuckGo,
    Google,
}

impl SearchProvider {
    pub fn label(&self) -> &'static str {
        match self {
            SearchProvider::DuckDuckGo => "DuckDuckGo",
            SearchProvider::Google => "Google",
        }
    }
}

impl fmt::Display for SearchProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SearchProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "duckduckgo" | "ddg" => Ok(SearchProvider::DuckDuckGo),
            "google" => Ok(SearchProvider::Google),
            other => Err(format!("unknown search provider '{}'", other)),
        }
    }
}

/// Search backend settings
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchConfig {
    pub provider: SearchProvider,
    pub google_api_key: Option<String>,
    pub google_engine_id: Option<String>,
}

/// One search result
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub title: String,
    pub snippet: String,
    pub url: String,
}

impl SearchHit {
    fn render(&self) -> String {
        let title = if self.title.is_empty() {
            "(untitled)"
        } else {
            &self.title
        };
        let mut entry = format!("- {}", title);
        if !self.snippet.is_empty() {
            entry.push_str(" — ");
            entry.push_str(&self.snippet);
        }
        if !self.url.is_empty() {
            entry.push_str(&format!(" ({})", self.url));
        }
        entry
    }
}

/// Result list for the model
pub fn format_hits(hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return "No search results found.".to_string();
    }
    let lines: Vec<String> = hits.iter().take(MAX_RESULTS).map(SearchHit::render).collect();
    format!("Search results:\n{}", lines.join("\n"))
}

fn ddg_result_regex() -> &'static Regex {
    static CACHED: OnceLock<Regex> = OnceLock::new();
    CACHED.get_or_init(|| {
        Regex::new(r#"(?is)<a\b[^>]*class="result__a"[^>]*href="([^"]*)"[^>]*>(.*?)</a>"#)
            .expect("result regex must compile")
    })
}

fn ddg_snippet_regex() -> &'static Regex {
    static CACHED: OnceLock<Regex> = OnceLock::new();
    CACHED.get_or_init(|| {
        Regex::new(r#"(?is)<(?:a|div|td)\b[^>]*class="result__snippet"[^>]*>(.*?)</(?:a|div|td)>"#)
            .expect("snippet regex must compile")
    })
}

/// Unwrap DuckDuckGo's `/l/?uddg=<encoded>` redirect links
pub fn decode_ddg_link(href: &str) -> String {
    let href = decode_entities(href);
    if let Some(start) = href.find("uddg=") {
        let encoded = &href[start + "uddg=".len()..];
        let encoded = encoded.split('&').next().unwrap_or(encoded);
        if let Ok(decoded) = urlencoding::decode(encoded) {
            return decoded.into_owned();
        }
    }
    if let Some(rest) = href.strip_prefix("//") {
        return format!("https://{}", rest);
    }
    href
}

/// Parse the DuckDuckGo HTML results page
pub fn parse_duckduckgo_html(html: &str) -> Vec<SearchHit> {
    let snippets: Vec<String> = ddg_snippet_regex()
        .captures_iter(html)
        .filter_map(|caps| caps.get(1).map(|m| fragment_text(m.as_str())))
        .collect();

    ddg_result_regex()
        .captures_iter(html)
        .enumerate()
        .filter_map(|(idx, caps)| {
            let url = decode_ddg_link(caps.get(1)?.as_str());
            let title = fragment_text(caps.get(2)?.as_str());
            Some(SearchHit {
                title,
                snippet: snippets.get(idx).cloned().unwrap_or_default(),
                url,
            })
        })
        .take(MAX_RESULTS)
        .collect()
}

/// Parse a Google Custom Search JSON response
pub fn parse_google_json(json: &JsonValue) -> Vec<SearchHit> {
    let items = json
        .get("items")
        .and_then(|i| i.as_array())
        .map(|i| i.as_slice())
        .unwrap_or(&[]);
    let field = |item: &JsonValue, key: &str| {
        item.get(key)
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .trim()
            .to_string()
    };
    items
        .iter()
        .take(MAX_RESULTS)
        .map(|item| SearchHit {
            title: field(item, "title"),
            snippet: field(item, "snippet"),
            url: field(item, "link"),
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct SearchInternetTool {
    config: SearchConfig,
    description: String,
}

impl SearchInternetTool {
    pub fn new(config: SearchConfig) -> Self {
        let description = format!(
            "Run an internet search using {} and return matching snippets.",
            config.provider
        );
        Self {
            config,
            description,
        }
    }

    fn search_duckduckgo(&self, query: &str) -> Result<Vec<SearchHit>, ToolError> {
        let html = ureq::post(DUCKDUCKGO_URL)
            .timeout(SEARCH_TIMEOUT)
            .set("User-Agent", USER_AGENT)
            .send_form(&[("q", query)])
            .map_err(|e| ToolError::Http(format!("DuckDuckGo search failed: {}", e)))?
            .into_string()
            .map_err(|e| ToolError::Http(format!("DuckDuckGo search failed: {}", e)))?;
        Ok(parse_duckduckgo_html(&html))
    }

    fn search_google(&self, query: &str) -> Result<Vec<SearchHit>, ToolError> {
        let (Some(key), Some(engine)) = (
            self.config.google_api_key.as_deref(),
            self.config.google_engine_id.as_deref(),
        ) else {
            return Err(ToolError::InvalidArguments(
                "Google search requires google_api_key and google_engine_id in the config file"
                    .to_string(),
            ));
        };
        let body = ureq::get(GOOGLE_URL)
            .timeout(SEARCH_TIMEOUT)
            .query("key", key)
            .query("cx", engine)
            .query("q", query)
            .query("num", &MAX_RESULTS.to_string())
            .call()
            .map_err(|e| ToolError::Http(format!("Google search request failed: {}", e)))?
            .into_string()
            .map_err(|e| ToolError::Http(format!("Google search request failed: {}", e)))?;
        let json: JsonValue = serde_json::from_str(&body)?;
        Ok(parse_google_json(&json))
    }
}

impl Tool for SearchInternetTool {
    fn name(&self) -> &str {
        "search_internet"
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn schema(&self) -> &str {
        r#"{"query": "open source llm agents"}"#
    }

    fn execute(&self, args: &ToolArgs, _ctx: &ToolContext) -> Result<String, ToolError> {
        let query = required_str(args, "query")?;
        let hits = match self.config.provider {
            SearchProvider::DuckDuckGo => self.search_duckduckgo(query)?,
            SearchProvider::Google => self.search_google(query)?,
        };
        Ok(format_hits(&hits))
    }
}

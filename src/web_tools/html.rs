//! HTML to text conversion
//!
//! Pages go through htmd and come out as Markdown, links inlined as
//! `[label](href)`. Search snippets only need their tags stripped, which
//! the regex helpers below do.

use std::sync::OnceLock;

use regex::Regex;

fn tag_regex() -> &'static Regex {
    static CACHED: OnceLock<Regex> = OnceLock::new();
    CACHED.get_or_init(|| Regex::new(r"(?s)<[^>]*>").expect("tag regex must compile"))
}

fn whitespace_regex() -> &'static Regex {
    static CACHED: OnceLock<Regex> = OnceLock::new();
    CACHED.get_or_init(|| Regex::new(r"\s+").expect("whitespace regex must compile"))
}

/// Decode the handful of entities that matter for readability
pub fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&amp;", "&")
}

/// Strip tags from a fragment and collapse whitespace
pub fn fragment_text(fragment: &str) -> String {
    let without_tags = tag_regex().replace_all(fragment, " ");
    let decoded = decode_entities(&without_tags);
    whitespace_regex()
        .replace_all(&decoded, " ")
        .trim()
        .to_string()
}

fn blank_run_regex() -> &'static Regex {
    static CACHED: OnceLock<Regex> = OnceLock::new();
    CACHED.get_or_init(|| Regex::new(r"\n[ \t]*(\n[ \t]*)+\n").expect("blank run regex must compile"))
}

/// Readable Markdown of a page, without scripts or styles
///
/// Falls back to bare tag stripping if htmd rejects the document.
pub fn html_to_text(html: &str) -> String {
    let options = htmd::options::Options {
        heading_style: htmd::options::HeadingStyle::Atx,
        code_block_style: htmd::options::CodeBlockStyle::Fenced,
        link_style: htmd::options::LinkStyle::Inlined,
        ..Default::default()
    };
    let converter = htmd::HtmlToMarkdown::builder()
        .skip_tags(vec!["head", "script", "style", "noscript", "iframe", "svg"])
        .options(options)
        .build();
    match converter.convert(html) {
        Ok(markdown) => blank_run_regex()
            .replace_all(&markdown, "\n\n")
            .trim()
            .to_string(),
        Err(e) => {
            tracing::debug!(event = "html_convert_failed", error = %e);
            fragment_text(html)
        }
    }
}

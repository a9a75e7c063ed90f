//! Shared adapter error and transport seam
//!
//! HTTP failures surface before the first event; in-band backend errors
//! become [`AdapterError::Provider`] once the stream ends on them.

use std::io::BufRead;

use serde_json::Value as JsonValue;

#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    /// Connection refused, DNS failure, timeout
    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP error {status}: {message}")]
    Http { status: u16, message: String },

    /// 401 or 403
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// 429; `retry_after` is empty or starts with ": "
    #[error("Rate limited{retry_after}")]
    RateLimited { retry_after: String },

    /// Error payload delivered inside the stream
    #[error("{0}")]
    Provider(String),

    /// Unknown provider, missing key
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("JSON error: {0}")]
    Json(String),
}

impl AdapterError {
    /// Map a non-2xx status and its body to an error
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = extract_error_message(body);
        match status {
            401 | 403 => AdapterError::Authentication(message),
            429 => AdapterError::RateLimited {
                retry_after: if message.is_empty() {
                    String::new()
                } else {
                    format!(": {}", message)
                },
            },
            _ => AdapterError::Http { status, message },
        }
    }
}

impl From<std::io::Error> for AdapterError {
    fn from(err: std::io::Error) -> Self {
        AdapterError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for AdapterError {
    fn from(err: serde_json::Error) -> Self {
        AdapterError::Json(err.to_string())
    }
}

impl From<ureq::Error> for AdapterError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(code, response) => {
                let body = response.into_string().unwrap_or_default();
                AdapterError::from_status(code, &body)
            }
            ureq::Error::Transport(err) => AdapterError::Network(err.to_string()),
        }
    }
}

/// Reduce an error body to its message
///
/// JSON bodies with a string `error` field (or an object carrying
/// `error.message`) yield that text; anything else is returned trimmed.
pub fn extract_error_message(body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<JsonValue>(body) {
        match json.get("error") {
            Some(JsonValue::String(s)) => return s.clone(),
            Some(JsonValue::Object(obj)) => {
                if let Some(JsonValue::String(s)) = obj.get("message") {
                    return s.clone();
                }
            }
            _ => {}
        }
    }
    body.trim().to_string()
}

/// Streaming response body, read line by line by the decoders
pub type StreamBody = Box<dyn BufRead + Send>;

/// Blocking POST that yields the streamed body
pub trait SyncTransport: Send + Sync {
    /// POST JSON request and hand back the response body as a line reader
    ///
    /// Non-2xx statuses are returned as errors carrying the extracted
    /// error message.
    fn post_stream(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &str,
    ) -> Result<StreamBody, AdapterError>;
}

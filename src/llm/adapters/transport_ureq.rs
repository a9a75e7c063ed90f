//! ureq-backed transport
//!
//! Blocks the calling thread; the body is read lazily by the decoders so
//! output streams as the backend produces it.
//!
//! The timeout bounds connecting and each individual read, never the whole
//! response: a generation that keeps streaming may run for as long as it
//! keeps producing bytes, while a backend that goes silent fails after one
//! timeout period.

use std::io::BufReader;
use std::time::Duration;

use crate::llm::adapters::transport_types::{AdapterError, StreamBody, SyncTransport};

/// Connect and per-read timeout when none is configured
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

#[derive(Debug)]
pub struct UreqTransport {
    timeout: u64,
}

impl UreqTransport {
    pub fn new() -> Self {
        Self { timeout: DEFAULT_TIMEOUT_SECS }
    }

    pub fn with_timeout(timeout_secs: u64) -> Self {
        Self {
            timeout: timeout_secs,
        }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncTransport for UreqTransport {
    fn post_stream(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &str,
    ) -> Result<StreamBody, AdapterError> {
        tracing::debug!(
            event = "http_request",
            url,
            timeout = self.timeout,
            body_len = body.len()
        );
        let timeout = Duration::from_secs(self.timeout);
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(timeout)
            .timeout_read(timeout)
            .build();
        let mut request = agent.post(url).set("Content-Type", "application/json");

        for (key, value) in headers {
            request = request.set(key, value);
        }

        // ureq reports every status >= 400 as Error::Status
        let response = request.send_string(body).map_err(|err| {
            let err = AdapterError::from(err);
            tracing::debug!(event = "http_error", url, error = %err);
            err
        })?;
        tracing::debug!(event = "http_response", url, status = response.status());

        Ok(Box::new(BufReader::new(response.into_reader())))
    }
}

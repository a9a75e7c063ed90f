//! Fake transport for testing
//!
//! Replays scripted responses instead of making HTTP calls and records
//! every request it receives.

use std::collections::VecDeque;
use std::io::Cursor;
use std::sync::Mutex;

use crate::llm::adapters::transport_types::{AdapterError, StreamBody, SyncTransport};

/// One scripted reply
#[derive(Debug, Clone)]
pub enum FakeResponse {
    /// 2xx response with this body
    Stream(String),
    /// Non-2xx response with status and body
    Status(u16, String),
    /// Connection-level failure
    NetworkError(String),
}

/// Request captured by [`FakeTransport`]
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub url: String,
    pub body: String,
}

/// Fake transport for testing (uses fixture strings)
///
/// Responses are consumed in order. Once the script runs dry every call
/// fails with a network error.
#[derive(Debug, Default)]
pub struct FakeTransport {
    responses: Mutex<VecDeque<FakeResponse>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl FakeTransport {
    /// Create fake transport with the given scripted replies
    pub fn new(responses: Vec<FakeResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Create fake transport answering once with a streaming body
    pub fn with_stream(stream: &str) -> Self {
        Self::new(vec![FakeResponse::Stream(stream.to_string())])
    }

    /// Create fake transport that returns a network error
    pub fn with_error(msg: &str) -> Self {
        Self::new(vec![FakeResponse::NetworkError(msg.to_string())])
    }

    /// Queue another reply
    pub fn push(&self, response: FakeResponse) {
        if let Ok(mut queue) = self.responses.lock() {
            queue.push_back(response);
        }
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }
}

impl SyncTransport for FakeTransport {
    fn post_stream(
        &self,
        url: &str,
        _headers: &[(&str, &str)],
        body: &str,
    ) -> Result<StreamBody, AdapterError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(RecordedRequest {
                url: url.to_string(),
                body: body.to_string(),
            });
        }

        let next = self
            .responses
            .lock()
            .ok()
            .and_then(|mut queue| queue.pop_front());

        match next {
            Some(FakeResponse::Stream(stream)) => Ok(Box::new(Cursor::new(stream.into_bytes()))),
            Some(FakeResponse::Status(status, body)) => Err(AdapterError::from_status(status, &body)),
            Some(FakeResponse::NetworkError(msg)) => Err(AdapterError::Network(msg)),
            None => Err(AdapterError::Network(
                "fake transport has no scripted response".to_string(),
            )),
        }
    }
}

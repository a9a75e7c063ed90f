//! Transport selection
//!
//! Adapters hold a [`Transport`]: ureq against a live backend, or a
//! scripted fake that records every request.

pub use crate::llm::adapters::transport_fake::{FakeResponse, FakeTransport, RecordedRequest};
pub use crate::llm::adapters::transport_types::{
    extract_error_message, AdapterError, StreamBody, SyncTransport,
};
pub use crate::llm::adapters::transport_ureq::UreqTransport;

/// Live or scripted transport
#[derive(Debug)]
pub enum Transport {
    Real(UreqTransport),
    Fake(FakeTransport),
}

impl SyncTransport for Transport {
    fn post_stream(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &str,
    ) -> Result<StreamBody, AdapterError> {
        match self {
            Transport::Real(t) => t.post_stream(url, headers, body),
            Transport::Fake(t) => t.post_stream(url, headers, body),
        }
    }
}

impl Default for Transport {
    fn default() -> Self {
        Transport::Real(UreqTransport::new())
    }
}

//! Mock detail source for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use url::Url;

use crate::error::{FetchError, FetchResult};
use crate::traits::source::DetailSource;

/// Canned answer for one URL.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// 200 with this body
    Body(String),
    /// Non-2xx status
    Status(u16),
    /// Connection-level failure
    Transport(String),
}

/// Serves canned responses and records every fetch.
///
/// URLs without a canned response answer 404. Clones share state, so a test
/// can hand one clone to the pipeline and assert on the other.
///
/// ```rust
/// use listing_enricher::sources::MockDetailSource;
///
/// let mock = MockDetailSource::new()
///     .with_body("https://example.com/oferta-1", "<html></html>")
///     .with_status("https://example.com/oferta-2", 404);
/// assert_eq!(mock.call_count(), 0);
/// ```
#[derive(Default, Clone)]
pub struct MockDetailSource {
    responses: Arc<RwLock<HashMap<String, MockResponse>>>,
    calls: Arc<RwLock<Vec<String>>>,
}

impl MockDetailSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_response(&self, url: impl Into<String>, response: MockResponse) {
        self.responses.write().unwrap().insert(url.into(), response);
    }

    /// Serve `body` with status 200 for `url`.
    pub fn with_body(self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.set_response(url, MockResponse::Body(body.into()));
        self
    }

    /// Answer `url` with a non-2xx `status`.
    pub fn with_status(self, url: impl Into<String>, status: u16) -> Self {
        self.set_response(url, MockResponse::Status(status));
        self
    }

    /// Fail `url` as if the connection broke.
    pub fn with_transport_error(self, url: impl Into<String>, message: impl Into<String>) -> Self {
        self.set_response(url, MockResponse::Transport(message.into()));
        self
    }

    /// Number of fetches made so far.
    pub fn call_count(&self) -> usize {
        self.calls.read().unwrap().len()
    }

    /// Every URL fetched, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.read().unwrap().clone()
    }

    pub fn calls_to(&self, url: &str) -> usize {
        self.calls.read().unwrap().iter().filter(|c| *c == url).count()
    }

    pub fn reset_calls(&self) {
        self.calls.write().unwrap().clear();
    }
}

#[async_trait]
impl DetailSource for MockDetailSource {
    async fn fetch(&self, url: &Url) -> FetchResult<String> {
        self.calls.write().unwrap().push(url.to_string());

        let response = self.responses.read().unwrap().get(url.as_str()).cloned();
        match response {
            Some(MockResponse::Body(body)) => Ok(body),
            Some(MockResponse::Status(status)) => Err(FetchError::Status {
                url: url.to_string(),
                status,
            }),
            Some(MockResponse::Transport(message)) => Err(FetchError::Transport {
                url: url.to_string(),
                source: message.into(),
            }),
            None => Err(FetchError::Status {
                url: url.to_string(),
                status: 404,
            }),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

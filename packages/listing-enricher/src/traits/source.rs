//! Network seam for fetching detail documents.
//!
//! The pipeline never talks to reqwest directly; it goes through a
//! [`DetailSource`], so tests can count and script every network call.

use async_trait::async_trait;
use url::Url;

use crate::error::FetchResult;

/// Fetches the raw HTML of one detail page.
///
/// Implementations issue a single request per call with no retries. Any
/// transport failure or non-2xx status is an error.
#[async_trait]
pub trait DetailSource: Send + Sync {
    async fn fetch(&self, url: &Url) -> FetchResult<String>;

    fn name(&self) -> &str;
}

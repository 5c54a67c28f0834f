//! HTTP-backed detail source.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE};
use tracing::{debug, warn};
use url::Url;

use crate::config::EnrichConfig;
use crate::error::{EnrichError, FetchError, FetchResult, Result};
use crate::traits::source::DetailSource;

/// Single GET per call, bounded timeout, desktop user agent, no retries.
pub struct HttpDetailSource {
    client: reqwest::Client,
}

impl HttpDetailSource {
    pub fn new(config: &EnrichConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let accept_language = HeaderValue::from_str(&config.accept_language).map_err(|_| {
            EnrichError::Config(format!(
                "invalid Accept-Language header: {:?}",
                config.accept_language
            ))
        })?;
        headers.insert(ACCEPT_LANGUAGE, accept_language);

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .build()
            .map_err(EnrichError::Client)?;

        Ok(Self { client })
    }
}

#[async_trait]
impl DetailSource for HttpDetailSource {
    async fn fetch(&self, url: &Url) -> FetchResult<String> {
        debug!(url = %url, "HTTP fetch starting");

        let response = self.client.get(url.clone()).send().await.map_err(|e| {
            warn!(url = %url, error = %e, "HTTP request failed");
            if e.is_timeout() {
                FetchError::Timeout {
                    url: url.to_string(),
                }
            } else {
                FetchError::Transport {
                    url: url.to_string(),
                    source: Box::new(e),
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|e| FetchError::Transport {
            url: url.to_string(),
            source: Box::new(e),
        })
    }

    fn name(&self) -> &str {
        "http"
    }
}

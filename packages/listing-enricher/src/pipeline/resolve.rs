//! Reference resolution: cache first, then one polite network fetch.
//!
//! Used by both the map-building phase and the injector's live fallback, so
//! a reference is resolved the same way wherever it is first met.

use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use crate::cache::DetailCache;
use crate::error::FetchError;
use crate::pipeline::extract::DescriptionExtractor;
use crate::traits::source::DetailSource;
use crate::types::reference::DetailReference;
use crate::types::report::{ContentOrigin, Resolution};

pub struct DescriptionResolver<S: DetailSource> {
    source: S,
    cache: DetailCache,
    extractor: DescriptionExtractor,
    base_url: Url,
    delay: Duration,
    validate_before_cache: bool,
    network_calls: usize,
}

impl<S: DetailSource> DescriptionResolver<S> {
    pub fn new(source: S, cache: DetailCache, base_url: Url) -> Self {
        Self {
            source,
            cache,
            extractor: DescriptionExtractor::default(),
            base_url,
            delay: Duration::ZERO,
            validate_before_cache: true,
            network_calls: 0,
        }
    }

    /// Pause inserted after every network fetch.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Replace the default extractor.
    pub fn with_extractor(mut self, extractor: DescriptionExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// When on, 2xx bodies without any description candidate are not cached.
    pub fn with_validation(mut self, validate_before_cache: bool) -> Self {
        self.validate_before_cache = validate_before_cache;
        self
    }

    /// Network fetches attempted so far.
    pub fn network_calls(&self) -> usize {
        self.network_calls
    }

    pub fn cache(&self) -> &DetailCache {
        &self.cache
    }

    pub async fn resolve(&mut self, reference: &DetailReference) -> Resolution {
        match self.cache.get(reference).await {
            Ok(Some(html)) => return self.describe(reference, &html, ContentOrigin::Cache),
            Ok(None) => {}
            Err(e) => {
                warn!(reference = %reference, error = %e, "Cache read failed");
                return Resolution::Failed {
                    error: e.to_string(),
                };
            }
        }

        let url = match reference.resolve(&self.base_url) {
            Ok(url) => url,
            Err(source) => {
                let e = FetchError::InvalidUrl {
                    reference: reference.to_string(),
                    source,
                };
                warn!(reference = %reference, error = %e, "Cannot build detail URL");
                return Resolution::Failed {
                    error: e.to_string(),
                };
            }
        };

        info!(url = %url, source = self.source.name(), "Downloading detail page");
        let fetched = self.source.fetch(&url).await;
        self.network_calls += 1;
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let html = match fetched {
            Ok(html) => html,
            Err(e) => {
                // Nothing is cached for failed fetches
                warn!(url = %url, error = %e, "Detail page unavailable");
                return Resolution::Unavailable {
                    reason: e.to_string(),
                };
            }
        };

        let resolution = self.describe(reference, &html, ContentOrigin::Network);
        if self.validate_before_cache && resolution.description().is_none() {
            warn!(
                reference = %reference,
                bytes = html.len(),
                "Detail page has no description candidate, not caching"
            );
            return resolution;
        }

        if let Err(e) = self.cache.put(reference, &html).await {
            warn!(reference = %reference, error = %e, "Failed to cache detail page");
        }
        resolution
    }

    fn describe(
        &self,
        reference: &DetailReference,
        html: &str,
        origin: ContentOrigin,
    ) -> Resolution {
        let text = self.extractor.extract(html);
        if text.is_empty() {
            warn!(reference = %reference, ?origin, "No description found in detail page");
            Resolution::ExtractionMiss { origin }
        } else {
            debug!(
                reference = %reference,
                ?origin,
                chars = text.chars().count(),
                "Description extracted"
            );
            Resolution::Described { text, origin }
        }
    }
}

//! End-to-end enrichment run.

use indexmap::IndexMap;
use tracing::{info, warn};

use crate::cache::DetailCache;
use crate::config::EnrichConfig;
use crate::error::Result;
use crate::listing::collect_listing_files;
use crate::pipeline::harvest::harvest_references;
use crate::pipeline::inject::{inject_document, InjectionTexts};
use crate::pipeline::resolve::DescriptionResolver;
use crate::sources::HttpDetailSource;
use crate::traits::source::DetailSource;
use crate::types::reference::DetailReference;
use crate::types::report::{DocumentReport, Resolution, RunReport};

/// Enrich every selected listing document using `source` for cache misses.
///
/// Only a missing listing directory or a malformed base URL abort the run.
/// Per-document and per-reference failures are logged and reported.
pub async fn run<S: DetailSource>(config: &EnrichConfig, source: S) -> Result<RunReport> {
    let files = collect_listing_files(config).await?;
    let base_url = config.parsed_base_url()?;

    let mut report = RunReport {
        listing_files: files.len(),
        ..RunReport::default()
    };

    if files.is_empty() {
        warn!(dir = %config.listing_dir.display(), "No listing documents found");
        return Ok(report);
    }
    info!(documents = files.len(), dir = %config.listing_dir.display(), "Starting enrichment run");

    let cache =
        DetailCache::new(&config.cache_dir).with_legacy_lookup(config.legacy_cache_names);
    if let Err(e) = cache.ensure_dir().await {
        warn!(
            dir = %cache.dir().display(),
            error = %e,
            "Cannot create cache directory; every store will fail"
        );
    }

    let mut resolver = DescriptionResolver::new(source, cache, base_url)
        .with_delay(config.request_delay)
        .with_validation(config.validate_before_cache);

    let harvest = harvest_references(&files, &config.detail_path_pattern).await;
    report.harvested_references = harvest.references.len();
    report.skipped_listing_files = harvest.skipped;

    let total = harvest.references.len();
    let mut resolutions: IndexMap<DetailReference, Resolution> = IndexMap::with_capacity(total);
    for (i, reference) in harvest.references.into_iter().enumerate() {
        info!("[{}/{}] {}", i + 1, total, reference);
        let resolution = resolver.resolve(&reference).await;
        resolutions.insert(reference, resolution);
    }

    let texts = InjectionTexts {
        placeholder: config.placeholder_text.clone(),
        banner: config.banner_text.clone(),
    };
    for path in &files {
        let document = match inject_document(path, &mut resolutions, &mut resolver, &texts).await {
            Ok(document) => document,
            Err(e) => {
                warn!(file = %path.display(), error = %e, "Listing document left unchanged");
                DocumentReport::failed(path, e)
            }
        };
        report.documents.push(document);
    }

    report.record_items(&resolutions);
    report.network_calls = resolver.network_calls();

    info!(
        references = report.items.len(),
        cached = report.cached(),
        fetched = report.fetched(),
        placeholders = report.placeholders(),
        errors = report.errors(),
        injected_cards = report.injected_cards(),
        failed_documents = report.failed_documents(),
        network_calls = report.network_calls,
        "Enrichment run complete"
    );
    Ok(report)
}

/// [`run`] with the HTTP source configured from `config`.
pub async fn run_with_http(config: &EnrichConfig) -> Result<RunReport> {
    let source = HttpDetailSource::new(config)?;
    run(config, source).await
}

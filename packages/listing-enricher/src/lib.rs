//! Listing Enricher
//!
//! Fills archived job-listing pages with the full description of each offer.
//! Listing pages only carry a title, company and location per card; the
//! description lives on a detail page. The enricher harvests detail links,
//! downloads each detail page once into a write-once cache, extracts the
//! description heuristically and injects it into the card in place.
//!
//! Re-running is safe: enriched cards are left alone, and the shared style
//! and script blocks are replaced rather than duplicated.
//!
//! # Usage
//!
//! ```rust,ignore
//! use listing_enricher::{run, EnrichConfig, HttpDetailSource};
//!
//! let config = EnrichConfig::from_env()?;
//! let source = HttpDetailSource::new(&config)?;
//! let report = run(&config, source).await?;
//! println!("{} cards enriched", report.injected_cards());
//! ```
//!
//! # Modules
//!
//! - [`traits`] - The detail source seam
//! - [`types`] - References, cards, artifacts and reports
//! - [`pipeline`] - Harvest, resolve, extract and inject stages
//! - [`sources`] - HTTP and mock detail sources
//! - [`layout`] - Old-layout card reformatter
//! - [`head`] - Head normalizer for documents archived from other provinces
//! - [`sitemap`] - Sitemap generation for the published tree
//! - [`testing`] - Fixtures for tests

pub mod cache;
pub mod config;
pub mod error;
pub mod head;
pub mod layout;
pub mod listing;
pub mod pipeline;
pub mod presentation;
pub mod sitemap;
pub mod sources;
pub mod testing;
pub mod traits;
pub mod types;

pub use cache::DetailCache;
pub use config::EnrichConfig;
pub use error::{CacheError, EnrichError, FetchError, ListingError, Result, SitemapError};
pub use head::{normalize_head, normalize_head_listings, HeadCleanup};
pub use layout::{reformat_cards, reformat_listings, Reformatted};
pub use pipeline::{
    harvest_references, inject_document, run, run_with_http, DescriptionExtractor,
    DescriptionResolver, Harvest, InjectionTexts,
};
pub use sitemap::{SitemapOptions, SitemapReport};
pub use sources::{HttpDetailSource, MockDetailSource, MockResponse};
pub use traits::source::DetailSource;
pub use types::{
    artifact::{Artifact, Provenance},
    listing::{CardPlan, ListingCard},
    reference::DetailReference,
    report::{
        ContentOrigin, DocumentReport, FileRewrite, ItemOutcome, ItemReport, Resolution, RunReport,
    },
};

//! Typed errors for the enrichment pipeline.
//!
//! Only [`EnrichError`] aborts a run. Every other error is scoped to a single
//! listing document or detail reference and ends up in the run report.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors that stop a whole enrichment run.
#[derive(Debug, Error)]
pub enum EnrichError {
    /// The listing directory could not be read
    #[error("cannot read listing directory {path}: {source}")]
    ListingDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration value is missing or malformed
    #[error("config error: {0}")]
    Config(String),

    /// HTTP client could not be constructed
    #[error("HTTP client error: {0}")]
    Client(#[source] reqwest::Error),
}

/// Errors from fetching a detail page over the network.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Reference could not be resolved against the base URL
    #[error("invalid URL for reference {reference}: {source}")]
    InvalidUrl {
        reference: String,
        #[source]
        source: url::ParseError,
    },

    /// Request exceeded the configured timeout
    #[error("timeout fetching {url}")]
    Timeout { url: String },

    /// Connection or body read failed
    #[error("HTTP error fetching {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Server answered with a non-2xx status
    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },
}

/// Errors from the on-disk detail cache.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors scoped to one listing document.
#[derive(Debug, Error)]
pub enum ListingError {
    /// File missing, unreadable or not UTF-8
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Rewritten document could not be persisted
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The streaming rewriter rejected the markup
    #[error("HTML rewrite failed for {path}: {source}")]
    Rewrite {
        path: PathBuf,
        #[source]
        source: lol_html::errors::RewritingError,
    },
}

/// Errors from sitemap generation.
#[derive(Debug, Error)]
pub enum SitemapError {
    #[error("sitemap I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid base URL: {0}")]
    BaseUrl(#[from] url::ParseError),
}

/// Result type alias for fatal run operations.
pub type Result<T> = std::result::Result<T, EnrichError>;

/// Result type alias for network fetches.
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Result type alias for cache operations.
pub type CacheResult<T> = std::result::Result<T, CacheError>;

/// Result type alias for listing document operations.
pub type ListingResult<T> = std::result::Result<T, ListingError>;

/// Result type alias for sitemap generation.
pub type SitemapResult<T> = std::result::Result<T, SitemapError>;

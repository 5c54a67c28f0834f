//! Run configuration.
//!
//! Defaults target the Buenos Aires archive; `ENRICH_*` variables override
//! them and the CLI overrides those.

use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

use crate::error::{EnrichError, Result};

pub const DEFAULT_BASE_URL: &str = "https://ar.computrabajo.com";
pub const DEFAULT_DETAIL_PATTERN: &str = "/ofertas-de-trabajo/oferta-de-trabajo-de-";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";
pub const DEFAULT_ACCEPT_LANGUAGE: &str = "es-AR,es;q=0.9,en;q=0.8";
pub const DEFAULT_PLACEHOLDER: &str =
    "Descripción no disponible. Esta oferta ya no existe en el sitio original de Computrabajo.";
pub const DEFAULT_BANNER: &str =
    "Esta oferta ya no tiene descripción disponible en el sitio original.";

/// Settings for one enrichment run, passed explicitly to [`crate::run`].
#[derive(Debug, Clone)]
pub struct EnrichConfig {
    /// Directory holding the archived listing pages
    pub listing_dir: PathBuf,
    /// Filename prefix of listing pages (locality part)
    pub listing_prefix: String,
    /// Filename suffix of listing pages
    pub listing_suffix: String,
    /// One file per detail page lives here
    pub cache_dir: PathBuf,
    /// Only the first `max_pages` listing files (sorted by name) are processed
    pub max_pages: usize,
    /// Detail references are joined onto this URL
    pub base_url: String,
    /// Substring an anchor's href must contain to count as a detail link
    pub detail_path_pattern: String,
    /// Pause after every network fetch
    pub request_delay: Duration,
    pub request_timeout: Duration,
    pub user_agent: String,
    pub accept_language: String,
    /// Refuse to cache 2xx bodies that contain no description candidate
    pub validate_before_cache: bool,
    /// Also reuse cache entries stored under digest-less legacy names.
    /// Such names can collide, so a hit may hold another offer's page.
    pub legacy_cache_names: bool,
    pub placeholder_text: String,
    pub banner_text: String,
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self {
            listing_dir: PathBuf::from("data/buenos_aires"),
            listing_prefix: "buenos_aires_p".to_string(),
            listing_suffix: ".html".to_string(),
            cache_dir: PathBuf::from("data/ofertas_detalle"),
            max_pages: 30,
            base_url: DEFAULT_BASE_URL.to_string(),
            detail_path_pattern: DEFAULT_DETAIL_PATTERN.to_string(),
            request_delay: Duration::from_secs(2),
            request_timeout: Duration::from_secs(25),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_language: DEFAULT_ACCEPT_LANGUAGE.to_string(),
            validate_before_cache: true,
            legacy_cache_names: false,
            placeholder_text: DEFAULT_PLACEHOLDER.to_string(),
            banner_text: DEFAULT_BANNER.to_string(),
        }
    }
}

impl EnrichConfig {
    /// Load configuration from `ENRICH_*` environment variables over the defaults.
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        let _ = dotenv();

        let defaults = Self::default();

        Ok(Self {
            listing_dir: env::var("ENRICH_LISTING_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.listing_dir),
            listing_prefix: env::var("ENRICH_LISTING_PREFIX").unwrap_or(defaults.listing_prefix),
            listing_suffix: env::var("ENRICH_LISTING_SUFFIX").unwrap_or(defaults.listing_suffix),
            cache_dir: env::var("ENRICH_CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.cache_dir),
            max_pages: parse_var("ENRICH_MAX_PAGES")?.unwrap_or(defaults.max_pages),
            base_url: env::var("ENRICH_BASE_URL").unwrap_or(defaults.base_url),
            detail_path_pattern: env::var("ENRICH_DETAIL_PATTERN")
                .unwrap_or(defaults.detail_path_pattern),
            request_delay: parse_var::<u64>("ENRICH_REQUEST_DELAY_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.request_delay),
            request_timeout: parse_var::<u64>("ENRICH_REQUEST_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            user_agent: env::var("ENRICH_USER_AGENT").unwrap_or(defaults.user_agent),
            accept_language: env::var("ENRICH_ACCEPT_LANGUAGE")
                .unwrap_or(defaults.accept_language),
            validate_before_cache: parse_var("ENRICH_VALIDATE_BEFORE_CACHE")?
                .unwrap_or(defaults.validate_before_cache),
            legacy_cache_names: parse_var("ENRICH_LEGACY_CACHE_NAMES")?
                .unwrap_or(defaults.legacy_cache_names),
            placeholder_text: env::var("ENRICH_PLACEHOLDER").unwrap_or(defaults.placeholder_text),
            banner_text: env::var("ENRICH_BANNER").unwrap_or(defaults.banner_text),
        })
    }

    /// Set the listing and cache directories.
    pub fn with_dirs(
        mut self,
        listing_dir: impl Into<PathBuf>,
        cache_dir: impl Into<PathBuf>,
    ) -> Self {
        self.listing_dir = listing_dir.into();
        self.cache_dir = cache_dir.into();
        self
    }

    /// Cap the number of listing files processed.
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Set the pause inserted after every network fetch.
    pub fn with_request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = delay;
        self
    }

    /// Set the URL detail references are resolved against.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Parsed form of `base_url`.
    pub fn parsed_base_url(&self) -> Result<Url> {
        Url::parse(&self.base_url)
            .map_err(|e| EnrichError::Config(format!("invalid base URL {}: {}", self.base_url, e)))
    }

    /// Whether a file name belongs to the listing set.
    pub fn is_listing_file(&self, file_name: &str) -> bool {
        file_name.starts_with(&self.listing_prefix) && file_name.ends_with(&self.listing_suffix)
    }
}

fn parse_var<T: FromStr>(key: &str) -> Result<Option<T>> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| {
                EnrichError::Config(format!("{} must be a valid value, got {:?}", key, raw))
            }),
        Err(_) => Ok(None),
    }
}

//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::time::Duration;

use listing_enricher::testing::{listing_page, TestCard};
use listing_enricher::EnrichConfig;
use tempfile::TempDir;

pub const BASE_URL: &str = "https://example.com";
pub const DETAIL_PREFIX: &str = "/ofertas-de-trabajo/oferta-de-trabajo-de-";

/// Temp workspace with a listing directory and a cache directory.
pub struct Workspace {
    pub root: TempDir,
    pub config: EnrichConfig,
}

impl Workspace {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        let listing_dir = root.path().join("listados");
        let cache_dir = root.path().join("cache");
        std::fs::create_dir_all(&listing_dir).unwrap();

        let config = EnrichConfig::default()
            .with_dirs(listing_dir, cache_dir)
            .with_base_url(BASE_URL)
            .with_request_delay(Duration::ZERO);

        Self { root, config }
    }

    pub fn listing_path(&self, page: usize) -> PathBuf {
        self.config
            .listing_dir
            .join(format!("{}{}{}", self.config.listing_prefix, page, self.config.listing_suffix))
    }

    /// Write listing page `page` with `cards`, returning its path.
    pub fn write_listing(&self, page: usize, cards: &[TestCard]) -> PathBuf {
        let path = self.listing_path(page);
        std::fs::write(&path, listing_page(cards)).unwrap();
        path
    }

    pub fn read(&self, path: &Path) -> String {
        std::fs::read_to_string(path).unwrap()
    }

    pub fn cache_files(&self) -> usize {
        match std::fs::read_dir(&self.config.cache_dir) {
            Ok(entries) => entries.count(),
            Err(_) => 0,
        }
    }
}

pub fn detail_href(slug: &str) -> String {
    format!("{}{}", DETAIL_PREFIX, slug)
}

pub fn detail_url(slug: &str) -> String {
    format!("{}{}", BASE_URL, detail_href(slug))
}

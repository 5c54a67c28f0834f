//! XML sitemap generation for a published site tree.
//!
//! Every `.html` page under the root becomes one `<url>` entry. Large sites
//! are split into numbered parts with a sitemap index at the output name.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{SitemapError, SitemapResult};

/// Protocol limit is 50 000; stay below it.
pub const MAX_URLS_PER_SITEMAP: usize = 45_000;

pub const DEFAULT_OUTPUT: &str = "sitemap.xml";

const EXCLUDED_DIRS: &[&str] = &[
    ".git",
    ".github",
    "node_modules",
    "dist",
    "build",
    "__pycache__",
    ".vscode",
];

const EXCLUDED_SEGMENTS: &[&str] = &["/tmp/", "/test/"];

const XMLNS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

#[derive(Debug, Clone)]
pub struct SitemapOptions {
    pub root: PathBuf,
    pub base_url: String,
    pub max_urls: usize,
    /// File name of the single sitemap or of the index, relative to `root`
    pub output: String,
}

impl SitemapOptions {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into(),
            max_urls: MAX_URLS_PER_SITEMAP,
            output: DEFAULT_OUTPUT.to_string(),
        }
    }

    /// Cap the URLs written to one urlset.
    pub fn with_max_urls(mut self, max_urls: usize) -> Self {
        self.max_urls = max_urls;
        self
    }

    /// File name of the single urlset or of the index.
    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = output.into();
        self
    }

    /// Base URL with exactly one trailing slash, so joins append.
    fn base(&self) -> SitemapResult<Url> {
        let base = format!("{}/", self.base_url.trim_end_matches('/'));
        Ok(Url::parse(&base)?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SitemapEntry {
    pub loc: String,
    pub lastmod: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SitemapReport {
    pub urls: usize,
    /// Urlset files written, in part order
    pub parts: Vec<PathBuf>,
    /// Index file, when the URLs did not fit one part
    pub index: Option<PathBuf>,
}

/// Site-relative URL path for a page, or `None` when the page is excluded.
///
/// `dir/index.html` maps to `dir` and the root `index.html` to the empty path.
pub fn page_path(relative: &str) -> Option<String> {
    let relative = relative.replace('\\', "/");
    let lower = relative.to_lowercase();

    // Previous outputs and anything under a top-level sitemap* directory
    if lower.starts_with("sitemap") {
        return None;
    }

    let rooted = format!("/{}", lower);
    if EXCLUDED_SEGMENTS.iter().any(|segment| rooted.contains(segment)) {
        return None;
    }

    if lower == "index.html" {
        return Some(String::new());
    }
    if lower.ends_with("/index.html") {
        let trimmed = &relative[..relative.len() - "index.html".len()];
        return Some(trimmed.trim_end_matches('/').to_string());
    }
    Some(relative)
}

/// Sitemap entries for every page under the configured root, sorted and deduplicated.
pub fn collect_entries(options: &SitemapOptions) -> SitemapResult<Vec<SitemapEntry>> {
    let base = options.base()?;

    let mut pages = Vec::new();
    walk_html(&options.root, &mut pages)?;
    pages.sort();

    let mut seen = std::collections::HashSet::new();
    let mut entries = Vec::with_capacity(pages.len());
    for page in pages {
        let Ok(relative) = page.strip_prefix(&options.root) else {
            continue;
        };
        let Some(path) = page_path(&relative.to_string_lossy()) else {
            debug!(page = %page.display(), "Excluded from sitemap");
            continue;
        };
        let loc = match base.join(&path) {
            Ok(url) => url.to_string(),
            Err(e) => {
                warn!(page = %page.display(), error = %e, "Cannot build page URL");
                continue;
            }
        };
        if !seen.insert(loc.clone()) {
            continue;
        }

        let lastmod = fs::metadata(&page)
            .and_then(|meta| meta.modified())
            .map(|modified| DateTime::<Utc>::from(modified).format("%Y-%m-%d").to_string())
            .map_err(|source| SitemapError::Io {
                path: page.clone(),
                source,
            })?;
        entries.push(SitemapEntry { loc, lastmod });
    }
    Ok(entries)
}

fn walk_html(dir: &Path, pages: &mut Vec<PathBuf>) -> SitemapResult<()> {
    let io_error = |source: std::io::Error| SitemapError::Io {
        path: dir.to_path_buf(),
        source,
    };

    for entry in fs::read_dir(dir).map_err(io_error)? {
        let entry = entry.map_err(io_error)?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(io_error)?;
        let name = entry.file_name().to_string_lossy().to_string();

        if file_type.is_dir() {
            if !EXCLUDED_DIRS.contains(&name.as_str()) {
                walk_html(&path, pages)?;
            }
        } else if name.to_lowercase().ends_with(".html") {
            pages.push(path);
        }
    }
    Ok(())
}

pub fn render_urlset(entries: &[SitemapEntry]) -> String {
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str(&format!("<urlset xmlns=\"{}\">\n", XMLNS));
    for entry in entries {
        xml.push_str("  <url>\n");
        xml.push_str(&format!("    <loc>{}</loc>\n", html_escape::encode_text(&entry.loc)));
        xml.push_str(&format!("    <lastmod>{}</lastmod>\n", entry.lastmod));
        xml.push_str("  </url>\n");
    }
    xml.push_str("</urlset>\n");
    xml
}

pub fn render_index(locs: &[String], lastmod: &str) -> String {
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str(&format!("<sitemapindex xmlns=\"{}\">\n", XMLNS));
    for loc in locs {
        xml.push_str("  <sitemap>\n");
        xml.push_str(&format!("    <loc>{}</loc>\n", html_escape::encode_text(loc)));
        xml.push_str(&format!("    <lastmod>{}</lastmod>\n", lastmod));
        xml.push_str("  </sitemap>\n");
    }
    xml.push_str("</sitemapindex>\n");
    xml
}

/// Write the sitemap (or sitemap parts plus an index) into the root directory.
///
/// Writes nothing when the tree has no pages.
pub fn generate(options: &SitemapOptions) -> SitemapResult<SitemapReport> {
    let entries = collect_entries(options)?;
    let mut report = SitemapReport {
        urls: entries.len(),
        ..SitemapReport::default()
    };

    if entries.is_empty() {
        warn!(root = %options.root.display(), "No pages found; no sitemap written");
        return Ok(report);
    }

    let output = options.root.join(&options.output);
    let chunks: Vec<&[SitemapEntry]> = entries.chunks(options.max_urls.max(1)).collect();

    if chunks.len() == 1 {
        write_file(&output, &render_urlset(&entries))?;
        info!(file = %output.display(), urls = entries.len(), "Sitemap written");
        report.parts.push(output);
        return Ok(report);
    }

    let base = options.base()?;
    let mut locs = Vec::with_capacity(chunks.len());
    for (i, chunk) in chunks.iter().enumerate() {
        let name = format!("sitemap-{}.xml", i + 1);
        let path = options.root.join(&name);
        write_file(&path, &render_urlset(chunk))?;
        info!(file = %path.display(), urls = chunk.len(), "Sitemap part written");
        locs.push(base.join(&name)?.to_string());
        report.parts.push(path);
    }

    let today = Utc::now().format("%Y-%m-%d").to_string();
    write_file(&output, &render_index(&locs, &today))?;
    info!(file = %output.display(), parts = locs.len(), "Sitemap index written");
    report.index = Some(output);
    Ok(report)
}

fn write_file(path: &Path, contents: &str) -> SitemapResult<()> {
    fs::write(path, contents).map_err(|source| SitemapError::Io {
        path: path.to_path_buf(),
        source,
    })
}

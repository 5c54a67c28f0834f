//! Detail-page references and their cache keys.

use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;
use url::Url;

/// Longest escaped prefix kept in a cache file name.
const MAX_ESCAPED_LEN: usize = 180;

/// Hex characters of the reference digest appended to cache file names.
const DIGEST_LEN: usize = 16;

/// Longest file name most filesystems accept, in bytes.
const MAX_FILE_NAME_LEN: usize = 255;

pub const CACHE_EXTENSION: &str = "html";

/// Normalized relative link to a job's detail page.
///
/// The fragment is stripped, so `/oferta-123#lc=abc` and `/oferta-123` are the
/// same reference, the same cache entry and the same map key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct DetailReference(String);

impl DetailReference {
    /// Normalize a raw `href`. Returns `None` when nothing is left after
    /// trimming and dropping the fragment.
    pub fn parse(href: &str) -> Option<Self> {
        let base = href.trim().split('#').next().unwrap_or("").trim();
        if base.is_empty() {
            None
        } else {
            Some(Self(base.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this reference points at a job posting detail page.
    pub fn matches(&self, pattern: &str) -> bool {
        self.0.contains(pattern)
    }

    /// Absolute URL of the detail page.
    pub fn resolve(&self, base: &Url) -> Result<Url, url::ParseError> {
        base.join(&self.0)
    }

    /// File name under which the detail document is cached.
    ///
    /// Every character outside `[A-Za-z0-9_]` becomes `_`; a digest of the
    /// untouched reference keeps distinct references apart after escaping.
    pub fn cache_key(&self) -> String {
        let escaped: String = escape(&self.0).chars().take(MAX_ESCAPED_LEN).collect();
        let digest = hex::encode(Sha256::digest(self.0.as_bytes()));
        format!("{}__{}.{}", escaped, &digest[..DIGEST_LEN], CACHE_EXTENSION)
    }

    /// File name used by caches written before digests were added.
    ///
    /// Distinct references can share this name (`/oferta-1` and `/oferta_1`).
    /// `None` when the name would not fit on disk.
    pub fn legacy_cache_key(&self) -> Option<String> {
        let key = format!("{}.{}", escape(&self.0), CACHE_EXTENSION);
        (key.len() <= MAX_FILE_NAME_LEN).then_some(key)
    }
}

impl fmt::Display for DetailReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn escape(raw: &str) -> String {
    raw.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

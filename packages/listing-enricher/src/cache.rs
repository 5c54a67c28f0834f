//! On-disk store of raw detail documents, one file per reference.
//!
//! Entries are write-once: the first successful fetch wins and nothing here
//! ever refreshes or deletes an entry.

use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

use crate::error::{CacheError, CacheResult};
use crate::types::reference::{DetailReference, CACHE_EXTENSION};

#[derive(Debug, Clone)]
pub struct DetailCache {
    dir: PathBuf,
    legacy_lookup: bool,
}

impl DetailCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            legacy_lookup: false,
        }
    }

    /// Also read entries stored under the digest-less legacy name.
    ///
    /// Legacy names collide for references that differ only in escaped
    /// characters, so a hit may belong to another reference. Off by default.
    pub fn with_legacy_lookup(mut self, enabled: bool) -> Self {
        self.legacy_lookup = enabled;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the cache directory if it does not exist yet.
    pub async fn ensure_dir(&self) -> CacheResult<()> {
        fs::create_dir_all(&self.dir).await.map_err(|source| CacheError::Io {
            path: self.dir.clone(),
            source,
        })
    }

    /// Path of the entry for `reference`.
    pub fn path_for(&self, reference: &DetailReference) -> PathBuf {
        self.dir.join(reference.cache_key())
    }

    /// Stored document for `reference`, if any.
    pub async fn get(&self, reference: &DetailReference) -> CacheResult<Option<String>> {
        let path = self.path_for(reference);
        match fs::read_to_string(&path).await {
            Ok(content) => {
                debug!(reference = %reference, path = %path.display(), "Cache hit");
                return Ok(Some(content));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(source) => return Err(CacheError::Io { path, source }),
        }

        if self.legacy_lookup {
            return Ok(self.get_legacy(reference).await);
        }
        Ok(None)
    }

    /// Legacy entries are best effort: any read failure counts as a miss.
    async fn get_legacy(&self, reference: &DetailReference) -> Option<String> {
        let path = self.dir.join(reference.legacy_cache_key()?);
        match fs::read_to_string(&path).await {
            Ok(content) => {
                debug!(reference = %reference, path = %path.display(), "Legacy cache hit");
                Some(content)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring unreadable legacy entry");
                None
            }
        }
    }

    /// Whether an entry exists under the digest key. Legacy names are not consulted.
    pub async fn contains(&self, reference: &DetailReference) -> bool {
        fs::try_exists(self.path_for(reference)).await.unwrap_or(false)
    }

    /// Persist `content` for `reference` unless an entry already exists.
    ///
    /// Writes a sibling temp file and renames it into place, so a crash never
    /// leaves a truncated entry behind.
    pub async fn put(&self, reference: &DetailReference, content: &str) -> CacheResult<bool> {
        if self.contains(reference).await {
            return Ok(false);
        }

        let path = self.path_for(reference);
        let tmp = path.with_extension(format!("{}.tmp", CACHE_EXTENSION));

        fs::write(&tmp, content)
            .await
            .map_err(|source| CacheError::Io {
                path: tmp.clone(),
                source,
            })?;
        fs::rename(&tmp, &path)
            .await
            .map_err(|source| CacheError::Io {
                path: path.clone(),
                source,
            })?;

        debug!(
            reference = %reference,
            path = %path.display(),
            bytes = content.len(),
            "Cached detail document"
        );
        Ok(true)
    }

    /// Number of cache entries on disk.
    pub async fn entry_count(&self) -> CacheResult<usize> {
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(source) => {
                return Err(CacheError::Io {
                    path: self.dir.clone(),
                    source,
                })
            }
        };

        let mut count = 0;
        while let Some(entry) = entries.next_entry().await.map_err(|source| CacheError::Io {
            path: self.dir.clone(),
            source,
        })? {
            let is_entry = entry
                .path()
                .extension()
                .map(|ext| ext == CACHE_EXTENSION)
                .unwrap_or(false);
            if is_entry {
                count += 1;
            }
        }
        Ok(count)
    }
}

//! Per-item and per-document results of a run.

use indexmap::IndexMap;
use serde::Serialize;
use std::path::PathBuf;

use super::reference::DetailReference;

/// Where the raw detail document came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentOrigin {
    Cache,
    Network,
}

/// Result of resolving one reference to a description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Resolution {
    /// A description was extracted
    Described { text: String, origin: ContentOrigin },
    /// The document was available but no block qualified
    ExtractionMiss { origin: ContentOrigin },
    /// Transport failure, timeout or non-2xx status
    Unavailable { reason: String },
    /// Local failure (cache I/O, bad URL)
    Failed { error: String },
}

impl Resolution {
    pub fn description(&self) -> Option<&str> {
        match self {
            Resolution::Described { text, .. } => Some(text),
            _ => None,
        }
    }

    pub fn outcome(&self) -> ItemOutcome {
        match self {
            Resolution::Described { origin: ContentOrigin::Cache, .. } => ItemOutcome::Cached,
            Resolution::Described { origin: ContentOrigin::Network, .. } => ItemOutcome::Fetched,
            Resolution::ExtractionMiss { .. } => ItemOutcome::Placeholder {
                reason: "no description block found".to_string(),
            },
            Resolution::Unavailable { reason } => ItemOutcome::Placeholder {
                reason: reason.clone(),
            },
            Resolution::Failed { error } => ItemOutcome::Error {
                message: error.clone(),
            },
        }
    }
}

/// Final status of one detail reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ItemOutcome {
    /// Description taken from a cached document
    Cached,
    /// Description taken from a freshly downloaded document
    Fetched,
    /// No description available; cards get the placeholder
    Placeholder { reason: String },
    /// Local error prevented resolution
    Error { message: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct ItemReport {
    pub reference: DetailReference,
    #[serde(flatten)]
    pub outcome: ItemOutcome,
}

/// What happened to one listing document.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DocumentReport {
    pub file: PathBuf,
    pub total_cards: usize,
    pub already_enriched: usize,
    pub injected: usize,
    pub placeholders: usize,
    /// Pending cards left alone (no link, empty text, failed resolution)
    pub skipped: usize,
    pub head_missing: bool,
    pub body_missing: bool,
    pub error: Option<String>,
}

impl DocumentReport {
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self {
            file: file.into(),
            ..Default::default()
        }
    }

    pub fn failed(file: impl Into<PathBuf>, error: impl ToString) -> Self {
        Self {
            error: Some(error.to_string()),
            ..Self::new(file)
        }
    }
}

/// Result of a maintenance rewrite (reformat, head cleanup) on one file.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FileRewrite {
    pub file: PathBuf,
    pub changes: usize,
    pub error: Option<String>,
}

/// Everything a run did, in processing order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub listing_files: usize,
    pub harvested_references: usize,
    pub network_calls: usize,
    pub documents: Vec<DocumentReport>,
    pub items: Vec<ItemReport>,
    /// Listing documents the harvester could not read
    pub skipped_listing_files: Vec<PathBuf>,
}

impl RunReport {
    /// Build item entries from the run's resolution map, in first-seen order.
    pub fn record_items(&mut self, resolutions: &IndexMap<DetailReference, Resolution>) {
        self.items = resolutions
            .iter()
            .map(|(reference, resolution)| ItemReport {
                reference: reference.clone(),
                outcome: resolution.outcome(),
            })
            .collect();
    }

    pub fn count(&self, f: impl Fn(&ItemOutcome) -> bool) -> usize {
        self.items.iter().filter(|item| f(&item.outcome)).count()
    }

    pub fn cached(&self) -> usize {
        self.count(|o| matches!(o, ItemOutcome::Cached))
    }

    pub fn fetched(&self) -> usize {
        self.count(|o| matches!(o, ItemOutcome::Fetched))
    }

    pub fn placeholders(&self) -> usize {
        self.count(|o| matches!(o, ItemOutcome::Placeholder { .. }))
    }

    pub fn errors(&self) -> usize {
        self.count(|o| matches!(o, ItemOutcome::Error { .. }))
    }

    pub fn injected_cards(&self) -> usize {
        self.documents.iter().map(|d| d.injected).sum()
    }

    pub fn failed_documents(&self) -> usize {
        self.documents.iter().filter(|d| d.error.is_some()).count()
    }
}

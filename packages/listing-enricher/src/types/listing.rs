//! Listing cards and the per-card plan applied by the injector.

use serde::Serialize;

use super::reference::DetailReference;

/// One job posting summary inside a listing document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ListingCard {
    /// Position among the document's cards, in document order
    pub index: usize,
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    /// Reference from the card's first link, if it has one
    pub reference: Option<DetailReference>,
    /// A description container is already attached
    pub is_enriched: bool,
}

/// What the injector does with one card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardPlan {
    /// Leave the card byte-for-byte as it is
    Skip,
    /// Append a description container, and a stale-listing banner if `stale`
    Inject { paragraphs: Vec<String>, stale: bool },
}

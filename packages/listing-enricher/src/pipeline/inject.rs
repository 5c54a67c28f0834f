//! Card-level injection of descriptions into listing documents.
//!
//! Cards that already carry a description container are never touched again;
//! pending cards receive one container, plus a stale banner when no real
//! description could be obtained.

use indexmap::IndexMap;
use lazy_static::lazy_static;
use regex::Regex;
use std::path::Path;
use tokio::fs;
use tracing::{debug, info, warn};

use crate::error::{ListingError, ListingResult};
use crate::listing::{apply_plans, scan_cards, write_whole_file};
use crate::pipeline::resolve::DescriptionResolver;
use crate::traits::source::DetailSource;
use crate::types::listing::{CardPlan, ListingCard};
use crate::types::reference::DetailReference;
use crate::types::report::{DocumentReport, Resolution};

lazy_static! {
    static ref BLANK_LINES: Regex = Regex::new(r"\n\s*\n+").unwrap();
}

/// Fixed texts written for cards without a real description.
#[derive(Debug, Clone)]
pub struct InjectionTexts {
    pub placeholder: String,
    pub banner: String,
}

/// Split text into paragraphs on blank lines, dropping blank paragraphs.
pub fn split_paragraphs(text: &str) -> Vec<String> {
    BLANK_LINES
        .split(text)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

/// Enrich the pending cards of one listing document and write it back in place.
///
/// `resolutions` is consulted first; references it does not know are resolved
/// live and recorded in it.
pub async fn inject_document<S: DetailSource>(
    path: &Path,
    resolutions: &mut IndexMap<DetailReference, Resolution>,
    resolver: &mut DescriptionResolver<S>,
    texts: &InjectionTexts,
) -> ListingResult<DocumentReport> {
    let html = fs::read_to_string(path)
        .await
        .map_err(|source| ListingError::Read {
            path: path.to_path_buf(),
            source,
        })?;

    let cards = scan_cards(&html).map_err(|source| ListingError::Rewrite {
        path: path.to_path_buf(),
        source,
    })?;

    let mut report = DocumentReport::new(path);
    report.total_cards = cards.len();
    report.already_enriched = cards.iter().filter(|c| c.is_enriched).count();

    info!(
        file = %path.display(),
        total = report.total_cards,
        enriched = report.already_enriched,
        pending = report.total_cards - report.already_enriched,
        "Analyzing listing document"
    );

    let mut plans = Vec::with_capacity(cards.len());
    for card in &cards {
        let plan = plan_card(card, resolutions, resolver, texts).await;
        match &plan {
            CardPlan::Inject { stale, .. } => {
                report.injected += 1;
                if *stale {
                    report.placeholders += 1;
                }
            }
            CardPlan::Skip if !card.is_enriched => report.skipped += 1,
            CardPlan::Skip => {}
        }
        plans.push(plan);
    }

    let rewritten = apply_plans(&html, &plans, &texts.banner).map_err(|source| {
        ListingError::Rewrite {
            path: path.to_path_buf(),
            source,
        }
    })?;

    report.head_missing = !rewritten.head_found;
    report.body_missing = !rewritten.body_found;
    if report.head_missing {
        warn!(file = %path.display(), "No <head>; style block not injected");
    }
    if report.body_missing {
        warn!(file = %path.display(), "No <body>; script block not injected");
    }

    write_whole_file(path, &rewritten.html).await?;

    info!(
        file = %path.display(),
        injected = report.injected,
        placeholders = report.placeholders,
        removed_artifacts = rewritten.removed_artifacts,
        "Listing document updated"
    );
    Ok(report)
}

async fn plan_card<S: DetailSource>(
    card: &ListingCard,
    resolutions: &mut IndexMap<DetailReference, Resolution>,
    resolver: &mut DescriptionResolver<S>,
    texts: &InjectionTexts,
) -> CardPlan {
    if card.is_enriched {
        return CardPlan::Skip;
    }

    let Some(reference) = &card.reference else {
        warn!(card = card.index, title = ?card.title, "Card has no link; skipping");
        return CardPlan::Skip;
    };

    let resolution = match resolutions.get(reference) {
        Some(known) => known.clone(),
        None => {
            debug!(reference = %reference, "Reference missed by harvest; resolving live");
            let fresh = resolver.resolve(reference).await;
            resolutions.insert(reference.clone(), fresh.clone());
            fresh
        }
    };

    if let Resolution::Failed { error } = &resolution {
        // Local failure, not a verdict on the listing: retry on a later run
        warn!(reference = %reference, error = %error, "Resolution failed; card left pending");
        return CardPlan::Skip;
    }

    let (text, stale) = match resolution.description() {
        Some(text) => (text, false),
        None => {
            info!(
                reference = %reference,
                title = ?card.title,
                company = ?card.company,
                "Using placeholder description"
            );
            (texts.placeholder.as_str(), true)
        }
    };

    let paragraphs = split_paragraphs(text);
    if paragraphs.is_empty() {
        warn!(reference = %reference, "Description is blank; card left pending");
        return CardPlan::Skip;
    }

    CardPlan::Inject { paragraphs, stale }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_paragraphs_on_blank_lines() {
        let text = "Primera línea\nsigue igual\n\n  \n- Rust\n\n\n\nÚltima  ";
        assert_eq!(
            split_paragraphs(text),
            vec!["Primera línea\nsigue igual", "- Rust", "Última"]
        );
    }

    #[test]
    fn test_split_paragraphs_blank_input() {
        assert!(split_paragraphs("   \n\n  ").is_empty());
        assert_eq!(split_paragraphs("solo"), vec!["solo"]);
    }
}

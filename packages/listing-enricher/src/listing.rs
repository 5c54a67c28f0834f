//! Listing documents: discovery, card scanning and byte-preserving rewrites.
//!
//! Both passes run on `lol_html`, so the card indices seen by the scan are the
//! indices the rewrite applies plans to. Markup outside the injected nodes and
//! the removed page-level artifacts is emitted unchanged.

use html_escape::decode_html_entities;
use lol_html::errors::RewritingError;
use lol_html::html_content::ContentType;
use lol_html::{
    element, rewrite_str, text, HtmlRewriter, OutputSink, RewriteStrSettings, Settings,
};
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, warn};

use crate::config::EnrichConfig;
use crate::error::{EnrichError, ListingError, ListingResult, Result};
use crate::presentation;
use crate::types::artifact::{classify, Artifact, Provenance, OWNERSHIP_ATTR};
use crate::types::listing::{CardPlan, ListingCard};
use crate::types::reference::DetailReference;
use crate::types::report::FileRewrite;

pub const CARD_SELECTOR: &str = "article.box_offer";

const TITLE_SELECTOR: &str = "article.box_offer h2";
const COMPANY_SELECTOR: &str = "article.box_offer p:nth-of-type(1)";
const LOCATION_SELECTOR: &str = "article.box_offer p:nth-of-type(2)";
const LINK_SELECTOR: &str = "article.box_offer a[href]";
const ENRICHED_SELECTOR: &str = "article.box_offer div.descripcion_scrapeada";

/// Listing files in `config.listing_dir`, sorted by name and capped at `max_pages`.
///
/// This is the only fatal I/O in a run.
pub async fn collect_listing_files(config: &EnrichConfig) -> Result<Vec<PathBuf>> {
    let mut files = all_listing_files(config).await?;
    files.truncate(config.max_pages);
    Ok(files)
}

/// Every listing file in `config.listing_dir`, sorted by name.
pub async fn all_listing_files(config: &EnrichConfig) -> Result<Vec<PathBuf>> {
    let dir_error = |source: std::io::Error| EnrichError::ListingDir {
        path: config.listing_dir.clone(),
        source,
    };

    let mut entries = fs::read_dir(&config.listing_dir).await.map_err(dir_error)?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(dir_error)? {
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if config.is_listing_file(name) {
            files.push(entry.path());
        }
    }

    files.sort();
    Ok(files)
}

/// Replace `path` with `contents` via a sibling temp file and a rename.
pub(crate) async fn write_whole_file(path: &Path, contents: &str) -> ListingResult<()> {
    let tmp = path.with_extension("enrich.tmp");
    let write_error = |source: std::io::Error| ListingError::Write {
        path: path.to_path_buf(),
        source,
    };

    fs::write(&tmp, contents).await.map_err(write_error)?;
    fs::rename(&tmp, path).await.map_err(write_error)
}

/// Apply `transform` to each file, writing back only files it changed.
///
/// `transform` returns the new markup and the number of changes it made.
/// Failures are reported per file and never stop the loop.
pub async fn rewrite_listing_files<F>(files: &[PathBuf], transform: F) -> Vec<FileRewrite>
where
    F: Fn(&str) -> std::result::Result<(String, usize), RewritingError>,
{
    let mut results = Vec::with_capacity(files.len());
    for path in files {
        let result = match rewrite_one(path, &transform).await {
            Ok(changes) => {
                info!(file = %path.display(), changes, "Listing document processed");
                FileRewrite {
                    file: path.clone(),
                    changes,
                    error: None,
                }
            }
            Err(e) => {
                warn!(file = %path.display(), error = %e, "Listing document left unchanged");
                FileRewrite {
                    file: path.clone(),
                    changes: 0,
                    error: Some(e.to_string()),
                }
            }
        };
        results.push(result);
    }
    results
}

async fn rewrite_one<F>(path: &Path, transform: &F) -> ListingResult<usize>
where
    F: Fn(&str) -> std::result::Result<(String, usize), RewritingError>,
{
    let html = fs::read_to_string(path)
        .await
        .map_err(|source| ListingError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    let (rewritten, changes) = transform(&html).map_err(|source| ListingError::Rewrite {
        path: path.to_path_buf(),
        source,
    })?;
    if changes > 0 {
        write_whole_file(path, &rewritten).await?;
    }
    Ok(changes)
}

#[derive(Default)]
struct CardScan {
    card: ListingCard,
    titles: usize,
    companies: usize,
    locations: usize,
    link_seen: bool,
    title: String,
    company: String,
    location: String,
}

impl CardScan {
    fn finish(mut self) -> ListingCard {
        self.card.title = normalize_text(&self.title);
        self.card.company = normalize_text(&self.company);
        self.card.location = normalize_text(&self.location);
        self.card
    }
}

pub(crate) fn normalize_text(raw: &str) -> Option<String> {
    let decoded = decode_html_entities(raw);
    let collapsed = decoded.split_whitespace().collect::<Vec<_>>().join(" ");
    (!collapsed.is_empty()).then_some(collapsed)
}

/// Classify every card of a listing document, in document order.
pub fn scan_cards(html: &str) -> std::result::Result<Vec<ListingCard>, RewritingError> {
    let scans: RefCell<Vec<CardScan>> = RefCell::new(Vec::new());

    let mut rewriter = HtmlRewriter::new(
        Settings {
            element_content_handlers: vec![
                element!(CARD_SELECTOR, |_el| {
                    let mut scans = scans.borrow_mut();
                    let index = scans.len();
                    scans.push(CardScan {
                        card: ListingCard {
                            index,
                            ..ListingCard::default()
                        },
                        ..CardScan::default()
                    });
                    Ok(())
                }),
                element!(TITLE_SELECTOR, |_el| {
                    if let Some(scan) = scans.borrow_mut().last_mut() {
                        scan.titles += 1;
                    }
                    Ok(())
                }),
                text!(TITLE_SELECTOR, |t| {
                    if let Some(scan) = scans.borrow_mut().last_mut() {
                        if scan.titles == 1 {
                            scan.title.push_str(t.as_str());
                        }
                    }
                    Ok(())
                }),
                element!(COMPANY_SELECTOR, |_el| {
                    if let Some(scan) = scans.borrow_mut().last_mut() {
                        scan.companies += 1;
                    }
                    Ok(())
                }),
                text!(COMPANY_SELECTOR, |t| {
                    if let Some(scan) = scans.borrow_mut().last_mut() {
                        if scan.companies == 1 {
                            scan.company.push_str(t.as_str());
                        }
                    }
                    Ok(())
                }),
                element!(LOCATION_SELECTOR, |_el| {
                    if let Some(scan) = scans.borrow_mut().last_mut() {
                        scan.locations += 1;
                    }
                    Ok(())
                }),
                text!(LOCATION_SELECTOR, |t| {
                    if let Some(scan) = scans.borrow_mut().last_mut() {
                        if scan.locations == 1 {
                            scan.location.push_str(t.as_str());
                        }
                    }
                    Ok(())
                }),
                element!(LINK_SELECTOR, |el| {
                    if let Some(scan) = scans.borrow_mut().last_mut() {
                        // Only the card's first link identifies it
                        if !scan.link_seen {
                            scan.link_seen = true;
                            scan.card.reference = el
                                .get_attribute("href")
                                .and_then(|href| {
                                    DetailReference::parse(&decode_html_entities(&href))
                                });
                        }
                    }
                    Ok(())
                }),
                element!(ENRICHED_SELECTOR, |_el| {
                    if let Some(scan) = scans.borrow_mut().last_mut() {
                        scan.card.is_enriched = true;
                    }
                    Ok(())
                }),
            ],
            ..Settings::default()
        },
        NoopSink,
    );

    rewriter.write(html.as_bytes())?;
    rewriter.end()?;

    Ok(scans.into_inner().into_iter().map(CardScan::finish).collect())
}

/// Output of [`apply_plans`].
#[derive(Debug, Clone)]
pub struct Rewritten {
    pub html: String,
    pub head_found: bool,
    pub body_found: bool,
    /// Page-level artifacts from earlier runs that were dropped
    pub removed_artifacts: usize,
}

#[derive(Default)]
struct ApplyState {
    next_card: usize,
    head_found: bool,
    body_found: bool,
    removed: usize,
}

/// Rewrite a listing document: drop removable artifacts, execute one plan per
/// card (by index) and attach fresh style/script blocks.
///
/// A document without `<head>` or `<body>` still gets its card injections.
pub fn apply_plans(
    html: &str,
    plans: &[CardPlan],
    banner_text: &str,
) -> std::result::Result<Rewritten, RewritingError> {
    let state = RefCell::new(ApplyState::default());
    let banner = presentation::stale_banner(banner_text);
    let style = presentation::style_block();
    let script = presentation::script_block();

    let mut handlers = Vec::new();

    for artifact in Artifact::removable() {
        handlers.push(element!(artifact.selector(), |el| {
            let class = el.get_attribute("class");
            let provenance = classify(
                &el.tag_name(),
                class.as_deref(),
                el.has_attribute(OWNERSHIP_ATTR),
            );
            if provenance == Provenance::GeneratedRemovable {
                el.remove();
                state.borrow_mut().removed += 1;
            }
            Ok(())
        }));
    }

    handlers.push(element!(CARD_SELECTOR, |el| {
        let index = {
            let mut state = state.borrow_mut();
            let index = state.next_card;
            state.next_card += 1;
            index
        };

        if let Some(CardPlan::Inject { paragraphs, stale }) = plans.get(index) {
            if *stale {
                el.prepend(&banner, ContentType::Html);
            }
            el.append(&presentation::description_container(paragraphs), ContentType::Html);
        }
        Ok(())
    }));

    handlers.push(element!("head", |el| {
        let mut state = state.borrow_mut();
        if !state.head_found {
            state.head_found = true;
            el.append(&style, ContentType::Html);
        }
        Ok(())
    }));

    handlers.push(element!("body", |el| {
        let mut state = state.borrow_mut();
        if !state.body_found {
            state.body_found = true;
            el.append(&script, ContentType::Html);
        }
        Ok(())
    }));

    let html = rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: handlers,
            ..RewriteStrSettings::default()
        },
    )?;

    let state = state.into_inner();
    Ok(Rewritten {
        html,
        head_found: state.head_found,
        body_found: state.body_found,
        removed_artifacts: state.removed,
    })
}

pub(crate) struct NoopSink;

impl OutputSink for NoopSink {
    fn handle_chunk(&mut self, _chunk: &[u8]) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r##"<html><head><title>Empleos</title></head><body>
<article class="box_offer"><h2><a href="/ofertas-de-trabajo/oferta-de-trabajo-de-dev-1#lc=x">Dev &amp; Ops</a></h2><p>Acme</p><p>Palermo, Buenos Aires</p></article>
<article class="box_offer sel"><h2><a href="/ofertas-de-trabajo/oferta-de-trabajo-de-qa-2">QA</a></h2><div class="descripcion_scrapeada"><p>hecho</p></div></article>
<article class="box_offer"><h2>Sin link</h2></article>
</body></html>"##;

    #[test]
    fn test_scan_cards() {
        let cards = scan_cards(PAGE).unwrap();
        assert_eq!(cards.len(), 3);

        assert_eq!(cards[0].index, 0);
        assert_eq!(cards[0].title.as_deref(), Some("Dev & Ops"));
        assert_eq!(cards[0].company.as_deref(), Some("Acme"));
        assert_eq!(cards[0].location.as_deref(), Some("Palermo, Buenos Aires"));
        assert_eq!(
            cards[0].reference.as_ref().map(|r| r.as_str()),
            Some("/ofertas-de-trabajo/oferta-de-trabajo-de-dev-1")
        );
        assert!(!cards[0].is_enriched);

        assert!(cards[1].is_enriched);
        assert!(cards[2].reference.is_none());
        assert_eq!(cards[2].company, None);
    }

    #[test]
    fn test_apply_injects_and_leaves_other_cards_alone() {
        let plans = vec![
            CardPlan::Inject {
                paragraphs: vec!["Primera".into(), "- Rust".into()],
                stale: false,
            },
            CardPlan::Skip,
            CardPlan::Inject {
                paragraphs: vec!["No disponible".into()],
                stale: true,
            },
        ];

        let out = apply_plans(PAGE, &plans, "Ya no existe").unwrap();
        assert!(out.head_found && out.body_found);

        assert!(out.html.contains(
            "Palermo, Buenos Aires</p><div class=\"descripcion_scrapeada\">\
             <p>Primera</p><p>- Rust</p></div></article>"
        ));
        assert!(out.html.contains(
            "<article class=\"box_offer sel\">\
             <h2><a href=\"/ofertas-de-trabajo/oferta-de-trabajo-de-qa-2\">QA</a></h2>\
             <div class=\"descripcion_scrapeada\"><p>hecho</p></div></article>"
        ));
        assert!(out.html.contains(
            "<article class=\"box_offer\"><div class=\"aviso_sin_descripcion\">Ya no existe</div>\
             <h2>Sin link</h2>"
        ));
        assert!(out.html.contains("<style data-custom-ofertas=\"1\">"));
        assert!(out.html.contains("</script></body>"));
    }

    #[test]
    fn test_page_artifacts_are_replaced_not_duplicated() {
        let plans = vec![CardPlan::Skip; 3];
        let first = apply_plans(PAGE, &plans, "x").unwrap();
        let second = apply_plans(&first.html, &plans, "x").unwrap();

        assert_eq!(first.removed_artifacts, 0);
        assert_eq!(second.removed_artifacts, 2);
        assert_eq!(first.html, second.html);
        assert_eq!(second.html.matches("data-custom-ofertas").count(), 2);
    }

    #[test]
    fn test_unmarked_site_scripts_survive() {
        let html =
            "<html><head><style>.site{}</style></head><body><script>site()</script></body></html>";
        let out = apply_plans(html, &[], "x").unwrap();

        assert!(out.html.contains("<style>.site{}</style>"));
        assert!(out.html.contains("<script>site()</script>"));
        assert_eq!(out.removed_artifacts, 0);
    }

    #[test]
    fn test_missing_head_and_body_still_injects_cards() {
        let fragment = r#"<article class="box_offer"><h2>Solo</h2></article>"#;
        let plans = vec![CardPlan::Inject {
            paragraphs: vec!["Texto".into()],
            stale: false,
        }];

        let out = apply_plans(fragment, &plans, "x").unwrap();
        assert!(!out.head_found);
        assert!(!out.body_found);
        assert_eq!(
            out.html,
            "<article class=\"box_offer\"><h2>Solo</h2>\
             <div class=\"descripcion_scrapeada\"><p>Texto</p></div></article>"
        );
    }

    #[tokio::test]
    async fn test_collect_listing_files_sorts_and_caps() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "buenos_aires_p3.html",
            "buenos_aires_p1.html",
            "buenos_aires_p2.html",
            "cordoba_p1.html",
            "buenos_aires_p1.txt",
        ] {
            std::fs::write(dir.path().join(name), "<html></html>").unwrap();
        }

        let config = EnrichConfig::default()
            .with_dirs(dir.path(), dir.path().join("cache"))
            .with_max_pages(2);
        let files = collect_listing_files(&config).await.unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();

        assert_eq!(names, vec!["buenos_aires_p1.html", "buenos_aires_p2.html"]);
    }

    #[tokio::test]
    async fn test_missing_listing_dir_is_fatal() {
        let config = EnrichConfig::default().with_dirs("/nonexistent/listings", "/tmp/cache");
        assert!(matches!(
            collect_listing_files(&config).await,
            Err(EnrichError::ListingDir { .. })
        ));
    }
}

//! Head normalizer for listing documents archived from other provinces.
//!
//! Drops head scripts, preconnect and canonical links, and tag-manager links,
//! and points remote font links at the local `../CSS/` copies. The
//! web-push bundle script is dropped wherever it appears.

use lol_html::errors::RewritingError;
use lol_html::{element, rewrite_str, RewriteStrSettings};
use std::cell::RefCell;
use tracing::info;

use crate::config::EnrichConfig;
use crate::error::Result;
use crate::listing::{all_listing_files, rewrite_listing_files};
use crate::types::report::FileRewrite;

const LOCAL_FONTS: [&str; 3] = ["CTFont_xs.woff2", "ct_regular_font.woff2", "ct_bold_font.woff2"];
const LOCAL_FONT_DIR: &str = "../CSS/";
const DROPPED_RELS: [&str; 2] = ["preconnect", "canonical"];
const TAG_MANAGER_HOST: &str = "googletagmanager.com";
const WEBPUSH_BUNDLE: &str = "webpush.bundle.min.js";

/// Output of [`normalize_head`].
#[derive(Debug, Clone, Default)]
pub struct HeadCleanup {
    pub html: String,
    pub head_found: bool,
    pub removed_scripts: usize,
    pub removed_links: usize,
    pub relinked_fonts: usize,
}

impl HeadCleanup {
    pub fn changes(&self) -> usize {
        self.removed_scripts + self.removed_links + self.relinked_fonts
    }
}

#[derive(Default)]
struct Counts {
    head_found: bool,
    removed_scripts: usize,
    removed_links: usize,
    relinked_fonts: usize,
}

enum LinkAction {
    Keep,
    Drop,
    Relink(String),
}

fn link_action(rel: &str, href: &str) -> LinkAction {
    if DROPPED_RELS.iter().any(|r| rel.contains(r)) || href.contains(TAG_MANAGER_HOST) {
        return LinkAction::Drop;
    }
    match LOCAL_FONTS.iter().find(|font| href.contains(*font)) {
        Some(font) => LinkAction::Relink(format!("{}{}", LOCAL_FONT_DIR, font)),
        None => LinkAction::Keep,
    }
}

/// Normalize the head of one document. Documents without a head only lose
/// the web-push script.
pub fn normalize_head(html: &str) -> std::result::Result<HeadCleanup, RewritingError> {
    let counts = RefCell::new(Counts::default());

    let html = rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![
                element!("head", |_el| {
                    counts.borrow_mut().head_found = true;
                    Ok(())
                }),
                element!("head script", |el| {
                    el.remove();
                    counts.borrow_mut().removed_scripts += 1;
                    Ok(())
                }),
                element!("head link", |el| {
                    let rel = el.get_attribute("rel").unwrap_or_default();
                    let href = el.get_attribute("href").unwrap_or_default();
                    match link_action(&rel, href.trim()) {
                        LinkAction::Keep => {}
                        LinkAction::Drop => {
                            el.remove();
                            counts.borrow_mut().removed_links += 1;
                        }
                        LinkAction::Relink(local) => {
                            let changed = href != local || el.has_attribute("rel");
                            el.set_attribute("href", &local)?;
                            el.remove_attribute("rel");
                            if changed {
                                counts.borrow_mut().relinked_fonts += 1;
                            }
                        }
                    }
                    Ok(())
                }),
                element!("body script[src]", |el| {
                    let src = el.get_attribute("src").unwrap_or_default();
                    if src.contains(WEBPUSH_BUNDLE) {
                        el.remove();
                        counts.borrow_mut().removed_scripts += 1;
                    }
                    Ok(())
                }),
            ],
            ..RewriteStrSettings::default()
        },
    )?;

    let counts = counts.into_inner();
    Ok(HeadCleanup {
        html,
        head_found: counts.head_found,
        removed_scripts: counts.removed_scripts,
        removed_links: counts.removed_links,
        relinked_fonts: counts.relinked_fonts,
    })
}

/// Normalize every listing file of the configured directory, ignoring `max_pages`.
pub async fn normalize_head_listings(config: &EnrichConfig) -> Result<Vec<FileRewrite>> {
    let files = all_listing_files(config).await?;
    let results = rewrite_listing_files(&files, |html| {
        normalize_head(html).map(|out| {
            let changes = out.changes();
            (out.html, changes)
        })
    })
    .await;

    info!(
        documents = results.len(),
        changes = results.iter().map(|r| r.changes).sum::<usize>(),
        "Head normalization complete"
    );
    Ok(results)
}

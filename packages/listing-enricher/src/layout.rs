//! Listing-layout reformatter.
//!
//! Rebuilds cards of the old listing layout into the compact one used across
//! provinces (title in `h2.fs18`, company line, extra line, layout stubs).
//! Cards whose first `h2` already carries `fs18` are left untouched.
//! Description containers and stale banners survive the rebuild.

use html_escape::{decode_html_entities, encode_double_quoted_attribute, encode_text};
use lol_html::errors::RewritingError;
use lol_html::html_content::ContentType;
use lol_html::{element, rewrite_str, text, HtmlRewriter, RewriteStrSettings, Settings};
use std::cell::RefCell;
use tracing::info;

use crate::config::EnrichConfig;
use crate::error::Result;
use crate::listing::{
    all_listing_files, normalize_text, rewrite_listing_files, NoopSink, CARD_SELECTOR,
};
use crate::presentation;
use crate::types::report::FileRewrite;

const COMPACT_TITLE_CLASS: &str = "fs18";

const TITLE_SELECTOR: &str = "article.box_offer h2";
const LINK_SELECTOR: &str = "article.box_offer a[href]";
const LINE_SELECTOR: &str = "article.box_offer > p";
const DESCRIPTION_SELECTOR: &str = "article.box_offer div.descripcion_scrapeada";
const PARAGRAPH_SELECTOR: &str = "article.box_offer div.descripcion_scrapeada > p";
const BANNER_SELECTOR: &str = "article.box_offer div.aviso_sin_descripcion";

const TAGS: &str = "<div class=\"tags\">\
<span class=\"tag postulated hide\" applied-offer-tag=\"\">Postulado</span>\
<span class=\"tag hide\" viewed-offer-tag=\"\">Vista</span></div>";

#[derive(Default)]
struct CardLayout {
    titles: usize,
    compact: bool,
    title: String,
    href: Option<String>,
    lines: usize,
    company: String,
    extra: String,
    descriptions: usize,
    paragraphs: Vec<String>,
    banners: usize,
    banner: String,
}

impl CardLayout {
    fn needs_rebuild(&self) -> bool {
        self.titles > 0 && !self.compact
    }

    fn rebuild(&self) -> String {
        let href = self
            .href
            .as_deref()
            .map(|raw| decode_html_entities(raw.trim()).to_string())
            .unwrap_or_else(|| "#".to_string());
        let title = normalize_text(&self.title).unwrap_or_default();
        let company = normalize_text(&self.company).unwrap_or_default();
        let extra = normalize_text(&self.extra).unwrap_or_default();

        let mut html = String::new();
        if self.banners > 0 {
            let text = normalize_text(&self.banner).unwrap_or_default();
            html.push_str(&presentation::stale_banner(&text));
        }
        html.push_str("<div class=\"list_dot mb15\"></div>");
        html.push_str(&format!(
            "<h2 class=\"fs18 fwB prB\"><a class=\"js-o-link fc_base\" href=\"{}\">{}</a>{}</h2>",
            encode_double_quoted_attribute(&href),
            encode_text(&title),
            TAGS
        ));
        html.push_str(&format!(
            "<p class=\"dFlex vm_fx fs16 fc_base mt5\">{}</p>",
            encode_text(&company)
        ));
        html.push_str(&format!(
            "<p class=\"fs16 fc_base mt5\"><span class=\"mr10\">{}</span></p>",
            encode_text(&extra)
        ));
        html.push_str("<p class=\"fs13 fc_aux mt15\"></p>");
        html.push_str("<div class=\"opt_dots\"></div>");
        if self.descriptions > 0 {
            let paragraphs: Vec<String> = self
                .paragraphs
                .iter()
                .map(|p| decode_html_entities(p).to_string())
                .collect();
            html.push_str(&presentation::description_container(&paragraphs));
        }
        html
    }
}

/// Output of [`reformat_cards`].
#[derive(Debug, Clone)]
pub struct Reformatted {
    pub html: String,
    pub reformatted: usize,
    pub already_compact: usize,
}

fn scan_layouts(html: &str) -> std::result::Result<Vec<CardLayout>, RewritingError> {
    let layouts: RefCell<Vec<CardLayout>> = RefCell::new(Vec::new());

    let mut rewriter = HtmlRewriter::new(
        Settings {
            element_content_handlers: vec![
                element!(CARD_SELECTOR, |_el| {
                    layouts.borrow_mut().push(CardLayout::default());
                    Ok(())
                }),
                element!(TITLE_SELECTOR, |el| {
                    if let Some(card) = layouts.borrow_mut().last_mut() {
                        card.titles += 1;
                        if card.titles == 1 {
                            card.compact = el
                                .get_attribute("class")
                                .map(|c| c.split_whitespace().any(|t| t == COMPACT_TITLE_CLASS))
                                .unwrap_or(false);
                        }
                    }
                    Ok(())
                }),
                text!(TITLE_SELECTOR, |t| {
                    if let Some(card) = layouts.borrow_mut().last_mut() {
                        if card.titles == 1 {
                            card.title.push_str(t.as_str());
                        }
                    }
                    Ok(())
                }),
                element!(LINK_SELECTOR, |el| {
                    if let Some(card) = layouts.borrow_mut().last_mut() {
                        if card.href.is_none() {
                            card.href = el.get_attribute("href");
                        }
                    }
                    Ok(())
                }),
                element!(LINE_SELECTOR, |_el| {
                    if let Some(card) = layouts.borrow_mut().last_mut() {
                        card.lines += 1;
                    }
                    Ok(())
                }),
                text!(LINE_SELECTOR, |t| {
                    if let Some(card) = layouts.borrow_mut().last_mut() {
                        match card.lines {
                            1 => card.company.push_str(t.as_str()),
                            2 => card.extra.push_str(t.as_str()),
                            _ => {}
                        }
                    }
                    Ok(())
                }),
                element!(DESCRIPTION_SELECTOR, |_el| {
                    if let Some(card) = layouts.borrow_mut().last_mut() {
                        card.descriptions += 1;
                    }
                    Ok(())
                }),
                element!(PARAGRAPH_SELECTOR, |_el| {
                    if let Some(card) = layouts.borrow_mut().last_mut() {
                        if card.descriptions == 1 {
                            card.paragraphs.push(String::new());
                        }
                    }
                    Ok(())
                }),
                text!(PARAGRAPH_SELECTOR, |t| {
                    if let Some(card) = layouts.borrow_mut().last_mut() {
                        if card.descriptions == 1 {
                            if let Some(p) = card.paragraphs.last_mut() {
                                p.push_str(t.as_str());
                            }
                        }
                    }
                    Ok(())
                }),
                element!(BANNER_SELECTOR, |_el| {
                    if let Some(card) = layouts.borrow_mut().last_mut() {
                        card.banners += 1;
                    }
                    Ok(())
                }),
                text!(BANNER_SELECTOR, |t| {
                    if let Some(card) = layouts.borrow_mut().last_mut() {
                        if card.banners == 1 {
                            card.banner.push_str(t.as_str());
                        }
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
    Ok(layouts.into_inner())
}

/// Rebuild every old-layout card of a listing document.
///
/// Cards without an `h2` are skipped, as is everything outside the cards.
pub fn reformat_cards(html: &str) -> std::result::Result<Reformatted, RewritingError> {
    let layouts = scan_layouts(html)?;
    let rebuilt: Vec<Option<String>> = layouts
        .iter()
        .map(|card| card.needs_rebuild().then(|| card.rebuild()))
        .collect();
    let reformatted = rebuilt.iter().filter(|r| r.is_some()).count();
    let already_compact = layouts.iter().filter(|c| c.compact).count();

    if reformatted == 0 {
        return Ok(Reformatted {
            html: html.to_string(),
            reformatted,
            already_compact,
        });
    }

    let next_card = RefCell::new(0usize);
    let html = rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![element!(CARD_SELECTOR, |el| {
                let index = {
                    let mut next = next_card.borrow_mut();
                    let index = *next;
                    *next += 1;
                    index
                };
                if let Some(Some(inner)) = rebuilt.get(index) {
                    el.set_inner_content(inner, ContentType::Html);
                }
                Ok(())
            })],
            ..RewriteStrSettings::default()
        },
    )?;

    Ok(Reformatted {
        html,
        reformatted,
        already_compact,
    })
}

/// Reformat every listing file of the configured directory, ignoring `max_pages`.
pub async fn reformat_listings(config: &EnrichConfig) -> Result<Vec<FileRewrite>> {
    let files = all_listing_files(config).await?;
    let results = rewrite_listing_files(&files, |html| {
        reformat_cards(html).map(|out| (out.html, out.reformatted))
    })
    .await;

    info!(
        documents = results.len(),
        cards = results.iter().map(|r| r.changes).sum::<usize>(),
        "Layout reformat complete"
    );
    Ok(results)
}

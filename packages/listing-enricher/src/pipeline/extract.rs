//! Heuristic job-description extraction.
//!
//! Detail pages carry no reliable container for the description, so the
//! extractor scores every `<div>` by its visible text and keeps the longest
//! one that is neither too short nor cookie/privacy boilerplate. It can pick
//! the wrong block on unusual layouts; that is accepted.

use scraper::{ElementRef, Html, Node, Selector};

/// Blocks shorter than this (in characters) are never descriptions.
pub const MIN_DESCRIPTION_CHARS: usize = 300;

/// Lowercased markers of consent and policy boilerplate.
pub const BOILERPLATE_MARKERS: &[&str] = &["cookies", "política de privacidad"];

const CANDIDATE_SELECTOR: &str = "div";

/// Elements whose text is not visible content.
const HIDDEN_TEXT_PARENTS: &[&str] = &["script", "style", "noscript", "template"];

#[derive(Debug, Clone)]
pub struct DescriptionExtractor {
    min_chars: usize,
    markers: Vec<String>,
}

impl Default for DescriptionExtractor {
    fn default() -> Self {
        Self {
            min_chars: MIN_DESCRIPTION_CHARS,
            markers: BOILERPLATE_MARKERS.iter().map(|m| m.to_string()).collect(),
        }
    }
}

impl DescriptionExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Minimum length, in characters, of a qualifying block.
    pub fn with_min_chars(mut self, min_chars: usize) -> Self {
        self.min_chars = min_chars;
        self
    }

    /// Replace the boilerplate markers.
    pub fn with_markers<I, S>(mut self, markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.markers = markers.into_iter().map(|m| m.into().to_lowercase()).collect();
        self
    }

    /// Score a block by its flattened visible text.
    ///
    /// `None` disqualifies the block; otherwise the score is its length in characters.
    pub fn score(&self, block_text: &str) -> Option<usize> {
        let len = block_text.chars().count();
        if len < self.min_chars {
            return None;
        }

        let lowered = block_text.to_lowercase();
        if self.markers.iter().any(|m| lowered.contains(m.as_str())) {
            return None;
        }

        Some(len)
    }

    /// Plain-text description of a detail document, or an empty string.
    ///
    /// Text nodes of the winning block are trimmed and joined with newlines.
    pub fn extract(&self, html: &str) -> String {
        let document = Html::parse_document(html);
        let selector = match Selector::parse(CANDIDATE_SELECTOR) {
            Ok(s) => s,
            Err(_) => return String::new(),
        };

        let mut best: Option<(usize, ElementRef)> = None;
        for block in document.select(&selector) {
            let flattened = visible_text(block).join(" ");
            if let Some(score) = self.score(&flattened) {
                // Strictly greater: ties go to the first block
                if best.map(|(top, _)| score > top).unwrap_or(true) {
                    best = Some((score, block));
                }
            }
        }

        best.map(|(_, block)| visible_text(block).join("\n"))
            .unwrap_or_default()
    }
}

/// Trimmed, non-empty visible text nodes under `element`, in document order.
fn visible_text(element: ElementRef<'_>) -> Vec<&str> {
    element
        .descendants()
        .filter_map(|node| {
            let text = match node.value() {
                Node::Text(text) => &**text,
                _ => return None,
            };

            let hidden = node
                .parent()
                .and_then(|p| p.value().as_element().map(|e| e.name()))
                .map(|name| HIDDEN_TEXT_PARENTS.contains(&name))
                .unwrap_or(false);
            if hidden {
                return None;
            }

            let trimmed = text.trim();
            (!trimmed.is_empty()).then_some(trimmed)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(n: usize) -> String {
        "lorem ".repeat(n).trim().to_string()
    }

    #[test]
    fn test_score_threshold() {
        let extractor = DescriptionExtractor::new();
        assert_eq!(extractor.score(&"a".repeat(299)), None);
        assert_eq!(extractor.score(&"a".repeat(300)), Some(300));
    }

    #[test]
    fn test_score_counts_characters_not_bytes() {
        let extractor = DescriptionExtractor::new();
        // 'ñ' is two bytes in UTF-8
        assert_eq!(extractor.score(&"ñ".repeat(299)), None);
        assert_eq!(extractor.score(&"ñ".repeat(300)), Some(300));
    }

    #[test]
    fn test_score_rejects_boilerplate() {
        let extractor = DescriptionExtractor::new();
        let cookies = format!("{} Usamos COOKIES para mejorar", words(80));
        let privacy = format!("{} Ver Política de Privacidad", words(80));

        assert_eq!(extractor.score(&cookies), None);
        assert_eq!(extractor.score(&privacy), None);
    }

    #[test]
    fn test_short_only_block_yields_empty() {
        let html = "<html><body><div>Desarrollador Rust, jornada completa.</div></body></html>";
        assert_eq!(DescriptionExtractor::new().extract(html), "");
    }

    #[test]
    fn test_longest_non_boilerplate_block_wins() {
        let description = words(70);
        let cookie_banner = format!("Este sitio usa cookies. {}", words(200));
        let html = format!(
            "<html><body>\
             <div id=\"banner\">{cookie_banner}</div>\
             <section><div id=\"desc\">{description}</div></section>\
             </body></html>"
        );

        assert_eq!(DescriptionExtractor::new().extract(&html), description);
    }

    #[test]
    fn test_outer_wrapper_wins_when_it_qualifies() {
        let html = format!(
            "<div id=\"outer\"><h1>Titulo</h1><div id=\"inner\">{}</div></div>",
            words(70)
        );
        let text = DescriptionExtractor::new().extract(&html);
        assert!(text.starts_with("Titulo\n"));
    }

    #[test]
    fn test_tie_goes_to_first_block() {
        let first = "a".repeat(320);
        let second = "b".repeat(320);
        let html = format!("<div>{first}</div><div>{second}</div>");

        assert_eq!(DescriptionExtractor::new().extract(&html), first);
    }

    #[test]
    fn test_text_nodes_become_lines_and_scripts_are_ignored() {
        let html = format!(
            "<div><p>Requisitos:</p><ul><li>- Rust</li><li>- Tokio</li></ul>\
             <script>var tracking = 1;</script><p>{}</p></div>",
            words(60)
        );
        let text = DescriptionExtractor::new().extract(&html);
        let lines: Vec<_> = text.lines().collect();

        assert_eq!(lines[0], "Requisitos:");
        assert_eq!(lines[1], "- Rust");
        assert_eq!(lines[2], "- Tokio");
        assert!(!text.contains("tracking"));
    }

    #[test]
    fn test_custom_threshold_and_markers() {
        let extractor = DescriptionExtractor::new()
            .with_min_chars(5)
            .with_markers(["Newsletter"]);
        assert_eq!(extractor.score("hello world"), Some(11));
        assert_eq!(extractor.score("join our newsletter"), None);
        assert_eq!(extractor.score("use cookies here"), Some(16));
    }
}

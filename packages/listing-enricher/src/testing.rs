//! Fixtures for tests of applications built on this crate.
//!
//! Pair these with [`crate::sources::MockDetailSource`] to exercise a full
//! run without network access.

pub use crate::sources::{MockDetailSource, MockResponse};

/// Filler appended to every fixture description so it clears the length threshold.
const FILLER: &str = "Ofrecemos relación de dependencia, obra social para todo el grupo familiar, \
capacitación continua y un equipo que trabaja con prácticas modernas. Modalidad híbrida con dos \
días presenciales en oficinas de Palermo. Horario de lunes a viernes de 9 a 18 horas. Buscamos \
personas proactivas, con ganas de aprender y compartir conocimiento.";

/// Description text a fixture detail page carries for `lead`.
pub fn description_text(lead: &str) -> String {
    format!("{} {}", lead, FILLER)
}

/// Detail page with a header, a cookie banner and one description block.
///
/// The cookie banner is longer than the description so boilerplate filtering
/// is always exercised.
pub fn detail_page(lead: &str) -> String {
    let banner = format!(
        "Este sitio utiliza cookies para mejorar la experiencia. {} {}",
        FILLER, FILLER
    );
    format!(
        "<!DOCTYPE html><html><head><title>Oferta</title></head><body>\
         <header><div>Computrabajo</div></header>\
         <div class=\"cookie-consent\">{banner}</div>\
         <main><div class=\"box_detail\">{description}</div></main>\
         </body></html>",
        banner = banner,
        description = description_text(lead),
    )
}

/// One card of a fixture listing page.
#[derive(Debug, Clone)]
pub struct TestCard {
    pub href: String,
    pub title: String,
    pub company: String,
    pub location: String,
    /// Pre-attached description paragraphs (an already enriched card)
    pub existing_description: Option<Vec<String>>,
}

impl TestCard {
    pub fn new(href: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            title: title.into(),
            company: "Acme SA".to_string(),
            location: "Palermo, Capital Federal".to_string(),
            existing_description: None,
        }
    }

    pub fn enriched(mut self, paragraphs: &[&str]) -> Self {
        self.existing_description = Some(paragraphs.iter().map(|p| p.to_string()).collect());
        self
    }

    pub fn to_html(&self) -> String {
        let mut html = format!(
            "<article class=\"box_offer\"><h2><a href=\"{}\">{}</a></h2><p>{}</p><p>{}</p>",
            self.href, self.title, self.company, self.location
        );
        if let Some(paragraphs) = &self.existing_description {
            html.push_str("<div class=\"descripcion_scrapeada\">");
            for p in paragraphs {
                html.push_str(&format!("<p>{}</p>", p));
            }
            html.push_str("</div>");
        }
        html.push_str("</article>");
        html
    }
}

/// Listing page with a detail panel and the given cards.
pub fn listing_page(cards: &[TestCard]) -> String {
    let cards: String = cards.iter().map(TestCard::to_html).collect::<Vec<_>>().join("\n");
    format!(
        "<!DOCTYPE html>\n<html lang=\"es\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>Empleos en Buenos Aires</title>\n</head>\n\
         <body>\n<div class=\"box_grid\">\n{cards}\n</div>\n\
         <div data-offers-grid-box-detail>\
         <div data-offers-grid-detail-container class=\"hide\"></div></div>\n\
         </body>\n</html>\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::extract::DescriptionExtractor;

    #[test]
    fn test_detail_page_extracts_description_not_banner() {
        let html = detail_page("Buscamos desarrollador Rust.");
        let text = DescriptionExtractor::new().extract(&html);
        assert_eq!(text, description_text("Buscamos desarrollador Rust."));
    }

    #[test]
    fn test_listing_page_cards_scan() {
        let html = listing_page(&[
            TestCard::new("/ofertas-de-trabajo/oferta-de-trabajo-de-a-1", "A"),
            TestCard::new("/ofertas-de-trabajo/oferta-de-trabajo-de-b-2", "B").enriched(&["Listo"]),
        ]);
        let cards = crate::listing::scan_cards(&html).unwrap();

        assert_eq!(cards.len(), 2);
        assert!(!cards[0].is_enriched);
        assert!(cards[1].is_enriched);
        assert_eq!(cards[0].company.as_deref(), Some("Acme SA"));
    }

    #[test]
    fn test_mock_source_is_reexported() {
        use crate::traits::source::DetailSource;

        let mock = MockDetailSource::new().with_body("https://example.com/x", "X");
        let url = url::Url::parse("https://example.com/x").unwrap();
        let body = tokio_test::block_on(mock.fetch(&url)).unwrap();
        assert_eq!(body, "X");
    }
}

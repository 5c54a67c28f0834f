//! Provenance of nodes the enricher writes into listing documents.

use serde::Serialize;

/// Attribute carried by regenerated page-level nodes.
pub const OWNERSHIP_ATTR: &str = "data-custom-ofertas";

pub const DESCRIPTION_CLASS: &str = "descripcion_scrapeada";
pub const BANNER_CLASS: &str = "aviso_sin_descripcion";

/// Who authored a node and whether a later run may remove it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Site markup; never touched.
    Original,
    /// Written by the enricher and recreated from scratch on every run.
    GeneratedRemovable,
    /// Written by the enricher once and kept forever; marks a card as enriched.
    GeneratedPermanent,
}

/// Nodes the enricher knows how to recognise and emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Artifact {
    DescriptionContainer,
    StaleBanner,
    Style,
    Script,
}

impl Artifact {
    pub const ALL: [Artifact; 4] = [
        Artifact::DescriptionContainer,
        Artifact::StaleBanner,
        Artifact::Style,
        Artifact::Script,
    ];

    pub fn provenance(self) -> Provenance {
        match self {
            Artifact::DescriptionContainer | Artifact::StaleBanner => {
                Provenance::GeneratedPermanent
            }
            Artifact::Style | Artifact::Script => Provenance::GeneratedRemovable,
        }
    }

    /// CSS selector matching this artifact in a document.
    pub fn selector(self) -> &'static str {
        match self {
            Artifact::DescriptionContainer => "div.descripcion_scrapeada",
            Artifact::StaleBanner => "div.aviso_sin_descripcion",
            Artifact::Style => "style[data-custom-ofertas]",
            Artifact::Script => "script[data-custom-ofertas]",
        }
    }

    /// Artifacts a run removes before writing fresh copies.
    pub fn removable() -> impl Iterator<Item = Artifact> {
        Self::ALL
            .into_iter()
            .filter(|a| a.provenance() == Provenance::GeneratedRemovable)
    }
}

/// Classify an element by its tag name and attributes.
pub fn classify(tag: &str, class: Option<&str>, has_ownership_attr: bool) -> Provenance {
    let has_class = |wanted: &str| {
        class
            .map(|c| c.split_ascii_whitespace().any(|token| token == wanted))
            .unwrap_or(false)
    };

    match tag {
        "style" | "script" if has_ownership_attr => Provenance::GeneratedRemovable,
        "div" if has_class(DESCRIPTION_CLASS) || has_class(BANNER_CLASS) => {
            Provenance::GeneratedPermanent
        }
        _ => Provenance::Original,
    }
}

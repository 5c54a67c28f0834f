//! Detail-link harvesting from local listing documents.

use indexmap::IndexSet;
use scraper::{Html, Selector};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

use crate::types::reference::DetailReference;

/// References found across a set of listing documents.
#[derive(Debug, Clone, Default)]
pub struct Harvest {
    /// Unique references in first-seen order
    pub references: Vec<DetailReference>,
    /// Documents that could not be read
    pub skipped: Vec<PathBuf>,
}

/// Detail references in one listing document, deduplicated, in document order.
pub fn references_in_document(html: &str, pattern: &str) -> Vec<DetailReference> {
    let document = Html::parse_document(html);
    let link_selector = match Selector::parse("a[href]") {
        Ok(s) => s,
        Err(_) => return vec![],
    };

    let unique: IndexSet<DetailReference> = document
        .select(&link_selector)
        .filter_map(|el| el.value().attr("href"))
        .filter_map(DetailReference::parse)
        .filter(|reference| reference.matches(pattern))
        .collect();

    unique.into_iter().collect()
}

/// Collect detail references from `files`, deduplicated across documents.
///
/// Unreadable documents are logged and skipped. No network or cache access.
pub async fn harvest_references(files: &[PathBuf], pattern: &str) -> Harvest {
    let mut seen: IndexSet<DetailReference> = IndexSet::new();
    let mut skipped = Vec::new();

    for path in files {
        match read_listing(path).await {
            Ok(html) => {
                let found = references_in_document(&html, pattern);
                debug!(file = %path.display(), links = found.len(), "Scanned listing document");
                seen.extend(found);
            }
            Err(e) => {
                warn!(file = %path.display(), error = %e, "Skipping unreadable listing document");
                skipped.push(path.clone());
            }
        }
    }

    info!(
        documents = files.len(),
        skipped = skipped.len(),
        references = seen.len(),
        "Harvested detail references"
    );

    Harvest {
        references: seen.into_iter().collect(),
        skipped,
    }
}

async fn read_listing(path: &Path) -> std::io::Result<String> {
    fs::read_to_string(path).await
}

#[cfg(test)]
mod tests {
    use super::*;

    const PATTERN: &str = "/ofertas-de-trabajo/oferta-de-trabajo-de-";

    #[test]
    fn test_only_detail_links_qualify() {
        let html = r##"
            <a href="/ofertas-de-trabajo/oferta-de-trabajo-de-dev-1">Dev</a>
            <a href="/empresas/acme">Acme</a>
            <a href="/ofertas-de-trabajo/?p=2">Next</a>
            <a>No href</a>
        "##;

        let refs = references_in_document(html, PATTERN);
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].as_str(), "/ofertas-de-trabajo/oferta-de-trabajo-de-dev-1");
    }

    #[test]
    fn test_fragment_variants_collapse_in_first_seen_order() {
        let html = r##"
            <a href="/ofertas-de-trabajo/oferta-de-trabajo-de-b-2#lc=1">B</a>
            <a href="/ofertas-de-trabajo/oferta-de-trabajo-de-a-1">A</a>
            <a href=" /ofertas-de-trabajo/oferta-de-trabajo-de-b-2 ">B again</a>
            <a href="/ofertas-de-trabajo/oferta-de-trabajo-de-a-1#lc=9">A again</a>
        "##;

        let refs: Vec<_> = references_in_document(html, PATTERN)
            .into_iter()
            .map(|r| r.as_str().to_string())
            .collect();
        assert_eq!(
            refs,
            vec![
                "/ofertas-de-trabajo/oferta-de-trabajo-de-b-2",
                "/ofertas-de-trabajo/oferta-de-trabajo-de-a-1",
            ]
        );
    }

    #[tokio::test]
    async fn test_harvest_dedups_across_documents_and_skips_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let p1 = dir.path().join("buenos_aires_p1.html");
        let p2 = dir.path().join("buenos_aires_p2.html");
        let missing = dir.path().join("buenos_aires_p3.html");
        let not_utf8 = dir.path().join("buenos_aires_p4.html");

        std::fs::write(
            &p1,
            r#"<a href="/ofertas-de-trabajo/oferta-de-trabajo-de-x-1">X</a>"#,
        )
        .unwrap();
        std::fs::write(
            &p2,
            r#"<a href="/ofertas-de-trabajo/oferta-de-trabajo-de-x-1#lc=2">X</a>
               <a href="/ofertas-de-trabajo/oferta-de-trabajo-de-y-2">Y</a>"#,
        )
        .unwrap();
        std::fs::write(&not_utf8, [0xff, 0xfe, 0x00]).unwrap();

        let harvest =
            harvest_references(&[p1, p2, missing.clone(), not_utf8.clone()], PATTERN).await;

        assert_eq!(harvest.references.len(), 2);
        assert_eq!(harvest.skipped, vec![missing, not_utf8]);
    }
}

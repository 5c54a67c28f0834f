//! Integration tests for full enrichment runs over a temp listing directory.
//!
//! Detail pages come from `MockDetailSource`; everything else touches the
//! real filesystem.

mod common;

use common::{detail_href, detail_url, Workspace};
use listing_enricher::testing::{detail_page, TestCard};
use listing_enricher::{
    run, DetailCache, DetailReference, EnrichError, ItemOutcome, MockDetailSource,
};

fn count(haystack: &str, needle: &str) -> usize {
    haystack.matches(needle).count()
}

/// The `<article>...</article>` markup of the card linking to `href`.
fn card_slice<'a>(html: &'a str, href: &str) -> &'a str {
    let at = html.find(&format!("href=\"{}\"", href)).unwrap();
    let start = html[..at].rfind("<article").unwrap();
    let end = at + html[at..].find("</article>").unwrap() + "</article>".len();
    &html[start..end]
}

#[tokio::test]
async fn test_run_enriches_pending_cards_and_marks_missing_ones() {
    let ws = Workspace::new();
    let path = ws.write_listing(
        1,
        &[
            TestCard::new(detail_href("done-1"), "Hecha").enriched(&["Descripción previa"]),
            TestCard::new(detail_href("gone-2"), "Vencida"),
            TestCard::new(detail_href("dev-3"), "Desarrollador"),
        ],
    );
    let done_before = card_slice(&ws.read(&path), &detail_href("done-1")).to_string();
    let mock = MockDetailSource::new()
        .with_status(detail_url("gone-2"), 404)
        .with_body(detail_url("dev-3"), detail_page("Buscamos desarrollador Rust."));

    let report = run(&ws.config, mock.clone()).await.unwrap();
    let html = ws.read(&path);

    assert_eq!(card_slice(&html, &detail_href("done-1")), done_before);

    let gone = card_slice(&html, &detail_href("gone-2"));
    assert!(gone.starts_with(
        "<article class=\"box_offer\"><div class=\"aviso_sin_descripcion\">"
    ));
    assert_eq!(count(gone, "class=\"descripcion_scrapeada\""), 1);

    // One pre-existing container, one placeholder, one real description
    assert_eq!(count(&html, "class=\"descripcion_scrapeada\""), 3);
    assert_eq!(count(&html, "class=\"aviso_sin_descripcion\""), 1);
    assert_eq!(count(&html, "Descripción previa"), 1);
    assert!(html.contains("Buscamos desarrollador Rust."));
    assert_eq!(count(&html, "data-custom-ofertas=\"1\""), 2);
    assert!(html.contains("<div data-offers-grid-box-detail>"));

    let document = &report.documents[0];
    assert_eq!(document.total_cards, 3);
    assert_eq!(document.already_enriched, 1);
    assert_eq!(document.injected, 2);
    assert_eq!(document.placeholders, 1);
    assert!(document.error.is_none());

    // Only the fetched detail page is cached
    assert_eq!(ws.cache_files(), 1);
    let cache = DetailCache::new(&ws.config.cache_dir);
    let gone_ref = DetailReference::parse(&detail_href("gone-2")).unwrap();
    assert!(!cache.contains(&gone_ref).await);
    assert_eq!(report.fetched(), 1);
    assert!(report
        .items
        .iter()
        .any(|item| item.reference.as_str() == detail_href("gone-2")
            && matches!(item.outcome, ItemOutcome::Placeholder { .. })));
}

#[tokio::test]
async fn test_second_run_leaves_documents_byte_identical() {
    let ws = Workspace::new();
    let path = ws.write_listing(
        1,
        &[
            TestCard::new(detail_href("gone-1"), "Vencida"),
            TestCard::new(detail_href("dev-2"), "Desarrollador"),
        ],
    );
    let mock = MockDetailSource::new()
        .with_status(detail_url("gone-1"), 404)
        .with_body(detail_url("dev-2"), detail_page("Backend en Rust."));

    run(&ws.config, mock.clone()).await.unwrap();
    let first = ws.read(&path);

    let report = run(&ws.config, mock.clone()).await.unwrap();
    let second = ws.read(&path);

    assert_eq!(first, second);
    assert_eq!(report.injected_cards(), 0);
    assert_eq!(count(&second, "class=\"aviso_sin_descripcion\""), 1);
    assert_eq!(count(&second, "<style data-custom-ofertas=\"1\">"), 1);
    assert_eq!(count(&second, "<script data-custom-ofertas=\"1\">"), 1);
}

#[tokio::test]
async fn test_cached_details_are_not_downloaded_again() {
    let ws = Workspace::new();
    let cards = [
        TestCard::new(detail_href("a-1"), "A"),
        TestCard::new(detail_href("b-2"), "B"),
    ];
    ws.write_listing(1, &cards);
    let mock = MockDetailSource::new()
        .with_body(detail_url("a-1"), detail_page("Oferta A."))
        .with_body(detail_url("b-2"), detail_page("Oferta B."));

    let first = run(&ws.config, mock.clone()).await.unwrap();
    assert_eq!(first.network_calls, 2);

    // Fresh, unenriched copy of the page
    let path = ws.write_listing(1, &cards);
    mock.reset_calls();
    let second = run(&ws.config, mock.clone()).await.unwrap();

    assert_eq!(second.network_calls, 0);
    assert_eq!(mock.call_count(), 0);
    assert_eq!(second.cached(), 2);
    assert!(ws.read(&path).contains("Oferta B."));
}

#[tokio::test]
async fn test_fragment_variants_share_one_download() {
    let ws = Workspace::new();
    let path = ws.write_listing(
        1,
        &[
            TestCard::new(format!("{}#lc=1", detail_href("dup-1")), "Uno"),
            TestCard::new(format!("{}#lc=2", detail_href("dup-1")), "Uno otra vez"),
        ],
    );
    let mock = MockDetailSource::new().with_body(detail_url("dup-1"), detail_page("Duplicada."));

    let report = run(&ws.config, mock.clone()).await.unwrap();

    assert_eq!(mock.calls_to(&detail_url("dup-1")), 1);
    assert_eq!(report.items.len(), 1);
    assert_eq!(count(&ws.read(&path), "Duplicada."), 2);
}

#[tokio::test]
async fn test_cards_missed_by_harvest_are_resolved_live() {
    let mut ws = Workspace::new();
    ws.config.detail_path_pattern = "/no-coincide/".to_string();
    let path = ws.write_listing(1, &[TestCard::new(detail_href("live-1"), "En vivo")]);
    let mock = MockDetailSource::new()
        .with_body(detail_url("live-1"), detail_page("Resuelta en vivo."));

    let report = run(&ws.config, mock.clone()).await.unwrap();

    assert_eq!(report.harvested_references, 0);
    assert_eq!(report.network_calls, 1);
    assert_eq!(report.items.len(), 1);
    assert!(ws.read(&path).contains("Resuelta en vivo."));
}

#[tokio::test]
async fn test_max_pages_limits_processed_documents() {
    let mut ws = Workspace::new();
    ws.config.max_pages = 2;
    let card = TestCard::new(detail_href("x-1"), "X");
    ws.write_listing(1, &[card.clone()]);
    ws.write_listing(2, &[card.clone()]);
    let third = ws.write_listing(3, &[card.clone()]);
    let untouched = ws.read(&third);
    let mock = MockDetailSource::new().with_body(detail_url("x-1"), detail_page("X."));

    let report = run(&ws.config, mock).await.unwrap();

    assert_eq!(report.listing_files, 2);
    assert_eq!(report.documents.len(), 2);
    assert_eq!(ws.read(&third), untouched);
}

#[tokio::test]
async fn test_unreadable_document_does_not_stop_the_run() {
    let ws = Workspace::new();
    let good = ws.write_listing(1, &[TestCard::new(detail_href("ok-1"), "Ok")]);
    let bad = ws.listing_path(2);
    std::fs::write(&bad, [0xff, 0xfe, 0xfd]).unwrap();
    let mock = MockDetailSource::new().with_body(detail_url("ok-1"), detail_page("Funciona."));

    let report = run(&ws.config, mock).await.unwrap();

    assert_eq!(report.skipped_listing_files, vec![bad.clone()]);
    assert_eq!(report.failed_documents(), 1);
    assert!(ws.read(&good).contains("Funciona."));
    assert_eq!(std::fs::read(&bad).unwrap(), vec![0xff, 0xfe, 0xfd]);
}

#[tokio::test]
async fn test_missing_listing_directory_is_fatal() {
    let mut ws = Workspace::new();
    ws.config.listing_dir = ws.root.path().join("no-existe");

    let result = run(&ws.config, MockDetailSource::new()).await;
    assert!(matches!(result, Err(EnrichError::ListingDir { .. })));
}

#[tokio::test]
async fn test_overlong_reference_is_fetched_and_injected() {
    for legacy_cache_names in [false, true] {
        let mut ws = Workspace::new();
        ws.config.legacy_cache_names = legacy_cache_names;
        let slug = format!("{}-9", "desarrollador-backend-senior".repeat(11));
        let path = ws.write_listing(1, &[TestCard::new(detail_href(&slug), "Larga")]);
        let mock =
            MockDetailSource::new().with_body(detail_url(&slug), detail_page("Oferta larga."));

        let report = run(&ws.config, mock.clone()).await.unwrap();

        assert_eq!(mock.call_count(), 1);
        assert_eq!(report.fetched(), 1);
        assert_eq!(report.errors(), 0);
        assert_eq!(ws.cache_files(), 1);
        let html = ws.read(&path);
        assert!(html.contains("Oferta larga."));
        assert_eq!(count(&html, "class=\"aviso_sin_descripcion\""), 0);
    }
}

#[tokio::test]
async fn test_cache_read_failure_leaves_card_pending() {
    let ws = Workspace::new();
    let href = detail_href("roto-1");
    let path = ws.write_listing(1, &[TestCard::new(&href, "Rota")]);
    let before = ws.read(&path);
    // A directory where the entry should be makes the read fail
    let cache = DetailCache::new(&ws.config.cache_dir);
    let reference = DetailReference::parse(&href).unwrap();
    std::fs::create_dir_all(cache.path_for(&reference)).unwrap();
    let mock = MockDetailSource::new().with_body(detail_url("roto-1"), detail_page("Nunca."));

    let report = run(&ws.config, mock.clone()).await.unwrap();
    let html = ws.read(&path);

    assert_eq!(mock.call_count(), 0);
    assert_eq!(report.errors(), 1);
    assert_eq!(report.documents[0].skipped, 1);
    assert_eq!(report.injected_cards(), 0);
    assert_eq!(card_slice(&html, &href), card_slice(&before, &href));
    assert_eq!(count(&html, "class=\"aviso_sin_descripcion\""), 0);
}

#[tokio::test]
async fn test_legacy_named_entries_are_ignored_by_default() {
    let ws = Workspace::new();
    // `oferta-1` and `oferta_1` share the same legacy name
    let old = DetailReference::parse(&detail_href("oferta_1")).unwrap();
    let legacy_name = old.legacy_cache_key().unwrap();
    std::fs::create_dir_all(&ws.config.cache_dir).unwrap();
    std::fs::write(ws.config.cache_dir.join(legacy_name), detail_page("Oferta vieja.")).unwrap();

    let path = ws.write_listing(1, &[TestCard::new(detail_href("oferta-1"), "Nueva")]);
    let mock =
        MockDetailSource::new().with_body(detail_url("oferta-1"), detail_page("Oferta nueva."));

    run(&ws.config, mock.clone()).await.unwrap();
    let html = ws.read(&path);

    assert_eq!(mock.call_count(), 1);
    assert!(html.contains("Oferta nueva."));
    assert!(!html.contains("Oferta vieja."));
    let cache = DetailCache::new(&ws.config.cache_dir);
    let new = DetailReference::parse(&detail_href("oferta-1")).unwrap();
    assert!(cache.contains(&new).await);
    assert_eq!(ws.cache_files(), 2);
}

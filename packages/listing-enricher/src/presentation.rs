//! Markup the enricher writes into listing documents.
//!
//! The browser script reads each card's `h2`, first two `p` elements and the
//! paragraphs of its description container, and renders them into the page's
//! detail panel. Lines starting with `-` or `*` render as bullets.

use html_escape::encode_text;

use crate::types::artifact::{BANNER_CLASS, DESCRIPTION_CLASS, OWNERSHIP_ATTR};

pub const STYLE_CSS: &str = r#".descripcion_scrapeada {
    display: none !important;
    font-weight: normal;
    line-height: 1.4;
    white-space: pre-line;
}

.aviso_sin_descripcion {
    font-size: 12px;
    color: #b3261e;
    font-weight: bold;
    margin-bottom: 6px;
}

[data-offers-grid-loading-container] {
    display: none !important;
}"#;

pub const DETAIL_PANEL_JS: &str = r#"document.addEventListener('DOMContentLoaded', function () {

    const offers = document.querySelectorAll('.box_offer');
    const detailBox = document.querySelector('[data-offers-grid-box-detail]');
    if (!detailBox) return;

    const detailContainer = detailBox.querySelector('[data-offers-grid-detail-container]');
    if (!detailContainer) return;

    offers.forEach(offer => {
        offer.addEventListener('click', () => {

            document.querySelectorAll('.box_offer.sel').forEach(o => o.classList.remove('sel'));
            offer.classList.add('sel');

            const title   = (offer.querySelector('h2') || {}).innerText || '';
            const company = (offer.querySelector('p:nth-of-type(1)') || {}).innerText || '';
            const place   = (offer.querySelector('p:nth-of-type(2)') || {}).innerText || '';
            const descDiv = offer.querySelector('.descripcion_scrapeada');

            if (!descDiv) return;

            const lines = Array.from(descDiv.querySelectorAll('p'))
                .map(p => p.innerText.trim())
                .filter(p => p.length > 0);

            let html = "";

            lines.forEach(line => {
                if (/^\s*[-*]\s+/.test(line)) {
                    const txt = line.replace(/^\s*[-*]\s+/, "");
                    html += `<p style="margin:0 0 8px 0;">• ${txt}</p>`;
                } else {
                    html += `<p style="margin:0 0 10px 0;">${line}</p>`;
                }
            });

            detailContainer.classList.remove('hide');

            detailContainer.innerHTML = `
                <div class="box_border" style="padding:20px;">

                    <h1 class="fs22 fwB" style="margin-bottom:5px;">
                        ${title}
                    </h1>

                    <p class="fwB" style="margin:0;">${company}</p>
                    <p style="margin:0 0 15px 0;">${place}</p>

                    <div style="margin:15px 0;">
                        <button style="
                            background:#0D3878;
                            color:#fff;
                            padding:10px 20px;
                            border-radius:25px;
                            border:none;
                            font-weight:bold;
                            cursor:pointer;">
                            Postularme
                        </button>
                    </div>

                    <div style="font-size:15px; line-height:1.5;">
                        ${html}
                    </div>

                </div>
            `;
        });
    });

    if (offers.length > 0) {
        offers[0].click();
    }
});"#;

/// `<style>` block appended to `<head>`.
pub fn style_block() -> String {
    format!("<style {}=\"1\">{}</style>", OWNERSHIP_ATTR, STYLE_CSS)
}

/// `<script>` block appended to `<body>`.
pub fn script_block() -> String {
    format!("<script {}=\"1\">{}</script>", OWNERSHIP_ATTR, DETAIL_PANEL_JS)
}

/// Description container with one `<p>` per paragraph.
pub fn description_container(paragraphs: &[String]) -> String {
    let mut html = format!("<div class=\"{}\">", DESCRIPTION_CLASS);
    for paragraph in paragraphs {
        html.push_str("<p>");
        html.push_str(&encode_text(paragraph));
        html.push_str("</p>");
    }
    html.push_str("</div>");
    html
}

/// Visible "no longer available" banner.
pub fn stale_banner(text: &str) -> String {
    format!("<div class=\"{}\">{}</div>", BANNER_CLASS, encode_text(text))
}

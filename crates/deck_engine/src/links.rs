use deck_core::is_presentation;
use scraper::{Html, Selector};

/// Hyperlink targets in `html` that plausibly reference a hosted file, in
/// document order.
///
/// A target qualifies when it contains `/files/` or ends in a presentation
/// extension (case-insensitive). Only anchors are considered and the HTML is
/// parsed leniently; malformed markup is ignored.
pub fn extract_candidate_links(html: &str) -> Vec<String> {
    if html.trim().is_empty() {
        return Vec::new();
    }
    let Ok(anchors) = Selector::parse("a[href]") else {
        return Vec::new();
    };
    let fragment = Html::parse_fragment(html);
    let candidates: Vec<String> = fragment
        .select(&anchors)
        .filter_map(|anchor| anchor.value().attr("href"))
        .filter(|href| is_candidate(href))
        .map(str::to_string)
        .collect();
    candidates
}

fn is_candidate(href: &str) -> bool {
    !href.is_empty() && (href.contains("/files/") || is_presentation(href))
}

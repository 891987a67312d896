//! Listing and search page parsing
//!
//! Catalog pages are scanned for `<a href="/anime/<slug>" title="...">`
//! anchors. Search results are richer cards and are read with CSS selectors.

use scraper::{ElementRef, Html};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use utoipa::ToSchema;

use super::{static_regex, static_selector};

// Quoted attribute values are matched whole so a `>` inside a title does not end the tag
static_regex!(ANCHOR_REGEX, r#"(?is)<a\s(?:[^>"']|"[^"]*"|'[^']*')*>"#);
static_regex!(
    HREF_REGEX,
    r#"(?is)\shref\s*=\s*["'](?:https?://[^/"']+)?/anime/([A-Za-z0-9][A-Za-z0-9_-]*)/?["']"#
);
static_regex!(TITLE_REGEX, r#"(?is)\stitle\s*=\s*(?:"([^"]*)"|'([^']*)')"#);
static_regex!(
    SLUG_FROM_HREF_REGEX,
    r"^(?:https?://[^/]+)?/anime/([A-Za-z0-9][A-Za-z0-9_-]*)/?$"
);

static_selector!(CARD_SELECTOR, "article.Anime");
static_selector!(LINK_SELECTOR, "a[href]");
static_selector!(TITLE_SELECTOR, "h3.Title");
static_selector!(IMAGE_SELECTOR, "img");
static_selector!(DESCRIPTION_SELECTOR, "div.Description p");

/// One catalog entry: identifier and display title
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
pub struct CatalogEntry {
    /// URL-safe identifier (e.g., "naruto-shippuden-hd")
    pub id: String,
    /// Display title
    pub title: String,
}

impl CatalogEntry {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
        }
    }
}

/// Represents a search result card
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SeriesItem {
    /// Series identifier, usable with the episode endpoints
    pub id: String,
    /// Display title from h3.Title
    pub title: String,
    /// Poster image URL
    pub poster: Option<String>,
    /// Short synopsis from div.Description
    pub synopsis: Option<String>,
}

/// Extract `(identifier, title)` pairs from a catalog listing page
///
/// Anchors without a title attribute, or whose title is blank, are ignored.
/// When an identifier appears several times on the page the first one wins.
pub fn parse_catalog_page(html: &str) -> Vec<CatalogEntry> {
    let mut seen = HashSet::new();
    let mut entries = Vec::new();

    for tag in ANCHOR_REGEX.find_iter(html) {
        let tag = tag.as_str();

        let Some(id) = HREF_REGEX
            .captures(tag)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
        else {
            continue;
        };

        let Some(raw_title) = TITLE_REGEX
            .captures(tag)
            .and_then(|caps| caps.get(1).or_else(|| caps.get(2)))
            .map(|m| m.as_str())
        else {
            continue;
        };

        let title = html_escape::decode_html_entities(raw_title).trim().to_string();
        if title.is_empty() {
            continue;
        }

        if seen.insert(id.to_string()) {
            entries.push(CatalogEntry::new(id, title));
        }
    }

    entries
}

/// Parse search result cards (`article.Anime`)
///
/// Cards without a series link or title are skipped.
pub fn parse_search_results(html: &str) -> Vec<SeriesItem> {
    let document = Html::parse_document(html);

    document
        .select(&CARD_SELECTOR)
        .filter_map(|card| {
            let id = card
                .select(&LINK_SELECTOR)
                .filter_map(|a| a.value().attr("href"))
                .find_map(slug_from_href)?;

            let title = card
                .select(&TITLE_SELECTOR)
                .next()
                .map(element_text)
                .filter(|t| !t.is_empty())?;

            let poster = card
                .select(&IMAGE_SELECTOR)
                .next()
                .and_then(|img| img.value().attr("src").or_else(|| img.value().attr("data-src")))
                .map(|s| s.to_string());

            let synopsis = card
                .select(&DESCRIPTION_SELECTOR)
                .map(element_text)
                .filter(|t| !t.is_empty())
                .last();

            Some(SeriesItem {
                id,
                title,
                poster,
                synopsis,
            })
        })
        .collect()
}

/// Extract the series slug from an `/anime/<slug>` link
pub fn slug_from_href(href: &str) -> Option<String> {
    SLUG_FROM_HREF_REGEX
        .captures(href.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

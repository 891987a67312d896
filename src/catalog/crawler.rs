//! Paginated crawl of the catalog listing

use std::collections::HashSet;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info};

use crate::constants::endpoints;
use crate::parser::{parse_catalog_page, CatalogEntry};
use crate::scraper::{FetchError, PageFetcher};

/// Walks `/browse?page=N` and accumulates a deduplicated catalog
#[derive(Debug, Clone)]
pub struct CatalogCrawler {
    fetcher: PageFetcher,
}

impl CatalogCrawler {
    pub fn new(fetcher: PageFetcher) -> Self {
        Self { fetcher }
    }

    /// Crawl up to `max_pages` listing pages starting at `start_page`
    ///
    /// Stops early on a page with no entries or with no entries not already
    /// seen. A failed page aborts the whole crawl; nothing partial is returned.
    pub async fn crawl(
        &self,
        start_page: u32,
        max_pages: u32,
        delay: Duration,
    ) -> Result<Vec<CatalogEntry>, FetchError> {
        info!(
            "Crawling catalog from page {} (at most {} pages)",
            start_page, max_pages
        );

        let mut seen = HashSet::new();
        let mut entries = Vec::new();
        let mut pages = 0;

        for offset in 0..max_pages {
            let page = start_page.saturating_add(offset);

            if offset > 0 && !delay.is_zero() {
                sleep(delay).await;
            }

            let fetched = self.fetcher.fetch(&endpoints::browse(page), None).await?;
            pages += 1;

            let found = parse_catalog_page(&fetched.html);
            if found.is_empty() {
                debug!("Page {} has no entries, end of listing", page);
                break;
            }

            let total = found.len();
            let added = merge_page(&mut seen, &mut entries, found);
            debug!("Page {}: {} entries, {} new", page, total, added);

            if added == 0 {
                debug!("Page {} repeated known entries, end of listing", page);
                break;
            }
        }

        info!(
            "Catalog crawl finished: {} entries from {} pages",
            entries.len(),
            pages
        );
        Ok(entries)
    }
}

/// Append entries whose identifier has not been seen, returning how many were added
pub fn merge_page(
    seen: &mut HashSet<String>,
    entries: &mut Vec<CatalogEntry>,
    page: Vec<CatalogEntry>,
) -> usize {
    let before = entries.len();
    for entry in page {
        if seen.insert(entry.id.clone()) {
            entries.push(entry);
        }
    }
    entries.len() - before
}

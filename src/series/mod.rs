//! Series search and episode listing
//!
//! Both calls go through the same mirror fallback and retry policy as the
//! episode link lookup.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::constants::endpoints;
use crate::error::AppResult;
use crate::models::EpisodeItem;
use crate::parser::{parse_search_results, EmbeddedDataExtractor, SeriesItem};
use crate::scraper::{retry, FetchedPage, PageFetcher};

/// Client for the search listing and per-series pages
#[derive(Clone)]
pub struct SeriesClient {
    fetcher: PageFetcher,
    extractor: Arc<dyn EmbeddedDataExtractor>,
    retry_attempts: u32,
    retry_delay: Duration,
}

impl SeriesClient {
    pub fn new(
        fetcher: PageFetcher,
        extractor: Arc<dyn EmbeddedDataExtractor>,
        retry_attempts: u32,
        retry_delay: Duration,
    ) -> Self {
        Self {
            fetcher,
            extractor,
            retry_attempts,
            retry_delay,
        }
    }

    /// Series whose title matches `query`, in listing order
    pub async fn search(&self, query: &str) -> AppResult<Vec<SeriesItem>> {
        let page = self.fetch(&endpoints::search(query)).await?;
        let results = parse_search_results(&page.html);
        info!("Search {:?} returned {} series", query, results.len());
        Ok(results)
    }

    /// Episodes of the series `slug`, ascending by number
    pub async fn episodes(&self, slug: &str) -> AppResult<Vec<EpisodeItem>> {
        let page = self.fetch(&endpoints::anime(slug)).await?;
        let mut numbers = self.extractor.extract_episode_numbers(&page.html)?;
        numbers.sort_unstable();
        numbers.dedup();

        debug!("Series {} lists {} episodes", slug, numbers.len());
        Ok(numbers.into_iter().map(EpisodeItem::new).collect())
    }

    async fn fetch(&self, path: &str) -> AppResult<FetchedPage> {
        let fetcher = &self.fetcher;
        let page = retry(self.retry_attempts, self.retry_delay, move || {
            fetcher.fetch(path, None)
        })
        .await?;
        Ok(page)
    }
}

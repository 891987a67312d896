//! Service layer: the operations exposed over HTTP
//!
//! [`AnimeService`] owns one fetcher, one extractor and one catalog cache and
//! wires them into request-level operations. Input validation happens here,
//! before any network call.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::catalog::{
    CacheSettings, CatalogCache, CatalogCrawler, CatalogEntry, SnapshotStore, TitleResolver,
};
use crate::config::Config;
use crate::constants::{defaults, endpoints};
use crate::error::{AppError, AppResult};
use crate::models::{EpisodeItem, EpisodePageResult};
use crate::parser::{
    flatten_and_rank, pick_best, EmbeddedDataExtractor, ExtractionError, RegexExtractor,
    SeriesItem,
};
use crate::scraper::{retry, FetchError, PageFetcher};
use crate::series::SeriesClient;

/// Request-level operations over the upstream site
#[derive(Clone)]
pub struct AnimeService {
    fetcher: PageFetcher,
    extractor: Arc<dyn EmbeddedDataExtractor>,
    series: SeriesClient,
    crawler: CatalogCrawler,
    catalog: Arc<CatalogCache>,
    resolver: TitleResolver,
    retry_attempts: u32,
    retry_delay: Duration,
    max_pages: u32,
    page_delay: Duration,
}

impl AnimeService {
    /// Build the service with the regex extractor
    pub fn from_config(config: &Config) -> Result<Self, FetchError> {
        Self::with_extractor(config, Arc::new(RegexExtractor))
    }

    /// Build the service with a custom extractor
    pub fn with_extractor(
        config: &Config,
        extractor: Arc<dyn EmbeddedDataExtractor>,
    ) -> Result<Self, FetchError> {
        let fetcher = PageFetcher::from_config(config)?;
        let crawler = CatalogCrawler::new(fetcher.clone());
        let snapshot = config.catalog_cache_file.clone().map(SnapshotStore::new);
        let catalog = Arc::new(CatalogCache::new(
            crawler.clone(),
            snapshot,
            CacheSettings::from_config(config),
        ));

        Ok(Self {
            series: SeriesClient::new(
                fetcher.clone(),
                extractor.clone(),
                config.retry_attempts,
                config.retry_delay,
            ),
            resolver: TitleResolver::new(catalog.clone()),
            fetcher,
            extractor,
            crawler,
            catalog,
            retry_attempts: config.retry_attempts,
            retry_delay: config.retry_delay,
            max_pages: config.catalog_max_pages,
            page_delay: config.catalog_page_delay,
        })
    }

    /// Shared catalog cache
    pub fn catalog(&self) -> &Arc<CatalogCache> {
        &self.catalog
    }

    /// Ranked links of one episode
    ///
    /// `filter_host` keeps only links from that server (case-insensitive);
    /// `prefer_best` collapses the result to the single best link.
    pub async fn resolve_links(
        &self,
        identifier: &str,
        episode_number: u32,
        filter_host: Option<&str>,
        prefer_best: bool,
    ) -> AppResult<EpisodePageResult> {
        let identifier = validate_identifier(identifier)?;
        let path = endpoints::episode(identifier, episode_number);
        info!("Resolving links for {}", path);

        let fetcher = &self.fetcher;
        let page_path = path.as_str();
        let page = retry(self.retry_attempts, self.retry_delay, move || {
            fetcher.fetch(page_path, None)
        })
        .await?;

        let blob = self.extractor.extract_links_blob(&page.html)?;
        let ids = self.extractor.extract_scalar_ids(&page.html);

        let mut items = flatten_and_rank(&blob);
        if items.is_empty() {
            return Err(ExtractionError::NoLinks("videos").into());
        }

        if let Some(host) = filter_host.map(|h| h.trim().to_lowercase()) {
            if !host.is_empty() {
                items.retain(|record| record.server.to_lowercase() == host);
                if items.is_empty() {
                    return Err(AppError::not_found(format!(
                        "No links for server '{}' on {}",
                        host, path
                    )));
                }
            }
        }

        if prefer_best {
            items = pick_best(&items).cloned().into_iter().collect();
        }

        info!("Found {} links on {}", items.len(), page.url);
        Ok(EpisodePageResult {
            page_url: page.url,
            anime_id: ids.anime_id,
            episode_id: ids.episode_id,
            episode_number: ids.episode_number,
            items,
        })
    }

    /// Catalog entries, from the cache or from an ad-hoc crawl
    ///
    /// Giving `start_page` or `page_count` crawls just that range and leaves
    /// the cache untouched.
    pub async fn list_catalog(
        &self,
        force_refresh: bool,
        start_page: Option<u32>,
        page_count: Option<u32>,
    ) -> AppResult<Vec<CatalogEntry>> {
        if start_page.is_none() && page_count.is_none() {
            let view = self.catalog.get(force_refresh).await?;
            return Ok(view.entries().to_vec());
        }

        let start = start_page.unwrap_or(1);
        let count = page_count.unwrap_or(self.max_pages);
        if start == 0 {
            return Err(AppError::validation("start_page must be at least 1"));
        }
        if count == 0 || count > self.max_pages {
            return Err(AppError::validation(format!(
                "pages must be between 1 and {}",
                self.max_pages
            )));
        }

        info!("Ad-hoc catalog crawl: pages {}..{}", start, start.saturating_add(count - 1));
        let entries = self.crawler.crawl(start, count, self.page_delay).await?;
        Ok(entries)
    }

    /// Identifiers of the current catalog, in catalog order
    pub async fn list_identifiers(&self) -> AppResult<Vec<String>> {
        let view = self.catalog.get(false).await?;
        Ok(view.identifiers().to_vec())
    }

    /// Catalog entry whose title best matches `title`
    pub async fn resolve_title(&self, title: &str, cutoff: Option<f64>) -> AppResult<CatalogEntry> {
        let title = title.trim();
        if title.is_empty() {
            return Err(AppError::validation("Title is required"));
        }

        let cutoff = match cutoff {
            Some(c) if c.is_nan() => return Err(AppError::validation("cutoff must be a number")),
            Some(c) => c,
            None => defaults::TITLE_CUTOFF,
        };

        match self.resolver.resolve(title, cutoff).await? {
            Some(entry) => Ok(entry),
            None => {
                warn!("No catalog title matches {:?} at cutoff {}", title, cutoff);
                Err(AppError::not_found(format!("No series matches '{}'", title)))
            }
        }
    }

    /// Series search by free text
    pub async fn search(&self, query: &str) -> AppResult<Vec<SeriesItem>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AppError::validation("Search query is required"));
        }
        self.series.search(query).await
    }

    /// Episode list of one series
    pub async fn episodes(&self, identifier: &str) -> AppResult<Vec<EpisodeItem>> {
        let identifier = validate_identifier(identifier)?;
        self.series.episodes(identifier).await
    }
}

/// Reject identifiers that cannot be series slugs
///
/// Purely numeric values are internal ids, not slugs.
pub fn validate_identifier(identifier: &str) -> AppResult<&str> {
    let identifier = identifier.trim();
    if identifier.is_empty() {
        return Err(AppError::validation("Series identifier is required"));
    }
    if identifier.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::validation(format!(
            "'{}' is a numeric id; a series slug such as 'one-piece-tv' is required",
            identifier
        )));
    }
    Ok(identifier)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Track;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const EPISODE_PAGE: &str = r#"<html><script>
        var anime_id = 3;
        var episode_id = 2138;
        var episode_number = 1;
        var videos = {"SUB":[
            {"server":"mega","title":"Mega","code":"https://mega.nz/embed/x"},
            {"server":"okru","title":"Okru","code":"https://ok.ru/videoembed/1"},
            {"server":"sw","title":"SW","code":"https://streamwish.to/e/abc"}
        ],"LAT":[
            {"server":"sw","title":"SW","url":"https://streamwish.to/e/lat"}
        ]};
    </script></html>"#;

    fn config(server: &MockServer) -> Config {
        Config {
            base_candidates: vec![server.uri()],
            retry_attempts: 1,
            retry_delay: Duration::from_millis(1),
            catalog_max_pages: 5,
            catalog_cache_file: None,
            ..Config::default()
        }
    }

    fn service(server: &MockServer) -> AnimeService {
        AnimeService::from_config(&config(server)).unwrap()
    }

    async fn mount_episode(server: &MockServer, body: &str) {
        Mock::given(method("GET"))
            .and(path("/ver/naruto-1"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(server)
            .await;
    }

    fn listing(entries: &[(&str, &str)]) -> String {
        entries
            .iter()
            .map(|(slug, title)| format!(r#"<a href="/anime/{}" title="{}">{}</a>"#, slug, title, title))
            .collect()
    }

    async fn mount_listing(server: &MockServer, page: u32, body: String) {
        Mock::given(method("GET"))
            .and(path("/browse"))
            .and(query_param("page", page.to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(server)
            .await;
    }

    #[test]
    fn test_validate_identifier() {
        assert_eq!(validate_identifier(" naruto ").unwrap(), "naruto");
        assert_eq!(validate_identifier("86-eighty-six").unwrap(), "86-eighty-six");
        assert!(matches!(validate_identifier(""), Err(AppError::Validation(_))));
        assert!(matches!(validate_identifier("   "), Err(AppError::Validation(_))));
        assert!(matches!(validate_identifier("123"), Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_resolve_links_ranked() {
        let server = MockServer::start().await;
        mount_episode(&server, EPISODE_PAGE).await;

        let result = service(&server).resolve_links("naruto", 1, None, false).await.unwrap();
        assert_eq!(result.page_url, format!("{}/ver/naruto-1", server.uri()));
        assert_eq!(result.anime_id.as_deref(), Some("3"));
        assert_eq!(result.episode_id.as_deref(), Some("2138"));
        assert_eq!(result.episode_number.as_deref(), Some("1"));

        let servers: Vec<&str> = result.items.iter().map(|r| r.server.as_str()).collect();
        assert_eq!(servers, vec!["sw", "sw", "okru", "mega"]);
        assert_eq!(result.items[0].track, Track::Sub);
    }

    #[tokio::test]
    async fn test_resolve_links_prefer_best() {
        let server = MockServer::start().await;
        mount_episode(&server, EPISODE_PAGE).await;

        let result = service(&server).resolve_links("naruto", 1, None, true).await.unwrap();
        assert_eq!(result.items.len(), 1);
        assert_eq!(result.items[0].server, "sw");
        assert_eq!(result.items[0].code.as_deref(), Some("https://streamwish.to/e/abc"));
    }

    #[tokio::test]
    async fn test_resolve_links_filter_host() {
        let server = MockServer::start().await;
        mount_episode(&server, EPISODE_PAGE).await;
        let service = service(&server);

        let result = service.resolve_links("naruto", 1, Some(" OKRU "), false).await.unwrap();
        assert_eq!(result.items.len(), 1);
        assert_eq!(result.items[0].server, "okru");

        let err = service.resolve_links("naruto", 1, Some("fembed"), false).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_resolve_links_numeric_identifier_skips_network() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = service(&server).resolve_links("123", 1, None, false).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_resolve_links_missing_blob() {
        let server = MockServer::start().await;
        mount_episode(&server, "<html><body>Episode removed</body></html>").await;

        let err = service(&server).resolve_links("naruto", 1, None, false).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Extraction(ExtractionError::BlockMissing("videos"))
        ));
    }

    #[tokio::test]
    async fn test_resolve_links_empty_blob() {
        let server = MockServer::start().await;
        mount_episode(&server, r#"<script>var videos = {"SUB":[],"LAT":[]};</script>"#).await;

        let err = service(&server).resolve_links("naruto", 1, None, false).await.unwrap_err();
        assert!(matches!(err, AppError::Extraction(ExtractionError::NoLinks(_))));
    }

    #[tokio::test]
    async fn test_resolve_links_upstream_down() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = service(&server).resolve_links("naruto", 1, None, false).await.unwrap_err();
        assert!(matches!(err, AppError::Fetch(FetchError::AllHostsFailed { .. })));
    }

    #[tokio::test]
    async fn test_list_catalog_and_identifiers_from_cache() {
        let server = MockServer::start().await;
        mount_listing(&server, 1, listing(&[("naruto", "Naruto"), ("bleach", "Bleach")])).await;
        mount_listing(&server, 2, String::new()).await;
        let service = service(&server);

        let entries = service.list_catalog(false, None, None).await.unwrap();
        assert_eq!(
            entries,
            vec![CatalogEntry::new("naruto", "Naruto"), CatalogEntry::new("bleach", "Bleach")]
        );

        let ids = service.list_identifiers().await.unwrap();
        assert_eq!(ids, vec!["naruto".to_string(), "bleach".to_string()]);
    }

    #[tokio::test]
    async fn test_list_catalog_scoped_crawl_bypasses_cache() {
        let server = MockServer::start().await;
        mount_listing(&server, 3, listing(&[("one-piece-tv", "One Piece")])).await;
        let service = service(&server);

        let entries = service.list_catalog(false, Some(3), Some(1)).await.unwrap();
        assert_eq!(entries, vec![CatalogEntry::new("one-piece-tv", "One Piece")]);
        assert!(service.catalog().peek().is_empty());
    }

    #[tokio::test]
    async fn test_list_catalog_rejects_bad_range() {
        let server = MockServer::start().await;
        let service = service(&server);

        let err = service.list_catalog(false, Some(0), None).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        let err = service.list_catalog(false, None, Some(0)).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        let err = service.list_catalog(false, None, Some(6)).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_resolve_title() {
        let server = MockServer::start().await;
        mount_listing(
            &server,
            1,
            listing(&[("naruto-shippuden-hd", "Naruto Shippuden"), ("bleach", "Bleach")]),
        )
        .await;
        mount_listing(&server, 2, String::new()).await;
        let service = service(&server);

        let entry = service.resolve_title("naruto shipuden", None).await.unwrap();
        assert_eq!(entry.id, "naruto-shippuden-hd");

        let err = service.resolve_title("naruto shipuden", Some(0.99)).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_resolve_title_blank() {
        let server = MockServer::start().await;
        let err = service(&server).resolve_title("  ", None).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_search_blank_query() {
        let server = MockServer::start().await;
        let err = service(&server).search(" ").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_episodes_validates_identifier() {
        let server = MockServer::start().await;
        let err = service(&server).episodes("42").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}

//! API Routes module for the anime links API
//!
//! This module contains all HTTP route handlers for the public API endpoints.

use actix_cors::Cors;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use tracing::{debug, info};
use utoipa::{IntoParams, OpenApi, ToSchema};

use crate::catalog::CatalogEntry;
use crate::error::{AppError, AppResult};
use crate::models::{ApiError, ApiResponse, EpisodeItem, EpisodePageResult};
use crate::parser::{LinkRecord, SeriesItem, Track};
use crate::service::AnimeService;

/// Application state shared across handlers
pub struct AppState {
    pub service: AnimeService,
}

/// Query parameters for search endpoint
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct SearchQuery {
    /// Search keyword
    pub q: Option<String>,
}

/// GET /api/search - Search for series
///
/// Query parameter: q (required) - search keyword
#[utoipa::path(
    get,
    path = "/api/search",
    tag = "series",
    params(SearchQuery),
    responses(
        (status = 200, description = "Search results retrieved successfully", body = Vec<SeriesItem>),
        (status = 400, description = "Bad request - search query is required", body = ApiError),
        (status = 502, description = "Upstream site unavailable", body = ApiError)
    )
)]
pub async fn search_series(
    data: web::Data<AppState>,
    query: web::Query<SearchQuery>,
) -> AppResult<HttpResponse> {
    let keyword = query.q.as_deref().unwrap_or_default();
    info!("Searching for series: {}", keyword);

    let results = data.service.search(keyword).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::new(results)))
}

/// GET /api/anime/{slug}/episodes - Episode list of a series
#[utoipa::path(
    get,
    path = "/api/anime/{slug}/episodes",
    tag = "series",
    params(
        ("slug" = String, Path, description = "Series slug, e.g. one-piece-tv")
    ),
    responses(
        (status = 200, description = "Episodes in ascending order", body = Vec<EpisodeItem>),
        (status = 400, description = "Bad request - slug is numeric or empty", body = ApiError),
        (status = 502, description = "Upstream site unavailable or page unreadable", body = ApiError)
    )
)]
pub async fn get_episodes(
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let slug = path.into_inner();
    info!("Listing episodes for: {}", slug);

    let episodes = data.service.episodes(&slug).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::new(episodes)))
}

/// Query parameters for the episode videos endpoint
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct VideosQuery {
    /// Keep only links from this server (e.g. sw, okru)
    pub only: Option<String>,
    /// Return just the single best link
    #[serde(default)]
    pub prefer_best: bool,
}

/// GET /api/anime/{slug}/episode/{number}/videos - Ranked video links of an episode
#[utoipa::path(
    get,
    path = "/api/anime/{slug}/episode/{number}/videos",
    tag = "links",
    params(
        ("slug" = String, Path, description = "Series slug, e.g. one-piece-tv"),
        ("number" = u32, Path, description = "Episode number"),
        VideosQuery
    ),
    responses(
        (status = 200, description = "Links ranked best first", body = EpisodePageResult),
        (status = 400, description = "Bad request - slug is numeric or empty", body = ApiError),
        (status = 404, description = "No links for the requested server", body = ApiError),
        (status = 502, description = "Upstream site unavailable or page unreadable", body = ApiError)
    )
)]
pub async fn get_episode_videos(
    data: web::Data<AppState>,
    path: web::Path<(String, u32)>,
    query: web::Query<VideosQuery>,
) -> AppResult<HttpResponse> {
    let (slug, number) = path.into_inner();
    info!("Fetching videos for {} episode {}", slug, number);

    let result = data
        .service
        .resolve_links(&slug, number, query.only.as_deref(), query.prefer_best)
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::new(result)))
}

/// Query parameters for catalog endpoint
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct CatalogQuery {
    /// Ignore the cache and crawl again
    #[serde(default)]
    pub refresh: bool,
    /// First listing page of an ad-hoc crawl
    pub start_page: Option<u32>,
    /// Number of pages of an ad-hoc crawl
    pub pages: Option<u32>,
}

/// GET /api/catalog - Full series catalog
///
/// Served from the cache unless `refresh` is set. Giving `start_page` or
/// `pages` crawls just that range without touching the cache.
#[utoipa::path(
    get,
    path = "/api/catalog",
    tag = "catalog",
    params(CatalogQuery),
    responses(
        (status = 200, description = "Catalog entries in listing order", body = Vec<CatalogEntry>),
        (status = 400, description = "Bad request - invalid page range", body = ApiError),
        (status = 502, description = "Upstream site unavailable", body = ApiError)
    )
)]
pub async fn get_catalog(
    data: web::Data<AppState>,
    query: web::Query<CatalogQuery>,
) -> AppResult<HttpResponse> {
    let entries = data
        .service
        .list_catalog(query.refresh, query.start_page, query.pages)
        .await?;
    info!("Returning {} catalog entries", entries.len());
    Ok(HttpResponse::Ok().json(ApiResponse::new(entries)))
}

/// GET /api/catalog/slugs - Identifiers of the cached catalog
#[utoipa::path(
    get,
    path = "/api/catalog/slugs",
    tag = "catalog",
    responses(
        (status = 200, description = "Series slugs in catalog order", body = Vec<String>),
        (status = 502, description = "Upstream site unavailable", body = ApiError)
    )
)]
pub async fn get_catalog_slugs(data: web::Data<AppState>) -> AppResult<HttpResponse> {
    let slugs = data.service.list_identifiers().await?;
    Ok(HttpResponse::Ok().json(ApiResponse::new(slugs)))
}

/// Query parameters for title resolution
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct ResolveQuery {
    /// Free-form series title
    pub title: Option<String>,
    /// Minimum similarity in [0, 1] (default: 0.6)
    pub cutoff: Option<f64>,
}

/// GET /api/catalog/resolve - Resolve a title to a catalog entry
#[utoipa::path(
    get,
    path = "/api/catalog/resolve",
    tag = "catalog",
    params(ResolveQuery),
    responses(
        (status = 200, description = "Best matching catalog entry", body = CatalogEntry),
        (status = 400, description = "Bad request - title is required", body = ApiError),
        (status = 404, description = "No title is similar enough", body = ApiError),
        (status = 502, description = "Upstream site unavailable", body = ApiError)
    )
)]
pub async fn resolve_title(
    data: web::Data<AppState>,
    query: web::Query<ResolveQuery>,
) -> AppResult<HttpResponse> {
    let title = query.title.as_deref().unwrap_or_default();
    let entry = data.service.resolve_title(title, query.cutoff).await?;
    info!("Resolved {:?} to {}", title, entry.id);
    Ok(HttpResponse::Ok().json(ApiResponse::new(entry)))
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Anime Links API",
        version = "0.1.0",
        description = "Episode video links, series search and catalog lookup for AnimeFLV",
        license(
            name = "MIT"
        )
    ),
    paths(
        search_series,
        get_episodes,
        get_episode_videos,
        get_catalog,
        get_catalog_slugs,
        resolve_title
    ),
    components(
        schemas(
            SeriesItem,
            EpisodeItem,
            EpisodePageResult,
            LinkRecord,
            Track,
            CatalogEntry,
            ApiError,
            SearchQuery,
            VideosQuery,
            CatalogQuery,
            ResolveQuery
        )
    ),
    tags(
        (name = "links", description = "Episode video links"),
        (name = "series", description = "Series search and episode lists"),
        (name = "catalog", description = "Cached series catalog")
    )
)]
pub struct ApiDoc;

/// CORS policy for browser clients
///
/// An empty origin list allows any origin.
pub fn cors(allowed_origins: &[String]) -> Cors {
    let cors = Cors::default()
        .allowed_methods(vec!["GET", "OPTIONS"])
        .allow_any_header()
        .max_age(3600);

    if allowed_origins.is_empty() {
        return cors.allow_any_origin();
    }
    allowed_origins
        .iter()
        .fold(cors, |cors, origin| cors.allowed_origin(origin))
}

/// Malformed query strings answer with the JSON error envelope
fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, req| {
        debug!("Rejected query for {}: {}", req.path(), err);
        AppError::validation(format!("Invalid query parameters: {}", err)).into()
    })
}

/// Malformed path segments answer with the JSON error envelope
fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|err, req| {
        debug!("Rejected path {}: {}", req.path(), err);
        AppError::validation(format!("Invalid path parameters: {}", err)).into()
    })
}

/// Configure all API routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .app_data(query_config())
            .app_data(path_config())
            .route("/search", web::get().to(search_series))
            .route("/anime/{slug}/episodes", web::get().to(get_episodes))
            .route(
                "/anime/{slug}/episode/{number}/videos",
                web::get().to(get_episode_videos),
            )
            .route("/catalog", web::get().to(get_catalog))
            .route("/catalog/slugs", web::get().to(get_catalog_slugs))
            .route("/catalog/resolve", web::get().to(resolve_title)),
    );
}

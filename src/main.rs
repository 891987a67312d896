//! Anime Links API Server
//!
//! Main entry point for the anime links REST API service.

use actix_web::{web, App, HttpResponse, HttpServer, Responder};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use anime_links::config::Config;
use anime_links::routes::{configure_routes, cors, ApiDoc, AppState};
use anime_links::service::AnimeService;

/// Health check endpoint
async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    let bind_address = format!("{}:{}", config.host, config.port);

    let service = match AnimeService::from_config(&config) {
        Ok(service) => service,
        Err(e) => {
            error!("Failed to build the HTTP client: {}", e);
            return Err(std::io::Error::other(e.to_string()));
        }
    };

    info!(
        "Upstream mirrors: {}",
        config.base_candidates.join(", ")
    );
    if let Some(path) = &config.catalog_cache_file {
        info!("Catalog snapshot file: {}", path.display());
    }

    if config.cors_allowed_origins.is_empty() {
        info!("CORS: any origin allowed");
    } else {
        info!("CORS origins: {}", config.cors_allowed_origins.join(", "));
    }

    let app_state = web::Data::new(AppState { service });
    let allowed_origins = config.cors_allowed_origins.clone();

    info!("Starting Anime Links API server on {}", bind_address);

    let openapi = ApiDoc::openapi();

    HttpServer::new(move || {
        App::new()
            .wrap(cors(&allowed_origins))
            .app_data(app_state.clone())
            .route("/health", web::get().to(health_check))
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", openapi.clone())
            )
            .configure(configure_routes)
    })
    .bind(&bind_address)?
    .run()
    .await
}

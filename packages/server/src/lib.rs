#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the complaint map application.
//!
//! Loads the complaint table and boundary layers once at startup and serves
//! choropleth `GeoJSON`, marker lists, trends and filter facets computed
//! from them. Every request runs a fresh filter → aggregate → join pass;
//! identical passes are answered from a shared [`ChoroplethCache`].

mod handlers;

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use complaint_map_analytics::cache::ChoroplethCache;
use complaint_map_analytics::pipeline::MapData;
use complaint_map_geography_models::Granularity;
use complaint_map_ingest::config::{DataConfig, load_map_data};

/// Layer used when the requested granularity has no boundaries loaded.
pub const FALLBACK_GRANULARITY: Granularity = Granularity::State;

/// Shared application state.
pub struct AppState {
    /// Complaints and boundary layers, immutable after startup.
    pub data: Arc<MapData>,
    /// Memoized choropleth passes.
    pub cache: Mutex<ChoroplethCache>,
}

impl AppState {
    /// Wraps loaded data with an empty default-sized cache.
    #[must_use]
    pub fn new(data: MapData) -> Self {
        Self {
            data: Arc::new(data),
            cache: Mutex::new(ChoroplethCache::default()),
        }
    }

    /// Locks the cache, recovering from poisoning.
    pub fn cache(&self) -> MutexGuard<'_, ChoroplethCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The granularity to draw: the requested one if its layer is loaded,
    /// otherwise [`FALLBACK_GRANULARITY`].
    #[must_use]
    pub fn layer_granularity(&self, requested: Granularity) -> Granularity {
        if requested == FALLBACK_GRANULARITY || self.data.layer(requested).is_some() {
            return requested;
        }
        log::warn!(
            "No {requested} boundary layer loaded, falling back to {FALLBACK_GRANULARITY}"
        );
        FALLBACK_GRANULARITY
    }
}

/// Registers the `/api` routes.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/facets", web::get().to(handlers::facets))
            .route("/categories", web::get().to(handlers::categories))
            .route("/choropleth", web::get().to(handlers::choropleth))
            .route("/markers", web::get().to(handlers::markers))
            .route("/trend", web::get().to(handlers::trend)),
    );
}

/// Starts the complaint map API server.
///
/// Initializes logging, then calls [`serve`] with the data config named by
/// `COMPLAINT_MAP_CONFIG` (default `complaint_map.toml`). This is a regular
/// async function; the caller is responsible for providing the async
/// runtime (e.g. via `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an `std::io::Result` error if the data cannot be loaded or the
/// HTTP server fails to bind or encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");
    serve(&DataConfig::resolve_path(None)).await
}

/// Loads every file named by the data config at `config_path` and serves
/// the API until shut down. Expects logging to be initialized already.
///
/// # Errors
///
/// Returns an `std::io::Result` error if the data cannot be loaded or the
/// HTTP server fails to bind or encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn serve(config_path: &Path) -> std::io::Result<()> {
    log::info!("Loading data config from {}", config_path.display());
    let config = DataConfig::from_path(config_path).map_err(std::io::Error::other)?;
    let data = load_map_data(&config).map_err(std::io::Error::other)?;

    if data.layer(FALLBACK_GRANULARITY).is_none() {
        log::warn!(
            "No {FALLBACK_GRANULARITY} boundary layer configured; requests for unloaded layers will fail"
        );
    }

    let state = web::Data::new(AppState::new(data));

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(routes)
    })
    .bind((bind_addr, port))?
    .run()
    .await
}

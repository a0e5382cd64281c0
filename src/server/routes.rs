//! Route table and middleware for the render cache.
//!
//! The router is generic over the image source so tests can mount the same
//! routes on top of an in-memory source.
//!
//! # Route Structure
//!
//! ```text
//! /health                         - Liveness probe
//! /fit_width/{width}?url={url}    - Scale to an exact width
//! /fit_height/{height}?url={url}  - Scale to an exact height
//! ```
//!
//! # Example
//!
//! ```ignore
//! use rendercache::server::routes::{create_router, RouterConfig};
//! use rendercache::cache::RenderService;
//! use rendercache::image::{HttpImageSource, ImageTransformer};
//! use rendercache::storage::BlobStore;
//!
//! let transformer = ImageTransformer::new(HttpImageSource::new(timeout));
//! let render_service = RenderService::new(transformer, BlobStore::new("/var/cache/render"));
//!
//! let config = RouterConfig::new()
//!     .with_cors_origins(vec!["https://gallery.example".to_string()]);
//! let router = create_router(render_service, config);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//! axum::serve(listener, router).await?;
//! ```

use std::time::Duration;

use axum::{routing::get, Router};
use http::header::CONTENT_TYPE;
use http::Method;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{fit_height_handler, fit_width_handler, health_handler, AppState};
use crate::cache::RenderService;
use crate::image::ImageSource;

// =============================================================================
// Router Configuration
// =============================================================================

/// Middleware settings applied when the router is built.
#[derive(Clone)]
pub struct RouterConfig {
    /// Origins allowed by CORS; None means any origin
    pub cors_origins: Option<Vec<String>>,

    /// max-age for Cache-Control headers, in seconds
    pub cache_max_age: u32,

    /// Attach a TraceLayer to every request
    pub enable_tracing: bool,
}

impl RouterConfig {
    /// Defaults: any origin, max-age of one day, tracing on.
    pub fn new() -> Self {
        Self {
            cors_origins: None,
            cache_max_age: 86400,
            enable_tracing: true,
        }
    }

    /// Restrict CORS to the given origins.
    ///
    /// An empty vec shuts cross-origin access off entirely; leaving this
    /// unset (or passing None) keeps the any-origin default.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = Some(origins);
        self
    }

    /// Go back to allowing any origin.
    pub fn with_cors_any_origin(mut self) -> Self {
        self.cors_origins = None;
        self
    }

    /// Override the Cache-Control max-age, in seconds.
    pub fn with_cache_max_age(mut self, seconds: u32) -> Self {
        self.cache_max_age = seconds;
        self
    }

    /// Toggle the per-request TraceLayer.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Build the application router around a render service.
///
/// Mounts the health probe and the two render routes, attaches the shared
/// state, and layers CORS plus (unless disabled) request tracing on top.
pub fn create_router<S>(render_service: RenderService<S>, config: RouterConfig) -> Router
where
    S: ImageSource + 'static,
{
    let app_state = AppState::with_cache_max_age(render_service, config.cache_max_age);
    let cors = build_cors_layer(&config);

    let router = Router::new()
        .route("/health", get(health_handler))
        .route("/fit_width/{width}", get(fit_width_handler::<S>))
        .route("/fit_height/{height}", get(fit_height_handler::<S>))
        .with_state(app_state)
        .layer(cors);

    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

/// Router with the stock RouterConfig.
pub fn create_default_router<S>(render_service: RenderService<S>) -> Router
where
    S: ImageSource + 'static,
{
    create_router(render_service, RouterConfig::new())
}

/// CORS layer matching the configured origin policy.
fn build_cors_layer(config: &RouterConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::HEAD, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(86400)); // preflight cache, 24h

    match &config.cors_origins {
        None => cors.allow_origin(Any),
        Some(origins) if origins.is_empty() => {
            // No Allow-Origin header at all, so browsers reject everything
            cors
        }
        Some(origins) => {
            // Origins that fail to parse as header values are dropped
            let parsed_origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            cors.allow_origin(parsed_origins)
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

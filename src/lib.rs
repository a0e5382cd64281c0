//! # Render Cache
//!
//! An on-demand image rescaling server with a content-addressed filesystem
//! cache.
//!
//! This library fetches source images over HTTP, rescales them to a requested
//! width or height while preserving aspect ratio, and persists each rendered
//! result on disk. A repeated request is served straight from the cache
//! without touching the upstream again.
//!
//! ## Features
//!
//! - **On-demand rendering**: the first request fetches, scales, and stores;
//!   every following request for the same rendition is a disk read
//! - **Orientation aware**: EXIF orientation metadata is honored before
//!   scaling, so rotated camera photos come out upright
//! - **Format preserving**: the output format is the source's format, sniffed
//!   from content bytes rather than trusted from the URL
//! - **Single-flight**: concurrent requests for the same rendition share one
//!   upstream fetch and one computation
//! - **Content-addressed storage**: cache keys are SHA-256 digests of the
//!   operation and source URL, so entries never collide
//!
//! ## Architecture
//!
//! - [`mod@image`] - Source fetching, sniffing, EXIF orientation, and scaling
//! - [`cache`] - Cache keys, single-flight coordination, and the render service
//! - [`storage`] - Filesystem blob store for rendered entries
//! - [`server`] - Route table, handlers, and middleware
//! - [`config`] - Command-line flags and their defaults
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//!
//! use rendercache::{
//!     create_router, BlobStore, HttpImageSource, ImageTransformer, RenderService, RouterConfig,
//! };
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = BlobStore::new("/var/cache/render");
//!     store.ensure_root().await.unwrap();
//!
//!     let transformer = ImageTransformer::new(HttpImageSource::new(Duration::from_secs(10)));
//!     let render_service = RenderService::new(transformer, store);
//!
//!     let router = create_router(render_service, RouterConfig::new());
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
//!     axum::serve(listener, router).await.unwrap();
//! }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod image;
pub mod server;
pub mod storage;

// Flat re-exports so callers can use the crate root alone
pub use cache::{derive_key, CacheKey, FlightPermit, FlightTable, RenderService, RenderedImage};
pub use config::Config;
pub use error::{FetchError, RenderError, StorageError, TransformError};
pub use self::image::{
    decode_image, encode_image, read_rotation, sniff_format, target_dimensions, HttpImageSource,
    ImageData, ImageSource, ImageTransformer, Rotation, ScaleOp, JPEG_QUALITY,
};
pub use server::{
    create_default_router, create_router, fit_height_handler, fit_width_handler, health_handler,
    AppState, ErrorResponse, HealthResponse, RenderQueryParams, RouterConfig,
};
pub use storage::BlobStore;

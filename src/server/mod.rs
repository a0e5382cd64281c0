//! HTTP server layer for the render cache.
//!
//! This module provides the HTTP API for serving rescaled images.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        HTTP Layer                           │
//! │   GET /fit_width/{width}?url=…   GET /fit_height/{height}   │
//! │                                                             │
//! │   ┌──────────────────────┐   ┌──────────────────────────┐   │
//! │   │       handlers       │   │         routes           │   │
//! │   │ (requests/responses) │   │ (router config, CORS)    │   │
//! │   └──────────────────────┘   └──────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod handlers;
pub mod routes;

pub use handlers::{
    fit_height_handler, fit_width_handler, health_handler, AppState, ErrorResponse,
    HealthResponse, RenderQueryParams,
};
pub use routes::{create_default_router, create_router, RouterConfig};

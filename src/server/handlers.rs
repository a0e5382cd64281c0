//! HTTP request handlers for the render cache API.
//!
//! Each render handler extracts the target dimension from the path and the
//! source URL from the query string, delegates to the render service, and
//! turns the result into an image response or a JSON error.
//!
//! # Endpoints
//!
//! - `GET /fit_width/{width}?url={source}` - Scale to an exact width
//! - `GET /fit_height/{height}?url={source}` - Scale to an exact height
//! - `GET /health` - Liveness probe

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::cache::{RenderService, RenderedImage};
use crate::error::{FetchError, RenderError, TransformError};
use crate::image::ImageSource;

// =============================================================================
// Application State
// =============================================================================

/// Shared application state containing the render service.
///
/// Handlers receive a clone of this through Axum's `State` extractor.
pub struct AppState<S: ImageSource> {
    /// The render service every request goes through
    pub render_service: Arc<RenderService<S>>,

    /// max-age advertised in Cache-Control headers, in seconds
    pub cache_max_age: u32,
}

impl<S: ImageSource> AppState<S> {
    /// Wrap a render service with the default one-day max-age.
    pub fn new(render_service: RenderService<S>) -> Self {
        Self {
            render_service: Arc::new(render_service),
            cache_max_age: 86400,
        }
    }

    /// Wrap a render service with an explicit max-age.
    pub fn with_cache_max_age(render_service: RenderService<S>, cache_max_age: u32) -> Self {
        Self {
            render_service: Arc::new(render_service),
            cache_max_age,
        }
    }
}

impl<S: ImageSource> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            render_service: Arc::clone(&self.render_service),
            cache_max_age: self.cache_max_age,
        }
    }
}

// =============================================================================
// Request Parameters
// =============================================================================

/// Query parameters for render requests.
///
/// The `url` parameter is required; a request without it is rejected by the
/// extractor with `400 Bad Request` before the handler runs.
#[derive(Debug, Deserialize)]
pub struct RenderQueryParams {
    /// Source image URL to fetch and transform
    pub url: String,
}

// =============================================================================
// Response Types
// =============================================================================

/// JSON body returned for every error status.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Stable identifier (e.g., "invalid_target", "upstream_fetch")
    pub error: String,

    /// Human-readable description of what went wrong
    pub message: String,

    /// HTTP status, echoed in the body when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl ErrorResponse {
    /// Build an error body without a status echo.
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: None,
        }
    }

    /// Build an error body echoing the response status.
    pub fn with_status(
        error: impl Into<String>,
        message: impl Into<String>,
        status: StatusCode,
    ) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: Some(status.as_u16()),
        }
    }
}

/// Body of a successful health probe.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always "healthy" when the server can answer at all
    pub status: String,

    /// Crate version baked in at compile time
    pub version: String,
}

// =============================================================================
// Error Mapping
// =============================================================================

/// Convert RenderError to an HTTP response.
///
/// Client mistakes (4xx) log at warn level; everything the server or the
/// upstream got wrong (5xx) logs at error level.
impl IntoResponse for RenderError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            // 400 Bad Request - the target dimension was zero
            RenderError::InvalidTarget { value } => (
                StatusCode::BAD_REQUEST,
                "invalid_target",
                format!(
                    "Invalid target dimension: {} (must be a positive integer)",
                    value
                ),
            ),

            // 502 Bad Gateway - the upstream fetch failed
            RenderError::Transform(TransformError::Fetch(fetch_err)) => match fetch_err {
                FetchError::Status { url, status } => (
                    StatusCode::BAD_GATEWAY,
                    "upstream_status",
                    format!("Upstream {} returned HTTP status {}", url, status),
                ),
                FetchError::Timeout { url } => (
                    StatusCode::BAD_GATEWAY,
                    "upstream_timeout",
                    format!("Timed out fetching {}", url),
                ),
                FetchError::Request { url, message } => (
                    StatusCode::BAD_GATEWAY,
                    "upstream_fetch",
                    format!("Failed to fetch {}: {}", url, message),
                ),
            },

            // 415 Unsupported Media Type - content is not a known image format
            RenderError::Transform(TransformError::UnsupportedFormat { message }) => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "unsupported_format",
                format!("Unrecognized image format: {}", message),
            ),

            // 500 Internal Server Error - decode, storage, and task errors
            RenderError::Transform(TransformError::Decode { message }) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "decode_error",
                format!("Failed to decode source image: {}", message),
            ),

            RenderError::Storage(storage_err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "storage_error",
                storage_err.to_string(),
            ),

            RenderError::Encode { format, message } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "encode_error",
                format!("Failed to encode response as {}: {}", format, message),
            ),

            RenderError::TaskFailed { message } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "task_failed",
                format!("Render task failed: {}", message),
            ),
        };

        if status.is_server_error() {
            error!(
                error_type = error_type,
                status = status.as_u16(),
                "Server error: {}",
                message
            );
        } else if status.is_client_error() {
            warn!(
                error_type = error_type,
                status = status.as_u16(),
                "Client error: {}",
                message
            );
        }

        let error_response = ErrorResponse::with_status(error_type, message, status);

        (status, Json(error_response)).into_response()
    }
}

/// Newtype so handler `?` propagation lands on our IntoResponse impl.
pub struct HandlerError(pub RenderError);

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        self.0.into_response()
    }
}

impl From<RenderError> for HandlerError {
    fn from(err: RenderError) -> Self {
        HandlerError(err)
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Handle fit-width render requests.
///
/// # Endpoint
///
/// `GET /fit_width/{width}?url={source}`
///
/// # Path Parameters
///
/// - `width`: Target width in pixels (must be a positive integer)
///
/// # Query Parameters
///
/// - `url`: Source image URL (required, URL-encoded)
///
/// # Response
///
/// - `200 OK`: Rendered image in the source's detected format
/// - `400 Bad Request`: Missing `url` or a zero/non-numeric width
/// - `415 Unsupported Media Type`: Source content is not a known image format
/// - `502 Bad Gateway`: Source could not be fetched
/// - `500 Internal Server Error`: Decode, encode, or storage error
///
/// # Headers
///
/// - `Content-Type`: MIME type of the detected source format
/// - `Content-Length`: Size of the encoded body
/// - `Cache-Control: public, max-age={cache_max_age}`
/// - `X-Render-Cache-Hit: true|false`
pub async fn fit_width_handler<S: ImageSource + 'static>(
    State(state): State<AppState<S>>,
    Path(width): Path<u32>,
    Query(query): Query<RenderQueryParams>,
) -> Result<Response, HandlerError> {
    let rendered = state.render_service.fit_width(&query.url, width).await?;
    build_image_response(&state, rendered)
}

/// Handle fit-height render requests.
///
/// # Endpoint
///
/// `GET /fit_height/{height}?url={source}`
///
/// Same contract as the fit-width endpoint, with the target applied to the
/// output height instead of the width.
pub async fn fit_height_handler<S: ImageSource + 'static>(
    State(state): State<AppState<S>>,
    Path(height): Path<u32>,
    Query(query): Query<RenderQueryParams>,
) -> Result<Response, HandlerError> {
    let rendered = state.render_service.fit_height(&query.url, height).await?;
    build_image_response(&state, rendered)
}

/// Handle `GET /health`.
///
/// Answers `200 OK` with `{"status": "healthy", "version": ...}` as long as
/// the process is up. It does not touch storage or the upstream.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Encode a rendered raster and wrap it in an HTTP response.
fn build_image_response<S: ImageSource>(
    state: &AppState<S>,
    rendered: RenderedImage,
) -> Result<Response, HandlerError> {
    let body = rendered.data.encode().map_err(|e| RenderError::Encode {
        format: rendered.data.mime_type().to_string(),
        message: e.to_string(),
    })?;

    let http_response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, rendered.data.mime_type())
        .header(header::CONTENT_LENGTH, body.len())
        .header(
            header::CACHE_CONTROL,
            format!("public, max-age={}", state.cache_max_age),
        )
        .header("X-Render-Cache-Hit", rendered.cache_hit.to_string())
        .body(axum::body::Body::from(body))
        .unwrap();

    Ok(http_response)
}

// =============================================================================
// Tests
// =============================================================================

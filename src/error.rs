use thiserror::Error;

/// Errors that can occur when fetching a source image over HTTP
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// Request could not be sent or the body could not be read
    #[error("Request to {url} failed: {message}")]
    Request { url: String, message: String },

    /// Upstream answered with a non-2xx status
    #[error("{url} returned HTTP status {status}")]
    Status { url: String, status: u16 },

    /// Request exceeded the configured timeout
    #[error("Timed out fetching {url}")]
    Timeout { url: String },
}

/// Errors from the fetch/decode/orient/scale pipeline
#[derive(Debug, Clone, Error)]
pub enum TransformError {
    /// Source image could not be fetched
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Byte content is not a recognized image format (should map to HTTP 415)
    #[error("Unrecognized image format: {message}")]
    UnsupportedFormat { message: String },

    /// Content sniffed as an image but could not be decoded
    #[error("Decode error: {message}")]
    Decode { message: String },
}

/// Errors from the on-disk blob store
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    /// Cache entry could not be read
    #[error("Failed to read cache entry {path}: {message}")]
    Read { path: String, message: String },

    /// Cache entry bytes are not a decodable image
    #[error("Cache entry {path} is not a decodable image: {message}")]
    Corrupt { path: String, message: String },

    /// Cache entry could not be written
    #[error("Failed to write cache entry {path}: {message}")]
    Write { path: String, message: String },

    /// Image could not be encoded for persistence
    #[error("Failed to encode image as {format}: {message}")]
    Encode { format: String, message: String },
}

/// Errors surfaced by the render service to its callers
#[derive(Debug, Clone, Error)]
pub enum RenderError {
    /// Requested target dimension is not a positive integer
    #[error("Invalid target dimension: {value} (must be a positive integer)")]
    InvalidTarget { value: u32 },

    /// Transform pipeline failure (fetch, sniff, or decode)
    #[error(transparent)]
    Transform(#[from] TransformError),

    /// Blob store failure (read, write, or encode)
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Image could not be encoded for the response body
    #[error("Failed to encode response as {format}: {message}")]
    Encode { format: String, message: String },

    /// Background render task was lost (panicked or aborted)
    #[error("Render task failed: {message}")]
    TaskFailed { message: String },
}

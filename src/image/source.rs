//! Source image fetching.
//!
//! This module defines the seam between the transform pipeline and the
//! network: a trait for reading a source image's bytes by URL, and its
//! production implementation over an HTTP client. Tests substitute in-memory
//! sources to drive the pipeline without a network.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use url::Url;

use crate::error::FetchError;

// =============================================================================
// ImageSource Trait
// =============================================================================

/// Trait for reading a source image's full byte content by URL.
///
/// Implementations must read the body to completion: the pipeline sniffs,
/// parses metadata from, and decodes the same byte buffer.
#[async_trait]
pub trait ImageSource: Send + Sync {
    /// Fetch all bytes behind `url`.
    ///
    /// # Errors
    ///
    /// Fails when the URL is unusable, the transfer errors or times out, or
    /// the origin answers with a non-2xx status.
    async fn fetch(&self, url: &str) -> Result<Bytes, FetchError>;
}

// =============================================================================
// HTTP implementation
// =============================================================================

/// HTTP-backed implementation of `ImageSource`.
///
/// Wraps a pooled [`reqwest::Client`] with a total-request timeout. Source
/// URLs are parsed here, not at the API boundary: an unparseable URL is a
/// fetch failure like any other unreachable source.
#[derive(Debug, Clone)]
pub struct HttpImageSource {
    client: reqwest::Client,
}

impl HttpImageSource {
    /// Create a new HTTP source with the given total-request timeout.
    pub fn new(timeout: Duration) -> Self {
        // The builder only fails if the TLS backend cannot initialize.
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .build()
            .expect("failed to build HTTP client");

        Self { client }
    }
}

#[async_trait]
impl ImageSource for HttpImageSource {
    async fn fetch(&self, url: &str) -> Result<Bytes, FetchError> {
        let target = Url::parse(url).map_err(|e| FetchError::Request {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        let response = self
            .client
            .get(target)
            .send()
            .await
            .map_err(|e| classify(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.bytes().await.map_err(|e| classify(url, e))
    }
}

/// Maps a transport error onto the fetch taxonomy.
fn classify(url: &str, err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchError::Request {
            url: url.to_string(),
            message: err.to_string(),
        }
    }
}

//! Render service orchestrating the load-or-create protocol.
//!
//! The service is the main entry point for render requests. For each request
//! it derives the cache key, serves the entry from the blob store when
//! present, and otherwise runs the transform pipeline exactly once per key.
//! Concurrent requests for the same key wait on the in-flight computation
//! instead of fetching the source again.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                        RenderService                          │
//! │  ┌─────────────────────────────────────────────────────────┐  │
//! │  │                  render(url, op)                        │  │
//! │  │  1. Validate target    4. Re-check store (double-check) │  │
//! │  │  2. Derive cache key   5. Transform + store (spawned)   │  │
//! │  │  3. Probe store        6. Return upright raster         │  │
//! │  └─────────────────────────────────────────────────────────┘  │
//! │        │                  │                    │              │
//! │        ▼                  ▼                    ▼              │
//! │  ┌───────────┐    ┌──────────────┐    ┌──────────────────┐   │
//! │  │ FlightTable│   │  BlobStore   │    │ ImageTransformer │   │
//! │  └───────────┘    └──────────────┘    └──────────────────┘   │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Failure policy
//!
//! Nothing is stored on a failed computation, so a failure never poisons the
//! key: the permit is released, the next request finds no entry, and retries
//! the full pipeline.

use std::sync::Arc;

use tracing::{debug, info};

use crate::cache::flight::FlightTable;
use crate::cache::key::{derive_key, CacheKey};
use crate::error::RenderError;
use crate::image::{ImageData, ImageSource, ImageTransformer, ScaleOp};
use crate::storage::BlobStore;

// =============================================================================
// Rendered image
// =============================================================================

/// A rendered raster plus where it came from.
#[derive(Debug, Clone)]
pub struct RenderedImage {
    /// Upright, rescaled raster with its declared format.
    pub data: ImageData,

    /// Whether this render was served from the blob store.
    pub cache_hit: bool,
}

// =============================================================================
// Render service
// =============================================================================

/// Service tying the transform pipeline to the blob store.
///
/// # Type Parameters
///
/// * `S` - The image source used by the transformer (HTTP in production,
///   in-memory in tests)
///
/// # Example
///
/// ```ignore
/// use rendercache::cache::RenderService;
/// use rendercache::image::{HttpImageSource, ImageTransformer};
/// use rendercache::storage::BlobStore;
///
/// let transformer = ImageTransformer::new(HttpImageSource::new(timeout));
/// let service = RenderService::new(transformer, BlobStore::new("/var/cache/render"));
///
/// let rendered = service.fit_width("http://img.example/photo.jpg", 512).await?;
/// println!("{}x{}, hit: {}", rendered.data.width(), rendered.data.height(), rendered.cache_hit);
/// ```
pub struct RenderService<S: ImageSource> {
    /// Fetch + decode + scale pipeline
    transformer: Arc<ImageTransformer<S>>,

    /// Persisted cache entries
    store: Arc<BlobStore>,

    /// Per-key single-flight coordination
    flights: Arc<FlightTable>,
}

impl<S: ImageSource + 'static> RenderService<S> {
    /// Create a new render service over a transformer and a blob store.
    pub fn new(transformer: ImageTransformer<S>, store: BlobStore) -> Self {
        Self {
            transformer: Arc::new(transformer),
            store: Arc::new(store),
            flights: Arc::new(FlightTable::new()),
        }
    }

    /// Renders `url` scaled to the given width, loading from cache when
    /// possible.
    pub async fn fit_width(&self, url: &str, width: u32) -> Result<RenderedImage, RenderError> {
        self.render(url, ScaleOp::FitWidth(width)).await
    }

    /// Renders `url` scaled to the given height, loading from cache when
    /// possible.
    pub async fn fit_height(&self, url: &str, height: u32) -> Result<RenderedImage, RenderError> {
        self.render(url, ScaleOp::FitHeight(height)).await
    }

    /// Load-or-create for an arbitrary scale operation.
    ///
    /// # Errors
    ///
    /// Returns an error when the target value is zero, the pipeline fails
    /// (fetch, sniff, decode), or the store cannot be read or written. A
    /// pipeline failure stores nothing and releases the key for retry.
    pub async fn render(&self, url: &str, op: ScaleOp) -> Result<RenderedImage, RenderError> {
        if op.value() == 0 {
            return Err(RenderError::InvalidTarget { value: 0 });
        }

        let key = derive_key(&op.tag(), url);

        // Fast path: somebody already rendered this.
        if self.store.exists(&key).await {
            return self.load_hit(&key).await;
        }

        // Serialize computations per key. While we waited for the permit a
        // previous holder may have stored the entry, so probe again.
        let permit = self.flights.acquire(key.as_str()).await;
        if self.store.exists(&key).await {
            return self.load_hit(&key).await;
        }

        info!(key = %key, url, op = %op, "rendering and caching image");

        // The computation runs in its own task and carries the permit with
        // it: a caller that disconnects mid-render neither aborts the
        // computation nor releases the key early, and the entry still lands
        // in the store for the waiters.
        let handle = tokio::spawn({
            let transformer = Arc::clone(&self.transformer);
            let store = Arc::clone(&self.store);
            let key = key.clone();
            let url = url.to_string();
            async move {
                let _permit = permit;
                let data = transformer.transform(&url, op).await?;
                store.store(&key, &data).await?;
                Ok::<ImageData, RenderError>(data)
            }
        });

        let data = handle.await.map_err(|e| RenderError::TaskFailed {
            message: e.to_string(),
        })??;

        Ok(RenderedImage {
            data,
            cache_hit: false,
        })
    }

    /// Number of keys with an in-flight or recently finished computation.
    pub fn in_flight(&self) -> usize {
        self.flights.active()
    }

    async fn load_hit(&self, key: &CacheKey) -> Result<RenderedImage, RenderError> {
        debug!(key = %key, "serving cached render");
        let data = self.store.load(key).await?;
        Ok(RenderedImage {
            data,
            cache_hit: true,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

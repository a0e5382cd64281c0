//! Shared fixtures for the integration suite.
//!
//! Provides a scriptable in-memory image source plus generators for small
//! test images, including JPEGs carrying EXIF orientation metadata.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use std::io::Cursor;
use tempfile::TempDir;
use tokio::sync::RwLock;

use rendercache::cache::RenderService;
use rendercache::error::FetchError;
use rendercache::image::{ImageSource, ImageTransformer};
use rendercache::server::{create_router, RouterConfig};
use rendercache::storage::BlobStore;

// =============================================================================
// Mock Image Source with Request Tracking
// =============================================================================

/// A mock image source that serves pre-configured payloads per URL.
///
/// Unknown URLs answer with an upstream 404; configured failure URLs answer
/// with their configured status. Request counts are shared across clones so a
/// test can keep a handle after moving the source into a service.
pub struct MockImageSource {
    images: HashMap<String, Bytes>,
    failures: HashMap<String, u16>,
    delay: Option<Duration>,
    request_counts: Arc<RwLock<HashMap<String, usize>>>,
}

impl MockImageSource {
    pub fn new() -> Self {
        Self {
            images: HashMap::new(),
            failures: HashMap::new(),
            delay: None,
            request_counts: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn with_image(mut self, url: impl Into<String>, data: Vec<u8>) -> Self {
        self.images.insert(url.into(), Bytes::from(data));
        self
    }

    pub fn with_failure(mut self, url: impl Into<String>, status: u16) -> Self {
        self.failures.insert(url.into(), status);
        self
    }

    /// Add an artificial latency to every fetch, for concurrency tests.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub async fn get_request_count(&self, url: &str) -> usize {
        self.request_counts
            .read()
            .await
            .get(url)
            .copied()
            .unwrap_or(0)
    }
}

impl Default for MockImageSource {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for MockImageSource {
    fn clone(&self) -> Self {
        Self {
            images: self.images.clone(),
            failures: self.failures.clone(),
            delay: self.delay,
            request_counts: Arc::clone(&self.request_counts),
        }
    }
}

#[async_trait]
impl ImageSource for MockImageSource {
    async fn fetch(&self, url: &str) -> Result<Bytes, FetchError> {
        {
            let mut counts = self.request_counts.write().await;
            *counts.entry(url.to_string()).or_insert(0) += 1;
        }

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(&status) = self.failures.get(url) {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        match self.images.get(url) {
            Some(data) => Ok(data.clone()),
            None => Err(FetchError::Status {
                url: url.to_string(),
                status: 404,
            }),
        }
    }
}

// =============================================================================
// Application Construction
// =============================================================================

/// Build a router over a fresh temporary cache directory.
///
/// The returned TempDir must be kept alive for the duration of the test.
pub fn test_app(source: MockImageSource) -> (Router, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let router = test_app_with_store(source, &dir);
    (router, dir)
}

/// Build a router over an existing cache directory.
pub fn test_app_with_store(source: MockImageSource, dir: &TempDir) -> Router {
    let store = BlobStore::new(dir.path());
    let render_service = RenderService::new(ImageTransformer::new(source), store);
    create_router(render_service, RouterConfig::new())
}

// =============================================================================
// Test Image Creation
// =============================================================================

/// Encode a gradient-filled JPEG of the given size.
pub fn create_test_jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        let r = (x % 256) as u8;
        let g = (y % 256) as u8;
        let b = ((x + y) % 256) as u8;
        Rgb([r, g, b])
    });

    let mut buf = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut buf, 90);
    encoder.encode_image(&img).unwrap();
    buf
}

/// Create a test PNG image with an alpha channel.
pub fn create_test_png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_pixel(width, height, Rgba([40, 80, 120, 255]));

    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(img)
        .write_to(&mut buf, ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}

/// Create a test BMP image.
pub fn create_test_bmp(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([200, 100, 50]));

    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, ImageFormat::Bmp)
        .unwrap();
    buf.into_inner()
}

/// Create a test JPEG carrying an EXIF orientation tag.
///
/// The APP1 segment is spliced in directly after the SOI marker, which is
/// where EXIF readers expect it.
pub fn create_oriented_jpeg(width: u32, height: u32, orientation: u16) -> Vec<u8> {
    let jpeg = create_test_jpeg(width, height);
    assert_eq!(&jpeg[..2], &[0xFF, 0xD8], "JPEG must start with SOI");

    let app1 = exif_app1_segment(orientation);

    let mut out = Vec::with_capacity(jpeg.len() + app1.len());
    out.extend_from_slice(&jpeg[..2]);
    out.extend_from_slice(&app1);
    out.extend_from_slice(&jpeg[2..]);
    out
}

/// Build a minimal EXIF APP1 segment with a single orientation entry.
///
/// Layout: marker, length, "Exif\0\0", then a little-endian TIFF header with
/// one IFD containing one SHORT entry for tag 0x0112 (Orientation).
fn exif_app1_segment(orientation: u16) -> Vec<u8> {
    let mut tiff = Vec::new();
    tiff.extend_from_slice(b"II"); // little-endian byte order
    tiff.extend_from_slice(&42u16.to_le_bytes()); // TIFF magic
    tiff.extend_from_slice(&8u32.to_le_bytes()); // offset of IFD0

    tiff.extend_from_slice(&1u16.to_le_bytes()); // one IFD entry
    tiff.extend_from_slice(&0x0112u16.to_le_bytes()); // Orientation tag
    tiff.extend_from_slice(&3u16.to_le_bytes()); // type SHORT
    tiff.extend_from_slice(&1u32.to_le_bytes()); // one value
    tiff.extend_from_slice(&orientation.to_le_bytes());
    tiff.extend_from_slice(&[0, 0]); // value field padding
    tiff.extend_from_slice(&0u32.to_le_bytes()); // no next IFD

    let mut payload = Vec::new();
    payload.extend_from_slice(b"Exif\0\0");
    payload.extend_from_slice(&tiff);

    let mut segment = Vec::new();
    segment.extend_from_slice(&[0xFF, 0xE1]);
    segment.extend_from_slice(&((payload.len() as u16 + 2).to_be_bytes()));
    segment.extend_from_slice(&payload);
    segment
}

// =============================================================================
// Assertions
// =============================================================================

/// Check that the bytes look like a JPEG (SOI marker).
pub fn is_valid_jpeg(data: &[u8]) -> bool {
    data.len() >= 2 && data[0] == 0xFF && data[1] == 0xD8
}

/// Check that the bytes look like a PNG (signature).
pub fn is_valid_png(data: &[u8]) -> bool {
    data.len() >= 8 && &data[..8] == b"\x89PNG\r\n\x1a\n"
}

/// Decode the bytes and return (width, height).
pub fn decoded_dimensions(data: &[u8]) -> (u32, u32) {
    let img = image::load_from_memory(data).unwrap();
    (img.width(), img.height())
}

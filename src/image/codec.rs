//! Image content sniffing, decoding, and encoding.
//!
//! # Design Decisions
//!
//! - **Content is authoritative**: the encoding format is always sniffed from
//!   magic bytes, never taken from a URL extension or header. The same rule
//!   applies when re-reading persisted entries, so no format metadata is
//!   stored alongside them.
//!
//! - **Format is preserved**: a source fetched as PNG is cached and served as
//!   PNG. There is no format conversion in the pipeline, only re-encoding.
//!
//! - **JPEG flattening**: JPEG cannot carry an alpha channel, so rasters are
//!   flattened to RGB before JPEG encoding; other formats encode as-is.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageError, ImageFormat, ImageReader};

use crate::image::orientation::Rotation;

/// JPEG re-encode quality (1-100).
pub const JPEG_QUALITY: u8 = 80;

// =============================================================================
// Image data
// =============================================================================

/// A decoded raster together with its sniffed encoding format.
///
/// `rotation` is a transient pipeline attribute: the decode step sets it from
/// EXIF metadata, the scale step consumes it, and every raster leaving the
/// pipeline or the store is already upright (`Rotation::Deg0`). Dimensions of
/// any decoded raster are strictly positive; the codecs reject empty images.
#[derive(Debug, Clone)]
pub struct ImageData {
    /// Decoded pixel data.
    pub image: DynamicImage,

    /// Encoding format sniffed from the source bytes.
    pub format: ImageFormat,

    /// Clockwise rotation still to be applied, from orientation metadata.
    pub rotation: Rotation,
}

impl ImageData {
    /// Raster width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Raster height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Width-to-height ratio of the raster as decoded (pre-rotation).
    pub fn ratio(&self) -> f64 {
        f64::from(self.width()) / f64::from(self.height())
    }

    /// MIME type of the declared encoding format, e.g. `image/jpeg`.
    pub fn mime_type(&self) -> &'static str {
        self.format.to_mime_type()
    }

    /// Encodes the raster with its declared format.
    pub fn encode(&self) -> Result<Vec<u8>, ImageError> {
        encode_image(&self.image, self.format)
    }
}

// =============================================================================
// Codec functions
// =============================================================================

/// Sniffs the encoding format from magic bytes.
pub fn sniff_format(bytes: &[u8]) -> Result<ImageFormat, ImageError> {
    image::guess_format(bytes)
}

/// Decodes `bytes` as `format` into a raster.
pub fn decode_image(bytes: &[u8], format: ImageFormat) -> Result<DynamicImage, ImageError> {
    let reader = ImageReader::with_format(Cursor::new(bytes), format);
    reader.decode()
}

/// Encodes a raster as `format`.
///
/// JPEG output is flattened to RGB first and written at [`JPEG_QUALITY`];
/// every other format encodes the raster unchanged.
pub fn encode_image(image: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>, ImageError> {
    match format {
        ImageFormat::Jpeg => {
            let mut output = Vec::new();
            let mut encoder = JpegEncoder::new_with_quality(&mut output, JPEG_QUALITY);
            encoder.encode_image(&image.to_rgb8())?;
            Ok(output)
        }
        _ => {
            let mut output = Cursor::new(Vec::new());
            image.write_to(&mut output, format)?;
            Ok(output.into_inner())
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

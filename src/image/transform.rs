//! Aspect-preserving scale pipeline with orientation correction.
//!
//! The transformer turns a source URL and a fit operation into an upright,
//! rescaled raster:
//!
//! 1. **Fetch** the full source bytes.
//! 2. **Sniff** the encoding format from the content.
//! 3. **Read orientation** metadata off the same bytes (non-fatal).
//! 4. **Decode** into a raster.
//! 5. **Compute target size** from the pre-rotation aspect ratio.
//! 6. **Resample** to the target size.
//! 7. **Rotate** per orientation, swapping the canvas for quarter turns.
//!
//! Scaling happens in the decoded (unrotated) orientation on purpose: the
//! target size is computed against the raster as stored, then the quarter
//! turn swaps the output canvas. A 800×600 JPEG shot with EXIF orientation 6
//! and fit to width 400 therefore comes out 300×400.

use std::fmt;

use image::imageops::FilterType;
use tracing::debug;

use crate::error::TransformError;
use crate::image::codec::{self, ImageData};
use crate::image::orientation::{self, Rotation};
use crate::image::source::ImageSource;

// =============================================================================
// Scale operations
// =============================================================================

/// Aspect-ratio-preserving scale operation, constrained by one dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScaleOp {
    /// Scale so the output width equals the given value.
    FitWidth(u32),
    /// Scale so the output height equals the given value.
    FitHeight(u32),
}

impl ScaleOp {
    /// Stable tag naming this operation, used in cache key derivation.
    ///
    /// The format is `fitWidth#512` / `fitHeight#512`; changing it would
    /// silently orphan every existing cache entry.
    pub fn tag(&self) -> String {
        match self {
            ScaleOp::FitWidth(value) => format!("fitWidth#{}", value),
            ScaleOp::FitHeight(value) => format!("fitHeight#{}", value),
        }
    }

    /// The constrained dimension's target value.
    pub fn value(&self) -> u32 {
        match self {
            ScaleOp::FitWidth(value) | ScaleOp::FitHeight(value) => *value,
        }
    }
}

impl fmt::Display for ScaleOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tag())
    }
}

/// Computes the output size for `op` applied to a `width`×`height` raster.
///
/// The free dimension follows the aspect ratio `width / height` and rounds
/// up: `FitWidth(v) → (v, ceil(v / ratio))`, `FitHeight(v) → (ceil(v *
/// ratio), v)`. The rounding mode is part of the cache contract: entries
/// rendered before a change would disagree with fresh renders on size.
pub fn target_dimensions(op: ScaleOp, width: u32, height: u32) -> (u32, u32) {
    let ratio = f64::from(width) / f64::from(height);
    match op {
        ScaleOp::FitWidth(value) => {
            let target_height = (f64::from(value) / ratio).ceil() as u32;
            (value, target_height)
        }
        ScaleOp::FitHeight(value) => {
            let target_width = (f64::from(value) * ratio).ceil() as u32;
            (target_width, value)
        }
    }
}

// =============================================================================
// Transformer
// =============================================================================

/// Fetches, decodes, and rescales source images.
///
/// Pure compute plus one network call; the transformer knows nothing about
/// cache keys or storage. Generic over its [`ImageSource`] so tests can feed
/// it in-memory bytes.
pub struct ImageTransformer<S: ImageSource> {
    source: S,
}

impl<S: ImageSource> ImageTransformer<S> {
    /// Create a transformer reading sources from `source`.
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Runs the full pipeline for `url` and `op`.
    ///
    /// The returned raster is upright (`rotation` is 0) and carries the
    /// format sniffed from the source bytes. `op`'s value must be positive;
    /// the render service rejects zero before calling.
    ///
    /// # Errors
    ///
    /// Fails when the source cannot be fetched, its bytes are not a
    /// recognized image format, or the decode fails. Absent or unreadable
    /// orientation metadata is not an error.
    pub async fn transform(&self, url: &str, op: ScaleOp) -> Result<ImageData, TransformError> {
        let bytes = self.source.fetch(url).await?;
        let decoded = decode_source(&bytes)?;

        debug!(
            url,
            width = decoded.width(),
            height = decoded.height(),
            rotation = %decoded.rotation,
            format = ?decoded.format,
            "decoded source image"
        );

        Ok(scale(decoded, op))
    }
}

/// Sniffs, reads orientation from, and decodes raw source bytes.
fn decode_source(bytes: &[u8]) -> Result<ImageData, TransformError> {
    let format = codec::sniff_format(bytes).map_err(|e| TransformError::UnsupportedFormat {
        message: e.to_string(),
    })?;

    // Orientation comes from a separate metadata pass over the same bytes.
    // No metadata is a normal condition, not an error.
    let rotation = match orientation::read_rotation(bytes) {
        Some(rotation) => rotation,
        None => {
            debug!("no usable orientation metadata, assuming upright");
            Rotation::Deg0
        }
    };

    let image = codec::decode_image(bytes, format).map_err(|e| TransformError::Decode {
        message: e.to_string(),
    })?;

    Ok(ImageData {
        image,
        format,
        rotation,
    })
}

/// Resamples to the target size, then applies the pending rotation.
fn scale(source: ImageData, op: ScaleOp) -> ImageData {
    let (target_width, target_height) = target_dimensions(op, source.width(), source.height());
    let scaled = source
        .image
        .resize_exact(target_width, target_height, FilterType::Triangle);

    // The target size addressed the unrotated raster; a quarter turn now
    // swaps the output canvas.
    let corrected = source.rotation.apply(scaled);

    ImageData {
        image: corrected,
        format: source.format,
        rotation: Rotation::Deg0,
    }
}

// =============================================================================
// Tests
// =============================================================================

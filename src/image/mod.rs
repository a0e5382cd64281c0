//! Image acquisition and transformation.
//!
//! Everything between a source URL and an upright, rescaled raster lives
//! here; nothing in this module knows about cache keys or storage.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │             Render Service              │
//! └────────────────────┬────────────────────┘
//!                      │ transform(url, op)
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │            ImageTransformer             │
//! │   fetch → sniff → orient → decode →     │
//! │        scale → rotation fix-up          │
//! └──────┬──────────────────────┬───────────┘
//!        │                      │
//!        ▼                      ▼
//! ┌──────────────┐    ┌─────────────────────┐
//! │ ImageSource  │    │  codec/orientation  │
//! │ (HTTP fetch) │    │  (bytes ↔ raster)   │
//! └──────────────┘    └─────────────────────┘
//! ```

mod codec;
mod orientation;
mod source;
mod transform;

pub use codec::{decode_image, encode_image, sniff_format, ImageData, JPEG_QUALITY};
pub use orientation::{read_rotation, Rotation};
pub use source::{HttpImageSource, ImageSource};
pub use transform::{target_dimensions, ImageTransformer, ScaleOp};

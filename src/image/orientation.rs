//! EXIF orientation handling.
//!
//! Cameras record sensor orientation in EXIF metadata instead of rotating
//! pixel data. This module reads that tag from raw source bytes and maps it
//! to the clockwise rotation needed to display the raster upright.
//!
//! Metadata problems are never fatal: absent, truncated, or malformed EXIF
//! simply reads as "no rotation known", which callers treat as 0°.

use std::fmt;
use std::io::Cursor;

use image::DynamicImage;

/// Clockwise rotation that makes a decoded raster display upright.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    /// Maps an EXIF orientation tag value to a rotation.
    ///
    /// Only the pure-rotation orientations are honored: `1 → 0°`, `6 → 90°`,
    /// `3 → 180°`, `8 → 270°`. Mirrored orientations (2, 4, 5, 7) and
    /// out-of-range values fall back to 0°.
    pub fn from_exif_tag(value: u32) -> Self {
        match value {
            6 => Rotation::Deg90,
            3 => Rotation::Deg180,
            8 => Rotation::Deg270,
            _ => Rotation::Deg0,
        }
    }

    /// Rotation amount in degrees.
    pub fn degrees(self) -> u32 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }

    /// True when applying this rotation swaps canvas width and height.
    pub fn swaps_dimensions(self) -> bool {
        matches!(self, Rotation::Deg90 | Rotation::Deg270)
    }

    /// Rotates `img` clockwise by this amount.
    ///
    /// Quarter turns return a raster with swapped dimensions; 0° and 180°
    /// preserve them.
    pub fn apply(self, img: DynamicImage) -> DynamicImage {
        match self {
            Rotation::Deg0 => img,
            Rotation::Deg90 => img.rotate90(),
            Rotation::Deg180 => img.rotate180(),
            Rotation::Deg270 => img.rotate270(),
        }
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.degrees())
    }
}

/// Reads the EXIF orientation tag from raw image bytes.
///
/// The read is independent of the pixel decode: it walks the container's
/// metadata segments only. Returns `None` when there is no EXIF segment, the
/// segment cannot be parsed, or the orientation field is missing.
pub fn read_rotation(bytes: &[u8]) -> Option<Rotation> {
    let mut cursor = Cursor::new(bytes);
    let exif = exif::Reader::new().read_from_container(&mut cursor).ok()?;

    let field = exif.get_field(exif::Tag::Orientation, exif::In::PRIMARY)?;
    let value = field.value.get_uint(0)?;

    Some(Rotation::from_exif_tag(value))
}

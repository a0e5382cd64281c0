//! Content-addressed render cache.
//!
//! This module owns everything between an incoming render request and the
//! blob store: deterministic cache keys, per-key single-flight coordination,
//! and the load-or-create orchestration.
//!
//! Cache entries are addressed by a digest of the operation tag and the
//! source URL, so the same request always maps to the same file and two
//! different operations on the same source never collide.

mod flight;
mod key;
mod service;

pub use flight::{FlightPermit, FlightTable};
pub use key::{derive_key, CacheKey};
pub use service::{RenderService, RenderedImage};

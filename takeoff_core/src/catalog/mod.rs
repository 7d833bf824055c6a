//! # Shape Catalog
//!
//! Maps a structural size designation to weight and surface area per foot.
//!
//! Lookups never fail: an unknown designation yields zeros and a logged
//! warning, and the caller decides how to surface it. A line with a typo in
//! its size simply prices at zero weight until corrected.
//!
//! ## Example
//!
//! ```rust
//! use takeoff_core::catalog::{builtin, lookup};
//!
//! let hit = lookup(builtin(), "W12X26");
//! assert!(hit.found);
//! assert_eq!(hit.weight_per_ft, 26.0);
//!
//! let miss = lookup(builtin(), "W99X1");
//! assert!(!miss.found);
//! assert_eq!(miss.weight_per_ft, 0.0);
//! assert_eq!(miss.surface_area_per_ft, 0.0);
//! ```

pub mod shapes;

pub use shapes::{builtin_common_shapes, normalize_designation, SectionDims, ShapeCatalog, ShapeEntry, ShapeFamily};

use std::sync::Arc;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

static BUILTIN_CATALOG: Lazy<Arc<ShapeCatalog>> = Lazy::new(|| Arc::new(builtin_common_shapes()));

/// The built-in catalog of common shapes, built once on first use.
pub fn builtin() -> &'static ShapeCatalog {
    &BUILTIN_CATALOG
}

/// Shared handle to the built-in catalog
pub fn builtin_shared() -> Arc<ShapeCatalog> {
    Arc::clone(&BUILTIN_CATALOG)
}

/// Result of a catalog lookup
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CatalogLookup {
    /// lb/ft, zero when not found
    pub weight_per_ft: f64,
    /// ft²/ft, zero when not found
    pub surface_area_per_ft: f64,
    /// Whether the designation was in the catalog
    pub found: bool,
}

/// Look up a designation, returning zeros (and logging a warning) when unknown.
///
/// An empty designation is "no size selected" rather than an unknown one and
/// is not warned about.
pub fn lookup(catalog: &ShapeCatalog, designation: &str) -> CatalogLookup {
    if designation.trim().is_empty() {
        return CatalogLookup::default();
    }
    match catalog.get(designation) {
        Some(entry) => CatalogLookup {
            weight_per_ft: entry.weight_per_ft,
            surface_area_per_ft: entry.surface_area_per_ft,
            found: true,
        },
        None => {
            tracing::warn!(designation, "unknown size designation; weight and area set to zero");
            CatalogLookup::default()
        }
    }
}

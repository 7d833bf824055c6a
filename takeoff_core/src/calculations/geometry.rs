//! # Geometry
//!
//! Weight and surface area for one line, branching on material kind.
//!
//! ## Structural
//!
//! ```text
//! length_ft          = length_ft + length_in / 12   (rounded up to stock if enabled)
//! total_weight       = weight_per_ft × length_ft × qty
//! total_surface_area = surface_area_per_ft × length_ft × qty
//! ```
//!
//! ## Plate
//!
//! ```text
//! area_sf      = w × l / 144
//! perimeter_ft = 2 (w + l) / 12
//! unit_weight  = area_sf × t × 40.8
//! surface      = area_sf                          (one side)
//!              = 2 area_sf + perimeter_ft × t/12  (both sides and edges)
//! ```

use serde::{Deserialize, Serialize};

use crate::catalog::{lookup, ShapeCatalog};
use crate::line::{PlateSpec, StructuralSpec};
use crate::units::{finite_or_zero, parse_inches, Feet, Inches, Pounds, SqFt, SqIn, PLATE_LB_PER_SF_PER_IN};

/// Per-plate geometry
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PlateGeometry {
    /// Normalized thickness, inches
    pub thickness_in: f64,
    /// One face, ft²
    pub area_sf: f64,
    pub perimeter_ft: f64,
    /// Coated surface of one plate, ft²
    pub surface_area_sf: f64,
    /// Weight of one plate, lb
    pub unit_weight: f64,
}

/// Geometry outputs for one line
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Geometry {
    /// lb/ft (zero for plates)
    pub weight_per_ft: f64,
    /// lb
    pub total_weight: f64,
    /// ft²/ft (zero for plates)
    pub surface_area_per_ft: f64,
    /// ft²
    pub total_surface_area: f64,
    /// Piece length actually priced, ft (after stock rounding)
    pub billed_length_ft: f64,
    pub plate: Option<PlateGeometry>,
    /// A size was entered but the catalog doesn't know it
    pub size_not_found: bool,
}

/// Round a piece length up to the next multiple of the stock increment.
///
/// A non-positive increment leaves the length unchanged.
pub fn stock_length(length_ft: f64, increment_ft: f64) -> f64 {
    if !(increment_ft.is_finite() && increment_ft > 0.0) || length_ft <= 0.0 {
        return length_ft;
    }
    let pieces = length_ft / increment_ft;
    // Lengths that are already a multiple (within float noise) stay put
    if (pieces - pieces.round()).abs() < 1e-9 {
        return pieces.round() * increment_ft;
    }
    pieces.ceil() * increment_ft
}

/// Geometry of a structural line.
///
/// `stock_increment_ft` is `Some` when stock rounding is on for this line.
pub fn structural(
    spec: &StructuralSpec,
    qty: f64,
    catalog: &ShapeCatalog,
    stock_increment_ft: Option<f64>,
) -> Geometry {
    // Cleared size: nothing is priced, every output goes to zero
    if spec.size.trim().is_empty() {
        return Geometry::default();
    }

    let hit = lookup(catalog, &spec.size);
    let qty = finite_or_zero(qty);
    let mut length = finite_or_zero(spec.length().total_feet().value());
    if let Some(increment) = stock_increment_ft {
        length = stock_length(length, increment);
    }

    Geometry {
        weight_per_ft: hit.weight_per_ft,
        total_weight: hit.weight_per_ft * length * qty,
        surface_area_per_ft: hit.surface_area_per_ft,
        total_surface_area: hit.surface_area_per_ft * length * qty,
        billed_length_ft: length,
        plate: None,
        size_not_found: !hit.found,
    }
}

/// Geometry of one plate, before quantity.
pub fn plate_unit(spec: &PlateSpec) -> PlateGeometry {
    let thickness = match parse_inches(&spec.thickness) {
        Some(t) => t,
        None => {
            if !spec.thickness.trim().is_empty() {
                tracing::warn!(thickness = %spec.thickness, "unparseable plate thickness; using 0");
            }
            0.0
        }
    };
    let width = finite_or_zero(spec.width_in);
    let length = finite_or_zero(spec.length_in);

    let area = SqFt::from(SqIn(width * length));
    let perimeter = Feet::from(Inches(2.0 * (width + length)));
    let unit_weight = Pounds(area.value() * thickness * PLATE_LB_PER_SF_PER_IN);
    let surface = if spec.one_side_coat {
        area
    } else {
        area * 2.0 + SqFt(perimeter.value() * Feet::from(Inches(thickness)).value())
    };

    PlateGeometry {
        thickness_in: thickness,
        area_sf: area.value(),
        perimeter_ft: perimeter.value(),
        surface_area_sf: surface.value(),
        unit_weight: unit_weight.value(),
    }
}

/// Geometry of a plate line; totals are per-plate values × plate quantity.
pub fn plate(spec: &PlateSpec) -> Geometry {
    let unit = plate_unit(spec);
    let qty = finite_or_zero(spec.plate_qty);
    Geometry {
        weight_per_ft: 0.0,
        total_weight: unit.unit_weight * qty,
        surface_area_per_ft: 0.0,
        total_surface_area: unit.surface_area_sf * qty,
        billed_length_ft: 0.0,
        plate: Some(unit),
        size_not_found: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::builtin;

    fn member(size: &str, ft: f64, inches: f64) -> StructuralSpec {
        StructuralSpec {
            shape: "W".to_string(),
            size: size.to_string(),
            grade: "A992".to_string(),
            length_ft: ft,
            length_in: inches,
        }
    }

    #[test]
    fn test_weight_formula() {
        let geo = structural(&member("W12X26", 20.0, 6.0), 4.0, builtin(), None);
        // 26 × 20.5 × 4
        assert!((geo.total_weight - 2132.0).abs() < 1e-6);
        assert_eq!(geo.weight_per_ft, 26.0);
        assert!((geo.total_surface_area - geo.surface_area_per_ft * 20.5 * 4.0).abs() < 1e-6);
        assert!(!geo.size_not_found);
    }

    #[test]
    fn test_cleared_size_zeroes_everything() {
        let geo = structural(&member("", 20.0, 0.0), 4.0, builtin(), None);
        assert_eq!(geo, Geometry::default());
        assert!(!geo.size_not_found);
    }

    #[test]
    fn test_unknown_size_zeroes_weight() {
        let geo = structural(&member("W99X999", 20.0, 0.0), 2.0, builtin(), None);
        assert_eq!(geo.total_weight, 0.0);
        assert_eq!(geo.total_surface_area, 0.0);
        assert!(geo.size_not_found);
    }

    #[test]
    fn test_stock_rounding() {
        assert_eq!(stock_length(20.1, 1.0), 21.0);
        assert_eq!(stock_length(20.0, 1.0), 20.0);
        assert_eq!(stock_length(20.5, 5.0), 25.0);
        assert_eq!(stock_length(20.5, 0.0), 20.5);

        let geo = structural(&member("W12X26", 20.0, 1.0), 1.0, builtin(), Some(1.0));
        assert_eq!(geo.billed_length_ft, 21.0);
        assert!((geo.total_weight - 26.0 * 21.0).abs() < 1e-9);
    }

    #[test]
    fn test_plate_two_sides() {
        let spec = PlateSpec {
            thickness: "1/2".to_string(),
            width_in: 12.0,
            length_in: 24.0,
            plate_qty: 3.0,
            one_side_coat: false,
            grade: "A36".to_string(),
        };
        let geo = plate(&spec);
        let unit = geo.plate.unwrap();
        assert!((unit.area_sf - 2.0).abs() < 1e-12);
        assert!((unit.perimeter_ft - 6.0).abs() < 1e-12);
        assert!((unit.unit_weight - 40.8).abs() < 1e-9);
        // 2 × 2 + 6 × 0.5/12
        assert!((unit.surface_area_sf - 4.25).abs() < 1e-9);
        assert!((geo.total_weight - 122.4).abs() < 1e-9);
        assert!((geo.total_surface_area - 12.75).abs() < 1e-9);
    }

    #[test]
    fn test_plate_one_side() {
        let spec = PlateSpec {
            thickness: "3/4\"".to_string(),
            width_in: 12.0,
            length_in: 12.0,
            plate_qty: 1.0,
            one_side_coat: true,
            ..PlateSpec::default()
        };
        let unit = plate_unit(&spec);
        assert_eq!(unit.thickness_in, 0.75);
        assert!((unit.surface_area_sf - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_plate_bad_thickness_weighs_nothing() {
        let spec = PlateSpec {
            thickness: "thick".to_string(),
            width_in: 10.0,
            length_in: 10.0,
            ..PlateSpec::default()
        };
        let geo = plate(&spec);
        assert_eq!(geo.total_weight, 0.0);
        assert!(geo.total_surface_area > 0.0);
    }
}

//! # Cost Composition
//!
//! ```text
//! material            = total_weight × material_rate
//! labor               = total_labor_hours × labor_rate
//! hardware            = hardware_qty × cost_per_set
//! coating             = by coating basis (weight, area or zero)
//! material_with_waste = material × (1 + material_waste%)
//! labor_with_waste    = labor × (1 + labor_waste%)
//! subtotal            = material_with_waste + labor_with_waste + coating + hardware
//! with_overhead       = subtotal × (1 + overhead%)
//! with_profit         = with_overhead × (1 + profit%)
//! total               = with_profit × (1 + tax%)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use takeoff_core::calculations::cost::{apply_markup, BaseCosts};
//! use takeoff_core::rates::Markup;
//!
//! let base = BaseCosts { material: 1000.0, labor: 500.0, coating: 100.0, hardware: 50.0 };
//! let markup = Markup {
//!     material_waste_pct: 5.0,
//!     labor_waste_pct: 10.0,
//!     overhead_pct: 15.0,
//!     profit_pct: 10.0,
//!     tax_pct: 0.0,
//! };
//! let cost = apply_markup(base, &markup);
//! assert!((cost.total_cost - 2150.50).abs() < 1e-9);
//! ```

use serde::{Deserialize, Serialize};

use crate::line::{CoatingBasis, CoatingSystem};
use crate::rates::Markup;
use crate::units::finite_or_zero;

/// Unmarked-up cost components
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BaseCosts {
    pub material: f64,
    pub labor: f64,
    pub coating: f64,
    pub hardware: f64,
}

/// Full cost build-up for one line (or a sum of lines)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub material: f64,
    pub labor: f64,
    pub coating: f64,
    pub hardware: f64,
    pub material_with_waste: f64,
    pub labor_with_waste: f64,
    pub subtotal: f64,
    pub subtotal_with_overhead: f64,
    pub total_with_profit: f64,
    pub tax: f64,
    pub total_cost: f64,
}

impl CostBreakdown {
    /// Component-wise sum, used for collection totals
    pub fn accumulate(&mut self, other: &CostBreakdown) {
        self.material += other.material;
        self.labor += other.labor;
        self.coating += other.coating;
        self.hardware += other.hardware;
        self.material_with_waste += other.material_with_waste;
        self.labor_with_waste += other.labor_with_waste;
        self.subtotal += other.subtotal;
        self.subtotal_with_overhead += other.subtotal_with_overhead;
        self.total_with_profit += other.total_with_profit;
        self.tax += other.tax;
        self.total_cost += other.total_cost;
    }
}

/// Coating cost for a system given the line's weight and surface area.
pub fn coating_cost(system: &CoatingSystem, total_weight: f64, surface_area: f64, rate: f64) -> f64 {
    match system.basis() {
        CoatingBasis::NoCoating => 0.0,
        CoatingBasis::Weight => total_weight * rate,
        CoatingBasis::AreaPerGallon | CoatingBasis::AreaPerSquareFoot => surface_area * rate,
        CoatingBasis::Unrecognized => {
            tracing::warn!(coating = %system, "unrecognized coating system; coating cost set to zero");
            0.0
        }
    }
}

/// Apply waste, overhead, profit and tax to base costs.
pub fn apply_markup(base: BaseCosts, markup: &Markup) -> CostBreakdown {
    let factor = |pct: f64| 1.0 + finite_or_zero(pct) / 100.0;

    let material = finite_or_zero(base.material);
    let labor = finite_or_zero(base.labor);
    let coating = finite_or_zero(base.coating);
    let hardware = finite_or_zero(base.hardware);

    let material_with_waste = material * factor(markup.material_waste_pct);
    let labor_with_waste = labor * factor(markup.labor_waste_pct);
    let subtotal = material_with_waste + labor_with_waste + coating + hardware;
    let subtotal_with_overhead = subtotal * factor(markup.overhead_pct);
    let total_with_profit = subtotal_with_overhead * factor(markup.profit_pct);
    let total_cost = total_with_profit * factor(markup.tax_pct);

    CostBreakdown {
        material,
        labor,
        coating,
        hardware,
        material_with_waste,
        labor_with_waste,
        subtotal,
        subtotal_with_overhead,
        total_with_profit,
        tax: total_cost - total_with_profit,
        total_cost,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn markup(material: f64, labor: f64, overhead: f64, profit: f64, tax: f64) -> Markup {
        Markup {
            material_waste_pct: material,
            labor_waste_pct: labor,
            overhead_pct: overhead,
            profit_pct: profit,
            tax_pct: tax,
        }
    }

    #[test]
    fn test_composition_example() {
        let base = BaseCosts {
            material: 1000.0,
            labor: 500.0,
            coating: 100.0,
            hardware: 50.0,
        };
        let cost = apply_markup(base, &markup(5.0, 10.0, 15.0, 10.0, 0.0));
        assert!((cost.material_with_waste - 1050.0).abs() < 1e-9);
        assert!((cost.labor_with_waste - 550.0).abs() < 1e-9);
        assert!((cost.subtotal - 1700.0).abs() < 1e-9);
        assert!((cost.subtotal_with_overhead - 1955.0).abs() < 1e-9);
        assert!((cost.total_cost - 2150.50).abs() < 1e-9);
        assert_eq!(cost.tax, 0.0);
    }

    #[test]
    fn test_tax_applies_after_profit() {
        let base = BaseCosts {
            material: 100.0,
            ..BaseCosts::default()
        };
        let cost = apply_markup(base, &markup(0.0, 0.0, 0.0, 10.0, 8.0));
        assert!((cost.total_with_profit - 110.0).abs() < 1e-9);
        assert!((cost.tax - 8.8).abs() < 1e-9);
        assert!((cost.total_cost - 118.8).abs() < 1e-9);
    }

    #[test]
    fn test_coating_by_basis() {
        assert_eq!(coating_cost(&CoatingSystem::None, 1000.0, 50.0, 3.0), 0.0);
        assert_eq!(coating_cost(&CoatingSystem::Galvanizing, 1000.0, 50.0, 0.45), 450.0);
        assert_eq!(coating_cost(&CoatingSystem::Paint, 1000.0, 50.0, 2.0), 100.0);
        assert_eq!(coating_cost(&CoatingSystem::ZincPrimer, 1000.0, 50.0, 1.0), 50.0);
        assert_eq!(
            coating_cost(&CoatingSystem::Other("Mystery".to_string()), 1000.0, 50.0, 9.0),
            0.0
        );
    }

    #[test]
    fn test_markup_is_pure() {
        let base = BaseCosts {
            material: 812.5,
            labor: 311.0,
            coating: 42.0,
            hardware: 18.0,
        };
        let m = markup(3.0, 7.5, 12.0, 8.0, 6.25);
        assert_eq!(apply_markup(base, &m), apply_markup(base, &m));
    }

    #[test]
    fn test_accumulate() {
        let one = apply_markup(
            BaseCosts {
                material: 10.0,
                ..BaseCosts::default()
            },
            &Markup::default(),
        );
        let mut sum = CostBreakdown::default();
        sum.accumulate(&one);
        sum.accumulate(&one);
        assert_eq!(sum.material, 20.0);
        assert_eq!(sum.total_cost, 20.0);
    }
}

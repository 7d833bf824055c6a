//! # Rate Resolution
//!
//! Unit rates come from a layered chain, highest precedence first:
//!
//! 1. the line's own override
//! 2. the project's rate table
//! 3. the company's rate table
//! 4. a built-in fallback constant
//!
//! Material rates are selected by grade, labor rates by work type and
//! coating rates by coating system name. Table keys match case-insensitively.
//! A missing, negative or non-finite value is treated as unset and falls
//! through; an explicit `0.0` is a real rate.
//!
//! ## Example
//!
//! ```rust
//! use takeoff_core::rates::{RateKind, RateResolver, RateSettings, RateSource};
//!
//! let mut company = RateSettings::default();
//! company.material_rates.insert("A992".to_string(), 0.92);
//! let project = RateSettings::default();
//!
//! let resolver = RateResolver::new(&project, &company);
//! let rate = resolver.resolve(RateKind::Material, "a992", None);
//! assert_eq!(rate.rate, 0.92);
//! assert_eq!(rate.source, RateSource::Company);
//!
//! let overridden = resolver.resolve(RateKind::Material, "A992", Some(1.10));
//! assert_eq!(overridden.source, RateSource::LineOverride);
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::line::CoatingSystem;

/// Fallback material rate, $/lb
pub const FALLBACK_MATERIAL_RATE: f64 = 0.85;

/// Fallback shop labor rate, $/hr
pub const FALLBACK_LABOR_RATE: f64 = 75.0;

/// Fallback coating rate for a system: $/sf for area-based systems, $/lb for
/// galvanizing, zero for no coating or an unknown system.
pub fn fallback_coating_rate(system: &CoatingSystem) -> f64 {
    match system {
        CoatingSystem::None | CoatingSystem::Other(_) => 0.0,
        CoatingSystem::StandardShopPrimer => 0.75,
        CoatingSystem::ZincPrimer => 1.10,
        CoatingSystem::Paint => 2.50,
        CoatingSystem::PowderCoat => 3.50,
        CoatingSystem::SpecialtyCoating => 4.00,
        CoatingSystem::Galvanizing => 0.45,
    }
}

/// Markup percentages. Each one is optional so a project can override only
/// some of the company's values.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkupSettings {
    pub material_waste_pct: Option<f64>,
    pub labor_waste_pct: Option<f64>,
    pub overhead_pct: Option<f64>,
    pub profit_pct: Option<f64>,
    /// Applied after profit
    pub tax_pct: Option<f64>,
}

/// One level (company or project) of rate configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RateSettings {
    /// Grade → $/lb
    pub material_rates: BTreeMap<String, f64>,
    /// Work type → $/hr
    pub labor_rates: BTreeMap<String, f64>,
    /// Coating system name → $/sf (or $/lb for galvanizing)
    pub coating_rates: BTreeMap<String, f64>,
    pub markup: MarkupSettings,
}

impl RateSettings {
    fn table(&self, kind: RateKind) -> &BTreeMap<String, f64> {
        match kind {
            RateKind::Material => &self.material_rates,
            RateKind::Labor => &self.labor_rates,
            RateKind::Coating => &self.coating_rates,
        }
    }

    /// Look up a rate by selector, ignoring case and surrounding whitespace.
    pub fn rate_for(&self, kind: RateKind, selector: &str) -> Option<f64> {
        let selector = selector.trim();
        if selector.is_empty() {
            return None;
        }
        let table = self.table(kind);
        table
            .get(selector)
            .or_else(|| {
                table
                    .iter()
                    .find(|(key, _)| key.trim().eq_ignore_ascii_case(selector))
                    .map(|(_, v)| v)
            })
            .copied()
            .and_then(usable)
    }
}

/// Which unit rate is being resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RateKind {
    /// $/lb, selected by grade
    Material,
    /// $/hr, selected by work type
    Labor,
    /// $/sf or $/lb, selected by coating system
    Coating,
}

/// Where a resolved rate came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RateSource {
    LineOverride,
    Project,
    Company,
    #[default]
    Fallback,
}

/// An effective rate and its origin
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ResolvedRate {
    pub rate: f64,
    pub source: RateSource,
}

/// Markup percentages after project → company → zero resolution
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Markup {
    pub material_waste_pct: f64,
    pub labor_waste_pct: f64,
    pub overhead_pct: f64,
    pub profit_pct: f64,
    pub tax_pct: f64,
}

/// Resolves rates against one project and one company rate table.
///
/// Holds only borrowed settings; every call is a pure function of them.
#[derive(Debug, Clone, Copy)]
pub struct RateResolver<'a> {
    project: &'a RateSettings,
    company: &'a RateSettings,
}

impl<'a> RateResolver<'a> {
    pub fn new(project: &'a RateSettings, company: &'a RateSettings) -> Self {
        RateResolver { project, company }
    }

    /// Resolve a rate through line override → project → company → fallback.
    pub fn resolve(&self, kind: RateKind, selector: &str, line_override: Option<f64>) -> ResolvedRate {
        if let Some(rate) = line_override.and_then(usable) {
            return ResolvedRate {
                rate,
                source: RateSource::LineOverride,
            };
        }
        if let Some(rate) = self.project.rate_for(kind, selector) {
            return ResolvedRate {
                rate,
                source: RateSource::Project,
            };
        }
        if let Some(rate) = self.company.rate_for(kind, selector) {
            return ResolvedRate {
                rate,
                source: RateSource::Company,
            };
        }
        let rate = match kind {
            RateKind::Material => FALLBACK_MATERIAL_RATE,
            RateKind::Labor => FALLBACK_LABOR_RATE,
            RateKind::Coating => fallback_coating_rate(&CoatingSystem::parse(selector)),
        };
        ResolvedRate {
            rate,
            source: RateSource::Fallback,
        }
    }

    /// Resolve every markup percentage (project, then company, then zero).
    pub fn markup(&self) -> Markup {
        let pick = |project: Option<f64>, company: Option<f64>| {
            project.and_then(usable).or_else(|| company.and_then(usable)).unwrap_or(0.0)
        };
        let (p, c) = (&self.project.markup, &self.company.markup);
        Markup {
            material_waste_pct: pick(p.material_waste_pct, c.material_waste_pct),
            labor_waste_pct: pick(p.labor_waste_pct, c.labor_waste_pct),
            overhead_pct: pick(p.overhead_pct, c.overhead_pct),
            profit_pct: pick(p.profit_pct, c.profit_pct),
            tax_pct: pick(p.tax_pct, c.tax_pct),
        }
    }
}

fn usable(value: f64) -> Option<f64> {
    (value.is_finite() && value >= 0.0).then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(material: &[(&str, f64)], labor: &[(&str, f64)]) -> RateSettings {
        RateSettings {
            material_rates: material.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            labor_rates: labor.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            ..RateSettings::default()
        }
    }

    #[test]
    fn test_precedence_chain() {
        let project = settings(&[("A992", 0.95)], &[]);
        let company = settings(&[("A992", 0.90), ("A36", 0.80)], &[("Shop Fab", 68.0)]);
        let resolver = RateResolver::new(&project, &company);

        let r = resolver.resolve(RateKind::Material, "A992", Some(1.2));
        assert_eq!((r.rate, r.source), (1.2, RateSource::LineOverride));

        let r = resolver.resolve(RateKind::Material, "A992", None);
        assert_eq!((r.rate, r.source), (0.95, RateSource::Project));

        let r = resolver.resolve(RateKind::Material, "A36", None);
        assert_eq!((r.rate, r.source), (0.80, RateSource::Company));

        let r = resolver.resolve(RateKind::Material, "A500", None);
        assert_eq!((r.rate, r.source), (FALLBACK_MATERIAL_RATE, RateSource::Fallback));

        let r = resolver.resolve(RateKind::Labor, "shop fab", None);
        assert_eq!((r.rate, r.source), (68.0, RateSource::Company));

        let r = resolver.resolve(RateKind::Labor, "", None);
        assert_eq!((r.rate, r.source), (FALLBACK_LABOR_RATE, RateSource::Fallback));
    }

    #[test]
    fn test_unusable_values_fall_through() {
        let project = settings(&[("A992", f64::NAN)], &[]);
        let company = settings(&[("A992", -1.0)], &[]);
        let resolver = RateResolver::new(&project, &company);

        let r = resolver.resolve(RateKind::Material, "A992", Some(f64::INFINITY));
        assert_eq!(r.source, RateSource::Fallback);
    }

    #[test]
    fn test_zero_is_an_explicit_rate() {
        let project = settings(&[("A992", 0.0)], &[]);
        let company = settings(&[("A992", 0.9)], &[]);
        let resolver = RateResolver::new(&project, &company);
        let r = resolver.resolve(RateKind::Material, "A992", None);
        assert_eq!((r.rate, r.source), (0.0, RateSource::Project));
    }

    #[test]
    fn test_coating_fallbacks_by_system() {
        let empty = RateSettings::default();
        let resolver = RateResolver::new(&empty, &empty);
        assert_eq!(resolver.resolve(RateKind::Coating, "Galvanizing", None).rate, 0.45);
        assert_eq!(resolver.resolve(RateKind::Coating, "Standard Shop Primer", None).rate, 0.75);
        assert_eq!(resolver.resolve(RateKind::Coating, "None", None).rate, 0.0);
        assert_eq!(resolver.resolve(RateKind::Coating, "Intumescent", None).rate, 0.0);
    }

    #[test]
    fn test_markup_resolution() {
        let mut project = RateSettings::default();
        project.markup.profit_pct = Some(12.0);
        let mut company = RateSettings::default();
        company.markup = MarkupSettings {
            material_waste_pct: Some(5.0),
            labor_waste_pct: Some(10.0),
            overhead_pct: Some(15.0),
            profit_pct: Some(10.0),
            tax_pct: None,
        };

        let markup = RateResolver::new(&project, &company).markup();
        assert_eq!(markup.material_waste_pct, 5.0);
        assert_eq!(markup.profit_pct, 12.0);
        assert_eq!(markup.tax_pct, 0.0);
    }

    #[test]
    fn test_resolution_is_pure() {
        let project = settings(&[("A992", 0.95)], &[("Shop Fab", 70.0)]);
        let company = RateSettings::default();
        let resolver = RateResolver::new(&project, &company);
        let first = resolver.resolve(RateKind::Labor, "Shop Fab", None);
        let second = resolver.resolve(RateKind::Labor, "Shop Fab", None);
        assert_eq!(first, second);
    }
}

//! # Derived-Field Calculations
//!
//! Everything a line shows beyond what the estimator typed is computed here
//! by one pure pipeline:
//!
//! ```text
//! LineItem ──► geometry (catalog / plate math)
//!          ──► labor hours
//!          ──► resolved rates (line → project → company → fallback)
//!          ──► cost build-up (waste, overhead, profit, tax)
//!          = DerivedFields
//! ```
//!
//! Interactive editing and bulk import both go through
//! [`compute_derived_fields`], so the two paths can never disagree.
//!
//! ## Example
//!
//! ```rust
//! use takeoff_core::calculations::{compute_derived_fields, Pricer};
//! use takeoff_core::line::{LineItem, MaterialSpec};
//!
//! let mut line = LineItem::new(1);
//! if let MaterialSpec::Structural(spec) = &mut line.material {
//!     spec.size = "W12X26".to_string();
//!     spec.length_ft = 20.0;
//! }
//!
//! let priced = compute_derived_fields(&line, &Pricer::default());
//! assert_eq!(priced.derived.total_weight, 520.0);
//! assert!(priced.derived.cost.total_cost > 0.0);
//! ```

pub mod cost;
pub mod geometry;

pub use cost::{apply_markup, coating_cost, BaseCosts, CostBreakdown};
pub use geometry::{Geometry, PlateGeometry};

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::catalog::{builtin_shared, ShapeCatalog};
use crate::line::{CoatingSystem, Hardware, LaborHours, LineItem, MaterialSpec, RateOverrides};
use crate::project::{CompanySettings, EngineSettings, ProjectSettings, SettingsProvider};
use crate::rates::{Markup, RateKind, RateResolver, RateSettings, ResolvedRate};
use crate::units::finite_or_zero;

/// Cached calculation output for one line.
///
/// Always a function of the line's inputs plus the settings it was priced
/// with; never edited directly.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DerivedFields {
    /// lb/ft
    pub weight_per_ft: f64,
    /// lb
    pub total_weight: f64,
    /// ft²/ft
    pub surface_area_per_ft: f64,
    /// ft²
    pub total_surface_area: f64,
    /// Priced piece length after stock rounding, ft
    pub billed_length_ft: f64,
    pub plate: Option<PlateGeometry>,
    pub total_labor_hours: f64,
    pub material_rate: ResolvedRate,
    pub labor_rate: ResolvedRate,
    pub coating_rate: ResolvedRate,
    pub cost: CostBreakdown,
    /// The size designation wasn't found in the catalog
    pub size_not_found: bool,
}

/// Everything pricing needs besides the line itself: both rate levels, the
/// engine settings and the shape catalog.
#[derive(Debug, Clone)]
pub struct Pricer {
    company: RateSettings,
    project: RateSettings,
    engine: EngineSettings,
    catalog: Arc<ShapeCatalog>,
    fingerprint: u64,
}

impl Pricer {
    /// Pricer over the built-in shape catalog
    pub fn new(company: &CompanySettings, project: &ProjectSettings) -> Self {
        let fingerprint = settings_fingerprint(&company.rates, &project.rates, &project.engine);
        Pricer {
            company: company.rates.clone(),
            project: project.rates.clone(),
            engine: project.engine,
            catalog: builtin_shared(),
            fingerprint,
        }
    }

    /// Snapshot the provider's current settings.
    pub fn from_provider(provider: &dyn SettingsProvider) -> Self {
        Self::new(provider.company(), provider.project())
    }

    /// Price against a different shape catalog
    pub fn with_catalog(mut self, catalog: Arc<ShapeCatalog>) -> Self {
        let mut hasher = DefaultHasher::new();
        self.fingerprint.hash(&mut hasher);
        (Arc::as_ptr(&catalog) as usize).hash(&mut hasher);
        self.fingerprint = hasher.finish();
        self.catalog = catalog;
        self
    }

    pub fn resolver(&self) -> RateResolver<'_> {
        RateResolver::new(&self.project, &self.company)
    }

    pub fn markup(&self) -> Markup {
        self.resolver().markup()
    }

    pub fn catalog(&self) -> &ShapeCatalog {
        &self.catalog
    }

    /// Shared handle to the catalog, for building a pricer over new settings
    pub fn catalog_handle(&self) -> Arc<ShapeCatalog> {
        Arc::clone(&self.catalog)
    }

    pub fn engine(&self) -> &EngineSettings {
        &self.engine
    }

    /// Hash of the settings that affect pricing
    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }
}

impl Default for Pricer {
    fn default() -> Self {
        Pricer::new(&CompanySettings::default(), &ProjectSettings::default())
    }
}

/// Compute every derived field of a line.
pub fn derive(line: &LineItem, pricer: &Pricer) -> DerivedFields {
    let geometry = match &line.material {
        MaterialSpec::Structural(spec) => {
            let stock = line
                .use_stock_rounding
                .then_some(pricer.engine.stock_length_increment_ft);
            geometry::structural(spec, line.qty, pricer.catalog(), stock)
        }
        MaterialSpec::Plate(spec) => geometry::plate(spec),
    };
    let total_labor_hours = line.labor.total_hours();

    let resolver = pricer.resolver();
    let material_rate = resolver.resolve(RateKind::Material, line.material.grade(), line.rates.material_rate);
    let labor_rate = resolver.resolve(RateKind::Labor, &line.work_type, line.rates.labor_rate);
    let coating_rate = resolver.resolve(RateKind::Coating, line.coating.name(), line.rates.coating_rate);

    let base = BaseCosts {
        material: geometry.total_weight * material_rate.rate,
        labor: total_labor_hours * labor_rate.rate,
        coating: coating_cost(
            &line.coating,
            geometry.total_weight,
            geometry.total_surface_area,
            coating_rate.rate,
        ),
        hardware: finite_or_zero(line.hardware.qty) * finite_or_zero(line.hardware.cost_per_set),
    };

    DerivedFields {
        weight_per_ft: geometry.weight_per_ft,
        total_weight: geometry.total_weight,
        surface_area_per_ft: geometry.surface_area_per_ft,
        total_surface_area: geometry.total_surface_area,
        billed_length_ft: geometry.billed_length_ft,
        plate: geometry.plate,
        total_labor_hours,
        material_rate,
        labor_rate,
        coating_rate,
        cost: apply_markup(base, &resolver.markup()),
        size_not_found: geometry.size_not_found,
    }
}

/// The line with its derived fields freshly computed; the input is untouched.
pub fn compute_derived_fields(line: &LineItem, pricer: &Pricer) -> LineItem {
    let mut priced = line.clone();
    priced.derived = derive(line, pricer);
    priced
}

/// The inputs that affect pricing. Notes, tags, classification and the
/// bookkeeping fields are deliberately absent.
#[derive(Serialize)]
struct PricingInputs<'a> {
    qty: f64,
    material: &'a MaterialSpec,
    coating: &'a CoatingSystem,
    labor: &'a LaborHours,
    hardware: &'a Hardware,
    rates: &'a RateOverrides,
    work_type: &'a str,
    use_stock_rounding: bool,
}

/// Memo key over a line's pricing inputs and the pricer's settings.
///
/// Two calls return the same key exactly when re-pricing would give the same
/// result. `None` if the inputs couldn't be encoded, in which case the caller
/// should always recompute.
pub fn input_key(line: &LineItem, pricer: &Pricer) -> Option<u64> {
    let inputs = PricingInputs {
        qty: line.qty,
        material: &line.material,
        coating: &line.coating,
        labor: &line.labor,
        hardware: &line.hardware,
        rates: &line.rates,
        work_type: &line.work_type,
        use_stock_rounding: line.use_stock_rounding,
    };
    let bytes = serde_json::to_vec(&inputs).ok()?;
    let mut hasher = DefaultHasher::new();
    bytes.hash(&mut hasher);
    pricer.fingerprint.hash(&mut hasher);
    Some(hasher.finish())
}

fn settings_fingerprint(company: &RateSettings, project: &RateSettings, engine: &EngineSettings) -> u64 {
    let mut hasher = DefaultHasher::new();
    if let Ok(bytes) = serde_json::to_vec(&(company, project)) {
        bytes.hash(&mut hasher);
    }
    engine.stock_length_increment_ft.to_bits().hash(&mut hasher);
    hasher.finish()
}

//! # Line Items
//!
//! A line item is one priced row of a takeoff: either a structural member
//! cut from a catalog shape or a plate. Authored inputs live in plain fields;
//! everything in [`DerivedFields`] is a cache recomputed from those inputs
//! and the resolved rates, never a source of truth.
//!
//! ## JSON Example
//!
//! ```json
//! {
//!   "id": "5d0c7a6e-8d9b-4a53-9a0e-6c1f2b7d9e10",
//!   "sequence": 3,
//!   "status": "Active",
//!   "category": "Framing",
//!   "work_type": "Shop Fab",
//!   "qty": 4.0,
//!   "material": {
//!     "kind": "Structural",
//!     "shape": "W",
//!     "size": "W12X26",
//!     "grade": "A992",
//!     "length_ft": 20.0,
//!     "length_in": 6.0
//!   },
//!   "coating": "Standard Shop Primer"
//! }
//! ```

pub mod coating;
pub mod fields;
pub mod labor;

pub use coating::{CoatingBasis, CoatingSystem};
pub use fields::{apply_edit, LineField};
pub use labor::{LaborHours, LaborTask};

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calculations::DerivedFields;
use crate::units::FeetInches;

/// Soft status of a line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LineStatus {
    #[default]
    Active,
    /// Kept for audit and ordering, excluded from totals
    Void,
}

impl LineStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "active" => Some(LineStatus::Active),
            "void" | "voided" => Some(LineStatus::Void),
            _ => None,
        }
    }
}

/// A structural member cut from a catalog shape
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StructuralSpec {
    /// Shape family label as picked (e.g., "W", "HSS")
    pub shape: String,
    /// Size designation (e.g., "W12X26"); blank means not yet selected
    pub size: String,
    /// Steel grade (e.g., "A992")
    pub grade: String,
    pub length_ft: f64,
    pub length_in: f64,
}

impl StructuralSpec {
    pub fn length(&self) -> FeetInches {
        FeetInches::new(self.length_ft, self.length_in)
    }
}

/// A rectangular plate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlateSpec {
    /// Thickness as typed (e.g., "1/2", "0.375", "1-1/4")
    pub thickness: String,
    pub width_in: f64,
    pub length_in: f64,
    /// Mirrors the line's `qty`; the two are always kept equal
    pub plate_qty: f64,
    /// Coat one face only (otherwise both faces plus edges)
    pub one_side_coat: bool,
    pub grade: String,
}

impl Default for PlateSpec {
    fn default() -> Self {
        PlateSpec {
            thickness: String::new(),
            width_in: 0.0,
            length_in: 0.0,
            plate_qty: 1.0,
            one_side_coat: false,
            grade: "A36".to_string(),
        }
    }
}

/// Material kind discriminator: exactly one kind is populated per line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum MaterialSpec {
    Structural(StructuralSpec),
    Plate(PlateSpec),
}

impl MaterialSpec {
    pub fn kind_name(&self) -> &'static str {
        match self {
            MaterialSpec::Structural(_) => "Structural",
            MaterialSpec::Plate(_) => "Plate",
        }
    }

    pub fn grade(&self) -> &str {
        match self {
            MaterialSpec::Structural(s) => &s.grade,
            MaterialSpec::Plate(p) => &p.grade,
        }
    }

    pub fn is_plate(&self) -> bool {
        matches!(self, MaterialSpec::Plate(_))
    }
}

impl Default for MaterialSpec {
    fn default() -> Self {
        MaterialSpec::Structural(StructuralSpec {
            grade: "A992".to_string(),
            ..StructuralSpec::default()
        })
    }
}

/// Bolts / hardware sets on a line
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Hardware {
    /// e.g. "3/4"
    pub bolt_diameter: String,
    /// e.g. "A325-N"
    pub bolt_type: String,
    pub bolt_length: Option<String>,
    pub qty: f64,
    pub cost_per_set: f64,
}

/// Per-line rate overrides; `None` defers to project/company settings.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RateOverrides {
    /// $/lb
    pub material_rate: Option<f64>,
    /// $/hr
    pub labor_rate: Option<f64>,
    /// $/sf or $/lb depending on the coating system
    pub coating_rate: Option<f64>,
}

/// One priced takeoff entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// Store identity
    pub id: Uuid,

    /// Display order within the project, unique and increasing
    pub sequence: u32,

    #[serde(default)]
    pub status: LineStatus,

    /// Bumped by the store on every write; the optimistic-concurrency token
    #[serde(default)]
    pub revision: u64,

    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub subcategory: String,
    /// Also selects the labor rate (e.g., "Shop Fab", "Field Erect")
    #[serde(default)]
    pub work_type: String,

    #[serde(default)]
    pub is_main_member: bool,
    /// Main member this small part is attached to (a reference, not ownership)
    #[serde(default)]
    pub parent_line_id: Option<Uuid>,

    /// Piece count. For plates this mirrors `plate_qty`.
    pub qty: f64,

    pub material: MaterialSpec,

    #[serde(default)]
    pub coating: CoatingSystem,

    #[serde(default)]
    pub labor: LaborHours,

    #[serde(default)]
    pub hardware: Hardware,

    #[serde(default)]
    pub rates: RateOverrides,

    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub use_stock_rounding: bool,

    /// Last edit time per authored field, keyed by the field's JSON pointer
    #[serde(default)]
    pub edited_at: BTreeMap<String, DateTime<Utc>>,

    pub updated_at: DateTime<Utc>,

    /// Cached calculation output
    #[serde(default)]
    pub derived: DerivedFields,
}

impl LineItem {
    /// A new Active structural line with qty 1 and nothing priced yet.
    pub fn new(sequence: u32) -> Self {
        Self::with_material(sequence, MaterialSpec::default())
    }

    /// A new Active plate line with qty 1.
    pub fn new_plate(sequence: u32) -> Self {
        Self::with_material(sequence, MaterialSpec::Plate(PlateSpec::default()))
    }

    fn with_material(sequence: u32, material: MaterialSpec) -> Self {
        LineItem {
            id: Uuid::new_v4(),
            sequence,
            status: LineStatus::Active,
            revision: 0,
            category: String::new(),
            subcategory: String::new(),
            work_type: String::new(),
            is_main_member: false,
            parent_line_id: None,
            qty: 1.0,
            material,
            coating: CoatingSystem::None,
            labor: LaborHours::default(),
            hardware: Hardware::default(),
            rates: RateOverrides::default(),
            notes: String::new(),
            tags: Vec::new(),
            use_stock_rounding: false,
            edited_at: BTreeMap::new(),
            updated_at: Utc::now(),
            derived: DerivedFields::default(),
        }
    }

    pub fn is_void(&self) -> bool {
        self.status == LineStatus::Void
    }

    /// Set the piece count, keeping the plate count in step.
    pub fn set_qty(&mut self, qty: f64) {
        self.qty = qty;
        if let MaterialSpec::Plate(plate) = &mut self.material {
            plate.plate_qty = qty;
        }
    }

    /// Set the plate count, keeping the line count in step. No-op on structural lines.
    pub fn set_plate_qty(&mut self, qty: f64) {
        if let MaterialSpec::Plate(plate) = &mut self.material {
            plate.plate_qty = qty;
            self.qty = qty;
        }
    }

    /// Copy of this line under a fresh identity, ready to be created as a new row.
    pub fn duplicate(&self, sequence: u32) -> Self {
        LineItem {
            id: Uuid::new_v4(),
            sequence,
            revision: 0,
            edited_at: BTreeMap::new(),
            updated_at: Utc::now(),
            ..self.clone()
        }
    }

    /// Short label for logs and listings (e.g., "#3 W12X26" or "#4 PL1/2 x 8 x 12").
    pub fn label(&self) -> String {
        match &self.material {
            MaterialSpec::Structural(s) => format!("#{} {}", self.sequence, s.size),
            MaterialSpec::Plate(p) => {
                format!("#{} PL{} x {} x {}", self.sequence, p.thickness, p.width_in, p.length_in)
            }
        }
    }
}

//! # takeoff_core - Steel Fabrication Estimating Engine
//!
//! `takeoff_core` prices a structural-steel takeoff: a list of line items,
//! each a catalog member or a plate, from which it derives weights, surface
//! areas, labor hours and a fully marked-up cost. It also carries the two
//! pieces a shared, multi-user takeoff needs: a field-level three-way merge
//! for concurrent edits of the same line, and a bounded undo/redo history.
//!
//! ## Design Philosophy
//!
//! - **Pure pricing**: [`calculations::compute_derived_fields`] is the one
//!   calculation path, used by interactive edits and CSV import alike
//! - **JSON-First**: All types implement Serialize/Deserialize
//! - **Rich Errors**: Structured error types, not just strings
//! - **Injected collaborators**: storage behind [`store::LineStore`],
//!   settings behind [`project::SettingsProvider`], time passed in as `Instant`s
//!
//! ## Quick Start
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
//! line.set_qty(2.0);
//!
//! let priced = compute_derived_fields(&line, &Pricer::default());
//! assert_eq!(priced.derived.total_weight, 1040.0);
//! ```
//!
//! ## Modules
//!
//! - [`catalog`] - Shape designations to weight and surface area per foot
//! - [`line`] - Line items, field edits, labor and coating
//! - [`rates`] - Line → project → company → fallback rate resolution
//! - [`calculations`] - Geometry, cost composition and the pricing context
//! - [`merge`] - Three-way field merge for concurrent line edits
//! - [`history`] - Bounded undo/redo over collection snapshots
//! - [`session`] - One line's edit lifecycle: debounce, save, reconcile
//! - [`estimate`] - A project's takeoff: collection, history and open edit
//! - [`import`] - Bulk CSV takeoff import
//! - [`store`] - Persistence port with in-memory and file-backed stores
//! - [`project`] - Project container, metadata, and settings
//! - [`file_io`] - File operations with atomic saves and locking
//! - [`errors`] - Structured error types

pub mod calculations;
pub mod catalog;
pub mod collection;
pub mod errors;
pub mod estimate;
#[cfg(not(target_arch = "wasm32"))]
pub mod file_io;
pub mod history;
pub mod import;
pub mod line;
pub mod merge;
pub mod project;
pub mod rates;
pub mod schedule;
pub mod session;
pub mod store;
pub mod units;

// Re-export commonly used types at crate root for convenience
pub use calculations::{compute_derived_fields, DerivedFields, Pricer};
pub use collection::{CollectionSnapshot, EstimateSummary};
pub use errors::{EstimateError, EstimateResult};
pub use estimate::Estimate;
#[cfg(not(target_arch = "wasm32"))]
pub use file_io::{load_project, save_project, FileLock};
pub use line::{LineField, LineItem};
pub use merge::{smart_merge, MergeOutcome};
pub use project::{CompanySettings, Project, ProjectMetadata, ProjectSettings};

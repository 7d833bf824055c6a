//! # Bulk CSV Import
//!
//! Turns a header-keyed takeoff CSV into priced [`LineItem`]s. Each cell is
//! applied with the same [`apply_edit`] used by interactive editing and each
//! line is priced with the same [`compute_derived_fields`], so an imported
//! line and a hand-entered one with the same inputs are identical.
//!
//! Recognized columns (any order, case-insensitive, all optional):
//!
//! | Column | Field |
//! |--------|-------|
//! | `kind` | `Structural` (default) or `Plate` |
//! | `status`, `category`, `subcategory`, `work_type`, `is_main_member` | line admin |
//! | `shape`, `size`, `grade`, `length_ft`, `length_in` | structural material |
//! | `thickness`, `width_in`, `plate_length_in`, `one_side_coat` | plate material |
//! | `qty`, `coating`, `use_stock_rounding` | |
//! | `unload` … `load_ship` | the eleven labor task hours |
//! | `bolt_diameter`, `bolt_type`, `bolt_length`, `bolt_qty`, `bolt_cost_per_set` | hardware |
//! | `material_rate`, `labor_rate`, `coating_rate` | per-line rate overrides |
//! | `notes`, `tags` | |
//!
//! Blank cells leave the default. Malformed numbers become 0. A row whose
//! `kind` is unknown, or that fills a plate column on a structural row (or
//! the reverse), is skipped and reported. A CSV syntax error aborts the
//! import with [`EstimateError::Import`].
//!
//! ## Example
//!
//! ```rust
//! use takeoff_core::calculations::Pricer;
//! use takeoff_core::import::import_csv;
//!
//! let data = "kind,size,length_ft,qty,weld\nStructural,W12X26,20,2,1.5\n";
//! let report = import_csv(data.as_bytes(), &Pricer::default(), 1)?;
//!
//! assert_eq!(report.lines.len(), 1);
//! assert_eq!(report.lines[0].derived.total_weight, 1040.0);
//! # Ok::<(), takeoff_core::errors::EstimateError>(())
//! ```

use std::io::Read;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::calculations::{compute_derived_fields, Pricer};
use crate::errors::{EstimateError, EstimateResult};
use crate::line::{apply_edit, LaborTask, LineField, LineItem};

/// Column names mapped to the field they set, in the order they're applied.
/// `kind` always goes first so kind-specific columns land on the right
/// material block; `qty` follows it so plate quantity stays in sync.
const COLUMNS: &[(&str, LineField)] = &[
    ("kind", LineField::MaterialKind),
    ("qty", LineField::Qty),
    ("status", LineField::Status),
    ("category", LineField::Category),
    ("subcategory", LineField::Subcategory),
    ("work_type", LineField::WorkType),
    ("is_main_member", LineField::IsMainMember),
    ("shape", LineField::Shape),
    ("size", LineField::Size),
    ("grade", LineField::Grade),
    ("length_ft", LineField::LengthFt),
    ("length_in", LineField::LengthIn),
    ("thickness", LineField::Thickness),
    ("width_in", LineField::PlateWidth),
    ("plate_length_in", LineField::PlateLength),
    ("one_side_coat", LineField::OneSideCoat),
    ("coating", LineField::Coating),
    ("use_stock_rounding", LineField::StockRounding),
    ("bolt_diameter", LineField::BoltDiameter),
    ("bolt_type", LineField::BoltType),
    ("bolt_length", LineField::BoltLength),
    ("bolt_qty", LineField::HardwareQty),
    ("bolt_cost_per_set", LineField::HardwareCostPerSet),
    ("material_rate", LineField::MaterialRate),
    ("labor_rate", LineField::LaborRate),
    ("coating_rate", LineField::CoatingRate),
    ("notes", LineField::Notes),
    ("tags", LineField::Tags),
];

/// A data row that produced no line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedRow {
    /// 1-based row number in the file (the header is row 1)
    pub row: usize,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportReport {
    pub lines: Vec<LineItem>,
    pub skipped: Vec<SkippedRow>,
}

/// Read a takeoff CSV into priced lines numbered from `first_sequence`.
pub fn import_csv<R: Read>(reader: R, pricer: &Pricer, first_sequence: u32) -> EstimateResult<ImportReport> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|e| EstimateError::import(1, format!("Failed to read header: {}", e)))?
        .clone();
    let columns = column_map(&headers);
    if columns.is_empty() {
        return Err(EstimateError::import(1, "No recognized columns in header"));
    }

    let mut report = ImportReport::default();
    let mut sequence = first_sequence;
    for (i, record) in csv_reader.records().enumerate() {
        let row = i + 2;
        let record = record.map_err(|e| EstimateError::import(row, e.to_string()))?;
        if record.iter().all(str::is_empty) {
            continue;
        }

        match build_line(&record, &columns, sequence) {
            Ok(line) => {
                report.lines.push(compute_derived_fields(&line, pricer));
                sequence += 1;
            }
            Err(reason) => {
                tracing::warn!(row, %reason, "import row skipped");
                report.skipped.push(SkippedRow { row, reason });
            }
        }
    }

    tracing::info!(
        lines = report.lines.len(),
        skipped = report.skipped.len(),
        "CSV import read"
    );
    Ok(report)
}

/// (column index, field) pairs for every recognized header, in apply order.
fn column_map(headers: &csv::StringRecord) -> Vec<(usize, LineField)> {
    let position = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));

    let mut columns: Vec<(usize, LineField)> = COLUMNS
        .iter()
        .filter_map(|(name, field)| position(name).map(|idx| (idx, *field)))
        .collect();
    columns.extend(
        LaborTask::ALL
            .iter()
            .filter_map(|task| position(task.field_name()).map(|idx| (idx, LineField::Labor(*task)))),
    );
    columns
}

fn build_line(record: &csv::StringRecord, columns: &[(usize, LineField)], sequence: u32) -> Result<LineItem, String> {
    let mut line = LineItem::new(sequence);
    let now = Utc::now();

    for (idx, field) in columns {
        let raw = record.get(*idx).unwrap_or("");
        if raw.is_empty() {
            continue;
        }
        apply_edit(&mut line, *field, raw, now).map_err(|e| e.to_string())?;
    }

    // Imported values are the line's starting point, not user edits
    line.edited_at.clear();
    Ok(line)
}

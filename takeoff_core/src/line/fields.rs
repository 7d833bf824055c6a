//! Field-level edits.
//!
//! Every authored field of a [`LineItem`] is addressable as a [`LineField`]
//! with a stable JSON pointer path. The same paths key the per-field edit
//! timestamps and name the fields reported by the merge.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{CoatingSystem, LaborTask, LineItem, LineStatus, MaterialSpec, PlateSpec, StructuralSpec};
use crate::catalog::ShapeFamily;
use crate::errors::{EstimateError, EstimateResult};
use crate::units::parse_number;

/// An authored (user-editable) field of a line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LineField {
    Status,
    Category,
    Subcategory,
    WorkType,
    IsMainMember,
    ParentLine,
    Qty,
    /// "Structural" or "Plate"
    MaterialKind,
    Shape,
    Size,
    Grade,
    LengthFt,
    LengthIn,
    Thickness,
    PlateWidth,
    PlateLength,
    PlateQty,
    OneSideCoat,
    Coating,
    Labor(LaborTask),
    BoltDiameter,
    BoltType,
    BoltLength,
    HardwareQty,
    HardwareCostPerSet,
    MaterialRate,
    LaborRate,
    CoatingRate,
    Notes,
    Tags,
    StockRounding,
}

impl LineField {
    /// JSON pointer of the field inside a serialized [`LineItem`].
    pub fn path(&self) -> String {
        let path = match self {
            LineField::Status => "/status",
            LineField::Category => "/category",
            LineField::Subcategory => "/subcategory",
            LineField::WorkType => "/work_type",
            LineField::IsMainMember => "/is_main_member",
            LineField::ParentLine => "/parent_line_id",
            LineField::Qty => "/qty",
            LineField::MaterialKind => "/material/kind",
            LineField::Shape => "/material/shape",
            LineField::Size => "/material/size",
            LineField::Grade => "/material/grade",
            LineField::LengthFt => "/material/length_ft",
            LineField::LengthIn | LineField::PlateLength => "/material/length_in",
            LineField::Thickness => "/material/thickness",
            LineField::PlateWidth => "/material/width_in",
            LineField::PlateQty => "/material/plate_qty",
            LineField::OneSideCoat => "/material/one_side_coat",
            LineField::Coating => "/coating",
            LineField::Labor(task) => return format!("/labor/{}", task.field_name()),
            LineField::BoltDiameter => "/hardware/bolt_diameter",
            LineField::BoltType => "/hardware/bolt_type",
            LineField::BoltLength => "/hardware/bolt_length",
            LineField::HardwareQty => "/hardware/qty",
            LineField::HardwareCostPerSet => "/hardware/cost_per_set",
            LineField::MaterialRate => "/rates/material_rate",
            LineField::LaborRate => "/rates/labor_rate",
            LineField::CoatingRate => "/rates/coating_rate",
            LineField::Notes => "/notes",
            LineField::Tags => "/tags",
            LineField::StockRounding => "/use_stock_rounding",
        };
        path.to_string()
    }
}

/// Apply a raw text edit to one field, stamping its edit time.
///
/// Malformed numbers become `0`; a blank optional field (labor hours, rate
/// overrides, bolt length, parent line) becomes unset. Editing `Qty` on a
/// plate also sets `PlateQty` and vice versa. Derived fields are left stale;
/// the caller recomputes them.
///
/// Errors only for edits that cannot apply at all: a plate field on a
/// structural line (or the reverse), an unknown status or material kind, or
/// a parent reference that is not a line id.
pub fn apply_edit(line: &mut LineItem, field: LineField, raw: &str, at: DateTime<Utc>) -> EstimateResult<()> {
    let mismatch = |kind: &str| {
        EstimateError::invalid_input(
            format!("{:?}", field),
            raw,
            format!("Field does not apply to a {} line", kind),
        )
    };
    let kind = line.material.kind_name();
    let mut touched = vec![field.path()];

    match field {
        LineField::Status => {
            line.status = LineStatus::parse(raw)
                .ok_or_else(|| EstimateError::invalid_input("status", raw, "Expected Active or Void"))?;
        }
        LineField::Category => line.category = raw.trim().to_string(),
        LineField::Subcategory => line.subcategory = raw.trim().to_string(),
        LineField::WorkType => line.work_type = raw.trim().to_string(),
        LineField::IsMainMember => line.is_main_member = parse_flag(raw),
        LineField::ParentLine => {
            line.parent_line_id = if raw.trim().is_empty() {
                None
            } else {
                let parent = Uuid::parse_str(raw.trim())
                    .map_err(|e| EstimateError::invalid_input("parent_line_id", raw, e.to_string()))?;
                if parent == line.id {
                    return Err(EstimateError::invalid_input(
                        "parent_line_id",
                        raw,
                        "A line cannot be its own main member",
                    ));
                }
                Some(parent)
            };
        }
        LineField::Qty => {
            line.set_qty(parse_number(raw));
            if line.material.is_plate() {
                touched.push(LineField::PlateQty.path());
            }
        }
        LineField::MaterialKind => switch_kind(line, raw)?,
        LineField::Grade => match &mut line.material {
            MaterialSpec::Structural(s) => s.grade = raw.trim().to_string(),
            MaterialSpec::Plate(p) => p.grade = raw.trim().to_string(),
        },
        LineField::Shape | LineField::Size | LineField::LengthFt | LineField::LengthIn => {
            let MaterialSpec::Structural(spec) = &mut line.material else {
                return Err(mismatch(kind));
            };
            match field {
                LineField::Shape => spec.shape = raw.trim().to_uppercase(),
                LineField::Size => {
                    spec.size = raw.trim().to_uppercase();
                    if let Some(family) = ShapeFamily::from_designation(&spec.size) {
                        spec.shape = family.code().to_string();
                        touched.push(LineField::Shape.path());
                    }
                }
                LineField::LengthFt => spec.length_ft = parse_number(raw),
                _ => spec.length_in = parse_number(raw),
            }
        }
        LineField::Thickness
        | LineField::PlateWidth
        | LineField::PlateLength
        | LineField::PlateQty
        | LineField::OneSideCoat => {
            let MaterialSpec::Plate(plate) = &mut line.material else {
                return Err(mismatch(kind));
            };
            match field {
                LineField::Thickness => plate.thickness = raw.trim().to_string(),
                LineField::PlateWidth => plate.width_in = parse_number(raw),
                LineField::PlateLength => plate.length_in = parse_number(raw),
                LineField::OneSideCoat => plate.one_side_coat = parse_flag(raw),
                _ => {
                    line.set_plate_qty(parse_number(raw));
                    touched.push(LineField::Qty.path());
                }
            }
        }
        LineField::Coating => line.coating = CoatingSystem::parse(raw),
        LineField::Labor(task) => line.labor.set(task, parse_optional(raw)),
        LineField::BoltDiameter => line.hardware.bolt_diameter = raw.trim().to_string(),
        LineField::BoltType => line.hardware.bolt_type = raw.trim().to_string(),
        LineField::BoltLength => {
            line.hardware.bolt_length = Some(raw.trim().to_string()).filter(|s| !s.is_empty());
        }
        LineField::HardwareQty => line.hardware.qty = parse_number(raw),
        LineField::HardwareCostPerSet => line.hardware.cost_per_set = parse_number(raw),
        LineField::MaterialRate => line.rates.material_rate = parse_optional(raw),
        LineField::LaborRate => line.rates.labor_rate = parse_optional(raw),
        LineField::CoatingRate => line.rates.coating_rate = parse_optional(raw),
        LineField::Notes => line.notes = raw.to_string(),
        LineField::Tags => {
            line.tags = raw
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect();
        }
        LineField::StockRounding => line.use_stock_rounding = parse_flag(raw),
    }

    for path in touched {
        line.edited_at.insert(path, at);
    }
    Ok(())
}

fn switch_kind(line: &mut LineItem, raw: &str) -> EstimateResult<()> {
    let grade = line.material.grade().to_string();
    match (raw.trim().to_lowercase().as_str(), &line.material) {
        ("structural", MaterialSpec::Structural(_)) | ("plate", MaterialSpec::Plate(_)) => {}
        ("structural", MaterialSpec::Plate(_)) => {
            line.material = MaterialSpec::Structural(StructuralSpec {
                grade,
                ..StructuralSpec::default()
            });
        }
        ("plate", MaterialSpec::Structural(_)) => {
            line.material = MaterialSpec::Plate(PlateSpec {
                grade,
                plate_qty: line.qty,
                ..PlateSpec::default()
            });
        }
        _ => {
            return Err(EstimateError::invalid_input(
                "material.kind",
                raw,
                "Expected Structural or Plate",
            ))
        }
    }
    Ok(())
}

/// Blank → unset, anything else → number (malformed → 0).
fn parse_optional(raw: &str) -> Option<f64> {
    if raw.trim().is_empty() {
        None
    } else {
        Some(parse_number(raw))
    }
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_lowercase().as_str(),
        "true" | "yes" | "y" | "1" | "on" | "x"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    #[test]
    fn test_qty_edit_on_plate_syncs_plate_qty() {
        let mut line = LineItem::new_plate(1);
        apply_edit(&mut line, LineField::Qty, "4", now()).unwrap();
        match &line.material {
            MaterialSpec::Plate(p) => assert_eq!(p.plate_qty, 4.0),
            _ => unreachable!(),
        }
        assert!(line.edited_at.contains_key("/qty"));
        assert!(line.edited_at.contains_key("/material/plate_qty"));
    }

    #[test]
    fn test_plate_qty_edit_syncs_qty() {
        let mut line = LineItem::new_plate(1);
        apply_edit(&mut line, LineField::PlateQty, "12", now()).unwrap();
        assert_eq!(line.qty, 12.0);
    }

    #[test]
    fn test_malformed_number_coerces_to_zero() {
        let mut line = LineItem::new(1);
        apply_edit(&mut line, LineField::LengthFt, "twenty", now()).unwrap();
        match &line.material {
            MaterialSpec::Structural(s) => assert_eq!(s.length_ft, 0.0),
            _ => unreachable!(),
        }
        apply_edit(&mut line, LineField::Qty, "3x", now()).unwrap();
        assert_eq!(line.qty, 0.0);
    }

    #[test]
    fn test_blank_optional_is_unset() {
        let mut line = LineItem::new(1);
        apply_edit(&mut line, LineField::MaterialRate, "0.92", now()).unwrap();
        assert_eq!(line.rates.material_rate, Some(0.92));
        apply_edit(&mut line, LineField::MaterialRate, "  ", now()).unwrap();
        assert_eq!(line.rates.material_rate, None);

        apply_edit(&mut line, LineField::Labor(LaborTask::Weld), "1.5", now()).unwrap();
        assert_eq!(line.labor.weld, Some(1.5));
        apply_edit(&mut line, LineField::Labor(LaborTask::Weld), "", now()).unwrap();
        assert_eq!(line.labor.weld, None);
    }

    #[test]
    fn test_size_edit_infers_shape() {
        let mut line = LineItem::new(1);
        apply_edit(&mut line, LineField::Size, "hss6x6x1/4", now()).unwrap();
        match &line.material {
            MaterialSpec::Structural(s) => {
                assert_eq!(s.size, "HSS6X6X1/4");
                assert_eq!(s.shape, "HSS");
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_kind_mismatch_is_rejected() {
        let mut line = LineItem::new(1);
        let result = apply_edit(&mut line, LineField::Thickness, "1/2", now());
        assert!(matches!(result, Err(EstimateError::InvalidInput { .. })));
        assert!(line.edited_at.is_empty());
    }

    #[test]
    fn test_switch_kind_carries_grade_and_qty() {
        let mut line = LineItem::new(1);
        line.set_qty(3.0);
        apply_edit(&mut line, LineField::Grade, "A572-50", now()).unwrap();
        apply_edit(&mut line, LineField::MaterialKind, "Plate", now()).unwrap();
        match &line.material {
            MaterialSpec::Plate(p) => {
                assert_eq!(p.grade, "A572-50");
                assert_eq!(p.plate_qty, 3.0);
            }
            _ => panic!("expected plate"),
        }
        assert!(apply_edit(&mut line, LineField::MaterialKind, "Casting", now()).is_err());
    }

    #[test]
    fn test_parent_line_validation() {
        let mut line = LineItem::new(2);
        let own = line.id.to_string();
        assert!(apply_edit(&mut line, LineField::ParentLine, &own, now()).is_err());
        assert!(apply_edit(&mut line, LineField::ParentLine, "not-a-uuid", now()).is_err());

        let parent = Uuid::new_v4();
        apply_edit(&mut line, LineField::ParentLine, &parent.to_string(), now()).unwrap();
        assert_eq!(line.parent_line_id, Some(parent));
        apply_edit(&mut line, LineField::ParentLine, "", now()).unwrap();
        assert_eq!(line.parent_line_id, None);
    }

    #[test]
    fn test_tags_and_flags() {
        let mut line = LineItem::new(1);
        apply_edit(&mut line, LineField::Tags, "roof, ,phase 2,", now()).unwrap();
        assert_eq!(line.tags, vec!["roof".to_string(), "phase 2".to_string()]);

        apply_edit(&mut line, LineField::StockRounding, "Yes", now()).unwrap();
        assert!(line.use_stock_rounding);
        apply_edit(&mut line, LineField::IsMainMember, "no", now()).unwrap();
        assert!(!line.is_main_member);
    }

    #[test]
    fn test_paths_resolve_in_serialized_line() {
        let structural = serde_json::to_value(LineItem::new(1)).unwrap();
        let plate = serde_json::to_value(LineItem::new_plate(2)).unwrap();
        let fields = [
            LineField::Status,
            LineField::ParentLine,
            LineField::Qty,
            LineField::MaterialKind,
            LineField::Grade,
            LineField::Coating,
            LineField::Labor(LaborTask::DrillPunch),
            LineField::BoltLength,
            LineField::CoatingRate,
            LineField::Tags,
            LineField::StockRounding,
        ];
        for field in fields {
            assert!(structural.pointer(&field.path()).is_some(), "{:?}", field);
        }
        assert!(structural.pointer(&LineField::Size.path()).is_some());
        assert!(plate.pointer(&LineField::Thickness.path()).is_some());
        assert!(plate.pointer(&LineField::PlateQty.path()).is_some());
    }
}

//! Itemized shop labor
//!
//! Eleven task-hour fields per line. Any task left blank counts as zero, and
//! totals are never rounded here; rounding is a display concern.

use serde::{Deserialize, Serialize};

use crate::units::finite_or_zero;

/// Shop labor tasks, in routing order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LaborTask {
    Unload,
    Cut,
    Cope,
    ProcessPlate,
    DrillPunch,
    Fit,
    Weld,
    PrepClean,
    Paint,
    HandleMove,
    LoadShip,
}

impl LaborTask {
    /// All tasks in routing order
    pub const ALL: [LaborTask; 11] = [
        LaborTask::Unload,
        LaborTask::Cut,
        LaborTask::Cope,
        LaborTask::ProcessPlate,
        LaborTask::DrillPunch,
        LaborTask::Fit,
        LaborTask::Weld,
        LaborTask::PrepClean,
        LaborTask::Paint,
        LaborTask::HandleMove,
        LaborTask::LoadShip,
    ];

    /// Serialized field name inside [`LaborHours`] (also the CSV column name)
    pub fn field_name(&self) -> &'static str {
        match self {
            LaborTask::Unload => "unload",
            LaborTask::Cut => "cut",
            LaborTask::Cope => "cope",
            LaborTask::ProcessPlate => "process_plate",
            LaborTask::DrillPunch => "drill_punch",
            LaborTask::Fit => "fit",
            LaborTask::Weld => "weld",
            LaborTask::PrepClean => "prep_clean",
            LaborTask::Paint => "paint",
            LaborTask::HandleMove => "handle_move",
            LaborTask::LoadShip => "load_ship",
        }
    }

    /// Get display name
    pub fn display_name(&self) -> &'static str {
        match self {
            LaborTask::Unload => "Unload",
            LaborTask::Cut => "Cut",
            LaborTask::Cope => "Cope",
            LaborTask::ProcessPlate => "Process Plate",
            LaborTask::DrillPunch => "Drill/Punch",
            LaborTask::Fit => "Fit",
            LaborTask::Weld => "Weld",
            LaborTask::PrepClean => "Prep/Clean",
            LaborTask::Paint => "Paint",
            LaborTask::HandleMove => "Handle/Move",
            LaborTask::LoadShip => "Load/Ship",
        }
    }
}

impl std::fmt::Display for LaborTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Hours per task for one line. `None` means the estimator left it blank.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LaborHours {
    pub unload: Option<f64>,
    pub cut: Option<f64>,
    pub cope: Option<f64>,
    pub process_plate: Option<f64>,
    pub drill_punch: Option<f64>,
    pub fit: Option<f64>,
    pub weld: Option<f64>,
    pub prep_clean: Option<f64>,
    pub paint: Option<f64>,
    pub handle_move: Option<f64>,
    pub load_ship: Option<f64>,
}

impl LaborHours {
    pub fn get(&self, task: LaborTask) -> Option<f64> {
        *self.slot(task)
    }

    pub fn set(&mut self, task: LaborTask, hours: Option<f64>) {
        *self.slot_mut(task) = hours;
    }

    fn slot(&self, task: LaborTask) -> &Option<f64> {
        match task {
            LaborTask::Unload => &self.unload,
            LaborTask::Cut => &self.cut,
            LaborTask::Cope => &self.cope,
            LaborTask::ProcessPlate => &self.process_plate,
            LaborTask::DrillPunch => &self.drill_punch,
            LaborTask::Fit => &self.fit,
            LaborTask::Weld => &self.weld,
            LaborTask::PrepClean => &self.prep_clean,
            LaborTask::Paint => &self.paint,
            LaborTask::HandleMove => &self.handle_move,
            LaborTask::LoadShip => &self.load_ship,
        }
    }

    fn slot_mut(&mut self, task: LaborTask) -> &mut Option<f64> {
        match task {
            LaborTask::Unload => &mut self.unload,
            LaborTask::Cut => &mut self.cut,
            LaborTask::Cope => &mut self.cope,
            LaborTask::ProcessPlate => &mut self.process_plate,
            LaborTask::DrillPunch => &mut self.drill_punch,
            LaborTask::Fit => &mut self.fit,
            LaborTask::Weld => &mut self.weld,
            LaborTask::PrepClean => &mut self.prep_clean,
            LaborTask::Paint => &mut self.paint,
            LaborTask::HandleMove => &mut self.handle_move,
            LaborTask::LoadShip => &mut self.load_ship,
        }
    }

    /// Sum of all task hours, blanks and non-finite values counted as zero.
    pub fn total_hours(&self) -> f64 {
        LaborTask::ALL
            .iter()
            .map(|task| finite_or_zero(self.get(*task).unwrap_or(0.0)))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_with_blanks() {
        let mut labor = LaborHours::default();
        assert_eq!(labor.total_hours(), 0.0);

        labor.cut = Some(0.25);
        labor.weld = Some(1.5);
        labor.load_ship = Some(0.1);
        assert!((labor.total_hours() - 1.85).abs() < 1e-12);
    }

    #[test]
    fn test_total_is_not_rounded() {
        let mut labor = LaborHours::default();
        labor.fit = Some(0.333);
        labor.drill_punch = Some(0.001);
        assert!((labor.total_hours() - 0.334).abs() < 1e-12);
    }

    #[test]
    fn test_all_tasks_addressable() {
        let mut labor = LaborHours::default();
        for task in LaborTask::ALL {
            labor.set(task, Some(1.0));
        }
        assert_eq!(labor.total_hours(), 11.0);
        assert_eq!(labor.get(LaborTask::ProcessPlate), Some(1.0));
    }

    #[test]
    fn test_field_names_match_serde() {
        let mut labor = LaborHours::default();
        for task in LaborTask::ALL {
            labor.set(task, Some(2.0));
        }
        let json = serde_json::to_value(labor).unwrap();
        for task in LaborTask::ALL {
            assert_eq!(json[task.field_name()], 2.0, "{}", task);
        }
    }

    #[test]
    fn test_non_finite_counts_as_zero() {
        let mut labor = LaborHours::default();
        labor.weld = Some(f64::NAN);
        labor.cut = Some(2.0);
        assert_eq!(labor.total_hours(), 2.0);
    }
}

//! # Line Collections
//!
//! A [`CollectionSnapshot`] is every line of a project at one instant; it's
//! the unit undo/redo works on and what a store pushes to subscribers.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calculations::{compute_derived_fields, CostBreakdown, Pricer};
use crate::line::{LineItem, LineStatus};

/// All lines of a project, kept sorted by sequence.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CollectionSnapshot {
    lines: Vec<LineItem>,
}

impl CollectionSnapshot {
    pub fn new(mut lines: Vec<LineItem>) -> Self {
        lines.sort_by_key(|l| l.sequence);
        CollectionSnapshot { lines }
    }

    /// Lines in sequence order (Void lines included, in place)
    pub fn lines(&self) -> &[LineItem] {
        &self.lines
    }

    pub fn into_lines(self) -> Vec<LineItem> {
        self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn get(&self, id: Uuid) -> Option<&LineItem> {
        self.lines.iter().find(|l| l.id == id)
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.get(id).is_some()
    }

    /// Insert or replace a line by id, keeping sequence order.
    pub fn upsert(&mut self, line: LineItem) {
        match self.lines.iter_mut().find(|l| l.id == line.id) {
            Some(existing) => *existing = line,
            None => self.lines.push(line),
        }
        self.lines.sort_by_key(|l| l.sequence);
    }

    pub fn remove(&mut self, id: Uuid) -> Option<LineItem> {
        let index = self.lines.iter().position(|l| l.id == id)?;
        Some(self.lines.remove(index))
    }

    /// Display order: Active lines by sequence, then Void lines by sequence.
    pub fn display_order(&self) -> Vec<&LineItem> {
        let (active, void): (Vec<&LineItem>, Vec<&LineItem>) =
            self.lines.iter().partition(|l| l.status == LineStatus::Active);
        active.into_iter().chain(void).collect()
    }

    /// Sequence number for a new line
    pub fn next_sequence(&self) -> u32 {
        self.lines.iter().map(|l| l.sequence).max().map_or(1, |s| s + 1)
    }

    pub fn main_members(&self) -> Vec<&LineItem> {
        self.lines.iter().filter(|l| l.is_main_member).collect()
    }

    /// Lines attached to the given main member
    pub fn small_parts_of(&self, main_id: Uuid) -> Vec<&LineItem> {
        self.lines
            .iter()
            .filter(|l| l.parent_line_id == Some(main_id))
            .collect()
    }

    /// Every line with freshly computed derived fields.
    pub fn repriced(&self, pricer: &Pricer) -> Self {
        CollectionSnapshot {
            lines: self.lines.iter().map(|l| compute_derived_fields(l, pricer)).collect(),
        }
    }

    pub fn summary(&self) -> EstimateSummary {
        EstimateSummary::of(&self.lines)
    }
}

/// Project totals over Active lines.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EstimateSummary {
    pub line_count: usize,
    pub active_count: usize,
    pub void_count: usize,
    /// lb
    pub total_weight: f64,
    /// ft²
    pub total_surface_area: f64,
    pub total_labor_hours: f64,
    pub cost: CostBreakdown,
}

impl EstimateSummary {
    pub fn of(lines: &[LineItem]) -> Self {
        let mut summary = EstimateSummary {
            line_count: lines.len(),
            ..EstimateSummary::default()
        };
        for line in lines {
            if line.is_void() {
                summary.void_count += 1;
                continue;
            }
            summary.active_count += 1;
            summary.total_weight += line.derived.total_weight;
            summary.total_surface_area += line.derived.total_surface_area;
            summary.total_labor_hours += line.derived.total_labor_hours;
            summary.cost.accumulate(&line.derived.cost);
        }
        summary
    }

    /// Total weight in short tons
    pub fn total_tons(&self) -> f64 {
        self.total_weight / 2000.0
    }

    pub fn grand_total(&self) -> f64 {
        self.cost.total_cost
    }
}

//! # Three-Way Merge
//!
//! Reconciles a locally edited line against the store's current copy when a
//! save happens after someone else has written the same line.
//!
//! The line is flattened into JSON-pointer leaves (arrays count as one leaf,
//! as does the whole material block when the material kind differs between
//! copies) and each leaf is compared across the three copies:
//!
//! | remote vs base | local vs base | result                         |
//! |----------------|---------------|--------------------------------|
//! | unchanged      | any           | local                          |
//! | changed        | unchanged     | remote                         |
//! | changed        | changed, same | that value                     |
//! | changed        | changed, diff | conflict, resolved by policy   |
//!
//! A conflict goes to whichever side edited the field more recently when both
//! sides carry an edit time for it; otherwise local wins. Conflicts never
//! block the save; they're returned for display and logged.
//!
//! Bookkeeping (`id`, `revision`, `updated_at`, `edited_at`) and the derived
//! cache take no part in the comparison. The merged line carries the remote
//! revision so the following write is made against the latest copy, and its
//! derived fields must be recomputed by the caller.
//!
//! ## Example
//!
//! ```rust
//! use takeoff_core::line::{LineItem, LineStatus};
//! use takeoff_core::merge::smart_merge;
//!
//! let base = LineItem::new(1);
//! let mut local = base.clone();
//! local.rates.labor_rate = Some(55.0);
//! let mut remote = base.clone();
//! remote.status = LineStatus::Void;
//!
//! let outcome = smart_merge(&base, &local, &remote);
//! assert_eq!(outcome.merged.rates.labor_rate, Some(55.0));
//! assert_eq!(outcome.merged.status, LineStatus::Void);
//! assert!(outcome.conflicts.is_empty());
//! ```

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::line::LineItem;

/// Top-level keys that are never merged leaf by leaf
const BOOKKEEPING: [&str; 5] = ["id", "revision", "updated_at", "edited_at", "derived"];

/// Plate quantity mirrors `/qty` and is re-synced after merging
const QTY_MIRROR: &str = "/material/plate_qty";

/// Which copy a conflicting field was taken from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConflictSide {
    Local,
    Remote,
}

/// A field both sides changed to different values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldConflict {
    /// JSON pointer of the field (e.g. "/qty")
    pub field: String,
    /// `Null` when absent in that copy
    pub base: Value,
    pub local: Value,
    pub remote: Value,
    pub resolution: ConflictSide,
}

/// Result of [`smart_merge`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeOutcome {
    pub merged: LineItem,
    pub conflicts: Vec<FieldConflict>,
}

impl MergeOutcome {
    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }
}

/// Merge `local` and `remote`, both descended from `base`.
pub fn smart_merge(base: &LineItem, local: &LineItem, remote: &LineItem) -> MergeOutcome {
    if inputs_equal(base, local) && inputs_equal(base, remote) {
        let mut merged = base.clone();
        merged.revision = remote.revision;
        merged.updated_at = remote.updated_at;
        return MergeOutcome {
            merged,
            conflicts: Vec::new(),
        };
    }

    let (base_v, local_v, remote_v) = match (
        serde_json::to_value(base),
        serde_json::to_value(local),
        serde_json::to_value(remote),
    ) {
        (Ok(b), Ok(l), Ok(r)) => (b, l, r),
        _ => {
            tracing::warn!(line = %local.id, "line could not be encoded for merging; keeping local copy");
            return keep_local(local, remote);
        }
    };

    let kinds = [&base_v, &local_v, &remote_v].map(|v| v.pointer("/material/kind"));
    let material_atomic = kinds.iter().any(|kind| *kind != kinds[0]);
    let is_atomic = |path: &str| material_atomic && path == "/material";

    let base_leaves = flatten(&base_v, &is_atomic);
    let local_leaves = flatten(&local_v, &is_atomic);
    let remote_leaves = flatten(&remote_v, &is_atomic);

    let paths: BTreeSet<&String> = base_leaves
        .keys()
        .chain(local_leaves.keys())
        .chain(remote_leaves.keys())
        .collect();

    let mut merged_v = local_v.clone();
    let mut conflicts = Vec::new();

    for path in paths {
        let b = base_leaves.get(path);
        let l = local_leaves.get(path);
        let r = remote_leaves.get(path);

        let chosen = if l == r || r == b {
            l
        } else if l == b {
            r
        } else {
            let resolution = resolve_conflict(path, local, remote);
            if path != QTY_MIRROR {
                tracing::warn!(
                    line = %local.id,
                    field = %path,
                    kept = ?resolution,
                    "conflicting edits to the same field"
                );
                conflicts.push(FieldConflict {
                    field: path.clone(),
                    base: b.cloned().unwrap_or(Value::Null),
                    local: l.cloned().unwrap_or(Value::Null),
                    remote: r.cloned().unwrap_or(Value::Null),
                    resolution,
                });
            }
            match resolution {
                ConflictSide::Local => l,
                ConflictSide::Remote => r,
            }
        };

        if chosen != l {
            let segments = split_pointer(path);
            match chosen {
                Some(value) => set_path(&mut merged_v, &segments, value.clone()),
                None => remove_path(&mut merged_v, &segments),
            }
        }
    }

    let mut merged: LineItem = match serde_json::from_value(merged_v) {
        Ok(line) => line,
        Err(e) => {
            tracing::warn!(line = %local.id, error = %e, "merged line did not decode; keeping local copy");
            return keep_local(local, remote);
        }
    };

    merged.id = local.id;
    merged.revision = remote.revision;
    merged.updated_at = remote.updated_at;
    merged.edited_at = merge_edit_times(&local.edited_at, &remote.edited_at);
    // qty leads if the plate mirror came from the other side
    let qty = merged.qty;
    merged.set_qty(qty);

    MergeOutcome { merged, conflicts }
}

/// Equal on everything that's merged (bookkeeping and the cache ignored).
fn inputs_equal(a: &LineItem, b: &LineItem) -> bool {
    let strip = |line: &LineItem| LineItem {
        revision: 0,
        updated_at: DateTime::<Utc>::UNIX_EPOCH,
        edited_at: BTreeMap::new(),
        derived: Default::default(),
        ..line.clone()
    };
    a.id == b.id && strip(a) == strip(b)
}

fn keep_local(local: &LineItem, remote: &LineItem) -> MergeOutcome {
    let mut merged = local.clone();
    merged.revision = remote.revision;
    merged.updated_at = remote.updated_at;
    MergeOutcome {
        merged,
        conflicts: Vec::new(),
    }
}

/// Later edit time wins; ties and missing times go to local.
fn resolve_conflict(path: &str, local: &LineItem, remote: &LineItem) -> ConflictSide {
    match (edit_time(local, path), edit_time(remote, path)) {
        (Some(l), Some(r)) if r > l => ConflictSide::Remote,
        _ => ConflictSide::Local,
    }
}

/// Latest edit stamp at or below `path`.
fn edit_time(line: &LineItem, path: &str) -> Option<DateTime<Utc>> {
    let nested = format!("{}/", path);
    line.edited_at
        .iter()
        .filter(|(key, _)| key.as_str() == path || key.starts_with(&nested))
        .map(|(_, at)| *at)
        .max()
}

fn merge_edit_times(
    local: &BTreeMap<String, DateTime<Utc>>,
    remote: &BTreeMap<String, DateTime<Utc>>,
) -> BTreeMap<String, DateTime<Utc>> {
    let mut merged = local.clone();
    for (path, at) in remote {
        merged
            .entry(path.clone())
            .and_modify(|existing| *existing = (*existing).max(*at))
            .or_insert(*at);
    }
    merged
}

fn flatten(value: &Value, is_atomic: &dyn Fn(&str) -> bool) -> BTreeMap<String, Value> {
    let mut leaves = BTreeMap::new();
    if let Value::Object(map) = value {
        for (key, child) in map {
            if BOOKKEEPING.contains(&key.as_str()) {
                continue;
            }
            flatten_into(&format!("/{}", escape(key)), child, is_atomic, &mut leaves);
        }
    }
    leaves
}

fn flatten_into(path: &str, value: &Value, is_atomic: &dyn Fn(&str) -> bool, out: &mut BTreeMap<String, Value>) {
    match value {
        Value::Object(map) if !is_atomic(path) && !map.is_empty() => {
            for (key, child) in map {
                flatten_into(&format!("{}/{}", path, escape(key)), child, is_atomic, out);
            }
        }
        _ => {
            out.insert(path.to_string(), value.clone());
        }
    }
}

fn escape(key: &str) -> String {
    key.replace('~', "~0").replace('/', "~1")
}

fn split_pointer(path: &str) -> Vec<String> {
    path.split('/')
        .skip(1)
        .map(|s| s.replace("~1", "/").replace("~0", "~"))
        .collect()
}

fn set_path(root: &mut Value, segments: &[String], value: Value) {
    let Some((last, parents)) = segments.split_last() else {
        *root = value;
        return;
    };
    let mut node = root;
    for segment in parents {
        if !node.is_object() {
            *node = Value::Object(Map::new());
        }
        node = match node {
            Value::Object(map) => map.entry(segment.clone()).or_insert_with(|| Value::Object(Map::new())),
            _ => return,
        };
    }
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    if let Value::Object(map) = node {
        map.insert(last.clone(), value);
    }
}

fn remove_path(root: &mut Value, segments: &[String]) {
    let Some((last, parents)) = segments.split_last() else {
        return;
    };
    let mut node = root;
    for segment in parents {
        node = match node.get_mut(segment.as_str()) {
            Some(child) => child,
            None => return,
        };
    }
    if let Value::Object(map) = node {
        map.remove(last);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line::{apply_edit, LineField, LineStatus, MaterialSpec};
    use chrono::Duration;

    fn at(seconds: i64) -> DateTime<Utc> {
        DateTime::<Utc>::UNIX_EPOCH + Duration::seconds(1_700_000_000 + seconds)
    }

    fn synced_line() -> LineItem {
        let mut line = LineItem::new(1);
        line.revision = 4;
        line.rates.labor_rate = Some(50.0);
        line
    }

    #[test]
    fn test_identical_copies_return_base() {
        let base = synced_line();
        let outcome = smart_merge(&base, &base.clone(), &base.clone());
        assert_eq!(outcome.merged, base);
        assert!(outcome.conflicts.is_empty());
    }

    #[test]
    fn test_unchanged_copies_take_remote_revision() {
        let base = synced_line();
        let local = base.clone();
        let mut remote = base.clone();
        remote.revision = 6;

        let outcome = smart_merge(&base, &local, &remote);
        assert_eq!(outcome.merged.revision, 6);
        assert_eq!(outcome.merged.updated_at, remote.updated_at);
    }

    #[test]
    fn test_plate_qty_conflict_reported_once() {
        let mut base = LineItem::new_plate(1);
        base.revision = 2;
        let mut local = base.clone();
        local.set_qty(2.0);
        let mut remote = base.clone();
        remote.set_qty(3.0);
        remote.revision = 3;

        let outcome = smart_merge(&base, &local, &remote);
        assert_eq!(outcome.conflicts.len(), 1);
        assert_eq!(outcome.conflicts[0].field, "/qty");
        assert_eq!(outcome.merged.qty, 2.0);
        match &outcome.merged.material {
            MaterialSpec::Plate(plate) => assert_eq!(plate.plate_qty, outcome.merged.qty),
            other => panic!("expected plate, got {:?}", other),
        }
    }

    #[test]
    fn test_disjoint_changes_combine() {
        let base = synced_line();
        let mut local = base.clone();
        local.rates.labor_rate = Some(55.0);
        let mut remote = base.clone();
        remote.status = LineStatus::Void;
        remote.revision = 5;

        let outcome = smart_merge(&base, &local, &remote);
        assert_eq!(outcome.merged.rates.labor_rate, Some(55.0));
        assert_eq!(outcome.merged.status, LineStatus::Void);
        assert_eq!(outcome.merged.revision, 5);
        assert!(!outcome.has_conflicts());
    }

    #[test]
    fn test_same_change_both_sides_is_not_a_conflict() {
        let base = synced_line();
        let mut local = base.clone();
        local.set_qty(6.0);
        let mut remote = base.clone();
        remote.set_qty(6.0);

        let outcome = smart_merge(&base, &local, &remote);
        assert_eq!(outcome.merged.qty, 6.0);
        assert!(outcome.conflicts.is_empty());
    }

    #[test]
    fn test_conflict_without_times_keeps_local() {
        let base = synced_line();
        let mut local = base.clone();
        local.set_qty(2.0);
        let mut remote = base.clone();
        remote.set_qty(3.0);

        let outcome = smart_merge(&base, &local, &remote);
        assert_eq!(outcome.merged.qty, 2.0);
        assert_eq!(outcome.conflicts.len(), 1);
        let conflict = &outcome.conflicts[0];
        assert_eq!(conflict.field, "/qty");
        assert_eq!(conflict.base, Value::from(1.0));
        assert_eq!(conflict.remote, Value::from(3.0));
        assert_eq!(conflict.resolution, ConflictSide::Local);
    }

    #[test]
    fn test_conflict_later_edit_wins() {
        let base = synced_line();
        let mut local = base.clone();
        apply_edit(&mut local, LineField::Qty, "2", at(10)).unwrap();
        let mut remote = base.clone();
        apply_edit(&mut remote, LineField::Qty, "3", at(20)).unwrap();

        let outcome = smart_merge(&base, &local, &remote);
        assert_eq!(outcome.merged.qty, 3.0);
        assert_eq!(outcome.conflicts[0].resolution, ConflictSide::Remote);
        assert_eq!(outcome.merged.edited_at.get("/qty"), Some(&at(20)));

        // Equal times go to local
        let mut remote_tie = base.clone();
        apply_edit(&mut remote_tie, LineField::Qty, "3", at(10)).unwrap();
        let outcome = smart_merge(&base, &local, &remote_tie);
        assert_eq!(outcome.merged.qty, 2.0);
    }

    #[test]
    fn test_labor_leaves_merge_independently() {
        let base = synced_line();
        let mut local = base.clone();
        local.labor.weld = Some(2.0);
        let mut remote = base.clone();
        remote.labor.cut = Some(0.5);
        remote.notes = "field verify".to_string();

        let outcome = smart_merge(&base, &local, &remote);
        assert_eq!(outcome.merged.labor.weld, Some(2.0));
        assert_eq!(outcome.merged.labor.cut, Some(0.5));
        assert_eq!(outcome.merged.notes, "field verify");
        assert!(outcome.conflicts.is_empty());
    }

    #[test]
    fn test_kind_change_merges_material_whole() {
        let base = synced_line();
        let mut local = base.clone();
        apply_edit(&mut local, LineField::Size, "W12X26", at(5)).unwrap();
        let mut remote = base.clone();
        apply_edit(&mut remote, LineField::MaterialKind, "Plate", at(9)).unwrap();

        let outcome = smart_merge(&base, &local, &remote);
        assert!(matches!(outcome.merged.material, MaterialSpec::Plate(_)));
        assert_eq!(outcome.conflicts.len(), 1);
        assert_eq!(outcome.conflicts[0].field, "/material");
    }

    #[test]
    fn test_unset_override_on_remote_is_taken() {
        let base = synced_line();
        let local = base.clone();
        let mut remote = base.clone();
        remote.rates.labor_rate = None;
        let outcome = smart_merge(&base, &local, &remote);
        assert_eq!(outcome.merged.rates.labor_rate, None);
    }

    #[test]
    fn test_tags_are_atomic() {
        let mut base = synced_line();
        base.tags = vec!["a".to_string()];
        let mut local = base.clone();
        local.tags.push("b".to_string());
        let mut remote = base.clone();
        remote.tags.push("c".to_string());

        let outcome = smart_merge(&base, &local, &remote);
        assert_eq!(outcome.merged.tags, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(outcome.conflicts[0].field, "/tags");
    }

    #[test]
    fn test_pointer_escaping() {
        assert_eq!(escape("a/b~c"), "a~1b~0c");
        assert_eq!(split_pointer("/a~1b~0c/d"), vec!["a/b~c".to_string(), "d".to_string()]);
    }
}

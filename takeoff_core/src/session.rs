//! # Edit Sessions
//!
//! One line being edited: the copy it was opened from (**base**), the staged
//! copy with the user's changes (**pending**), a debounced save timer and an
//! explicit state machine.
//!
//! ```text
//!            edit               timer / save_now          write ok
//!   Clean ───────► Editing ──────────────────► PendingSave ─────────► Saved
//!                     ▲                              │                   │
//!                     │        remote changed        ▼                   │
//!                     │                         Conflicted ──────────────┘
//!                     │                            (merge, write ok)
//!                     └──────────────────── edit ────────────────────────┘
//! ```
//!
//! Edits apply synchronously to the pending copy and reprice it on the spot
//! (skipped when the pricing inputs didn't change). Saving fetches the
//! store's current copy first; if someone else wrote the line since it was
//! opened, the three copies are merged before the write. If another write
//! lands between that fetch and the update, the store rejects the update as
//! stale and the save fetches and merges again. A failed write leaves the
//! pending copy and state untouched so the caller can retry.

use std::time::Instant;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calculations::{derive, input_key, Pricer};
use crate::errors::{EstimateError, EstimateResult};
use crate::line::{apply_edit, LineField, LineItem};
use crate::merge::{smart_merge, FieldConflict};
use crate::schedule::DebounceTimer;
use crate::store::LineStore;

/// Fetch-merge-update rounds a single save makes before giving up on a
/// line that keeps changing underneath it
const MAX_WRITE_ROUNDS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EditState {
    /// Pending matches what was last synced
    Clean,
    /// Staged changes, save not yet due
    Editing,
    /// A save is due or failed and awaits retry
    PendingSave,
    /// Pending was merged with a concurrent remote change and still needs writing
    Conflicted,
    /// Last save succeeded
    Saved,
}

impl EditState {
    /// There are local changes the store hasn't seen
    pub fn has_unsaved_changes(&self) -> bool {
        matches!(self, EditState::Editing | EditState::PendingSave | EditState::Conflicted)
    }
}

/// What a successful save did
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveReport {
    /// The line as stored
    pub line: LineItem,
    /// Whether a concurrent remote change had to be merged in
    pub merged: bool,
    pub conflicts: Vec<FieldConflict>,
}

#[derive(Debug, Clone)]
pub struct EditSession {
    base: LineItem,
    pending: LineItem,
    state: EditState,
    timer: DebounceTimer,
    memo_key: Option<u64>,
    conflicts: Vec<FieldConflict>,
}

impl EditSession {
    /// Open a line for editing. `line` should be the last synced copy.
    pub fn begin(line: LineItem, pricer: &Pricer) -> Self {
        let mut session = EditSession {
            base: line.clone(),
            pending: line,
            state: EditState::Clean,
            timer: DebounceTimer::new(pricer.engine().save_debounce()),
            memo_key: None,
            conflicts: Vec::new(),
        };
        session.reprice(pricer);
        session
    }

    pub fn line_id(&self) -> Uuid {
        self.pending.id
    }

    pub fn state(&self) -> EditState {
        self.state
    }

    pub fn base(&self) -> &LineItem {
        &self.base
    }

    /// The staged line, derived fields current
    pub fn pending(&self) -> &LineItem {
        &self.pending
    }

    /// Conflicts from the most recent merge
    pub fn conflicts(&self) -> &[FieldConflict] {
        &self.conflicts
    }

    pub fn save_deadline(&self) -> Option<Instant> {
        self.timer.deadline()
    }

    /// Stage one field edit and schedule a save.
    pub fn edit(&mut self, field: LineField, raw: &str, pricer: &Pricer, now: Instant) -> EstimateResult<()> {
        apply_edit(&mut self.pending, field, raw, Utc::now())?;
        self.reprice(pricer);
        self.state = EditState::Editing;
        self.timer.schedule(now);
        Ok(())
    }

    /// Recompute derived fields if the pricing inputs changed since the last
    /// computation. Returns true if it recomputed.
    pub fn reprice(&mut self, pricer: &Pricer) -> bool {
        let key = input_key(&self.pending, pricer);
        if key.is_some() && key == self.memo_key {
            tracing::debug!(line = %self.pending.id, "pricing inputs unchanged; skipping recompute");
            return false;
        }
        self.pending.derived = derive(&self.pending, pricer);
        self.memo_key = key;
        tracing::debug!(line = %self.pending.id, total = self.pending.derived.cost.total_cost, "line repriced");
        true
    }

    /// Save if the debounce deadline has passed. `None` when nothing was due.
    pub fn poll(
        &mut self,
        now: Instant,
        store: &dyn LineStore,
        pricer: &Pricer,
    ) -> Option<EstimateResult<SaveReport>> {
        if self.timer.fire_if_due(now) {
            self.state = EditState::PendingSave;
            Some(self.write(store, pricer))
        } else {
            None
        }
    }

    /// Save immediately (explicit save or leaving the field). `None` when
    /// there was nothing unsaved.
    pub fn save_now(&mut self, store: &dyn LineStore, pricer: &Pricer) -> Option<EstimateResult<SaveReport>> {
        self.timer.force();
        if !self.state.has_unsaved_changes() {
            return None;
        }
        if self.state == EditState::Editing {
            self.state = EditState::PendingSave;
        }
        Some(self.write(store, pricer))
    }

    fn write(&mut self, store: &dyn LineStore, pricer: &Pricer) -> EstimateResult<SaveReport> {
        let id = self.pending.id;
        let mut merged = false;
        let mut conflicts = Vec::new();
        let mut round = 0;

        let stored = loop {
            round += 1;
            let remote = store
                .fetch(id)?
                .ok_or_else(|| EstimateError::line_not_found(id))?;
            if remote.revision != self.base.revision {
                self.reconcile(remote, pricer);
                conflicts.extend(self.conflicts.iter().cloned());
                merged = true;
            }

            match store.update(&self.pending) {
                Ok(stored) => break stored,
                Err(EstimateError::StaleRevision { stored, .. }) if round < MAX_WRITE_ROUNDS => {
                    tracing::debug!(line = %id, stored, round, "line changed before write; merging again");
                }
                Err(e) => {
                    tracing::warn!(line = %id, error = %e, "save failed; pending changes kept");
                    return Err(e);
                }
            }
        };

        let stored = self.adopt(stored, pricer);
        self.state = EditState::Saved;
        tracing::info!(line = %id, revision = stored.revision, merged, "line saved");
        Ok(SaveReport {
            line: stored,
            merged,
            conflicts,
        })
    }

    /// Take in a newer copy of the line from outside (subscription or a save
    /// race). With no unsaved changes it simply replaces both copies; with
    /// unsaved changes it's merged into pending.
    pub fn apply_remote(&mut self, remote: LineItem, pricer: &Pricer) {
        if remote.id != self.pending.id || remote.revision <= self.base.revision {
            return;
        }
        if self.state.has_unsaved_changes() {
            self.reconcile(remote, pricer);
        } else {
            self.adopt(remote, pricer);
        }
    }

    fn reconcile(&mut self, remote: LineItem, pricer: &Pricer) {
        let outcome = smart_merge(&self.base, &self.pending, &remote);
        self.base = remote;
        self.pending = outcome.merged;
        self.conflicts = outcome.conflicts;
        // The merged copy carries whichever side's derived fields it was built from
        self.memo_key = None;
        self.reprice(pricer);
        if !self.conflicts.is_empty() {
            self.state = EditState::Conflicted;
        }
    }

    fn adopt(&mut self, stored: LineItem, pricer: &Pricer) -> LineItem {
        self.base = stored.clone();
        self.pending = stored;
        self.memo_key = None;
        self.reprice(pricer);
        self.base.derived = self.pending.derived.clone();
        self.pending.clone()
    }
}

//! # Estimate
//!
//! Drives one project's takeoff: the committed line collection with its
//! undo history, at most one open [`EditSession`], the injected store and
//! the pricer.
//!
//! - User actions (add, duplicate, delete, void/restore, a saved field edit)
//!   write to the store first and only then push a new snapshot onto the
//!   history. A failed write leaves the collection untouched.
//! - Remote snapshots replace the current state without an undo entry; an
//!   open edit is reconciled against its remote copy rather than overwritten.
//! - Undo and redo only move the local view. They close any open edit
//!   without saving it and never write; [`Estimate::persist_current`] is the
//!   separate, explicit way to push a restored state to the store.
//!
//! ## Example
//!
//! ```rust
//! use std::time::{Duration, Instant};
//! use takeoff_core::calculations::Pricer;
//! use takeoff_core::estimate::Estimate;
//! use takeoff_core::line::LineField;
//! use takeoff_core::store::MemoryStore;
//!
//! let mut estimate = Estimate::open(MemoryStore::new(), Pricer::default())?;
//! let id = estimate.new_line()?;
//!
//! let now = Instant::now();
//! estimate.begin_edit(id)?;
//! estimate.edit(LineField::Size, "W12X26", now)?;
//! estimate.edit(LineField::LengthFt, "20", now)?;
//! estimate.poll(now + Duration::from_millis(500)).transpose()?;
//!
//! assert_eq!(estimate.summary().total_weight, 520.0);
//! # Ok::<(), takeoff_core::errors::EstimateError>(())
//! ```

use std::collections::HashMap;
use std::sync::mpsc::Receiver;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calculations::{compute_derived_fields, Pricer};
use crate::collection::{CollectionSnapshot, EstimateSummary};
use crate::errors::{EstimateError, EstimateResult};
use crate::history::HistoryManager;
use crate::line::{LineField, LineItem, LineStatus};
use crate::project::SettingsProvider;
use crate::session::{EditSession, EditState, SaveReport};
use crate::store::LineStore;

/// What [`Estimate::persist_current`] wrote
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistReport {
    pub created: Vec<Uuid>,
    pub updated: Vec<Uuid>,
    pub deleted: Vec<Uuid>,
}

impl PersistReport {
    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.updated.is_empty() && self.deleted.is_empty()
    }
}

pub struct Estimate<S: LineStore> {
    store: S,
    pricer: Pricer,
    history: HistoryManager<CollectionSnapshot>,
    session: Option<EditSession>,
    subscription: Option<Receiver<CollectionSnapshot>>,
}

impl<S: LineStore> Estimate<S> {
    /// Load every line from the store and price it.
    pub fn open(store: S, pricer: Pricer) -> EstimateResult<Self> {
        let snapshot = CollectionSnapshot::new(store.list()?).repriced(&pricer);
        let history = HistoryManager::new(snapshot, pricer.engine().history_capacity);
        let subscription = store.subscribe();
        tracing::info!(lines = history.current().len(), "estimate opened");
        Ok(Estimate {
            store,
            pricer,
            history,
            session: None,
            subscription,
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn pricer(&self) -> &Pricer {
        &self.pricer
    }

    /// Committed collection (without any unsaved edit)
    pub fn snapshot(&self) -> &CollectionSnapshot {
        self.history.current()
    }

    /// Collection as displayed: committed lines with the open edit overlaid
    pub fn view(&self) -> CollectionSnapshot {
        let mut view = self.snapshot().clone();
        if let Some(session) = &self.session {
            view.upsert(session.pending().clone());
        }
        view
    }

    /// A line as displayed
    pub fn line(&self, id: Uuid) -> Option<&LineItem> {
        match &self.session {
            Some(session) if session.line_id() == id => Some(session.pending()),
            _ => self.snapshot().get(id),
        }
    }

    pub fn summary(&self) -> EstimateSummary {
        self.view().summary()
    }

    pub fn edit_state(&self) -> Option<EditState> {
        self.session.as_ref().map(EditSession::state)
    }

    pub fn session(&self) -> Option<&EditSession> {
        self.session.as_ref()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    // ------------------------------------------------------------------
    // Collection operations
    // ------------------------------------------------------------------

    /// Add a new structural line; returns its id.
    pub fn new_line(&mut self) -> EstimateResult<Uuid> {
        self.add_line(LineItem::new(0))
    }

    /// Add a new plate line; returns its id.
    pub fn new_plate_line(&mut self) -> EstimateResult<Uuid> {
        self.add_line(LineItem::new_plate(0))
    }

    /// Store a line at the end of the sequence; returns its id.
    pub fn add_line(&mut self, mut line: LineItem) -> EstimateResult<Uuid> {
        line.sequence = self.view().next_sequence();
        let stored = self.store.create(&compute_derived_fields(&line, &self.pricer))?;
        let id = stored.id;
        self.commit(|snapshot, pricer| snapshot.upsert(compute_derived_fields(&stored, pricer)));
        tracing::info!(line = %id, sequence = line.sequence, "line added");
        Ok(id)
    }

    /// Copy a line (as displayed) to a new line at the end.
    pub fn duplicate_line(&mut self, id: Uuid) -> EstimateResult<Uuid> {
        let source = self.line(id).ok_or_else(|| EstimateError::line_not_found(id))?;
        let copy = source.duplicate(0);
        self.add_line(copy)
    }

    /// Hard-delete a line. Small parts that referenced it keep their
    /// (now dangling) parent reference.
    pub fn delete_line(&mut self, id: Uuid) -> EstimateResult<()> {
        if self.line(id).is_none() {
            return Err(EstimateError::line_not_found(id));
        }
        self.store.delete(id)?;
        if self.session.as_ref().is_some_and(|s| s.line_id() == id) {
            self.session = None;
        }
        self.commit(|snapshot, _| {
            snapshot.remove(id);
        });
        tracing::info!(line = %id, "line deleted");
        Ok(())
    }

    pub fn void_line(&mut self, id: Uuid) -> EstimateResult<SaveReport> {
        self.set_status(id, LineStatus::Void)
    }

    pub fn restore_line(&mut self, id: Uuid) -> EstimateResult<SaveReport> {
        self.set_status(id, LineStatus::Active)
    }

    fn set_status(&mut self, id: Uuid, status: LineStatus) -> EstimateResult<SaveReport> {
        let raw = match status {
            LineStatus::Active => "Active",
            LineStatus::Void => "Void",
        };
        self.edit_and_save(id, LineField::Status, raw)
    }

    /// One field change saved immediately, through the same merge-aware path
    /// as interactive edits.
    pub fn edit_and_save(&mut self, id: Uuid, field: LineField, raw: &str) -> EstimateResult<SaveReport> {
        self.begin_edit(id)?;
        self.edit(field, raw, Instant::now())?;
        match self.end_edit()? {
            Some(report) => Ok(report),
            None => Err(EstimateError::Internal {
                message: "edit produced nothing to save".to_string(),
            }),
        }
    }

    /// Store a batch of new lines (e.g. from a CSV import) as one undo step.
    ///
    /// Lines already written stay even if a later one fails.
    pub fn import_lines(&mut self, lines: Vec<LineItem>) -> EstimateResult<usize> {
        let mut next = self.view().next_sequence();
        let mut stored = Vec::with_capacity(lines.len());
        let mut failure = None;

        for mut line in lines {
            line.sequence = next;
            match self.store.create(&compute_derived_fields(&line, &self.pricer)) {
                Ok(line) => {
                    stored.push(line);
                    next += 1;
                }
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            }
        }

        let count = stored.len();
        if count > 0 {
            self.commit(|snapshot, pricer| {
                for line in &stored {
                    snapshot.upsert(compute_derived_fields(line, pricer));
                }
            });
        }
        tracing::info!(lines = count, "lines imported");
        match failure {
            Some(e) => Err(e),
            None => Ok(count),
        }
    }

    // ------------------------------------------------------------------
    // Editing
    // ------------------------------------------------------------------

    /// Open a line for editing. Any other open edit is saved first; if that
    /// save fails it stays open and the error is returned.
    pub fn begin_edit(&mut self, id: Uuid) -> EstimateResult<()> {
        if self.session.as_ref().is_some_and(|s| s.line_id() == id) {
            return Ok(());
        }
        self.end_edit()?;
        let line = self
            .snapshot()
            .get(id)
            .cloned()
            .ok_or_else(|| EstimateError::line_not_found(id))?;
        self.session = Some(EditSession::begin(line, &self.pricer));
        Ok(())
    }

    /// Stage an edit to the open line.
    pub fn edit(&mut self, field: LineField, raw: &str, now: Instant) -> EstimateResult<()> {
        let session = self
            .session
            .as_mut()
            .ok_or_else(|| EstimateError::invalid_input("line", "", "No line is open for editing"))?;
        session.edit(field, raw, &self.pricer, now)
    }

    /// Save the open edit if its debounce deadline has passed.
    pub fn poll(&mut self, now: Instant) -> Option<EstimateResult<SaveReport>> {
        let result = self.session.as_mut()?.poll(now, &self.store, &self.pricer)?;
        Some(self.after_save(result))
    }

    /// Save the open edit now (explicit save or blur).
    pub fn save_now(&mut self) -> Option<EstimateResult<SaveReport>> {
        let result = self.session.as_mut()?.save_now(&self.store, &self.pricer)?;
        Some(self.after_save(result))
    }

    /// Save and close the open edit. On a failed save the edit stays open.
    pub fn end_edit(&mut self) -> EstimateResult<Option<SaveReport>> {
        let report = self.save_now().transpose()?;
        self.session = None;
        Ok(report)
    }

    /// Close the open edit, discarding unsaved changes. Returns true if there
    /// were any.
    pub fn cancel_edit(&mut self) -> bool {
        self.session
            .take()
            .is_some_and(|s| s.state().has_unsaved_changes())
    }

    fn after_save(&mut self, result: EstimateResult<SaveReport>) -> EstimateResult<SaveReport> {
        let report = result?;
        let saved = report.line.clone();
        self.commit(|snapshot, _| snapshot.upsert(saved));
        Ok(report)
    }

    // ------------------------------------------------------------------
    // Remote updates, history, settings
    // ------------------------------------------------------------------

    /// Apply every snapshot the store has pushed since the last call.
    /// Returns how many arrived.
    pub fn sync_remote(&mut self) -> usize {
        let Some(rx) = &self.subscription else {
            return 0;
        };
        let received: Vec<CollectionSnapshot> = rx.try_iter().collect();
        let count = received.len();
        if let Some(latest) = received.into_iter().last() {
            self.apply_remote(latest);
        }
        count
    }

    /// Replace the current state with an externally sourced snapshot.
    pub fn apply_remote(&mut self, snapshot: CollectionSnapshot) {
        let repriced = snapshot.repriced(&self.pricer);
        let deleted = match &mut self.session {
            Some(session) => match repriced.get(session.line_id()) {
                Some(remote) => {
                    session.apply_remote(remote.clone(), &self.pricer);
                    false
                }
                None => true,
            },
            None => false,
        };
        if deleted {
            if let Some(session) = self.session.take() {
                tracing::warn!(line = %session.line_id(), "line being edited was deleted elsewhere; edit discarded");
            }
        }
        self.history.replace(repriced);
    }

    pub fn undo(&mut self) -> bool {
        self.close_for_history();
        let moved = self.history.undo().is_some();
        if moved {
            self.reprice_current();
        }
        moved
    }

    pub fn redo(&mut self) -> bool {
        self.close_for_history();
        let moved = self.history.redo().is_some();
        if moved {
            self.reprice_current();
        }
        moved
    }

    fn close_for_history(&mut self) {
        if self.cancel_edit() {
            tracing::warn!("unsaved edit discarded by undo/redo");
        }
    }

    /// Write the current state to the store as one explicit save: lines the
    /// store lacks are created, differing lines overwritten, extra lines
    /// deleted. Any open edit is saved first.
    pub fn persist_current(&mut self) -> EstimateResult<PersistReport> {
        self.end_edit()?;

        let mut stored: HashMap<Uuid, LineItem> = self.store.list()?.into_iter().map(|l| (l.id, l)).collect();
        let mut report = PersistReport::default();
        let mut persisted = Vec::with_capacity(self.snapshot().len());

        for line in self.snapshot().lines() {
            match stored.remove(&line.id) {
                None => {
                    persisted.push(self.store.create(line)?);
                    report.created.push(line.id);
                }
                Some(existing) if !same_content(&existing, line) => {
                    // Overwrite whatever is stored, not the revision this copy was taken at
                    let mut line = line.clone();
                    line.revision = existing.revision;
                    persisted.push(self.store.update(&line)?);
                    report.updated.push(line.id);
                }
                Some(existing) => persisted.push(existing),
            }
        }
        for id in stored.into_keys() {
            self.store.delete(id)?;
            report.deleted.push(id);
        }

        self.history.replace(CollectionSnapshot::new(persisted).repriced(&self.pricer));
        tracing::info!(
            created = report.created.len(),
            updated = report.updated.len(),
            deleted = report.deleted.len(),
            "current state persisted"
        );
        Ok(report)
    }

    /// Switch to a new pricer and reprice everything shown.
    pub fn set_pricer(&mut self, pricer: Pricer) {
        self.pricer = pricer;
        self.reprice_current();
        if let Some(session) = &mut self.session {
            session.reprice(&self.pricer);
        }
    }

    /// Re-read settings from the provider, keeping the current catalog.
    pub fn update_settings(&mut self, provider: &dyn SettingsProvider) {
        let catalog = self.pricer.catalog_handle();
        self.set_pricer(Pricer::from_provider(provider).with_catalog(catalog));
    }

    fn reprice_current(&mut self) {
        let repriced = self.history.current().repriced(&self.pricer);
        self.history.replace(repriced);
    }

    /// Apply a change to a copy of the current snapshot and push it.
    fn commit(&mut self, change: impl FnOnce(&mut CollectionSnapshot, &Pricer)) {
        let mut next = self.history.current().clone();
        change(&mut next, &self.pricer);
        self.history.push(next);
    }
}

/// Same line apart from store bookkeeping. Derived values count, so stale
/// pricing in the store gets refreshed.
fn same_content(a: &LineItem, b: &LineItem) -> bool {
    let b = LineItem {
        revision: a.revision,
        updated_at: a.updated_at,
        ..b.clone()
    };
    *a == b
}

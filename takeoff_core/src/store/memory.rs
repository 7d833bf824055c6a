//! In-process shared store.
//!
//! Cloning a [`MemoryStore`] gives another handle onto the same backing
//! collection, the way two editors would share one backend. Every
//! successful write pushes a fresh [`CollectionSnapshot`] to the
//! subscribers of every other handle; the writing handle already holds
//! what it wrote.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::mpsc::{channel, Receiver, Sender};

use chrono::Utc;
use uuid::Uuid;

use super::LineStore;
use crate::collection::CollectionSnapshot;
use crate::errors::{EstimateError, EstimateResult};
use crate::line::LineItem;

#[derive(Default)]
struct Backend {
    lines: HashMap<Uuid, LineItem>,
    /// (owning handle, channel)
    subscribers: Vec<(u64, Sender<CollectionSnapshot>)>,
    next_handle: u64,
    /// When set, every write fails with this reason
    failure: Option<String>,
}

impl Backend {
    fn snapshot(&self) -> CollectionSnapshot {
        CollectionSnapshot::new(self.lines.values().cloned().collect())
    }

    fn check_failure(&self, operation: &str, line_id: Option<Uuid>) -> EstimateResult<()> {
        match &self.failure {
            Some(reason) => Err(EstimateError::persistence(operation, line_id, reason.clone())),
            None => Ok(()),
        }
    }

    fn allocate_handle(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }

    /// Send the current collection to every subscriber not owned by `writer`.
    fn publish(&mut self, writer: u64) {
        let snapshot = self.snapshot();
        self.subscribers
            .retain(|(handle, tx)| *handle == writer || tx.send(snapshot.clone()).is_ok());
    }
}

pub struct MemoryStore {
    backend: Rc<RefCell<Backend>>,
    handle: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        let backend = Rc::new(RefCell::new(Backend::default()));
        let handle = backend.borrow_mut().allocate_handle();
        Self { backend, handle }
    }

    /// A store pre-loaded with lines, taken as already persisted.
    pub fn with_lines(lines: Vec<LineItem>) -> Self {
        let store = Self::new();
        store.backend.borrow_mut().lines = lines.into_iter().map(|l| (l.id, l)).collect();
        store
    }

    /// Make every subsequent write fail (`Some`) or succeed again (`None`).
    pub fn set_failure(&self, reason: Option<&str>) {
        self.backend.borrow_mut().failure = reason.map(str::to_string);
    }

    pub fn len(&self) -> usize {
        self.backend.borrow().lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// A new handle onto the same backend, with its own subscriptions.
impl Clone for MemoryStore {
    fn clone(&self) -> Self {
        let handle = self.backend.borrow_mut().allocate_handle();
        Self {
            backend: Rc::clone(&self.backend),
            handle,
        }
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let backend = self.backend.borrow();
        f.debug_struct("MemoryStore")
            .field("handle", &self.handle)
            .field("lines", &backend.lines.len())
            .field("subscribers", &backend.subscribers.len())
            .finish()
    }
}

impl LineStore for MemoryStore {
    fn list(&self) -> EstimateResult<Vec<LineItem>> {
        Ok(self.backend.borrow().snapshot().into_lines())
    }

    fn fetch(&self, id: Uuid) -> EstimateResult<Option<LineItem>> {
        Ok(self.backend.borrow().lines.get(&id).cloned())
    }

    fn create(&self, line: &LineItem) -> EstimateResult<LineItem> {
        let mut backend = self.backend.borrow_mut();
        backend.check_failure("create", Some(line.id))?;
        if backend.lines.contains_key(&line.id) {
            return Err(EstimateError::persistence("create", Some(line.id), "line already exists"));
        }

        let mut stored = line.clone();
        stored.revision = 1;
        stored.updated_at = Utc::now();
        backend.lines.insert(stored.id, stored.clone());
        backend.publish(self.handle);
        Ok(stored)
    }

    fn update(&self, line: &LineItem) -> EstimateResult<LineItem> {
        let mut backend = self.backend.borrow_mut();
        backend.check_failure("update", Some(line.id))?;
        let revision = match backend.lines.get(&line.id) {
            Some(existing) => existing.revision,
            None => return Err(EstimateError::line_not_found(line.id)),
        };
        if line.revision != revision {
            return Err(EstimateError::stale_revision(line.id, line.revision, revision));
        }

        let mut stored = line.clone();
        stored.revision = revision + 1;
        stored.updated_at = Utc::now();
        backend.lines.insert(stored.id, stored.clone());
        backend.publish(self.handle);
        Ok(stored)
    }

    fn delete(&self, id: Uuid) -> EstimateResult<()> {
        let mut backend = self.backend.borrow_mut();
        backend.check_failure("delete", Some(id))?;
        if backend.lines.remove(&id).is_none() {
            return Err(EstimateError::line_not_found(id));
        }
        backend.publish(self.handle);
        Ok(())
    }

    fn subscribe(&self) -> Option<Receiver<CollectionSnapshot>> {
        let (tx, rx) = channel();
        self.backend.borrow_mut().subscribers.push((self.handle, tx));
        Some(rx)
    }
}

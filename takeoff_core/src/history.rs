//! # Undo/Redo History
//!
//! A bounded stack of whole-collection snapshots with a position pointer.
//!
//! - [`HistoryManager::push`] records a user-initiated change and drops any
//!   redo entries.
//! - [`HistoryManager::replace`] swaps in an externally sourced state
//!   (another user's save) without touching the stack, so it can never be
//!   reached by undo or redo.
//! - [`HistoryManager::undo`] / [`HistoryManager::redo`] move the pointer and
//!   return the snapshot there. At either end they're no-ops returning `None`.
//!
//! History is a local view: moving through it never writes to a store.
//!
//! ## Example
//!
//! ```rust
//! use takeoff_core::history::HistoryManager;
//!
//! let mut history = HistoryManager::new(vec!["P0"], 100);
//! history.push(vec!["P1"]);
//! history.push(vec!["P2"]);
//! assert_eq!(history.undo(), Some(&vec!["P1"]));
//! assert_eq!(history.redo(), Some(&vec!["P2"]));
//! assert_eq!(history.redo(), None);
//! ```

use std::collections::VecDeque;

/// Default number of undo steps kept
pub const DEFAULT_CAPACITY: usize = 100;

/// Bounded undo/redo over snapshots of type `S`.
#[derive(Debug, Clone)]
pub struct HistoryManager<S> {
    /// Committed states, oldest first
    entries: VecDeque<S>,
    /// Index of the committed state the view is at
    position: usize,
    /// What's on screen: `entries[position]` unless replaced since
    current: S,
    /// Maximum undo steps
    capacity: usize,
}

impl<S: Clone> HistoryManager<S> {
    /// Start a history at `initial`, keeping at most `capacity` undo steps.
    pub fn new(initial: S, capacity: usize) -> Self {
        let mut entries = VecDeque::new();
        entries.push_back(initial.clone());
        HistoryManager {
            entries,
            position: 0,
            current: initial,
            capacity: capacity.max(1),
        }
    }

    /// Record a user-initiated change.
    pub fn push(&mut self, snapshot: S) {
        self.entries.truncate(self.position + 1);
        self.entries.push_back(snapshot.clone());

        // Limit history size
        while self.entries.len() > self.capacity + 1 {
            self.entries.pop_front();
        }
        self.position = self.entries.len() - 1;
        self.current = snapshot;
    }

    /// Apply an external update: current state changes, the stack doesn't.
    pub fn replace(&mut self, snapshot: S) {
        self.current = snapshot;
    }

    pub fn undo(&mut self) -> Option<&S> {
        if self.position == 0 {
            return None;
        }
        self.position -= 1;
        self.current = self.entries[self.position].clone();
        tracing::info!(position = self.position, "undo");
        Some(&self.current)
    }

    pub fn redo(&mut self) -> Option<&S> {
        if self.position + 1 >= self.entries.len() {
            return None;
        }
        self.position += 1;
        self.current = self.entries[self.position].clone();
        tracing::info!(position = self.position, "redo");
        Some(&self.current)
    }

    pub fn current(&self) -> &S {
        &self.current
    }

    pub fn can_undo(&self) -> bool {
        self.position > 0
    }

    pub fn can_redo(&self) -> bool {
        self.position + 1 < self.entries.len()
    }

    /// Number of undo steps available
    pub fn undo_depth(&self) -> usize {
        self.position
    }

    /// Number of redo steps available
    pub fn redo_depth(&self) -> usize {
        self.entries.len() - self.position - 1
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Forget all history, keeping the current state as the only entry.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.entries.push_back(self.current.clone());
        self.position = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_undo_twice_then_redo() {
        let mut history = HistoryManager::new("P0", DEFAULT_CAPACITY);
        history.push("P1");
        history.push("P2");
        history.push("P3");

        history.undo();
        assert_eq!(history.undo(), Some(&"P1"));
        assert_eq!(*history.current(), "P1");
        assert_eq!(history.redo(), Some(&"P2"));
    }

    #[test]
    fn test_boundaries_are_noops() {
        let mut history = HistoryManager::new(0, DEFAULT_CAPACITY);
        assert_eq!(history.undo(), None);
        assert_eq!(history.redo(), None);
        assert_eq!(*history.current(), 0);

        history.push(1);
        assert_eq!(history.redo(), None);
        assert_eq!(*history.current(), 1);
    }

    #[test]
    fn test_push_truncates_redo() {
        let mut history = HistoryManager::new(0, DEFAULT_CAPACITY);
        history.push(1);
        history.push(2);
        history.undo();
        assert!(history.can_redo());

        history.push(3);
        assert!(!history.can_redo());
        assert_eq!(history.undo(), Some(&1));
        assert_eq!(history.redo(), Some(&3));
    }

    #[test]
    fn test_replaced_state_is_never_reachable() {
        let mut history = HistoryManager::new("P0", DEFAULT_CAPACITY);
        history.push("P1");
        history.replace("R1");
        assert_eq!(*history.current(), "R1");
        assert_eq!(history.undo_depth(), 1);

        let mut seen = vec![];
        while let Some(s) = history.undo() {
            seen.push(*s);
        }
        while let Some(s) = history.redo() {
            seen.push(*s);
        }
        assert!(!seen.contains(&"R1"));
    }

    #[test]
    fn test_capacity_bounds_undo_depth() {
        let mut history = HistoryManager::new(0, 3);
        for i in 1..=10 {
            history.push(i);
        }
        assert_eq!(history.undo_depth(), 3);
        assert_eq!(history.undo(), Some(&9));
        assert_eq!(history.undo(), Some(&8));
        assert_eq!(history.undo(), Some(&7));
        assert_eq!(history.undo(), None);
        assert_eq!(history.redo_depth(), 3);
    }

    #[test]
    fn test_clear_keeps_current() {
        let mut history = HistoryManager::new(0, DEFAULT_CAPACITY);
        history.push(1);
        history.push(2);
        history.clear();
        assert_eq!(*history.current(), 2);
        assert!(!history.can_undo());
    }
}

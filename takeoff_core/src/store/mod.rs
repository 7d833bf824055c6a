//! # Persistence Port
//!
//! The engine never talks to storage directly; it goes through a
//! [`LineStore`]. The store is authoritative for `revision` (bumped on every
//! write) and `updated_at`, and it owns transport and retry. A failed write
//! comes back as a recoverable [`EstimateError::Persistence`] and is not
//! retried here.
//!
//! - [`MemoryStore`] - shared in-process store with push subscriptions
//! - [`ProjectFileStore`] - a locked, atomically saved `.tko` file
//!
//! [`EstimateError::Persistence`]: crate::errors::EstimateError::Persistence

pub mod memory;
#[cfg(not(target_arch = "wasm32"))]
pub mod file;

pub use memory::MemoryStore;
#[cfg(not(target_arch = "wasm32"))]
pub use file::ProjectFileStore;

use std::sync::mpsc::Receiver;

use uuid::Uuid;

use crate::collection::CollectionSnapshot;
use crate::errors::EstimateResult;
use crate::line::LineItem;

/// CRUD over the lines of one project, keyed by line id.
pub trait LineStore {
    /// All lines, in sequence order
    fn list(&self) -> EstimateResult<Vec<LineItem>>;

    /// Find a line by id
    fn fetch(&self, id: Uuid) -> EstimateResult<Option<LineItem>>;

    /// Store a new line; returns it as stored (revision 1)
    fn create(&self, line: &LineItem) -> EstimateResult<LineItem>;

    /// Overwrite an existing line; returns it as stored (revision bumped).
    ///
    /// `line.revision` must be the stored revision. A line written against
    /// an older copy is rejected with [`EstimateError::StaleRevision`] and
    /// nothing is changed.
    ///
    /// [`EstimateError::StaleRevision`]: crate::errors::EstimateError::StaleRevision
    fn update(&self, line: &LineItem) -> EstimateResult<LineItem>;

    /// Hard-delete a line
    fn delete(&self, id: Uuid) -> EstimateResult<()>;

    /// Push channel of whole-collection snapshots after every write made
    /// through another handle, when the backend supports one. A handle's own
    /// writes are not echoed back to it.
    fn subscribe(&self) -> Option<Receiver<CollectionSnapshot>> {
        None
    }
}

//! Store over a `.tko` project file.
//!
//! Every write takes the project lock, reloads the file, applies the one
//! change and saves atomically before releasing the lock, so two estimators
//! on a shared drive never overwrite each other's lines wholesale.

use std::path::{Path, PathBuf};

use chrono::Utc;
use uuid::Uuid;

use super::LineStore;
use crate::errors::{EstimateError, EstimateResult};
use crate::file_io::{load_project, save_project, FileLock};
use crate::line::LineItem;
use crate::project::Project;

#[derive(Debug, Clone)]
pub struct ProjectFileStore {
    path: PathBuf,
    user_id: String,
}

impl ProjectFileStore {
    /// A store over an existing project file, writing as `user_id`.
    pub fn new(path: impl Into<PathBuf>, user_id: impl Into<String>) -> Self {
        ProjectFileStore {
            path: path.into(),
            user_id: user_id.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current project as on disk
    pub fn load(&self) -> EstimateResult<Project> {
        load_project(&self.path)
    }

    /// Lock, load, mutate, save. The lock is released when this returns.
    fn write<T>(
        &self,
        operation: &str,
        line_id: Option<Uuid>,
        change: impl FnOnce(&mut Project) -> EstimateResult<T>,
    ) -> EstimateResult<T> {
        let _lock = FileLock::acquire(&self.path, self.user_id.as_str())?;
        let mut project = load_project(&self.path)?;
        let result = change(&mut project)?;
        project.touch();
        save_project(&project, &self.path).map_err(|e| match e {
            EstimateError::FileError { reason, .. } => EstimateError::persistence(operation, line_id, reason),
            other => other,
        })?;
        Ok(result)
    }
}

impl LineStore for ProjectFileStore {
    fn list(&self) -> EstimateResult<Vec<LineItem>> {
        let mut lines = self.load()?.lines;
        lines.sort_by_key(|l| l.sequence);
        Ok(lines)
    }

    fn fetch(&self, id: Uuid) -> EstimateResult<Option<LineItem>> {
        Ok(self.load()?.lines.into_iter().find(|l| l.id == id))
    }

    fn create(&self, line: &LineItem) -> EstimateResult<LineItem> {
        self.write("create", Some(line.id), |project| {
            if project.line(&line.id).is_some() {
                return Err(EstimateError::persistence("create", Some(line.id), "line already exists"));
            }
            let mut stored = line.clone();
            stored.revision = 1;
            stored.updated_at = Utc::now();
            project.lines.push(stored.clone());
            Ok(stored)
        })
    }

    fn update(&self, line: &LineItem) -> EstimateResult<LineItem> {
        self.write("update", Some(line.id), |project| {
            let existing = project
                .lines
                .iter_mut()
                .find(|l| l.id == line.id)
                .ok_or_else(|| EstimateError::line_not_found(line.id))?;
            if line.revision != existing.revision {
                return Err(EstimateError::stale_revision(line.id, line.revision, existing.revision));
            }
            let mut stored = line.clone();
            stored.revision = existing.revision + 1;
            stored.updated_at = Utc::now();
            *existing = stored.clone();
            Ok(stored)
        })
    }

    fn delete(&self, id: Uuid) -> EstimateResult<()> {
        self.write("delete", Some(id), |project| {
            let before = project.lines.len();
            project.lines.retain(|l| l.id != id);
            if project.lines.len() == before {
                return Err(EstimateError::line_not_found(id));
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_io::save_project;
    use std::env::temp_dir;
    use std::fs;

    fn fresh_file(name: &str) -> PathBuf {
        let path = temp_dir().join(format!("takeoff_store_test_{}_{}.tko", name, std::process::id()));
        save_project(&Project::new("Dana", "25-118", "Riverside Clinic"), &path).unwrap();
        path
    }

    #[test]
    fn test_crud_against_file() {
        let path = fresh_file("crud");
        let store = ProjectFileStore::new(&path, "dana@northside.example");

        let created = store.create(&LineItem::new(1)).unwrap();
        assert_eq!(created.revision, 1);

        let mut edited = created.clone();
        edited.set_qty(8.0);
        let updated = store.update(&edited).unwrap();
        assert_eq!(updated.revision, 2);

        let on_disk = load_project(&path).unwrap();
        assert_eq!(on_disk.lines.len(), 1);
        assert_eq!(on_disk.lines[0].qty, 8.0);

        store.delete(created.id).unwrap();
        assert!(store.list().unwrap().is_empty());
        assert!(matches!(store.delete(created.id), Err(EstimateError::LineNotFound { .. })));

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_stale_update_leaves_file_untouched() {
        let path = fresh_file("stale");
        let ours = ProjectFileStore::new(&path, "dana@northside.example");
        let theirs = ProjectFileStore::new(&path, "sam@northside.example");
        let created = ours.create(&LineItem::new(1)).unwrap();

        let mut their_edit = created.clone();
        their_edit.set_qty(3.0);
        theirs.update(&their_edit).unwrap();

        let mut our_edit = created.clone();
        our_edit.set_qty(5.0);
        assert!(matches!(
            ours.update(&our_edit),
            Err(EstimateError::StaleRevision { written: 1, stored: 2, .. })
        ));

        let on_disk = load_project(&path).unwrap();
        assert_eq!(on_disk.lines[0].qty, 3.0);
        assert_eq!(on_disk.lines[0].revision, 2);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_write_refused_while_locked() {
        let path = fresh_file("locked");
        let store = ProjectFileStore::new(&path, "dana@northside.example");

        let held = FileLock::acquire(&path, "sam@northside.example").unwrap();
        let err = store.create(&LineItem::new(1)).unwrap_err();
        assert!(err.is_recoverable());
        drop(held);

        assert!(store.create(&LineItem::new(1)).is_ok());
        let _ = fs::remove_file(&path);
    }
}

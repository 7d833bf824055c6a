//! # File I/O
//!
//! Project and company settings files, with the safety a shared network
//! drive needs:
//!
//! - **Atomic saves**: write to `.tmp`, fsync, rename over the target
//! - **File locking**: an OS lock plus a `.lock` file naming the holder
//! - **Version validation**: refuse files written by an incompatible schema
//!
//! ## File Format
//!
//! Projects are `.tko` files containing pretty-printed JSON. The lock for
//! `bid.tko` is `bid.tko.lock`, itself JSON [`LockInfo`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use takeoff_core::file_io::{load_project, save_project, FileLock};
//! use takeoff_core::project::Project;
//! use std::path::Path;
//!
//! let path = Path::new("bid-25-118.tko");
//! let lock = FileLock::acquire(path, "dana@northside.example")?;
//! save_project(&Project::new("Dana", "25-118", "Riverside Clinic"), path)?;
//! drop(lock);
//!
//! let project = load_project(path)?;
//! # Ok::<(), takeoff_core::errors::EstimateError>(())
//! ```

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::errors::{EstimateError, EstimateResult};
use crate::project::{CompanySettings, Project, SCHEMA_VERSION};

/// Project file extension
pub const PROJECT_EXTENSION: &str = "tko";

/// Locks older than this are taken over regardless of holder
const STALE_LOCK_AGE_HOURS: i64 = 24;

/// Contents of a `.lock` file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockInfo {
    /// Who holds the lock (email or username)
    pub user_id: String,
    pub machine: String,
    pub pid: u32,
    pub locked_at: DateTime<Utc>,
}

impl LockInfo {
    /// Lock info for this process
    pub fn new(user_id: impl Into<String>) -> Self {
        LockInfo {
            user_id: user_id.into(),
            machine: hostname().unwrap_or_else(|| "unknown".to_string()),
            pid: std::process::id(),
            locked_at: Utc::now(),
        }
    }

    /// Held by a process that's gone, or held too long to trust.
    pub fn is_stale(&self) -> bool {
        if Utc::now() - self.locked_at > Duration::hours(STALE_LOCK_AGE_HOURS) {
            return true;
        }
        hostname().is_some_and(|ours| ours == self.machine) && !process_alive(self.pid)
    }
}

fn hostname() -> Option<String> {
    #[cfg(windows)]
    {
        std::env::var("COMPUTERNAME").ok()
    }
    #[cfg(not(windows))]
    {
        std::env::var("HOSTNAME").ok().or_else(|| std::env::var("HOST").ok())
    }
}

fn process_alive(pid: u32) -> bool {
    #[cfg(unix)]
    {
        Path::new(&format!("/proc/{}", pid)).exists()
    }
    #[cfg(windows)]
    {
        use std::process::Command;
        Command::new("tasklist")
            .args(["/FI", &format!("PID eq {}", pid), "/NH"])
            .output()
            .map(|out| String::from_utf8_lossy(&out.stdout).contains(&pid.to_string()))
            .unwrap_or(true)
    }
    #[cfg(not(any(unix, windows)))]
    {
        let _ = pid;
        true
    }
}

/// Exclusive lock on a project file, released on drop.
///
/// Holds the OS-level lock (via fs2) on the `.lock` file for the guard's
/// lifetime; the file's JSON tells other users who has the project open.
pub struct FileLock {
    project_path: PathBuf,
    lock_path: PathBuf,
    /// Keeps the OS lock alive
    _handle: File,
    pub info: LockInfo,
}

impl FileLock {
    /// Acquire the lock for `path`, taking over a stale one.
    ///
    /// Fails with [`EstimateError::FileLocked`] when someone else holds it.
    pub fn acquire(path: &Path, user_id: impl Into<String>) -> EstimateResult<Self> {
        let lock_path = lock_path_for(path);

        if let Some(holder) = Self::check(path) {
            return Err(EstimateError::file_locked(
                path.display().to_string(),
                format!("{} ({})", holder.user_id, holder.machine),
                holder.locked_at.to_rfc3339(),
            ));
        }

        let lock_display = lock_path.display().to_string();
        let mut handle = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&lock_path)
            .map_err(|e| EstimateError::file_error("create lock", &lock_display, e.to_string()))?;

        handle
            .try_lock_exclusive()
            .map_err(|_| EstimateError::file_locked(path.display().to_string(), "another process", "unknown"))?;

        let info = LockInfo::new(user_id);
        let json = serde_json::to_string_pretty(&info).map_err(EstimateError::serialization)?;
        handle
            .write_all(json.as_bytes())
            .and_then(|_| handle.sync_all())
            .map_err(|e| EstimateError::file_error("write lock", &lock_display, e.to_string()))?;

        tracing::debug!(path = %path.display(), user = %info.user_id, "project lock acquired");
        Ok(FileLock {
            project_path: path.to_path_buf(),
            lock_path,
            _handle: handle,
            info,
        })
    }

    /// Current live holder of the lock on `path`, if any.
    pub fn check(path: &Path) -> Option<LockInfo> {
        read_json::<LockInfo>(&lock_path_for(path))
            .ok()
            .filter(|info| !info.is_stale())
    }

    pub fn project_path(&self) -> &Path {
        &self.project_path
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.lock_path);
    }
}

/// `bid.tko` → `bid.tko.lock`
fn lock_path_for(project_path: &Path) -> PathBuf {
    let mut lock_path = project_path.to_path_buf();
    let extension = lock_path
        .extension()
        .map(|e| format!("{}.lock", e.to_string_lossy()))
        .unwrap_or_else(|| "lock".to_string());
    lock_path.set_extension(extension);
    lock_path
}

/// Serialize `value` as pretty JSON and atomically replace `path` with it.
pub fn write_json_atomic<T: Serialize>(value: &T, path: &Path) -> EstimateResult<()> {
    let json = serde_json::to_string_pretty(value).map_err(EstimateError::serialization)?;

    let tmp_path = path.with_extension(match path.extension() {
        Some(ext) => format!("{}.tmp", ext.to_string_lossy()),
        None => "tmp".to_string(),
    });
    let tmp_display = tmp_path.display().to_string();

    let mut tmp = File::create(&tmp_path)
        .map_err(|e| EstimateError::file_error("create temp file", &tmp_display, e.to_string()))?;
    tmp.write_all(json.as_bytes())
        .and_then(|_| tmp.sync_all())
        .map_err(|e| EstimateError::file_error("write temp file", &tmp_display, e.to_string()))?;
    drop(tmp);

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        EstimateError::file_error("rename to final", path.display().to_string(), e.to_string())
    })
}

fn read_json<T: DeserializeOwned>(path: &Path) -> EstimateResult<T> {
    let contents = fs::read_to_string(path)
        .map_err(|e| EstimateError::file_error("read", path.display().to_string(), e.to_string()))?;
    serde_json::from_str(&contents)
        .map_err(|e| EstimateError::serialization(format!("Invalid JSON in {}: {}", path.display(), e)))
}

/// Save a project atomically.
pub fn save_project(project: &Project, path: &Path) -> EstimateResult<()> {
    write_json_atomic(project, path)?;
    tracing::info!(path = %path.display(), lines = project.lines.len(), "project saved");
    Ok(())
}

/// Load a project, rejecting incompatible schema versions.
///
/// Derived fields come back exactly as stored; callers reprice before use.
pub fn load_project(path: &Path) -> EstimateResult<Project> {
    let project: Project = read_json(path)?;
    validate_version(&project.meta.version)?;
    Ok(project)
}

/// Load a project along with the live lock holder, if any (open read-only
/// when `Some`).
pub fn load_project_with_lock_check(path: &Path) -> EstimateResult<(Project, Option<LockInfo>)> {
    let project = load_project(path)?;
    Ok((project, FileLock::check(path)))
}

pub fn save_company_settings(settings: &CompanySettings, path: &Path) -> EstimateResult<()> {
    write_json_atomic(settings, path)
}

/// Load company settings; a missing file means defaults.
pub fn load_company_settings(path: &Path) -> EstimateResult<CompanySettings> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no company settings file; using defaults");
        return Ok(CompanySettings::default());
    }
    read_json(path)
}

/// Same major version required; under 0.x the file's minor may not be newer.
fn validate_version(file_version: &str) -> EstimateResult<()> {
    let parse = |v: &str| -> Vec<u32> { v.split('.').filter_map(|p| p.parse().ok()).collect() };
    let file = parse(file_version);
    let current = parse(SCHEMA_VERSION);
    let mismatch = || EstimateError::VersionMismatch {
        file_version: file_version.to_string(),
        expected_version: SCHEMA_VERSION.to_string(),
    };

    match (file.as_slice(), current.as_slice()) {
        ([], _) | (_, []) => Err(mismatch()),
        ([f_major, ..], [c_major, ..]) if f_major != c_major => Err(mismatch()),
        ([0, f_minor, ..], [0, c_minor, ..]) if f_minor > c_minor => Err(mismatch()),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line::LineItem;
    use std::env::temp_dir;

    fn temp_path(name: &str) -> PathBuf {
        temp_dir().join(format!("takeoff_io_test_{}_{}.tko", name, std::process::id()))
    }

    #[test]
    fn test_lock_path_generation() {
        let lock_path = lock_path_for(Path::new("/jobs/25-118/bid.tko"));
        assert_eq!(lock_path, Path::new("/jobs/25-118/bid.tko.lock"));
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let path = temp_path("roundtrip");
        let mut project = Project::new("Dana", "25-118", "Riverside Clinic");
        project.lines.push(LineItem::new_plate(1));
        save_project(&project, &path).unwrap();

        let loaded = load_project(&path).unwrap();
        assert_eq!(loaded.meta.job_id, "25-118");
        assert_eq!(loaded.lines, project.lines);
        assert!(!path.with_extension("tko.tmp").exists());

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_lock_acquire_conflict_and_release() {
        let path = temp_path("lock");
        File::create(&path).unwrap();

        let lock = FileLock::acquire(&path, "dana@northside.example").unwrap();
        assert!(lock_path_for(&path).exists());

        let second = FileLock::acquire(&path, "sam@northside.example");
        assert!(matches!(second, Err(EstimateError::FileLocked { .. })));

        drop(lock);
        assert!(!lock_path_for(&path).exists());
        assert!(FileLock::check(&path).is_none());

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_load_reports_live_lock_holder() {
        let path = temp_path("lock_check");
        save_project(&Project::new("Dana", "25-118", "Riverside Clinic"), &path).unwrap();

        let lock = FileLock::acquire(&path, "sam@northside.example").unwrap();
        let (project, holder) = load_project_with_lock_check(&path).unwrap();
        assert_eq!(project.meta.job_id, "25-118");
        assert_eq!(holder.map(|info| info.user_id), Some("sam@northside.example".to_string()));

        drop(lock);
        let (_, holder) = load_project_with_lock_check(&path).unwrap();
        assert!(holder.is_none());

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_stale_lock_is_taken_over() {
        let path = temp_path("stale");
        let mut info = LockInfo::new("gone@northside.example");
        info.locked_at = Utc::now() - Duration::hours(STALE_LOCK_AGE_HOURS + 1);
        write_json_atomic(&info, &lock_path_for(&path)).unwrap();

        assert!(FileLock::check(&path).is_none());
        let lock = FileLock::acquire(&path, "dana@northside.example").unwrap();
        assert_eq!(lock.info.user_id, "dana@northside.example");
        drop(lock);
    }

    #[test]
    fn test_version_validation() {
        assert!(validate_version(SCHEMA_VERSION).is_ok());
        assert!(validate_version("0.1.7").is_ok());
        assert!(validate_version("0.0.9").is_ok());
        assert!(validate_version("1.0.0").is_err());
        assert!(validate_version("0.2.0").is_err());
        assert!(validate_version("garbage").is_err());
    }

    #[test]
    fn test_company_settings_missing_file_is_default() {
        let path = temp_dir().join("takeoff_io_test_no_such_company.json");
        let _ = fs::remove_file(&path);
        assert_eq!(load_company_settings(&path).unwrap(), CompanySettings::default());

        let mut settings = CompanySettings::default();
        settings.rates.labor_rates.insert("Shop Fab".to_string(), 72.0);
        save_company_settings(&settings, &path).unwrap();
        assert_eq!(load_company_settings(&path).unwrap(), settings);
        let _ = fs::remove_file(&path);
    }
}

//! # File I/O Module
//!
//! Project persistence for `.qdr` files:
//! - **Atomic saves**: write `.qdr.tmp`, fsync, rename over the target
//! - **File locking**: OS advisory lock plus a `.qdr.lock` file naming the holder
//! - **Version validation**: refuse files written by an incompatible schema
//!
//! ## Example
//!
//! ```rust,no_run
//! use quadro_core::file_io::{save_project, FileLock};
//! use quadro_core::project::Project;
//! use std::path::Path;
//!
//! let project = Project::new("Engineer", "25-001", "Client");
//! let path = Path::new("house.qdr");
//!
//! let lock = FileLock::acquire(path, "engineer@company.com").unwrap();
//! save_project(&project, path).unwrap();
//! drop(lock);
//! ```

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::errors::{CalcError, CalcResult};
use crate::project::{Project, SCHEMA_VERSION};

/// Project file extension
pub const PROJECT_EXTENSION: &str = "qdr";

/// Locks older than this are taken over regardless of the holder
pub const STALE_LOCK_HOURS: i64 = 24;

/// Holder metadata stored in `.qdr.lock` files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockInfo {
    /// User identifier (email or username)
    pub user_id: String,
    /// Machine where the lock was acquired
    pub machine: String,
    /// Holding process
    pub pid: u32,
    pub locked_at: DateTime<Utc>,
}

impl LockInfo {
    /// Lock info for the current process
    pub fn new(user_id: impl Into<String>) -> Self {
        LockInfo {
            user_id: user_id.into(),
            machine: hostname().unwrap_or_else(|| "unknown".to_string()),
            pid: std::process::id(),
            locked_at: Utc::now(),
        }
    }

    /// Whether the holder is gone or the lock is too old to trust.
    pub fn is_stale(&self) -> bool {
        if Utc::now() - self.locked_at > Duration::hours(STALE_LOCK_HOURS) {
            return true;
        }
        match hostname() {
            Some(ours) if ours == self.machine => !process_alive(self.pid),
            _ => false,
        }
    }

    /// "user (machine)"
    pub fn holder(&self) -> String {
        format!("{} ({})", self.user_id, self.machine)
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

#[cfg(target_os = "linux")]
fn process_alive(pid: u32) -> bool {
    Path::new("/proc").join(pid.to_string()).exists()
}

#[cfg(windows)]
fn process_alive(pid: u32) -> bool {
    use std::process::Command;
    match Command::new("tasklist")
        .args(["/FI", &format!("PID eq {pid}"), "/NH"])
        .output()
    {
        Ok(output) => String::from_utf8_lossy(&output.stdout).contains(&pid.to_string()),
        Err(_) => true,
    }
}

// Without a cheap liveness probe only the age rule applies
#[cfg(not(any(target_os = "linux", windows)))]
fn process_alive(_pid: u32) -> bool {
    true
}

fn io_error(operation: &str, path: &Path) -> impl FnOnce(std::io::Error) -> CalcError {
    let operation = operation.to_string();
    let path = path.display().to_string();
    move |e| CalcError::file_error(operation, path, e.to_string())
}

fn serialization_error(e: serde_json::Error) -> CalcError {
    CalcError::SerializationError { reason: e.to_string() }
}

/// Exclusive lock on a project file, released on drop.
///
/// Holds an OS-level lock (fs2) on the `.qdr.lock` file, whose contents name
/// the holder for other users.
#[derive(Debug)]
pub struct FileLock {
    project_path: PathBuf,
    lock_path: PathBuf,
    _handle: File,
    /// Holder metadata written to the lock file
    pub info: LockInfo,
}

impl FileLock {
    /// Acquire an exclusive lock on a project file.
    ///
    /// A stale lock (dead holder on this machine, or older than
    /// [`STALE_LOCK_HOURS`]) is taken over.
    ///
    /// # Returns
    ///
    /// * `Ok(FileLock)` - Lock acquired
    /// * `Err(CalcError::FileLocked)` - Another live holder has the lock
    /// * `Err(CalcError::FileError)` - The lock file could not be written
    pub fn acquire(path: &Path, user_id: impl Into<String>) -> CalcResult<Self> {
        let lock_path = lock_path_for(path);

        if let Some(existing) = read_lock_info(&lock_path) {
            if !existing.is_stale() {
                return Err(CalcError::file_locked(
                    path.display().to_string(),
                    existing.holder(),
                    existing.locked_at.to_rfc3339(),
                ));
            }
            warn!(
                path = %path.display(),
                holder = %existing.holder(),
                locked_at = %existing.locked_at,
                "taking over stale lock"
            );
        }

        let mut handle = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(io_error("create lock", &lock_path))?;

        // Only the holder of the OS lock may rewrite the holder metadata
        handle.try_lock_exclusive().map_err(|_| {
            CalcError::file_locked(path.display().to_string(), "another process", "unknown")
        })?;
        handle.set_len(0).map_err(io_error("truncate lock", &lock_path))?;

        let info = LockInfo::new(user_id);
        let json = serde_json::to_string_pretty(&info).map_err(serialization_error)?;
        handle
            .write_all(json.as_bytes())
            .map_err(io_error("write lock", &lock_path))?;
        handle.sync_all().map_err(io_error("sync lock", &lock_path))?;

        debug!(path = %path.display(), user = %info.user_id, "lock acquired");
        Ok(FileLock {
            project_path: path.to_path_buf(),
            lock_path,
            _handle: handle,
            info,
        })
    }

    /// Current live holder of a project file, if any.
    pub fn check(path: &Path) -> Option<LockInfo> {
        read_lock_info(&lock_path_for(path)).filter(|info| !info.is_stale())
    }

    /// Path of the locked project file
    pub fn project_path(&self) -> &Path {
        &self.project_path
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.lock_path);
    }
}

/// `house.qdr` → `house.qdr.lock`
fn lock_path_for(project_path: &Path) -> PathBuf {
    with_suffix(project_path, "lock")
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let extension = match path.extension() {
        Some(ext) => format!("{}.{suffix}", ext.to_string_lossy()),
        None => suffix.to_string(),
    };
    path.with_extension(extension)
}

/// Unreadable or malformed lock files count as absent.
fn read_lock_info(lock_path: &Path) -> Option<LockInfo> {
    let contents = fs::read_to_string(lock_path).ok()?;
    serde_json::from_str(&contents).ok()
}

/// Save a project with atomic write semantics.
///
/// Serializes to `<path>.tmp`, syncs it to disk, then renames it over `path`,
/// so an interrupted save never leaves a truncated project behind.
pub fn save_project(project: &Project, path: &Path) -> CalcResult<()> {
    let json = serde_json::to_string_pretty(project).map_err(serialization_error)?;
    let tmp_path = with_suffix(path, "tmp");

    let mut tmp = File::create(&tmp_path).map_err(io_error("create temp file", &tmp_path))?;
    tmp.write_all(json.as_bytes())
        .map_err(io_error("write temp file", &tmp_path))?;
    tmp.sync_all().map_err(io_error("sync temp file", &tmp_path))?;
    drop(tmp);

    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(io_error("rename to final", path)(e));
    }

    info!(
        path = %path.display(),
        rooms = project.rooms.len(),
        circuits = project.circuits.len(),
        "project saved"
    );
    Ok(())
}

/// Load a project and check its schema version.
///
/// # Returns
///
/// * `Ok(Project)` - Loaded project
/// * `Err(CalcError::VersionMismatch)` - Written by an incompatible schema
/// * `Err(CalcError::SerializationError)` - Not a valid project document
/// * `Err(CalcError::FileError)` - I/O error
pub fn load_project(path: &Path) -> CalcResult<Project> {
    let contents = fs::read_to_string(path).map_err(io_error("read", path))?;
    let project: Project = serde_json::from_str(&contents).map_err(|e| CalcError::SerializationError {
        reason: format!("Invalid project file {}: {}", path.display(), e),
    })?;
    validate_version(&project.meta.version)?;

    info!(
        path = %path.display(),
        version = %project.meta.version,
        rooms = project.rooms.len(),
        circuits = project.circuits.len(),
        "project loaded"
    );
    Ok(project)
}

/// Load a project along with the current lock holder, if any.
///
/// A caller that finds a holder should treat the project as read-only.
pub fn load_project_with_lock_check(path: &Path) -> CalcResult<(Project, Option<LockInfo>)> {
    let project = load_project(path)?;
    Ok((project, FileLock::check(path)))
}

/// Lock, load, modify and atomically save a project.
///
/// The lock is held for the whole read-modify-write cycle and released
/// afterwards. Nothing is written when `edit` fails.
pub fn update_project<T>(
    path: &Path,
    user_id: impl Into<String>,
    edit: impl FnOnce(&mut Project) -> CalcResult<T>,
) -> CalcResult<T> {
    let _lock = FileLock::acquire(path, user_id)?;
    let mut project = load_project(path)?;
    let out = edit(&mut project)?;
    save_project(&project, path)?;
    Ok(out)
}

fn parse_version(version: &str) -> Option<(u32, u32)> {
    let mut parts = version.split('.').map(|p| p.parse::<u32>().ok());
    let major = parts.next()??;
    let minor = parts.next().flatten().unwrap_or(0);
    Some((major, minor))
}

/// Majors must match; within 0.x a file from a newer minor is rejected.
fn validate_version(file_version: &str) -> CalcResult<()> {
    let mismatch = || CalcError::VersionMismatch {
        file_version: file_version.to_string(),
        expected_version: SCHEMA_VERSION.to_string(),
    };
    let (file_major, file_minor) = parse_version(file_version).ok_or_else(mismatch)?;
    let (major, minor) = parse_version(SCHEMA_VERSION).ok_or_else(mismatch)?;

    if file_major != major || (major == 0 && file_minor > minor) {
        return Err(mismatch());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculations::dimensioning::CircuitInput;
    use crate::calculations::room_load::{RoomCategory, RoomInput};
    use std::env::temp_dir;

    fn temp_project_path(name: &str) -> PathBuf {
        temp_dir().join(format!("quadro_test_{}_{}.qdr", name, std::process::id()))
    }

    #[test]
    fn test_sidecar_paths() {
        let project_path = Path::new("/path/to/house.qdr");
        assert_eq!(lock_path_for(project_path), Path::new("/path/to/house.qdr.lock"));
        assert_eq!(with_suffix(project_path, "tmp"), Path::new("/path/to/house.qdr.tmp"));
        assert_eq!(lock_path_for(Path::new("house")), Path::new("house.lock"));
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let path = temp_project_path("roundtrip");

        let mut project = Project::new("Test Engineer", "TEST-001", "Test Client");
        project
            .add_room(RoomInput {
                name: "Kitchen".into(),
                area_m2: 12.0,
                perimeter_m: 14.0,
                category: RoomCategory::Wet,
                appliance_va: 4400.0,
            })
            .unwrap();
        project.add_circuit(CircuitInput::new(1500.0, 220.0));
        project.dimension_circuits();
        save_project(&project, &path).unwrap();

        let loaded = load_project(&path).unwrap();
        assert_eq!(loaded.meta.job_id, "TEST-001");
        assert_eq!(loaded.rooms, project.rooms);
        assert_eq!(loaded.circuits, project.circuits);
        assert!(loaded.circuits[0].result().is_some());

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_atomic_save_leaves_no_tmp_file() {
        let path = temp_project_path("atomic");
        save_project(&Project::new("Test", "TEST", "Client"), &path).unwrap();

        assert!(!with_suffix(&path, "tmp").exists());
        assert!(path.exists());

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_load_rejects_garbage() {
        let path = temp_project_path("garbage");
        fs::write(&path, "{ not json").unwrap();
        let err = load_project(&path).unwrap_err();
        assert_eq!(err.error_code(), "SERIALIZATION_ERROR");
        let _ = fs::remove_file(&path);

        let missing = load_project(&temp_project_path("missing")).unwrap_err();
        assert_eq!(missing.error_code(), "FILE_ERROR");
    }

    #[test]
    fn test_lock_acquire_and_release() {
        let path = temp_project_path("lock");
        File::create(&path).unwrap();

        let lock = FileLock::acquire(&path, "test@example.com").unwrap();
        assert_eq!(lock.info.user_id, "test@example.com");
        assert_eq!(lock.project_path(), path.as_path());

        let lock_path = lock_path_for(&path);
        assert!(lock_path.exists());
        assert_eq!(FileLock::check(&path).map(|i| i.user_id), Some("test@example.com".into()));

        let second = FileLock::acquire(&path, "other@example.com").unwrap_err();
        assert_eq!(second.error_code(), "FILE_LOCKED");

        drop(lock);
        assert!(!lock_path.exists());
        assert!(FileLock::check(&path).is_none());

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_stale_lock_taken_over() {
        let path = temp_project_path("stale");
        File::create(&path).unwrap();

        let mut old = LockInfo::new("gone@example.com");
        old.locked_at = Utc::now() - Duration::hours(STALE_LOCK_HOURS + 1);
        assert!(old.is_stale());
        fs::write(lock_path_for(&path), serde_json::to_string(&old).unwrap()).unwrap();

        assert!(FileLock::check(&path).is_none());
        let lock = FileLock::acquire(&path, "me@example.com").unwrap();
        assert_eq!(lock.info.user_id, "me@example.com");
        drop(lock);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_losing_acquirer_leaves_lock_file_intact() {
        let path = temp_project_path("contended");
        File::create(&path).unwrap();
        let lock_path = lock_path_for(&path);

        let held = FileLock::acquire(&path, "first@example.com").unwrap();
        // Metadata that looks stale while the OS lock is still held
        let mut aged = held.info.clone();
        aged.locked_at = Utc::now() - Duration::hours(STALE_LOCK_HOURS + 1);
        let aged_json = serde_json::to_string(&aged).unwrap();
        fs::write(&lock_path, &aged_json).unwrap();

        let err = FileLock::acquire(&path, "second@example.com").unwrap_err();
        assert_eq!(err.error_code(), "FILE_LOCKED");
        assert_eq!(fs::read_to_string(&lock_path).unwrap(), aged_json);

        drop(held);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_update_project_saves_changes() {
        let path = temp_project_path("update");
        save_project(&Project::new("Test", "TEST", "Client"), &path).unwrap();

        let id = update_project(&path, "tester", |p| Ok(p.add_circuit(CircuitInput::new(800.0, 127.0)))).unwrap();
        let loaded = load_project(&path).unwrap();
        assert!(loaded.get_circuit(&id).is_some());
        assert!(!lock_path_for(&path).exists());

        let failed: CalcResult<()> = update_project(&path, "tester", |p| {
            p.circuits.clear();
            Err(CalcError::field("circuits", "rejected"))
        });
        assert!(failed.is_err());
        assert_eq!(load_project(&path).unwrap().circuits.len(), 1);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_version_validation() {
        assert!(validate_version(SCHEMA_VERSION).is_ok());
        assert!(validate_version("0.1.5").is_ok());
        assert!(validate_version("0.0.9").is_ok());
        assert!(validate_version("1.0.0").is_err());
        assert!(validate_version("0.2.0").is_err());
        assert!(validate_version("garbage").is_err());
    }

    #[test]
    fn test_load_with_lock_check() {
        let path = temp_project_path("lock_check");
        save_project(&Project::new("Test", "TEST", "Client"), &path).unwrap();

        let (loaded, holder) = load_project_with_lock_check(&path).unwrap();
        assert_eq!(loaded.meta.job_id, "TEST");
        assert!(holder.is_none());

        let _ = fs::remove_file(&path);
    }
}

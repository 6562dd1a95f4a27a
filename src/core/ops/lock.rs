//! core::ops::lock
//!
//! File-based mutual exclusion over a named resource.
//!
//! # Architecture
//!
//! Every writer of shared metadata (the staging log, a branch's commit
//! chain, the branch pointers) wraps its read-modify-write cycle in a
//! [`ResourceLock`] keyed to the file it mutates. The lock is a marker
//! file named `<resource>.lock`, created with exclusive-create semantics.
//! A contended acquirer polls at [`POLL_INTERVAL`] until the marker can
//! be created or the timeout elapses, then fails with
//! [`LockError::Timeout`].
//!
//! # Storage
//!
//! - `<resource>.lock` - Marker file containing the holder's pid
//!
//! # Invariants
//!
//! - The marker exists exactly while some process holds the lock
//! - The lock is released on drop (RAII), including early error returns
//! - Release is idempotent
//! - No reentrancy: acquiring the same resource twice from one process
//!   blocks until the timeout
//!
//! # Stale markers
//!
//! While held, the marker also carries an OS advisory lock (`fs2`). The
//! advisory lock dies with its process, so a waiter that can take it on
//! an existing marker older than [`STALE_GRACE`] knows the holder crashed
//! and reclaims the marker.
//!
//! # Example
//!
//! ```ignore
//! use sheaf::core::ops::lock::{with_lock, DEFAULT_LOCK_TIMEOUT};
//!
//! with_lock(&log_path, DEFAULT_LOCK_TIMEOUT, || {
//!     // read, modify and write log_path
//!     Ok::<_, RepoError>(())
//! })?;
//! ```

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant, SystemTime};

use fs2::FileExt;
use log::{debug, warn};
use thiserror::Error;

/// How long an acquirer waits before giving up.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// Delay between acquisition attempts.
pub const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Minimum age before an unowned marker is considered stale.
pub const STALE_GRACE: Duration = Duration::from_secs(1);

/// Errors from locking operations.
#[derive(Debug, Error)]
pub enum LockError {
    /// The lock could not be acquired before the timeout.
    #[error("timed out after {waited:?} waiting for lock on {}", .resource.display())]
    Timeout {
        /// The resource that was being locked.
        resource: PathBuf,
        /// How long the caller waited.
        waited: Duration,
    },

    /// Failed to create the marker file.
    #[error("failed to create lock: {0}")]
    CreateFailed(String),

    /// Failed to delete the marker file.
    #[error("failed to release lock: {0}")]
    ReleaseFailed(String),
}

/// An exclusive lock on one resource file.
///
/// The lock is released when this guard is dropped.
///
/// # Example
///
/// ```ignore
/// let lock = ResourceLock::acquire(&commits_path, DEFAULT_LOCK_TIMEOUT)?;
/// assert!(lock.is_held());
/// // marker removed when `lock` goes out of scope
/// ```
#[derive(Debug)]
pub struct ResourceLock {
    /// Path to the marker file.
    path: PathBuf,
    /// Open handle carrying the advisory lock. Some while held.
    file: Option<File>,
}

impl ResourceLock {
    /// The marker path guarding `resource`.
    pub fn marker_path(resource: &Path) -> PathBuf {
        let mut name = resource
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".lock");
        resource.with_file_name(name)
    }

    /// Acquire the lock on `resource`, polling until `timeout` elapses.
    ///
    /// # Errors
    ///
    /// - [`LockError::Timeout`] if another holder kept the lock for the whole wait
    /// - [`LockError::CreateFailed`] if the marker cannot be created for any
    ///   reason other than contention (for example a missing parent directory)
    pub fn acquire(resource: &Path, timeout: Duration) -> Result<Self, LockError> {
        let start = Instant::now();
        debug!("acquiring lock on {}", resource.display());

        loop {
            if let Some(lock) = Self::try_acquire(resource)? {
                debug!("lock acquired: {}", lock.path.display());
                return Ok(lock);
            }

            let waited = start.elapsed();
            if waited >= timeout {
                debug!("lock acquisition timed out: {}", resource.display());
                return Err(LockError::Timeout {
                    resource: resource.to_path_buf(),
                    waited,
                });
            }
            thread::sleep(POLL_INTERVAL);
        }
    }

    /// Make a single acquisition attempt, returning `None` if the lock is held.
    pub fn try_acquire(resource: &Path) -> Result<Option<Self>, LockError> {
        let path = Self::marker_path(resource);

        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => Ok(Self::claim(path, file)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                Self::reclaim_if_stale(&path);
                Ok(None)
            }
            Err(e) => Err(LockError::CreateFailed(format!(
                "cannot create {}: {}",
                path.display(),
                e
            ))),
        }
    }

    /// Take the advisory lock on a marker this process just created.
    ///
    /// A waiter checking the marker for staleness holds the advisory lock
    /// for a moment. Losing that race withdraws the marker so the caller
    /// polls again rather than holding a marker without its advisory lock.
    fn claim(path: PathBuf, mut file: File) -> Option<Self> {
        if let Err(e) = file.try_lock_exclusive() {
            if e.kind() == fs2::lock_contended_error().kind() {
                debug!("marker {} inspected by a waiter, retrying", path.display());
                drop(file);
                if let Err(e) = fs::remove_file(&path) {
                    debug!("cannot withdraw marker {}: {}", path.display(), e);
                }
                return None;
            }
            // Unsupported here, so no waiter can take it either.
            debug!("advisory lock unavailable on {}: {}", path.display(), e);
        }
        if let Err(e) = write!(file, "{}", std::process::id()) {
            debug!("cannot record pid in {}: {}", path.display(), e);
        }
        Some(Self {
            path,
            file: Some(file),
        })
    }

    /// Remove a marker left behind by a process that no longer exists.
    fn reclaim_if_stale(path: &Path) {
        let file = match OpenOptions::new().read(true).write(true).open(path) {
            Ok(file) => file,
            Err(_) => return,
        };

        if file.try_lock_exclusive().is_err() {
            return;
        }

        let age = file
            .metadata()
            .and_then(|m| m.modified())
            .ok()
            .and_then(|modified| SystemTime::now().duration_since(modified).ok())
            .unwrap_or_default();

        if age >= STALE_GRACE && same_file(&file, path) {
            warn!(
                "removing stale lock {} (age {:?}, holder gone)",
                path.display(),
                age
            );
            let _ = fs::remove_file(path);
        }
        let _ = file.unlock();
    }

    /// Check if this guard still holds the lock.
    pub fn is_held(&self) -> bool {
        self.file.is_some()
    }

    /// Get the path to the marker file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release the lock explicitly.
    ///
    /// Called automatically on drop. Calling it again is a no-op.
    pub fn release(&mut self) -> Result<(), LockError> {
        let Some(file) = self.file.take() else {
            return Ok(());
        };

        // The marker goes first so no waiter can mistake it for stale.
        let removed = match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(LockError::ReleaseFailed(format!(
                "cannot remove {}: {}",
                self.path.display(),
                e
            ))),
        };
        let _ = file.unlock();
        debug!("lock released: {}", self.path.display());
        removed
    }
}

impl Drop for ResourceLock {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            warn!("{}", e);
        }
    }
}

/// Run `f` while holding the lock on `resource`.
///
/// The lock is released on every exit path, including when `f` fails.
pub fn with_lock<T, E, F>(resource: &Path, timeout: Duration, f: F) -> Result<T, E>
where
    F: FnOnce() -> Result<T, E>,
    E: From<LockError>,
{
    let _lock = ResourceLock::acquire(resource, timeout)?;
    f()
}

#[cfg(unix)]
fn same_file(file: &File, path: &Path) -> bool {
    use std::os::unix::fs::MetadataExt;

    match (file.metadata(), fs::metadata(path)) {
        (Ok(a), Ok(b)) => a.dev() == b.dev() && a.ino() == b.ino(),
        _ => false,
    }
}

#[cfg(not(unix))]
fn same_file(_file: &File, path: &Path) -> bool {
    path.exists()
}

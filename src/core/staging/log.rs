//! core::staging::log
//!
//! The ordered record of pending operations.
//!
//! # Storage
//!
//! - `staging/logs.json` - JSON array of [`StagingEntry`] in staging order
//!
//! # Invariants
//!
//! - At most one entry per path
//! - Every mutation is a read-modify-write under the lock on `logs.json`
//! - Reads take no lock; a reader racing a writer sees either the old or
//!   the new array because writes are atomic renames

use std::time::Duration;

use log::{debug, warn};

use crate::core::error::{RepoError, Result};
use crate::core::metadata::{self, StagingEntry};
use crate::core::ops::lock::with_lock;
use crate::core::paths::SheafPaths;
use crate::core::types::{EntryId, Op, RepoPath};

/// Which operations a [`StagingLog::lookup`] should match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpFilter {
    /// Any operation.
    Any,
    /// Only the given operation.
    Only(Op),
}

impl OpFilter {
    fn matches(self, op: Op) -> bool {
        match self {
            OpFilter::Any => true,
            OpFilter::Only(wanted) => wanted == op,
        }
    }
}

/// Handle on the repository's staging log.
#[derive(Debug, Clone)]
pub struct StagingLog {
    paths: SheafPaths,
    lock_timeout: Duration,
}

impl StagingLog {
    pub fn new(paths: SheafPaths, lock_timeout: Duration) -> Self {
        Self {
            paths,
            lock_timeout,
        }
    }

    fn log_path(&self) -> std::path::PathBuf {
        self.paths.staging_log_path()
    }

    /// All entries in staging order.
    pub fn entries(&self) -> Result<Vec<StagingEntry>> {
        Ok(metadata::read_json_or_default(&self.log_path())?)
    }

    /// The entry staged for `path`, if its operation passes `filter`.
    pub fn lookup(&self, filter: OpFilter, path: &RepoPath) -> Result<Option<StagingEntry>> {
        Ok(self
            .entries()?
            .into_iter()
            .find(|e| &e.path == path && filter.matches(e.op)))
    }

    /// Whether nothing is staged.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.entries()?.is_empty())
    }

    /// Add an entry to the end of the log.
    ///
    /// # Errors
    ///
    /// Returns `RepoError::AlreadyStaged` if another entry already holds
    /// the path, which only happens when two stagers race on one file.
    pub fn append(&self, entry: StagingEntry) -> Result<()> {
        let log_path = self.log_path();
        with_lock(&log_path, self.lock_timeout, || {
            let mut entries: Vec<StagingEntry> = metadata::read_json_or_default(&log_path)?;
            if entries.iter().any(|e| e.path == entry.path) {
                return Err(RepoError::AlreadyStaged(entry.path.clone()));
            }
            debug!("staging log: append {} {} ({})", entry.op, entry.path, entry.id);
            entries.push(entry);
            metadata::write_json_atomic(&log_path, &entries)?;
            Ok(())
        })
    }

    /// Delete the entry with `id`. Returns whether it was present.
    pub fn remove(&self, id: &EntryId) -> Result<bool> {
        let log_path = self.log_path();
        with_lock(&log_path, self.lock_timeout, || {
            let mut entries: Vec<StagingEntry> = metadata::read_json_or_default(&log_path)?;
            let before = entries.len();
            entries.retain(|e| &e.id != id);
            if entries.len() == before {
                return Ok(false);
            }
            debug!("staging log: remove {}", id);
            metadata::write_json_atomic(&log_path, &entries)?;
            Ok(true)
        })
    }

    /// Clear the whole log.
    pub fn truncate(&self) -> Result<()> {
        let log_path = self.log_path();
        with_lock(&log_path, self.lock_timeout, || {
            debug!("staging log: truncate");
            metadata::write_json_atomic(&log_path, &Vec::<StagingEntry>::new())?;
            Ok(())
        })
    }

    /// Delete every entry whose id is in `ids`. Entries appended since the
    /// caller read the log are kept. Returns how many were removed.
    pub fn remove_all(&self, ids: &[EntryId]) -> Result<usize> {
        let log_path = self.log_path();
        with_lock(&log_path, self.lock_timeout, || {
            let mut entries: Vec<StagingEntry> = metadata::read_json_or_default(&log_path)?;
            let before = entries.len();
            entries.retain(|e| !ids.contains(&e.id));
            let removed = before - entries.len();
            if removed > 0 {
                debug!("staging log: remove {} entries", removed);
                metadata::write_json_atomic(&log_path, &entries)?;
            }
            Ok(removed)
        })
    }

    /// Drop entries whose staged copy is missing from disk.
    ///
    /// Returns the dropped entries.
    pub fn reconcile_integrity(&self) -> Result<Vec<StagingEntry>> {
        let log_path = self.log_path();
        with_lock(&log_path, self.lock_timeout, || {
            let entries: Vec<StagingEntry> = metadata::read_json_or_default(&log_path)?;
            let (kept, orphaned): (Vec<_>, Vec<_>) = entries.into_iter().partition(|e| {
                self.paths
                    .staged_copy_path(e.op, &e.id, &e.path)
                    .is_file()
            });

            if !orphaned.is_empty() {
                for entry in &orphaned {
                    warn!(
                        "dropping orphaned staging entry {} {} ({}): staged copy missing",
                        entry.op, entry.path, entry.id
                    );
                }
                metadata::write_json_atomic(&log_path, &kept)?;
            }
            Ok(orphaned)
        })
    }
}

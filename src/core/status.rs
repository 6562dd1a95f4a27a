//! core::status
//!
//! Comparing the working tree against the staging log and the latest
//! commit.
//!
//! # Categories
//!
//! - **staged**: every staging log entry
//! - **modified** / **deleted**: committed paths whose working file differs
//!   from (or is missing relative to) the committed bytes and that have no
//!   staging entry
//! - **untracked**: non-ignored working files that are neither staged nor
//!   committed
//!
//! [`tracked_drift`] is also the uncommitted-changes guard used before a
//! branch checkout.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::core::error::{RepoError, Result};
use crate::core::ignore::IgnoreMatcher;
use crate::core::metadata::StagingEntry;
use crate::core::paths::{SheafPaths, SHEAF_DIR};
use crate::core::snapshot::FileList;
use crate::core::staging::StagingLog;
use crate::core::store::ContentStore;
use crate::core::types::{BranchName, RepoPath};

/// How a committed path differs from its working file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Drift {
    Modified,
    Deleted,
}

/// Committed paths whose working file no longer matches, sorted by path.
pub fn tracked_drift(
    paths: &SheafPaths,
    store: &dyn ContentStore,
    snapshot: &FileList,
) -> Result<Vec<(RepoPath, Drift)>> {
    let mut drift = Vec::new();
    for entry in snapshot.sorted() {
        let working = paths.working_path(&entry.path);
        if !working.is_file() {
            drift.push((entry.path, Drift::Deleted));
        } else if store.differs(&working, &FileList::content_path(paths, &entry))? {
            drift.push((entry.path, Drift::Modified));
        }
    }
    Ok(drift)
}

/// Every non-ignored regular file in the working tree, sorted.
///
/// `.sheaf/` is never entered and ignored directories are pruned whole.
pub fn working_files(paths: &SheafPaths, ignore: &dyn IgnoreMatcher) -> Result<Vec<RepoPath>> {
    let mut files = Vec::new();
    walk(&paths.work_dir, &paths.work_dir, ignore, &mut files)?;
    files.sort();
    Ok(files)
}

fn walk(
    root: &Path,
    dir: &Path,
    ignore: &dyn IgnoreMatcher,
    files: &mut Vec<RepoPath>,
) -> Result<()> {
    let read_dir = match fs::read_dir(dir) {
        Ok(rd) => rd,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(RepoError::io(dir, e)),
    };

    for entry in read_dir {
        let entry = entry.map_err(|e| RepoError::io(dir, e))?;
        let path = entry.path();
        if dir == root && entry.file_name() == SHEAF_DIR {
            continue;
        }
        let meta = fs::symlink_metadata(&path).map_err(|e| RepoError::io(&path, e))?;
        let Ok(relative) = path.strip_prefix(root) else {
            continue;
        };
        let parts: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        let Ok(repo_path) = RepoPath::new(parts.join("/")) else {
            continue;
        };

        if meta.is_dir() {
            if !ignore.is_ignored(&repo_path, true) {
                walk(root, &path, ignore, files)?;
            }
        } else if meta.is_file() && !ignore.is_ignored(&repo_path, false) {
            files.push(repo_path);
        }
    }
    Ok(())
}

/// Snapshot of the working state of one branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub branch: BranchName,
    /// Sorted ADD, MOD, REM, then by path.
    pub staged: Vec<StagingEntry>,
    pub modified: Vec<RepoPath>,
    pub deleted: Vec<RepoPath>,
    pub untracked: Vec<RepoPath>,
}

impl Status {
    /// Gather the status of `branch` whose tail snapshot is `snapshot`.
    pub fn collect(
        paths: &SheafPaths,
        store: &dyn ContentStore,
        log: &StagingLog,
        snapshot: &FileList,
        ignore: &dyn IgnoreMatcher,
        branch: BranchName,
    ) -> Result<Self> {
        let mut staged = log.entries()?;
        staged.sort_by(|a, b| a.op.cmp(&b.op).then_with(|| a.path.cmp(&b.path)));
        let is_staged = |path: &RepoPath| staged.iter().any(|e| &e.path == path);

        let mut modified = Vec::new();
        let mut deleted = Vec::new();
        for (path, drift) in tracked_drift(paths, store, snapshot)? {
            if is_staged(&path) {
                continue;
            }
            match drift {
                Drift::Modified => modified.push(path),
                Drift::Deleted => deleted.push(path),
            }
        }

        let untracked = working_files(paths, ignore)?
            .into_iter()
            .filter(|path| !is_staged(path) && !snapshot.contains(path))
            .collect();

        Ok(Self {
            branch,
            staged,
            modified,
            deleted,
            untracked,
        })
    }

    pub fn is_clean(&self) -> bool {
        self.staged.is_empty()
            && self.modified.is_empty()
            && self.deleted.is_empty()
            && self.untracked.is_empty()
    }
}

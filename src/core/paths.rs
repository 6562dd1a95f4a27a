//! core::paths
//!
//! Centralized path routing for sheaf storage locations.
//!
//! # Architecture
//!
//! Every location under the repository dot-directory is computed here.
//! No code outside this module should join `".sheaf"`, `"staging"`,
//! `"commits"` or `"branches"` onto a path by hand.
//!
//! # Storage Layout
//!
//! ```text
//! <work_dir>/.sheaf/
//!   config.json
//!   staging/
//!     logs.json
//!     added/<id>/<file name>
//!     modified/<id>/<file name>
//!     removed/<id>/<file name>
//!   commits/<commit id>/
//!     <file id>/<file name>
//!     fileList.json
//!     metadata.json
//!     logs.json
//!   branches/
//!     metadata.json
//!     <branch name>/commits.json
//! ```
//!
//! # Example
//!
//! ```
//! use sheaf::core::paths::SheafPaths;
//! use std::path::PathBuf;
//!
//! let paths = SheafPaths::new(PathBuf::from("/work"));
//! assert_eq!(
//!     paths.staging_log_path(),
//!     PathBuf::from("/work/.sheaf/staging/logs.json")
//! );
//! ```

use std::path::{Component, Path, PathBuf};

use crate::core::types::{BranchName, CommitId, EntryId, Op, RepoPath, TypeError};

/// Name of the repository dot-directory.
pub const SHEAF_DIR: &str = ".sheaf";

/// Centralized path routing for sheaf storage.
///
/// # Invariants
///
/// - `work_dir` is the working-tree root (the parent of `.sheaf/`)
/// - All repository metadata lives under `root()`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheafPaths {
    /// The working-tree root.
    pub work_dir: PathBuf,
}

impl SheafPaths {
    /// Create paths for a working tree rooted at `work_dir`.
    pub fn new(work_dir: PathBuf) -> Self {
        Self { work_dir }
    }

    /// Walk upwards from `start` looking for a directory containing `.sheaf/`.
    ///
    /// Returns `None` if no ancestor is a sheaf working tree.
    pub fn discover(start: &Path) -> Option<Self> {
        let mut current = Some(start);
        while let Some(dir) = current {
            if dir.join(SHEAF_DIR).is_dir() {
                return Some(Self::new(dir.to_path_buf()));
            }
            current = dir.parent();
        }
        None
    }

    // =========================================================================
    // Repository root
    // =========================================================================

    /// The `.sheaf` directory.
    pub fn root(&self) -> PathBuf {
        self.work_dir.join(SHEAF_DIR)
    }

    /// Whether `.sheaf/` exists.
    pub fn is_initialized(&self) -> bool {
        self.root().is_dir()
    }

    /// The repository configuration file.
    pub fn config_path(&self) -> PathBuf {
        self.root().join("config.json")
    }

    // =========================================================================
    // Staging area
    // =========================================================================

    /// The staging directory.
    pub fn staging_dir(&self) -> PathBuf {
        self.root().join("staging")
    }

    /// The staging log (`staging/logs.json`).
    pub fn staging_log_path(&self) -> PathBuf {
        self.staging_dir().join("logs.json")
    }

    /// Directory holding staged copies for one operation kind.
    pub fn staging_op_dir(&self, op: Op) -> PathBuf {
        self.staging_dir().join(op.staging_dir())
    }

    /// Directory holding the staged copy of a single entry.
    pub fn staged_copy_dir(&self, op: Op, id: &EntryId) -> PathBuf {
        self.staging_op_dir(op).join(id.as_str())
    }

    /// Location of the staged copy of `path` under entry `id`.
    pub fn staged_copy_path(&self, op: Op, id: &EntryId, path: &RepoPath) -> PathBuf {
        self.staged_copy_dir(op, id).join(path.file_name())
    }

    // =========================================================================
    // Commits
    // =========================================================================

    /// The commits directory.
    pub fn commits_dir(&self) -> PathBuf {
        self.root().join("commits")
    }

    /// The permanent area of a single commit.
    pub fn commit_dir(&self, commit: &CommitId) -> PathBuf {
        self.commits_dir().join(commit.as_str())
    }

    /// Location of a committed file copy.
    pub fn committed_copy_path(
        &self,
        commit: &CommitId,
        file_id: &EntryId,
        path: &RepoPath,
    ) -> PathBuf {
        self.commit_dir(commit)
            .join(file_id.as_str())
            .join(path.file_name())
    }

    /// The file-list snapshot of a commit.
    pub fn file_list_path(&self, commit: &CommitId) -> PathBuf {
        self.commit_dir(commit).join("fileList.json")
    }

    /// The author/message record of a commit.
    pub fn commit_metadata_path(&self, commit: &CommitId) -> PathBuf {
        self.commit_dir(commit).join("metadata.json")
    }

    /// The audit copy of the staging log taken at commit time.
    pub fn commit_log_path(&self, commit: &CommitId) -> PathBuf {
        self.commit_dir(commit).join("logs.json")
    }

    // =========================================================================
    // Branches
    // =========================================================================

    /// The branches directory.
    pub fn branches_dir(&self) -> PathBuf {
        self.root().join("branches")
    }

    /// The current/default branch pointers.
    pub fn branches_metadata_path(&self) -> PathBuf {
        self.branches_dir().join("metadata.json")
    }

    /// The directory of a single branch.
    pub fn branch_dir(&self, branch: &BranchName) -> PathBuf {
        let mut dir = self.branches_dir();
        for component in branch.as_str().split('/') {
            dir.push(component);
        }
        dir
    }

    /// The commit chain of a branch.
    pub fn branch_commits_path(&self, branch: &BranchName) -> PathBuf {
        self.branch_dir(branch).join("commits.json")
    }

    // =========================================================================
    // Working tree
    // =========================================================================

    /// Absolute location of a tracked path in the working tree.
    pub fn working_path(&self, path: &RepoPath) -> PathBuf {
        let mut full = self.work_dir.clone();
        for component in path.components() {
            full.push(component);
        }
        full
    }

    /// Resolve user input (relative to `cwd`, or absolute) into a [`RepoPath`].
    ///
    /// Resolution is purely lexical so that paths of deleted files still
    /// resolve.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidPath` if the path escapes the working tree
    /// or points into `.sheaf/`.
    pub fn resolve(&self, cwd: &Path, input: &str) -> Result<RepoPath, TypeError> {
        let joined = if Path::new(input).is_absolute() {
            PathBuf::from(input)
        } else {
            cwd.join(input)
        };
        let absolute = normalize_lexically(&joined);
        let work_dir = normalize_lexically(&self.work_dir);

        let relative = absolute.strip_prefix(&work_dir).map_err(|_| {
            TypeError::InvalidPath(format!("'{input}' is outside the working tree"))
        })?;

        let parts: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        RepoPath::new(parts.join("/"))
    }
}

/// Remove `.` components and fold `..` against preceding components.
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

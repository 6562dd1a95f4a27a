//! core::error
//!
//! The error type returned by repository operations.
//!
//! # Taxonomy
//!
//! - **Precondition**: detected before any mutation (`NotInitialized`,
//!   `InvalidPath`, `InvalidBranchName`, `ConflictingSource`, ...)
//! - **Not found**: `PathNotFound`, `BranchNotFound`, `CommitNotFound`
//! - **Conflict**: `BranchExists`, `AlreadyStaged`, `UncommittedChanges`,
//!   lock timeouts
//! - **I/O**: filesystem and JSON failures, always fatal to the operation

use std::path::PathBuf;

use thiserror::Error;

use crate::core::config::ConfigError;
use crate::core::metadata::MetadataError;
use crate::core::ops::lock::LockError;
use crate::core::store::StoreError;
use crate::core::types::{BranchName, RepoPath, TypeError};

/// Errors from repository operations.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("not a sheaf repository (or any parent): {}", .0.display())]
    NotInitialized(PathBuf),

    #[error("repository already initialized at {}", .0.display())]
    AlreadyInitialized(PathBuf),

    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("invalid branch name: {0}")]
    InvalidBranchName(String),

    #[error("invalid id: {0}")]
    InvalidId(String),

    #[error("cannot create a branch from both a commit and a branch")]
    ConflictingSource,

    #[error("path '{0}' does not match any file")]
    PathNotFound(RepoPath),

    #[error("branch '{0}' does not exist")]
    BranchNotFound(String),

    #[error("commit '{commit}' not found on branch '{branch}'")]
    CommitNotFound { commit: String, branch: BranchName },

    #[error("branch '{0}' already exists")]
    BranchExists(BranchName),

    #[error("'{0}' is already staged")]
    AlreadyStaged(RepoPath),

    #[error("you have uncommitted changes; commit them first")]
    UncommittedChanges,

    #[error("already on branch '{0}'")]
    AlreadyOnBranch(BranchName),

    #[error("'{0}' is already the default branch")]
    AlreadyDefault(BranchName),

    #[error("cannot delete '{0}': it is the current branch")]
    CurrentBranch(BranchName),

    #[error("cannot delete '{0}': it is the default branch")]
    DefaultBranch(BranchName),

    #[error("nothing to commit")]
    NothingToCommit,

    #[error("commit chain of branch '{branch}' is broken: {reason}")]
    BrokenChain { branch: BranchName, reason: String },

    #[error(transparent)]
    Lock(#[from] LockError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Metadata(#[from] MetadataError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("i/o error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, RepoError>;

impl RepoError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn broken_chain(branch: &BranchName, reason: impl Into<String>) -> Self {
        Self::BrokenChain {
            branch: branch.clone(),
            reason: reason.into(),
        }
    }

    /// Whether the error was raised before anything on disk changed.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::NotInitialized(_)
                | Self::AlreadyInitialized(_)
                | Self::InvalidPath(_)
                | Self::InvalidBranchName(_)
                | Self::InvalidId(_)
                | Self::ConflictingSource
        )
    }
}

impl From<TypeError> for RepoError {
    fn from(err: TypeError) -> Self {
        match err {
            TypeError::InvalidBranchName(msg) => Self::InvalidBranchName(msg),
            TypeError::InvalidPath(msg) => Self::InvalidPath(msg),
            TypeError::InvalidId(msg) => Self::InvalidId(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_errors_map_to_preconditions() {
        let err: RepoError = TypeError::InvalidBranchName("x".into()).into();
        assert!(matches!(err, RepoError::InvalidBranchName(_)));
        assert!(err.is_precondition());

        let err: RepoError = TypeError::InvalidPath("y".into()).into();
        assert!(matches!(err, RepoError::InvalidPath(_)));
    }

    #[test]
    fn lock_errors_pass_through() {
        let err: RepoError = LockError::CreateFailed("boom".into()).into();
        assert_eq!(err.to_string(), "failed to create lock: boom");
        assert!(!err.is_precondition());
    }

    #[test]
    fn display_messages() {
        let main = BranchName::new("main").unwrap();
        assert_eq!(
            RepoError::AlreadyOnBranch(main.clone()).to_string(),
            "already on branch 'main'"
        );
        assert!(RepoError::broken_chain(&main, "two tails")
            .to_string()
            .contains("two tails"));
    }
}

//! core::repo
//!
//! The repository handle every command goes through.
//!
//! # Architecture
//!
//! [`Repository`] owns the path routing, the content store and the staging
//! log handle, and builds the short-lived components (staging machine,
//! commit engine, branch manager) each operation needs. Each public method
//! is one logical operation and reloads whatever on-disk state it reads,
//! since another process may have changed it in between.
//!
//! # Example
//!
//! ```no_run
//! use sheaf::core::repo::Repository;
//! use std::path::Path;
//!
//! let repo = Repository::open(Path::new("."))?;
//! let path = repo.resolve_path(Path::new("."), "notes.txt")?;
//! let report = repo.stage(&path, false)?;
//! println!("{}: {}", report.path, report.outcome);
//! repo.commit("add notes")?;
//! # Ok::<(), sheaf::core::error::RepoError>(())
//! ```

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::time::Duration;

use log::{debug, info};

use crate::core::branch::{BranchManager, INITIAL_BRANCH};
use crate::core::chain::CommitChain;
use crate::core::commit::{CommitEngine, CommitSummary};
use crate::core::config::Config;
use crate::core::error::{RepoError, Result};
use crate::core::history::{self, HistoryEntry};
use crate::core::ignore::IgnoreRules;
use crate::core::metadata::{self, BranchesMetadata, FileListEntry, StagingEntry};
use crate::core::ops::lock::DEFAULT_LOCK_TIMEOUT;
use crate::core::paths::SheafPaths;
use crate::core::snapshot::FileList;
use crate::core::staging::{StageReport, StagingLog, StagingMachine};
use crate::core::status::{self, Status};
use crate::core::store::{ContentStore, FsContentStore};
use crate::core::types::{BranchName, Op, RepoPath};

/// An opened sheaf repository.
pub struct Repository {
    paths: SheafPaths,
    store: Box<dyn ContentStore>,
    log: StagingLog,
    lock_timeout: Duration,
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("work_dir", &self.paths.work_dir)
            .field("lock_timeout", &self.lock_timeout)
            .finish()
    }
}

impl Repository {
    fn from_paths(paths: SheafPaths) -> Self {
        let log = StagingLog::new(paths.clone(), DEFAULT_LOCK_TIMEOUT);
        Self {
            paths,
            store: Box::new(FsContentStore),
            log,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }

    /// Create a repository in `work_dir`.
    ///
    /// # Errors
    ///
    /// Returns `RepoError::AlreadyInitialized` if `work_dir/.sheaf` exists.
    pub fn init(work_dir: &Path) -> Result<Self> {
        let paths = SheafPaths::new(work_dir.to_path_buf());
        if paths.root().exists() {
            return Err(RepoError::AlreadyInitialized(paths.work_dir));
        }

        for op in Op::ALL {
            let dir = paths.staging_op_dir(op);
            fs::create_dir_all(&dir).map_err(|e| RepoError::io(&dir, e))?;
        }
        let commits = paths.commits_dir();
        fs::create_dir_all(&commits).map_err(|e| RepoError::io(&commits, e))?;

        metadata::write_json_atomic(&paths.staging_log_path(), &Vec::<StagingEntry>::new())?;
        let main = BranchName::new(INITIAL_BRANCH)?;
        CommitChain::empty(main.clone()).save(&paths)?;
        metadata::write_json_atomic(
            &paths.branches_metadata_path(),
            &BranchesMetadata::single(main),
        )?;
        let config = paths.config_path();
        fs::write(&config, "").map_err(|e| RepoError::io(&config, e))?;

        info!("initialized sheaf repository in {}", paths.work_dir.display());
        Ok(Self::from_paths(paths))
    }

    /// Open the repository containing `start`.
    ///
    /// # Errors
    ///
    /// Returns `RepoError::NotInitialized` if neither `start` nor any parent
    /// holds a `.sheaf` directory.
    pub fn open(start: &Path) -> Result<Self> {
        let paths = SheafPaths::discover(start)
            .ok_or_else(|| RepoError::NotInitialized(start.to_path_buf()))?;
        debug!("opened repository at {}", paths.work_dir.display());
        Ok(Self::from_paths(paths))
    }

    /// Use `timeout` for every lock this handle takes.
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self.log = StagingLog::new(self.paths.clone(), timeout);
        self
    }

    /// Use another content store implementation.
    pub fn with_store(mut self, store: Box<dyn ContentStore>) -> Self {
        self.store = store;
        self
    }

    pub fn paths(&self) -> &SheafPaths {
        &self.paths
    }

    pub fn work_dir(&self) -> &Path {
        &self.paths.work_dir
    }

    /// Delete the whole `.sheaf` directory. The working tree is untouched.
    pub fn purge(self) -> Result<()> {
        let root = self.paths.root();
        fs::remove_dir_all(&root).map_err(|e| RepoError::io(&root, e))?;
        info!("purged {}", root.display());
        Ok(())
    }

    /// Turn user input into a repository path (see [`SheafPaths::resolve`]).
    pub fn resolve_path(&self, cwd: &Path, input: &str) -> Result<RepoPath> {
        Ok(self.paths.resolve(cwd, input)?)
    }

    // =========================================================================
    // Components
    // =========================================================================

    pub fn branches(&self) -> BranchManager<'_> {
        BranchManager::new(&self.paths, self.store.as_ref(), &self.log, self.lock_timeout)
    }

    pub fn current_branch(&self) -> Result<BranchName> {
        self.branches().current()
    }

    /// The file list of the current branch's latest commit.
    pub fn head_snapshot(&self) -> Result<FileList> {
        let chain = CommitChain::load(&self.paths, &self.current_branch()?)?;
        let tail = chain.tail()?.map(|r| r.id.clone());
        Ok(FileList::load(&self.paths, tail.as_ref())?)
    }

    pub fn ignore_rules(&self) -> Result<IgnoreRules> {
        IgnoreRules::load(&self.paths.work_dir)
    }

    /// Merged global and repository configuration.
    pub fn config(&self) -> Result<Config> {
        Ok(Config::load(Some(self.paths.config_path().as_path()))?)
    }

    // =========================================================================
    // Staging
    // =========================================================================

    /// Stage one path. Ignored paths are skipped unless `force` is set.
    ///
    /// # Errors
    ///
    /// Returns `RepoError::InvalidPath` for a directory; use
    /// [`Repository::stage_dir`] for those.
    pub fn stage(&self, path: &RepoPath, force: bool) -> Result<StageReport> {
        if self.paths.working_path(path).is_dir() {
            return Err(RepoError::InvalidPath(format!("'{path}' is a directory")));
        }
        let snapshot = self.head_snapshot()?;
        let ignore = self.ignore_rules()?;
        StagingMachine::new(&self.paths, self.store.as_ref(), &self.log, &snapshot, &ignore)
            .stage(path, force)
    }

    /// Stage every change in the working tree.
    ///
    /// Covers non-ignored working files, staged ADD/MOD paths whose file
    /// vanished and committed paths that were deleted.
    pub fn stage_all(&self, force: bool) -> Result<Vec<StageReport>> {
        self.stage_matching(|_| true, force)
    }

    /// [`Repository::stage_all`] restricted to paths below directory `dir`.
    pub fn stage_dir(&self, dir: &RepoPath, force: bool) -> Result<Vec<StageReport>> {
        let prefix = format!("{}/", dir.as_str());
        self.stage_matching(|path| path.as_str().starts_with(&prefix), force)
    }

    fn stage_matching<F>(&self, wanted: F, force: bool) -> Result<Vec<StageReport>>
    where
        F: Fn(&RepoPath) -> bool,
    {
        let snapshot = self.head_snapshot()?;
        let ignore = self.ignore_rules()?;
        let walk_rules = if force { IgnoreRules::default() } else { ignore.clone() };

        let mut candidates: BTreeSet<RepoPath> =
            status::working_files(&self.paths, &walk_rules)?.into_iter().collect();
        for entry in self.log.entries()? {
            if entry.op != Op::Rem && !self.paths.working_path(&entry.path).is_file() {
                candidates.insert(entry.path);
            }
        }
        for entry in snapshot.iter() {
            if !self.paths.working_path(&entry.path).is_file() {
                candidates.insert(entry.path.clone());
            }
        }
        candidates.retain(|path| wanted(path));
        debug!("stage all: {} candidate paths", candidates.len());

        let machine =
            StagingMachine::new(&self.paths, self.store.as_ref(), &self.log, &snapshot, &ignore);
        candidates
            .iter()
            .map(|path| machine.stage(path, force))
            .collect()
    }

    /// Drop whatever is staged for `path`, returning the removed entry.
    pub fn unstage(&self, path: &RepoPath) -> Result<Option<StagingEntry>> {
        let snapshot = self.head_snapshot()?;
        let ignore = IgnoreRules::default();
        StagingMachine::new(&self.paths, self.store.as_ref(), &self.log, &snapshot, &ignore)
            .unstage(path)
    }

    /// The staging log in staging order.
    pub fn staged(&self) -> Result<Vec<StagingEntry>> {
        self.log.entries()
    }

    // =========================================================================
    // Commits
    // =========================================================================

    /// Commit everything staged onto the current branch.
    pub fn commit(&self, message: &str) -> Result<CommitSummary> {
        let author = self.config()?.author();
        let branch = self.current_branch()?;
        CommitEngine::new(&self.paths, self.store.as_ref(), &self.log, self.lock_timeout)
            .commit(&branch, author, message)
    }

    /// Working state of the current branch.
    pub fn status(&self) -> Result<Status> {
        let branch = self.current_branch()?;
        let snapshot = self.head_snapshot()?;
        let ignore = self.ignore_rules()?;
        Status::collect(
            &self.paths,
            self.store.as_ref(),
            &self.log,
            &snapshot,
            &ignore,
            branch,
        )
    }

    /// Files tracked by the current branch's latest commit, sorted by path.
    pub fn tracked_files(&self) -> Result<Vec<FileListEntry>> {
        Ok(self.head_snapshot()?.sorted())
    }

    /// Commits of the current branch, newest first.
    pub fn history(&self, limit: Option<usize>) -> Result<Vec<HistoryEntry>> {
        history::history(&self.paths, &self.current_branch()?, limit)
    }
}

//! core::branch
//!
//! Branch pointers, creation, deletion and checkout.
//!
//! # Architecture
//!
//! A branch is a directory under `.sheaf/branches/` holding its
//! `commits.json` chain. `branches/metadata.json` names the current and
//! the default branch; there is always exactly one of each.
//!
//! # Invariants
//!
//! - Every pointer write happens under the lock of `branches/metadata.json`
//! - A checkout only runs when nothing is staged and every committed path
//!   still matches its committed bytes
//! - The current and the default branch cannot be dropped

use std::fs;
use std::path::Path;
use std::time::Duration;

use log::debug;

use crate::core::chain::CommitChain;
use crate::core::error::{RepoError, Result};
use crate::core::metadata::{self, BranchesMetadata};
use crate::core::ops::lock::with_lock;
use crate::core::paths::SheafPaths;
use crate::core::snapshot::FileList;
use crate::core::staging::StagingLog;
use crate::core::status;
use crate::core::store::ContentStore;
use crate::core::types::{BranchName, CommitId};

/// Name of the branch created by `init`.
pub const INITIAL_BRANCH: &str = "main";

/// One row of [`BranchManager::list`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchInfo {
    pub name: BranchName,
    pub is_current: bool,
    pub is_default: bool,
}

/// Where a new branch takes its history from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BranchSource {
    /// Truncate the source chain at this commit.
    pub commit: Option<CommitId>,
    /// Copy this branch's chain instead of the current one.
    pub branch: Option<BranchName>,
}

/// Branch operations over one repository.
pub struct BranchManager<'a> {
    paths: &'a SheafPaths,
    store: &'a dyn ContentStore,
    log: &'a StagingLog,
    lock_timeout: Duration,
}

impl<'a> BranchManager<'a> {
    pub fn new(
        paths: &'a SheafPaths,
        store: &'a dyn ContentStore,
        log: &'a StagingLog,
        lock_timeout: Duration,
    ) -> Self {
        Self {
            paths,
            store,
            log,
            lock_timeout,
        }
    }

    // =========================================================================
    // Pointers
    // =========================================================================

    /// Read `branches/metadata.json`.
    pub fn pointers(&self) -> Result<BranchesMetadata> {
        Ok(metadata::read_record(&self.paths.branches_metadata_path())?)
    }

    pub fn current(&self) -> Result<BranchName> {
        Ok(self.pointers()?.current)
    }

    pub fn default_branch(&self) -> Result<BranchName> {
        Ok(self.pointers()?.default)
    }

    /// Apply `update` to the pointers under their lock.
    fn update_pointers<F>(&self, update: F) -> Result<BranchesMetadata>
    where
        F: FnOnce(&mut BranchesMetadata) -> Result<()>,
    {
        let path = self.paths.branches_metadata_path();
        with_lock(&path, self.lock_timeout, || {
            let mut pointers: BranchesMetadata = metadata::read_record(&path)?;
            update(&mut pointers)?;
            metadata::write_json_atomic(&path, &pointers)?;
            Ok(pointers)
        })
    }

    fn set_current(&self, name: &BranchName) -> Result<()> {
        self.update_pointers(|pointers| {
            pointers.current = name.clone();
            Ok(())
        })?;
        debug!("current branch is now {}", name);
        Ok(())
    }

    /// Make `name` the default branch.
    ///
    /// # Errors
    ///
    /// - `RepoError::BranchNotFound` if the branch does not exist
    /// - `RepoError::AlreadyDefault` if it already is the default
    pub fn set_default(&self, name: &BranchName) -> Result<()> {
        self.require(name)?;
        self.update_pointers(|pointers| {
            if &pointers.default == name {
                return Err(RepoError::AlreadyDefault(name.clone()));
            }
            pointers.default = name.clone();
            Ok(())
        })?;
        debug!("default branch is now {}", name);
        Ok(())
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn exists(&self, name: &BranchName) -> bool {
        self.paths.branch_commits_path(name).is_file()
    }

    fn require(&self, name: &BranchName) -> Result<()> {
        if self.exists(name) {
            Ok(())
        } else {
            Err(RepoError::BranchNotFound(name.to_string()))
        }
    }

    /// Every branch, sorted by name.
    pub fn list(&self) -> Result<Vec<BranchInfo>> {
        let pointers = self.pointers()?;
        let mut names = Vec::new();
        let root = self.paths.branches_dir();
        collect_branches(&root, &root, &mut names)?;
        names.sort();

        Ok(names
            .into_iter()
            .map(|name| BranchInfo {
                is_current: name == pointers.current,
                is_default: name == pointers.default,
                name,
            })
            .collect())
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Create `name` from another branch's history and switch to it.
    ///
    /// Without a source branch the current branch is copied. With a source
    /// commit the copied chain ends at that commit. The working tree is only
    /// rewritten (and so only needs to be clean) when the new branch's tail
    /// differs from the current one.
    ///
    /// # Errors
    ///
    /// - `RepoError::ConflictingSource` if both a commit and a branch are given
    /// - `RepoError::BranchExists` if `name` is taken
    /// - `RepoError::BranchNotFound` / `RepoError::CommitNotFound` for a bad source
    /// - `RepoError::UncommittedChanges` if a checkout would discard work
    pub fn create(&self, name: &BranchName, source: &BranchSource) -> Result<()> {
        if source.commit.is_some() && source.branch.is_some() {
            return Err(RepoError::ConflictingSource);
        }
        if self.exists(name) || self.paths.branch_dir(name).exists() {
            return Err(RepoError::BranchExists(name.clone()));
        }

        let current = self.current()?;
        let from = source.branch.clone().unwrap_or_else(|| current.clone());
        let source_chain = CommitChain::load(self.paths, &from)?;
        let chain = match &source.commit {
            Some(commit) => source_chain.truncated_at(commit)?,
            None => source_chain,
        }
        .for_branch(name.clone());

        let new_tail = chain.tail()?.map(|r| r.id.clone());
        let current_tail = self.tail_of(&current)?;
        let needs_checkout = new_tail != current_tail;
        if needs_checkout {
            self.ensure_clean(&current_tail)?;
        }

        let branch_dir = self.paths.branch_dir(name);
        fs::create_dir_all(&branch_dir).map_err(|e| RepoError::io(&branch_dir, e))?;
        let chain_path = self.paths.branch_commits_path(name);
        with_lock(&chain_path, self.lock_timeout, || {
            if chain_path.is_file() {
                return Err(RepoError::BranchExists(name.clone()));
            }
            chain.save(self.paths)
        })?;
        debug!("created branch {} from {} ({} commits)", name, from, chain.len());

        if needs_checkout {
            self.checkout(new_tail.as_ref())?;
        }
        self.set_current(name)
    }

    /// Delete branch `name`.
    ///
    /// # Errors
    ///
    /// - `RepoError::BranchNotFound` if it does not exist
    /// - `RepoError::CurrentBranch` / `RepoError::DefaultBranch` if it is
    ///   pointed at
    pub fn drop_branch(&self, name: &BranchName) -> Result<()> {
        self.require(name)?;
        let pointers = self.pointers()?;
        if &pointers.current == name {
            return Err(RepoError::CurrentBranch(name.clone()));
        }
        if &pointers.default == name {
            return Err(RepoError::DefaultBranch(name.clone()));
        }

        let chain_path = self.paths.branch_commits_path(name);
        with_lock(&chain_path, self.lock_timeout, || {
            fs::remove_file(&chain_path).map_err(|e| RepoError::io(&chain_path, e))
        })?;
        self.prune_empty_dirs(&self.paths.branch_dir(name))?;
        debug!("dropped branch {}", name);
        Ok(())
    }

    /// Check out `name`'s latest commit and make it current.
    ///
    /// # Errors
    ///
    /// - `RepoError::AlreadyOnBranch` if `name` is current
    /// - `RepoError::BranchNotFound` if it does not exist
    /// - `RepoError::UncommittedChanges` if anything is staged or a
    ///   committed path was edited or deleted
    pub fn switch(&self, name: &BranchName) -> Result<()> {
        let current = self.current()?;
        if &current == name {
            return Err(RepoError::AlreadyOnBranch(name.clone()));
        }
        self.require(name)?;

        self.ensure_clean(&self.tail_of(&current)?)?;
        let target_tail = self.tail_of(name)?;
        self.checkout(target_tail.as_ref())?;
        self.set_current(name)
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn tail_of(&self, branch: &BranchName) -> Result<Option<CommitId>> {
        let chain = CommitChain::load(self.paths, branch)?;
        Ok(chain.tail()?.map(|r| r.id.clone()))
    }

    /// Fail with `UncommittedChanges` unless nothing is staged and the
    /// snapshot of `tail` matches the working tree.
    fn ensure_clean(&self, tail: &Option<CommitId>) -> Result<()> {
        if !self.log.is_empty()? {
            debug!("checkout refused: staging log not empty");
            return Err(RepoError::UncommittedChanges);
        }
        let snapshot = FileList::load(self.paths, tail.as_ref())?;
        let drift = status::tracked_drift(self.paths, self.store, &snapshot)?;
        if let Some((path, kind)) = drift.first() {
            debug!("checkout refused: {} is {:?}", path, kind);
            return Err(RepoError::UncommittedChanges);
        }
        Ok(())
    }

    /// Overwrite every path of `tail`'s snapshot with its committed bytes.
    fn checkout(&self, tail: Option<&CommitId>) -> Result<()> {
        let snapshot = FileList::load(self.paths, tail)?;
        for entry in snapshot.iter() {
            let source = FileList::content_path(self.paths, entry);
            let target = self.paths.working_path(&entry.path);
            self.store.store(&source, &target)?;
        }
        debug!("checked out {} files", snapshot.len());
        Ok(())
    }

    fn prune_empty_dirs(&self, start: &Path) -> Result<()> {
        let stop = self.paths.branches_dir();
        let mut dir = start.to_path_buf();
        while dir != stop && dir.starts_with(&stop) {
            let is_empty = match fs::read_dir(&dir) {
                Ok(mut entries) => entries.next().is_none(),
                Err(_) => break,
            };
            if !is_empty {
                break;
            }
            fs::remove_dir(&dir).map_err(|e| RepoError::io(&dir, e))?;
            if !dir.pop() {
                break;
            }
        }
        Ok(())
    }
}

/// Find every directory below `root` holding a `commits.json`.
fn collect_branches(root: &Path, dir: &Path, names: &mut Vec<BranchName>) -> Result<()> {
    let read_dir = fs::read_dir(dir).map_err(|e| RepoError::io(dir, e))?;
    for entry in read_dir {
        let entry = entry.map_err(|e| RepoError::io(dir, e))?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        if path.join("commits.json").is_file() {
            if let Ok(relative) = path.strip_prefix(root) {
                let parts: Vec<String> = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect();
                match BranchName::new(parts.join("/")) {
                    Ok(name) => names.push(name),
                    Err(e) => debug!("skipping {}: {}", path.display(), e),
                }
            }
        }
        collect_branches(root, &path, names)?;
    }
    Ok(())
}

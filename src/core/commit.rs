//! core::commit
//!
//! Turning the staging log into an immutable commit.
//!
//! # Sequence
//!
//! 1. Drop log entries whose staged copy is missing
//! 2. Fail with `NothingToCommit` if the log is empty
//! 3. Replay the log over the branch tail's file list, copying each staged
//!    ADD/MOD copy into the new commit's content area
//! 4. Write `fileList.json` and `metadata.json`
//! 5. Write the committed entries to the commit as `logs.json`, then remove
//!    exactly those entries and their staged copies from staging
//! 6. Append the commit to the branch chain under the chain's lock
//!
//! # Invariants
//!
//! - The chain append is the last step, so a crash earlier leaves only
//!   unreferenced content under the new commit id
//! - Commit content is copied from staged copies, never from the working
//!   tree, so edits made after staging are not committed
//! - Entries staged while a commit runs stay in the log for the next one

use std::time::Duration;

use log::{debug, warn};

use crate::core::chain::CommitChain;
use crate::core::error::{RepoError, Result};
use crate::core::metadata::{self, CommitMetadata, CommitRecord, StagingEntry};
use crate::core::paths::SheafPaths;
use crate::core::snapshot::FileList;
use crate::core::staging::StagingLog;
use crate::core::store::ContentStore;
use crate::core::types::{BranchName, CommitId, EntryId, Op, UtcTimestamp};

/// What a successful commit produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitSummary {
    pub record: CommitRecord,
    pub branch: BranchName,
    pub file_list: FileList,
    pub added: usize,
    pub modified: usize,
    pub removed: usize,
}

impl CommitSummary {
    pub fn commit_id(&self) -> &CommitId {
        &self.record.id
    }
}

/// Produces commits from the staging log.
pub struct CommitEngine<'a> {
    paths: &'a SheafPaths,
    store: &'a dyn ContentStore,
    log: &'a StagingLog,
    lock_timeout: Duration,
}

impl<'a> CommitEngine<'a> {
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

    /// Commit everything staged onto `branch`.
    ///
    /// # Errors
    ///
    /// - `RepoError::NothingToCommit` if nothing (valid) is staged
    /// - `RepoError::BrokenChain` if the branch's chain cannot be ordered
    /// - I/O and lock errors
    pub fn commit(
        &self,
        branch: &BranchName,
        author: String,
        message: &str,
    ) -> Result<CommitSummary> {
        let orphans = self.log.reconcile_integrity()?;
        if !orphans.is_empty() {
            warn!("dropped {} orphaned staging entries", orphans.len());
        }

        let entries = self.log.entries()?;
        if entries.is_empty() {
            return Err(RepoError::NothingToCommit);
        }

        let commit_id = CommitId::generate();
        let chain = CommitChain::load(self.paths, branch)?;
        let parent = chain.tail()?.map(|r| r.id.clone());
        debug!(
            "committing {} entries on {} (parent {:?})",
            entries.len(),
            branch,
            parent.as_ref().map(CommitId::as_str)
        );

        let mut file_list = FileList::load(self.paths, parent.as_ref())?;
        let (mut added, mut modified, mut removed) = (0, 0, 0);
        for entry in &entries {
            match entry.op {
                Op::Add => added += 1,
                Op::Mod => modified += 1,
                Op::Rem => removed += 1,
            }
            if entry.op != Op::Rem {
                let staged = self.paths.staged_copy_path(entry.op, &entry.id, &entry.path);
                let committed = self
                    .paths
                    .committed_copy_path(&commit_id, &entry.id, &entry.path);
                self.store.store(&staged, &committed)?;
            }
            file_list.apply(entry, &commit_id);
        }
        file_list.save(self.paths, &commit_id)?;

        metadata::write_json_atomic(
            &self.paths.commit_metadata_path(&commit_id),
            &CommitMetadata {
                author,
                message: message.to_string(),
            },
        )?;

        metadata::write_json_atomic(&self.paths.commit_log_path(&commit_id), &entries)?;
        self.clear_committed(&entries)?;

        let record = CommitChain::append_locked(
            self.paths,
            branch,
            commit_id,
            UtcTimestamp::now(),
            self.lock_timeout,
        )?;

        Ok(CommitSummary {
            record,
            branch: branch.clone(),
            file_list,
            added,
            modified,
            removed,
        })
    }

    fn clear_committed(&self, entries: &[StagingEntry]) -> Result<()> {
        let ids: Vec<EntryId> = entries.iter().map(|e| e.id.clone()).collect();
        let removed = self.log.remove_all(&ids)?;
        if removed != ids.len() {
            warn!(
                "{} committed entries had already left the staging log",
                ids.len() - removed
            );
        }
        for entry in entries {
            self.store
                .remove_if_present(&self.paths.staged_copy_dir(entry.op, &entry.id))?;
        }
        Ok(())
    }
}

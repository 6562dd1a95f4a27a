//! core::chain
//!
//! A branch's commit history as a forward linked list.
//!
//! # Architecture
//!
//! `branches/<name>/commits.json` holds an unordered array of
//! [`CommitRecord`]s. Order comes from each record's `Next` pointer: the
//! head is the record no other record points to, and the tail (the most
//! recent commit) is the record whose `Next` is empty. Timestamps are
//! informational only.
//!
//! # Invariants
//!
//! - A non-empty chain has exactly one head and exactly one tail
//! - Following `Next` from the head visits every record once and ends at
//!   the tail
//!
//! Any violation is reported as `RepoError::BrokenChain` rather than
//! guessed around.
//!
//! # Example
//!
//! ```ignore
//! let chain = CommitChain::load(&paths, &branch)?;
//! for record in chain.ordered()? {
//!     println!("{} {}", record.id, record.timestamp);
//! }
//! ```

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use log::debug;

use crate::core::error::{RepoError, Result};
use crate::core::metadata::{self, CommitRecord};
use crate::core::ops::lock::with_lock;
use crate::core::paths::SheafPaths;
use crate::core::types::{BranchName, CommitId, UtcTimestamp};

/// The commit chain of one branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitChain {
    branch: BranchName,
    records: Vec<CommitRecord>,
}

impl CommitChain {
    /// An empty chain for `branch`.
    pub fn empty(branch: BranchName) -> Self {
        Self {
            branch,
            records: Vec::new(),
        }
    }

    /// Build a chain from records as stored.
    pub fn from_records(branch: BranchName, records: Vec<CommitRecord>) -> Self {
        Self { branch, records }
    }

    /// Load the chain of `branch`.
    ///
    /// # Errors
    ///
    /// Returns `RepoError::BranchNotFound` if the branch has no chain file.
    pub fn load(paths: &SheafPaths, branch: &BranchName) -> Result<Self> {
        let path = paths.branch_commits_path(branch);
        match metadata::read_json::<Vec<CommitRecord>>(&path) {
            Ok(records) => Ok(Self::from_records(branch.clone(), records)),
            Err(e) if e.is_not_found() => Err(RepoError::BranchNotFound(branch.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    /// Write the chain to its branch's `commits.json`.
    pub fn save(&self, paths: &SheafPaths) -> Result<()> {
        metadata::write_json_atomic(&paths.branch_commits_path(&self.branch), &self.records)?;
        Ok(())
    }

    pub fn branch(&self) -> &BranchName {
        &self.branch
    }

    /// Records in storage order.
    pub fn records(&self) -> &[CommitRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, id: &CommitId) -> bool {
        self.records.iter().any(|r| &r.id == id)
    }

    /// The same records under another branch name.
    pub fn for_branch(self, branch: BranchName) -> Self {
        Self {
            branch,
            records: self.records,
        }
    }

    /// Records oldest first.
    pub fn ordered(&self) -> Result<Vec<&CommitRecord>> {
        if self.records.is_empty() {
            return Ok(Vec::new());
        }

        let mut by_id: HashMap<&CommitId, &CommitRecord> = HashMap::new();
        for record in &self.records {
            if by_id.insert(&record.id, record).is_some() {
                return Err(self.broken(format!("commit {} appears twice", record.id)));
            }
        }

        let pointed_to: HashSet<&CommitId> =
            self.records.iter().filter_map(|r| r.next.as_ref()).collect();
        let heads: Vec<&CommitRecord> = self
            .records
            .iter()
            .filter(|r| !pointed_to.contains(&r.id))
            .collect();
        let head = match heads.as_slice() {
            [head] => *head,
            [] => return Err(self.broken("no head commit (cycle)")),
            _ => return Err(self.broken(format!("{} head commits", heads.len()))),
        };

        let mut ordered = Vec::with_capacity(self.records.len());
        let mut visited = HashSet::new();
        let mut current = head;
        loop {
            if !visited.insert(&current.id) {
                return Err(self.broken(format!("cycle at commit {}", current.id)));
            }
            ordered.push(current);

            match &current.next {
                None => break,
                Some(next) => match by_id.get(next) {
                    Some(record) => current = *record,
                    None => {
                        return Err(self.broken(format!(
                            "commit {} points to missing commit {}",
                            current.id, next
                        )))
                    }
                },
            }
        }

        if ordered.len() != self.records.len() {
            return Err(self.broken(format!(
                "{} of {} commits unreachable from the head",
                self.records.len() - ordered.len(),
                self.records.len()
            )));
        }
        Ok(ordered)
    }

    /// The most recent commit, or `None` for a branch without commits.
    pub fn tail(&self) -> Result<Option<&CommitRecord>> {
        Ok(self.ordered()?.last().copied())
    }

    /// The chain up to and including `id`, which becomes the new tail.
    ///
    /// # Errors
    ///
    /// Returns `RepoError::CommitNotFound` if `id` is not on this chain.
    pub fn truncated_at(&self, id: &CommitId) -> Result<Self> {
        let mut records = Vec::new();
        for record in self.ordered()? {
            let is_target = &record.id == id;
            let mut kept = record.clone();
            if is_target {
                kept.next = None;
            }
            records.push(kept);
            if is_target {
                return Ok(Self::from_records(self.branch.clone(), records));
            }
        }
        Err(RepoError::CommitNotFound {
            commit: id.to_string(),
            branch: self.branch.clone(),
        })
    }

    /// Link a new tail after the current one.
    pub fn push(&mut self, id: CommitId, timestamp: UtcTimestamp) -> Result<CommitRecord> {
        let previous = self.tail()?.map(|r| r.id.clone());
        if let Some(previous) = previous {
            if let Some(record) = self.records.iter_mut().find(|r| r.id == previous) {
                record.next = Some(id.clone());
            }
        }
        let record = CommitRecord::tail(id, timestamp);
        self.records.push(record.clone());
        Ok(record)
    }

    /// Append a commit to `branch`'s chain on disk under its lock.
    ///
    /// The read, both pointer updates and the write happen inside one
    /// critical section.
    pub fn append_locked(
        paths: &SheafPaths,
        branch: &BranchName,
        id: CommitId,
        timestamp: UtcTimestamp,
        lock_timeout: Duration,
    ) -> Result<CommitRecord> {
        let chain_path = paths.branch_commits_path(branch);
        with_lock(&chain_path, lock_timeout, || {
            let mut chain = Self::load(paths, branch)?;
            let record = chain.push(id, timestamp)?;
            chain.save(paths)?;
            debug!("branch {}: appended commit {}", branch, record.id);
            Ok(record)
        })
    }

    fn broken(&self, reason: impl Into<String>) -> RepoError {
        RepoError::broken_chain(&self.branch, reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn branch() -> BranchName {
        BranchName::new("main").unwrap()
    }

    fn id(s: &str) -> CommitId {
        CommitId::new(s).unwrap()
    }

    fn record(own: &str, next: Option<&str>) -> CommitRecord {
        CommitRecord {
            id: id(own),
            timestamp: UtcTimestamp::now(),
            next: next.map(id),
        }
    }

    fn ids(records: &[&CommitRecord]) -> Vec<String> {
        records.iter().map(|r| r.id.to_string()).collect()
    }

    #[test]
    fn empty_chain_has_no_tail() {
        let chain = CommitChain::empty(branch());
        assert!(chain.tail().unwrap().is_none());
        assert!(chain.ordered().unwrap().is_empty());
    }

    #[test]
    fn order_follows_next_not_storage() {
        let chain = CommitChain::from_records(
            branch(),
            vec![
                record("c3", None),
                record("c1", Some("c2")),
                record("c2", Some("c3")),
            ],
        );
        assert_eq!(ids(&chain.ordered().unwrap()), vec!["c1", "c2", "c3"]);
        assert_eq!(chain.tail().unwrap().unwrap().id, id("c3"));
    }

    #[test]
    fn same_timestamps_do_not_matter() {
        let ts = UtcTimestamp::now();
        let mut chain = CommitChain::empty(branch());
        for name in ["a", "b", "c", "d"] {
            chain.push(id(name), ts.clone()).unwrap();
        }
        assert_eq!(ids(&chain.ordered().unwrap()), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn push_links_previous_tail() {
        let mut chain = CommitChain::empty(branch());
        chain.push(id("a"), UtcTimestamp::now()).unwrap();
        chain.push(id("b"), UtcTimestamp::now()).unwrap();

        let a = chain.records().iter().find(|r| r.id == id("a")).unwrap();
        assert_eq!(a.next, Some(id("b")));
        assert_eq!(chain.records().iter().filter(|r| r.is_tail()).count(), 1);
    }

    #[test]
    fn two_tails_is_broken() {
        let chain =
            CommitChain::from_records(branch(), vec![record("a", None), record("b", None)]);
        assert!(matches!(chain.tail(), Err(RepoError::BrokenChain { .. })));
    }

    #[test]
    fn cycle_is_broken() {
        let chain = CommitChain::from_records(
            branch(),
            vec![record("a", Some("b")), record("b", Some("a"))],
        );
        assert!(matches!(chain.ordered(), Err(RepoError::BrokenChain { .. })));
    }

    #[test]
    fn dangling_next_is_broken() {
        let chain = CommitChain::from_records(branch(), vec![record("a", Some("zzz"))]);
        assert!(matches!(chain.tail(), Err(RepoError::BrokenChain { .. })));
    }

    #[test]
    fn detached_loop_is_broken() {
        let chain = CommitChain::from_records(
            branch(),
            vec![
                record("a", None),
                record("b", Some("c")),
                record("c", Some("b")),
            ],
        );
        assert!(matches!(chain.ordered(), Err(RepoError::BrokenChain { .. })));
    }

    #[test]
    fn truncation_makes_target_the_tail() {
        let mut chain = CommitChain::empty(branch());
        for name in ["a", "b", "c"] {
            chain.push(id(name), UtcTimestamp::now()).unwrap();
        }

        let cut = chain.truncated_at(&id("b")).unwrap();
        assert_eq!(ids(&cut.ordered().unwrap()), vec!["a", "b"]);
        assert_eq!(cut.tail().unwrap().unwrap().id, id("b"));
    }

    #[test]
    fn truncation_at_unknown_commit() {
        let mut chain = CommitChain::empty(branch());
        chain.push(id("a"), UtcTimestamp::now()).unwrap();
        assert!(matches!(
            chain.truncated_at(&id("nope")),
            Err(RepoError::CommitNotFound { .. })
        ));
    }

    #[test]
    fn load_missing_branch() {
        let temp = tempfile::TempDir::new().unwrap();
        let paths = SheafPaths::new(temp.path().to_path_buf());
        assert!(matches!(
            CommitChain::load(&paths, &branch()),
            Err(RepoError::BranchNotFound(_))
        ));
    }

    #[test]
    fn append_locked_persists() {
        let temp = tempfile::TempDir::new().unwrap();
        let paths = SheafPaths::new(temp.path().to_path_buf());
        CommitChain::empty(branch()).save(&paths).unwrap();

        let timeout = crate::core::ops::lock::DEFAULT_LOCK_TIMEOUT;
        CommitChain::append_locked(&paths, &branch(), id("a"), UtcTimestamp::now(), timeout)
            .unwrap();
        CommitChain::append_locked(&paths, &branch(), id("b"), UtcTimestamp::now(), timeout)
            .unwrap();

        let chain = CommitChain::load(&paths, &branch()).unwrap();
        assert_eq!(ids(&chain.ordered().unwrap()), vec!["a", "b"]);
    }
}

//! core::snapshot
//!
//! A commit's file-list snapshot.
//!
//! # Invariants
//!
//! - At most one entry per path
//! - Replaying a staging log over a snapshot grows it by the number of ADD
//!   entries and shrinks it by the number of REM entries; MOD keeps the size

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::metadata::{self, FileListEntry, MetadataError, StagingEntry};
use crate::core::paths::SheafPaths;
use crate::core::types::{CommitId, Op, RepoPath};

/// Every tracked path of one commit and where its bytes live.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileList {
    entries: Vec<FileListEntry>,
}

impl FileList {
    /// An empty snapshot (a branch with no commits).
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the snapshot of `commit`, or an empty one for `None`.
    pub fn load(paths: &SheafPaths, commit: Option<&CommitId>) -> Result<Self, MetadataError> {
        match commit {
            Some(id) => metadata::read_json(&paths.file_list_path(id)),
            None => Ok(Self::new()),
        }
    }

    /// Persist this snapshot as the file list of `commit`.
    pub fn save(&self, paths: &SheafPaths, commit: &CommitId) -> Result<(), MetadataError> {
        metadata::write_json_atomic(&paths.file_list_path(commit), self)
    }

    /// The entry tracking `path`, if any.
    pub fn find(&self, path: &RepoPath) -> Option<&FileListEntry> {
        self.entries.iter().find(|e| &e.path == path)
    }

    /// Apply one staging entry as part of producing `commit`.
    ///
    /// ADD and MOD point the path at the entry's copy inside `commit`;
    /// REM drops the path.
    pub fn apply(&mut self, entry: &StagingEntry, commit: &CommitId) {
        match entry.op {
            Op::Rem => self.entries.retain(|e| e.path != entry.path),
            Op::Add | Op::Mod => {
                match self.entries.iter_mut().find(|e| e.path == entry.path) {
                    Some(existing) => {
                        existing.id = entry.id.clone();
                        existing.commit_id = commit.clone();
                    }
                    None => self.entries.push(FileListEntry {
                        id: entry.id.clone(),
                        commit_id: commit.clone(),
                        path: entry.path.clone(),
                    }),
                }
            }
        }
    }

    /// Absolute location of the committed bytes behind `entry`.
    pub fn content_path(paths: &SheafPaths, entry: &FileListEntry) -> PathBuf {
        paths.committed_copy_path(&entry.commit_id, &entry.id, &entry.path)
    }

    /// Entries sorted by path.
    pub fn sorted(&self) -> Vec<FileListEntry> {
        let mut entries = self.entries.clone();
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &FileListEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether the snapshot tracks `path`.
    pub fn contains(&self, path: &RepoPath) -> bool {
        self.find(path).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::EntryId;

    fn path(p: &str) -> RepoPath {
        RepoPath::new(p).unwrap()
    }

    fn entry(op: Op, p: &str) -> StagingEntry {
        StagingEntry::new(op, path(p))
    }

    #[test]
    fn add_then_mod_keeps_one_entry() {
        let c1 = CommitId::generate();
        let c2 = CommitId::generate();
        let mut list = FileList::new();

        list.apply(&entry(Op::Add, "a.txt"), &c1);
        assert_eq!(list.len(), 1);

        let modify = entry(Op::Mod, "a.txt");
        list.apply(&modify, &c2);
        assert_eq!(list.len(), 1);
        let tracked = list.find(&path("a.txt")).unwrap();
        assert_eq!(tracked.id, modify.id);
        assert_eq!(tracked.commit_id, c2);
    }

    #[test]
    fn rem_drops_path() {
        let c1 = CommitId::generate();
        let mut list = FileList::new();
        list.apply(&entry(Op::Add, "a.txt"), &c1);
        list.apply(&entry(Op::Add, "b.txt"), &c1);
        list.apply(&entry(Op::Rem, "a.txt"), &c1);

        assert_eq!(list.len(), 1);
        assert!(!list.contains(&path("a.txt")));
        assert!(list.contains(&path("b.txt")));
    }

    #[test]
    fn add_of_tracked_path_stays_unique() {
        let c1 = CommitId::generate();
        let mut list = FileList::new();
        list.apply(&entry(Op::Add, "a.txt"), &c1);
        list.apply(&entry(Op::Add, "a.txt"), &c1);
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn serializes_as_plain_array() {
        let mut list = FileList::new();
        list.apply(
            &StagingEntry {
                id: EntryId::new("f1").unwrap(),
                op: Op::Add,
                path: path("a.txt"),
            },
            &CommitId::new("c1").unwrap(),
        );
        let json = serde_json::to_string(&list).unwrap();
        assert_eq!(json, r#"[{"Id":"f1","CommitId":"c1","Path":"a.txt"}]"#);
    }

    #[test]
    fn sorted_by_path() {
        let c1 = CommitId::generate();
        let mut list = FileList::new();
        list.apply(&entry(Op::Add, "z.txt"), &c1);
        list.apply(&entry(Op::Add, "a/b.txt"), &c1);
        let names: Vec<_> = list.sorted().into_iter().map(|e| e.path.to_string()).collect();
        assert_eq!(names, vec!["a/b.txt", "z.txt"]);
    }
}

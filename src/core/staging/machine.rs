//! core::staging::machine
//!
//! The staging state machine.
//!
//! # Architecture
//!
//! A path's state is read from three places: the staging log, the staged
//! copy of its entry, and the latest commit's file-list snapshot (plus the
//! committed copy the snapshot points at). [`StagingMachine::stage`]
//! compares the working file against whichever of those is authoritative
//! and makes exactly one transition.
//!
//! # Transitions
//!
//! | staged | working file | result                                  |
//! |--------|--------------|-----------------------------------------|
//! | ADD    | gone         | entry dropped ([`StageOutcome::RemovedFromStaging`]) |
//! | ADD    | changed      | copy refreshed, same id                 |
//! | MOD    | gone         | entry replaced by REM                   |
//! | MOD    | changed      | copy refreshed, same id                 |
//! | REM    | back, edited | entry replaced by MOD                   |
//! | REM    | back, same   | entry dropped                           |
//! | none   | gone         | new REM (path must be committed)        |
//! | none   | changed      | new MOD                                 |
//! | none   | untracked    | new ADD                                 |
//!
//! # Invariants
//!
//! - A staged copy is written before the log entry that references it
//! - A log entry is removed only after its staged copy is gone
//! - At most one log entry per path

use log::debug;

use crate::core::error::{RepoError, Result};
use crate::core::ignore::IgnoreMatcher;
use crate::core::metadata::{FileListEntry, StagingEntry};
use crate::core::paths::SheafPaths;
use crate::core::snapshot::FileList;
use crate::core::staging::log::{OpFilter, StagingLog};
use crate::core::store::ContentStore;
use crate::core::types::{EntryId, Op, RepoPath};

/// Result of staging one path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageOutcome {
    /// A staged ADD whose file vanished was forgotten.
    RemovedFromStaging,
    /// A staged ADD was refreshed with new content.
    StagedAddUpdated,
    /// A staged ADD already matched the working file.
    AlreadyStagedAdd,
    /// A staged MOD whose file vanished became a REM.
    ConvertedToRemoval,
    /// A staged MOD was refreshed with new content.
    StagedModUpdated,
    /// A staged MOD already matched the working file.
    AlreadyStagedMod,
    /// A removed file came back with different content and is now a MOD.
    RestoredModified,
    /// A removed file came back unchanged; nothing is staged for it.
    FullyReverted,
    /// A staged REM whose file is still absent.
    StillRemoved,
    /// A committed file was deleted and is now staged as REM.
    NewRemoval,
    /// A committed file changed and is now staged as MOD.
    NewModification,
    /// A committed file matches its committed content.
    Unchanged,
    /// An untracked file is now staged as ADD.
    NewFile,
    /// The path matched an ignore rule and was skipped.
    Ignored,
}

impl StageOutcome {
    /// Numeric status code reported by the CLI.
    pub fn code(self) -> u16 {
        match self {
            StageOutcome::Ignored => 2,
            StageOutcome::RemovedFromStaging => 101,
            StageOutcome::StagedAddUpdated => 102,
            StageOutcome::AlreadyStagedAdd => 103,
            StageOutcome::ConvertedToRemoval => 104,
            StageOutcome::StagedModUpdated => 105,
            StageOutcome::AlreadyStagedMod => 106,
            StageOutcome::RestoredModified => 107,
            StageOutcome::StillRemoved => 108,
            StageOutcome::NewRemoval => 109,
            StageOutcome::NewModification => 110,
            StageOutcome::Unchanged => 111,
            StageOutcome::NewFile => 112,
            StageOutcome::FullyReverted => 113,
        }
    }

    /// Whether the call left the log and staged copies untouched.
    pub fn is_noop(self) -> bool {
        matches!(
            self,
            StageOutcome::AlreadyStagedAdd
                | StageOutcome::AlreadyStagedMod
                | StageOutcome::StillRemoved
                | StageOutcome::Unchanged
                | StageOutcome::Ignored
        )
    }

    /// Short human-readable description.
    pub fn describe(self) -> &'static str {
        match self {
            StageOutcome::RemovedFromStaging => "removed from staging",
            StageOutcome::StagedAddUpdated | StageOutcome::StagedModUpdated => {
                "staged file updated"
            }
            StageOutcome::AlreadyStagedAdd
            | StageOutcome::AlreadyStagedMod
            | StageOutcome::StillRemoved => "already staged",
            StageOutcome::ConvertedToRemoval => "staged for removal",
            StageOutcome::RestoredModified => "restored with changes, staged as modified",
            StageOutcome::FullyReverted => "restored, nothing to stage",
            StageOutcome::NewRemoval => "staged for removal",
            StageOutcome::NewModification => "staged as modified",
            StageOutcome::Unchanged => "not modified",
            StageOutcome::NewFile => "staged as new file",
            StageOutcome::Ignored => "ignored by rules",
        }
    }
}

impl std::fmt::Display for StageOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.describe())
    }
}

/// What [`StagingMachine::stage`] did to one path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageReport {
    pub path: RepoPath,
    pub outcome: StageOutcome,
    /// The entry that now holds the path, or the one that was dropped.
    pub entry_id: Option<EntryId>,
}

impl StageReport {
    fn new(path: &RepoPath, outcome: StageOutcome, entry_id: Option<EntryId>) -> Self {
        debug!("stage {}: {:?}", path, outcome);
        Self {
            path: path.clone(),
            outcome,
            entry_id,
        }
    }
}

/// Staging transitions for one repository state.
pub struct StagingMachine<'a> {
    paths: &'a SheafPaths,
    store: &'a dyn ContentStore,
    log: &'a StagingLog,
    snapshot: &'a FileList,
    ignore: &'a dyn IgnoreMatcher,
}

impl<'a> StagingMachine<'a> {
    /// `snapshot` must be the file list of the current branch's tail.
    pub fn new(
        paths: &'a SheafPaths,
        store: &'a dyn ContentStore,
        log: &'a StagingLog,
        snapshot: &'a FileList,
        ignore: &'a dyn IgnoreMatcher,
    ) -> Self {
        Self {
            paths,
            store,
            log,
            snapshot,
            ignore,
        }
    }

    /// Reconcile `path` across the log, its staged copy and the snapshot.
    ///
    /// Unless `force` is set, ignored paths are reported as
    /// [`StageOutcome::Ignored`] without looking at anything else.
    ///
    /// # Errors
    ///
    /// - `RepoError::PathNotFound` if the path is neither on disk, staged
    ///   nor committed, as after a [`StageOutcome::RemovedFromStaging`]
    /// - Content store and log failures
    pub fn stage(&self, path: &RepoPath, force: bool) -> Result<StageReport> {
        if !force && self.ignore.is_ignored(path, false) {
            return Ok(StageReport::new(path, StageOutcome::Ignored, None));
        }

        let working = self.paths.working_path(path);
        let exists = working.exists();

        match self.log.lookup(OpFilter::Any, path)? {
            Some(entry) => match entry.op {
                Op::Add => self.restage(entry, exists, StageOutcome::StagedAddUpdated),
                Op::Mod => self.restage(entry, exists, StageOutcome::StagedModUpdated),
                Op::Rem => self.stage_over_removal(entry, exists),
            },
            None => self.stage_unstaged(path, exists),
        }
    }

    /// Drop any entry staged for `path`, returning it.
    pub fn unstage(&self, path: &RepoPath) -> Result<Option<StagingEntry>> {
        match self.log.lookup(OpFilter::Any, path)? {
            Some(entry) => {
                self.discard(&entry)?;
                debug!("unstaged {} {}", entry.op, entry.path);
                Ok(Some(entry))
            }
            None => Ok(None),
        }
    }

    /// ADD and MOD entries share their shape: forget (or convert) on
    /// deletion, refresh on change.
    fn restage(
        &self,
        entry: StagingEntry,
        exists: bool,
        updated: StageOutcome,
    ) -> Result<StageReport> {
        let path = entry.path.clone();

        if !exists {
            self.discard(&entry)?;
            if entry.op == Op::Add {
                return Ok(StageReport::new(
                    &path,
                    StageOutcome::RemovedFromStaging,
                    Some(entry.id),
                ));
            }
            return match self.snapshot.find(&path) {
                Some(committed) => {
                    let id = self.stage_removal(committed)?;
                    Ok(StageReport::new(
                        &path,
                        StageOutcome::ConvertedToRemoval,
                        Some(id),
                    ))
                }
                None => Ok(StageReport::new(
                    &path,
                    StageOutcome::RemovedFromStaging,
                    Some(entry.id),
                )),
            };
        }

        let working = self.paths.working_path(&path);
        let copy = self.paths.staged_copy_path(entry.op, &entry.id, &path);
        let changed = !copy.is_file() || self.store.differs(&working, &copy)?;

        if changed {
            self.store.store(&working, &copy)?;
            return Ok(StageReport::new(&path, updated, Some(entry.id)));
        }

        let unchanged = match entry.op {
            Op::Add => StageOutcome::AlreadyStagedAdd,
            _ => StageOutcome::AlreadyStagedMod,
        };
        Ok(StageReport::new(&path, unchanged, Some(entry.id)))
    }

    fn stage_over_removal(&self, entry: StagingEntry, exists: bool) -> Result<StageReport> {
        let path = entry.path.clone();
        if !exists {
            return Ok(StageReport::new(
                &path,
                StageOutcome::StillRemoved,
                Some(entry.id),
            ));
        }

        self.discard(&entry)?;
        let working = self.paths.working_path(&path);

        match self.snapshot.find(&path) {
            Some(committed) => {
                let committed_copy = FileList::content_path(self.paths, committed);
                if self.store.differs(&working, &committed_copy)? {
                    let id = self.stage_new(Op::Mod, &path)?;
                    Ok(StageReport::new(
                        &path,
                        StageOutcome::RestoredModified,
                        Some(id),
                    ))
                } else {
                    Ok(StageReport::new(&path, StageOutcome::FullyReverted, None))
                }
            }
            None => {
                let id = self.stage_new(Op::Add, &path)?;
                Ok(StageReport::new(&path, StageOutcome::NewFile, Some(id)))
            }
        }
    }

    fn stage_unstaged(&self, path: &RepoPath, exists: bool) -> Result<StageReport> {
        match (self.snapshot.find(path), exists) {
            (Some(committed), false) => {
                let id = self.stage_removal(committed)?;
                Ok(StageReport::new(path, StageOutcome::NewRemoval, Some(id)))
            }
            (Some(committed), true) => {
                let working = self.paths.working_path(path);
                let committed_copy = FileList::content_path(self.paths, committed);
                if self.store.differs(&working, &committed_copy)? {
                    let id = self.stage_new(Op::Mod, path)?;
                    Ok(StageReport::new(
                        path,
                        StageOutcome::NewModification,
                        Some(id),
                    ))
                } else {
                    Ok(StageReport::new(path, StageOutcome::Unchanged, None))
                }
            }
            (None, true) => {
                let id = self.stage_new(Op::Add, path)?;
                Ok(StageReport::new(path, StageOutcome::NewFile, Some(id)))
            }
            (None, false) => Err(RepoError::PathNotFound(path.clone())),
        }
    }

    /// Stage the working file under a fresh entry.
    fn stage_new(&self, op: Op, path: &RepoPath) -> Result<EntryId> {
        let working = self.paths.working_path(path);
        self.record(StagingEntry::new(op, path.clone()), &working)
    }

    /// Stage a REM whose copy is the last committed content.
    fn stage_removal(&self, committed: &FileListEntry) -> Result<EntryId> {
        let source = FileList::content_path(self.paths, committed);
        self.record(StagingEntry::new(Op::Rem, committed.path.clone()), &source)
    }

    fn record(&self, entry: StagingEntry, source: &std::path::Path) -> Result<EntryId> {
        let copy = self
            .paths
            .staged_copy_path(entry.op, &entry.id, &entry.path);
        self.store.store(source, &copy)?;

        let id = entry.id.clone();
        let copy_dir = self.paths.staged_copy_dir(entry.op, &entry.id);
        if let Err(e) = self.log.append(entry) {
            self.store.remove_if_present(&copy_dir)?;
            return Err(e);
        }
        Ok(id)
    }

    fn discard(&self, entry: &StagingEntry) -> Result<()> {
        self.store
            .remove_if_present(&self.paths.staged_copy_dir(entry.op, &entry.id))?;
        self.log.remove(&entry.id)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ignore::IgnoreRules;
    use crate::core::ops::lock::DEFAULT_LOCK_TIMEOUT;
    use crate::core::store::FsContentStore;
    use crate::core::types::CommitId;
    use std::fs;
    use tempfile::TempDir;

    struct Fixture {
        _temp: TempDir,
        paths: SheafPaths,
        log: StagingLog,
        snapshot: FileList,
        ignore: IgnoreRules,
    }

    impl Fixture {
        fn new() -> Self {
            let temp = TempDir::new().unwrap();
            let paths = SheafPaths::new(temp.path().to_path_buf());
            fs::create_dir_all(paths.staging_dir()).unwrap();
            fs::write(paths.staging_log_path(), "[]").unwrap();
            let log = StagingLog::new(paths.clone(), DEFAULT_LOCK_TIMEOUT);
            Self {
                _temp: temp,
                paths,
                log,
                snapshot: FileList::new(),
                ignore: IgnoreRules::default(),
            }
        }

        fn stage(&self, p: &str) -> StageOutcome {
            let machine = StagingMachine::new(
                &self.paths,
                &FsContentStore,
                &self.log,
                &self.snapshot,
                &self.ignore,
            );
            machine.stage(&path(p), false).unwrap().outcome
        }

        fn write(&self, p: &str, contents: &str) {
            let full = self.paths.working_path(&path(p));
            fs::create_dir_all(full.parent().unwrap()).unwrap();
            fs::write(full, contents).unwrap();
        }

        fn delete(&self, p: &str) {
            fs::remove_file(self.paths.working_path(&path(p))).unwrap();
        }

        /// Pretend `p` was committed with `contents`.
        fn commit(&mut self, p: &str, contents: &str) {
            let commit = CommitId::generate();
            let entry = StagingEntry::new(Op::Add, path(p));
            let copy = self
                .paths
                .committed_copy_path(&commit, &entry.id, &entry.path);
            fs::create_dir_all(copy.parent().unwrap()).unwrap();
            fs::write(copy, contents).unwrap();
            self.snapshot.apply(&entry, &commit);
        }

        fn staged_op(&self, p: &str) -> Option<Op> {
            self.log
                .lookup(OpFilter::Any, &path(p))
                .unwrap()
                .map(|e| e.op)
        }
    }

    fn path(p: &str) -> RepoPath {
        RepoPath::new(p).unwrap()
    }

    #[test]
    fn new_file_then_idempotent() {
        let fx = Fixture::new();
        fx.write("a.txt", "one");
        assert_eq!(fx.stage("a.txt"), StageOutcome::NewFile);
        assert_eq!(fx.stage("a.txt"), StageOutcome::AlreadyStagedAdd);
        assert_eq!(fx.staged_op("a.txt"), Some(Op::Add));
    }

    #[test]
    fn staged_add_updated_keeps_id() {
        let fx = Fixture::new();
        fx.write("a.txt", "one");
        fx.stage("a.txt");
        let id = fx.log.lookup(OpFilter::Any, &path("a.txt")).unwrap().unwrap().id;

        fx.write("a.txt", "two");
        assert_eq!(fx.stage("a.txt"), StageOutcome::StagedAddUpdated);

        let entry = fx.log.lookup(OpFilter::Any, &path("a.txt")).unwrap().unwrap();
        assert_eq!(entry.id, id);
        let copy = fx.paths.staged_copy_path(Op::Add, &id, &path("a.txt"));
        assert_eq!(fs::read_to_string(copy).unwrap(), "two");
    }

    #[test]
    fn staged_add_forgotten_when_deleted() {
        let fx = Fixture::new();
        fx.write("b.txt", "x");
        fx.stage("b.txt");
        fx.delete("b.txt");

        assert_eq!(fx.stage("b.txt"), StageOutcome::RemovedFromStaging);
        assert!(fx.log.is_empty().unwrap());
        assert!(fs::read_dir(fx.paths.staging_op_dir(Op::Add))
            .unwrap()
            .next()
            .is_none());
    }

    #[test]
    fn committed_file_modification_lifecycle() {
        let mut fx = Fixture::new();
        fx.write("a.txt", "v1");
        fx.commit("a.txt", "v1");
        assert_eq!(fx.stage("a.txt"), StageOutcome::Unchanged);

        fx.write("a.txt", "v2");
        assert_eq!(fx.stage("a.txt"), StageOutcome::NewModification);
        assert_eq!(fx.stage("a.txt"), StageOutcome::AlreadyStagedMod);

        fx.write("a.txt", "v3");
        assert_eq!(fx.stage("a.txt"), StageOutcome::StagedModUpdated);
    }

    #[test]
    fn staged_mod_becomes_removal_with_committed_bytes() {
        let mut fx = Fixture::new();
        fx.write("a.txt", "v1");
        fx.commit("a.txt", "v1");
        fx.write("a.txt", "v2");
        fx.stage("a.txt");
        fx.delete("a.txt");

        assert_eq!(fx.stage("a.txt"), StageOutcome::ConvertedToRemoval);
        let entry = fx.log.lookup(OpFilter::Any, &path("a.txt")).unwrap().unwrap();
        assert_eq!(entry.op, Op::Rem);
        let copy = fx.paths.staged_copy_path(Op::Rem, &entry.id, &entry.path);
        assert_eq!(fs::read_to_string(copy).unwrap(), "v1");
        assert_eq!(fx.log.entries().unwrap().len(), 1);
    }

    #[test]
    fn removal_lifecycle() {
        let mut fx = Fixture::new();
        fx.write("a.txt", "v1");
        fx.commit("a.txt", "v1");
        fx.delete("a.txt");

        assert_eq!(fx.stage("a.txt"), StageOutcome::NewRemoval);
        assert_eq!(fx.stage("a.txt"), StageOutcome::StillRemoved);

        fx.write("a.txt", "v1");
        assert_eq!(fx.stage("a.txt"), StageOutcome::FullyReverted);
        assert!(fx.log.is_empty().unwrap());
    }

    #[test]
    fn removed_file_restored_with_changes() {
        let mut fx = Fixture::new();
        fx.write("a.txt", "v1");
        fx.commit("a.txt", "v1");
        fx.delete("a.txt");
        fx.stage("a.txt");

        fx.write("a.txt", "different");
        assert_eq!(fx.stage("a.txt"), StageOutcome::RestoredModified);
        assert_eq!(fx.staged_op("a.txt"), Some(Op::Mod));
    }

    #[test]
    fn missing_untracked_path_is_error() {
        let fx = Fixture::new();
        let machine = StagingMachine::new(
            &fx.paths,
            &FsContentStore,
            &fx.log,
            &fx.snapshot,
            &fx.ignore,
        );
        let result = machine.stage(&path("ghost.txt"), false);
        assert!(matches!(result, Err(RepoError::PathNotFound(_))));
    }

    #[test]
    fn ignored_unless_forced() {
        let mut fx = Fixture::new();
        fx.ignore = IgnoreRules::parse("*.log\n");
        fx.write("debug.log", "noise");

        assert_eq!(fx.stage("debug.log"), StageOutcome::Ignored);
        assert!(fx.log.is_empty().unwrap());

        let machine = StagingMachine::new(
            &fx.paths,
            &FsContentStore,
            &fx.log,
            &fx.snapshot,
            &fx.ignore,
        );
        let report = machine.stage(&path("debug.log"), true).unwrap();
        assert_eq!(report.outcome, StageOutcome::NewFile);
    }

    #[test]
    fn unstage_drops_entry_and_copy() {
        let fx = Fixture::new();
        fx.write("a.txt", "x");
        fx.stage("a.txt");
        let machine = StagingMachine::new(
            &fx.paths,
            &FsContentStore,
            &fx.log,
            &fx.snapshot,
            &fx.ignore,
        );

        let removed = machine.unstage(&path("a.txt")).unwrap().unwrap();
        assert_eq!(removed.op, Op::Add);
        assert!(!fx.paths.staged_copy_dir(Op::Add, &removed.id).exists());
        assert!(machine.unstage(&path("a.txt")).unwrap().is_none());
    }

    #[test]
    fn outcome_codes_and_noops() {
        assert_eq!(StageOutcome::NewFile.code(), 112);
        assert_eq!(StageOutcome::RestoredModified.code(), 107);
        assert_eq!(StageOutcome::FullyReverted.code(), 113);
        assert_eq!(StageOutcome::Ignored.code(), 2);
        assert!(StageOutcome::Unchanged.is_noop());
        assert!(!StageOutcome::NewRemoval.is_noop());
    }
}

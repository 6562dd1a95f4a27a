//! Integration tests for staging.
//!
//! These tests drive a real repository in a temporary directory through
//! `Repository` and check both the reported outcome and what lands in
//! `.sheaf/staging/`.

use std::fs;
use std::path::Path;

use tempfile::TempDir;

use sheaf::core::error::RepoError;
use sheaf::core::repo::Repository;
use sheaf::core::staging::StageOutcome;
use sheaf::core::types::{Op, RepoPath};

// =============================================================================
// Test Fixtures
// =============================================================================

struct TestRepo {
    dir: TempDir,
    repo: Repository,
}

impl TestRepo {
    fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        let repo = Repository::init(dir.path()).expect("failed to init repository");
        Self { dir, repo }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn write(&self, file: &str, contents: &str) {
        let target = self.path().join(file);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(target, contents).unwrap();
    }

    fn delete(&self, file: &str) {
        fs::remove_file(self.path().join(file)).unwrap();
    }

    fn stage(&self, file: &str) -> StageOutcome {
        self.repo.stage(&rp(file), false).unwrap().outcome
    }

    fn staged_ops(&self) -> Vec<(Op, String)> {
        self.repo
            .staged()
            .unwrap()
            .into_iter()
            .map(|e| (e.op, e.path.to_string()))
            .collect()
    }

    fn commit(&self, message: &str) {
        self.repo.commit(message).unwrap();
    }
}

fn rp(path: &str) -> RepoPath {
    RepoPath::new(path).unwrap()
}

// =============================================================================
// Untracked files
// =============================================================================

#[test]
fn new_file_is_staged_as_add_with_a_copy() {
    let t = TestRepo::new();
    t.write("notes/a.txt", "hello");

    let report = t.repo.stage(&rp("notes/a.txt"), false).unwrap();
    assert_eq!(report.outcome, StageOutcome::NewFile);
    assert_eq!(report.outcome.code(), 112);

    let id = report.entry_id.unwrap();
    let copy = t
        .repo
        .paths()
        .staged_copy_path(Op::Add, &id, &rp("notes/a.txt"));
    assert_eq!(fs::read_to_string(copy).unwrap(), "hello");
    assert_eq!(t.staged_ops(), vec![(Op::Add, "notes/a.txt".to_string())]);
}

#[test]
fn restaging_an_add_refreshes_or_reports_no_change() {
    let t = TestRepo::new();
    t.write("a.txt", "one");
    t.stage("a.txt");

    assert_eq!(t.stage("a.txt"), StageOutcome::AlreadyStagedAdd);

    t.write("a.txt", "two");
    assert_eq!(t.stage("a.txt"), StageOutcome::StagedAddUpdated);
    assert_eq!(t.staged_ops().len(), 1);
}

#[test]
fn deleting_a_staged_add_forgets_it() {
    let t = TestRepo::new();
    t.write("b.txt", "temporary");
    assert_eq!(t.stage("b.txt"), StageOutcome::NewFile);

    t.delete("b.txt");
    assert_eq!(t.stage("b.txt"), StageOutcome::RemovedFromStaging);
    assert!(t.staged_ops().is_empty());

    let add_dir = t.repo.paths().staging_op_dir(Op::Add);
    assert_eq!(fs::read_dir(add_dir).unwrap().count(), 0);
}

#[test]
fn unknown_path_is_not_found() {
    let t = TestRepo::new();
    let err = t.repo.stage(&rp("missing.txt"), false).unwrap_err();
    assert!(matches!(err, RepoError::PathNotFound(_)));
}

#[test]
fn forgotten_add_is_not_found_on_restage() {
    let t = TestRepo::new();
    t.write("b.txt", "b");
    t.stage("b.txt");
    t.delete("b.txt");
    assert_eq!(t.stage("b.txt"), StageOutcome::RemovedFromStaging);

    for _ in 0..2 {
        let err = t.repo.stage(&rp("b.txt"), false).unwrap_err();
        assert!(matches!(err, RepoError::PathNotFound(_)));
        assert!(t.staged_ops().is_empty());
    }
}

#[test]
fn directory_path_is_rejected() {
    let t = TestRepo::new();
    t.write("dir/a.txt", "a");
    let err = t.repo.stage(&rp("dir"), false).unwrap_err();
    assert!(matches!(err, RepoError::InvalidPath(_)));
}

// =============================================================================
// Committed files
// =============================================================================

#[test]
fn committed_file_lifecycle() {
    let t = TestRepo::new();
    t.write("a.txt", "v1");
    t.stage("a.txt");
    t.commit("first");

    assert_eq!(t.stage("a.txt"), StageOutcome::Unchanged);
    assert!(t.staged_ops().is_empty());

    t.write("a.txt", "v2");
    assert_eq!(t.stage("a.txt"), StageOutcome::NewModification);
    t.write("a.txt", "v3");
    assert_eq!(t.stage("a.txt"), StageOutcome::StagedModUpdated);
    assert_eq!(t.stage("a.txt"), StageOutcome::AlreadyStagedMod);

    t.delete("a.txt");
    assert_eq!(t.stage("a.txt"), StageOutcome::ConvertedToRemoval);
    assert_eq!(t.staged_ops(), vec![(Op::Rem, "a.txt".to_string())]);
    assert_eq!(t.stage("a.txt"), StageOutcome::StillRemoved);

    t.write("a.txt", "v1");
    assert_eq!(t.stage("a.txt"), StageOutcome::FullyReverted);
    assert!(t.staged_ops().is_empty());
}

#[test]
fn removal_then_edit_becomes_modification() {
    let t = TestRepo::new();
    t.write("a.txt", "v1");
    t.stage("a.txt");
    t.commit("first");

    t.delete("a.txt");
    assert_eq!(t.stage("a.txt"), StageOutcome::NewRemoval);

    t.write("a.txt", "different");
    assert_eq!(t.stage("a.txt"), StageOutcome::RestoredModified);
    assert_eq!(t.staged_ops(), vec![(Op::Mod, "a.txt".to_string())]);
}

#[test]
fn removal_keeps_the_committed_bytes() {
    let t = TestRepo::new();
    t.write("a.txt", "committed");
    t.stage("a.txt");
    t.commit("first");

    t.delete("a.txt");
    let report = t.repo.stage(&rp("a.txt"), false).unwrap();
    let copy = t
        .repo
        .paths()
        .staged_copy_path(Op::Rem, &report.entry_id.unwrap(), &rp("a.txt"));
    assert_eq!(fs::read_to_string(copy).unwrap(), "committed");
}

// =============================================================================
// Ignore rules
// =============================================================================

#[test]
fn ignored_paths_are_skipped_unless_forced() {
    let t = TestRepo::new();
    t.write(".sheafignore", "*.log\nbuild/\n");
    t.write("debug.log", "noise");

    let report = t.repo.stage(&rp("debug.log"), false).unwrap();
    assert_eq!(report.outcome, StageOutcome::Ignored);
    assert_eq!(report.outcome.code(), 2);
    assert!(t.staged_ops().is_empty());

    let forced = t.repo.stage(&rp("debug.log"), true).unwrap();
    assert_eq!(forced.outcome, StageOutcome::NewFile);
}

#[test]
fn stage_all_walks_the_tree_and_respects_ignores() {
    let t = TestRepo::new();
    t.write(".sheafignore", "build/\n");
    t.write("a.txt", "a");
    t.write("src/lib.rs", "lib");
    t.write("build/out.bin", "bin");

    let reports = t.repo.stage_all(false).unwrap();
    let staged: Vec<String> = reports.iter().map(|r| r.path.to_string()).collect();
    assert_eq!(staged, vec![".sheafignore", "a.txt", "src/lib.rs"]);

    let forced = t.repo.stage_all(true).unwrap();
    assert!(forced
        .iter()
        .any(|r| r.path.as_str() == "build/out.bin" && r.outcome == StageOutcome::NewFile));
}

#[test]
fn stage_all_picks_up_deleted_files() {
    let t = TestRepo::new();
    t.write("keep.txt", "k");
    t.write("gone.txt", "g");
    t.repo.stage_all(false).unwrap();
    t.commit("first");

    t.delete("gone.txt");
    let reports = t.repo.stage_all(false).unwrap();
    let gone = reports
        .iter()
        .find(|r| r.path.as_str() == "gone.txt")
        .unwrap();
    assert_eq!(gone.outcome, StageOutcome::NewRemoval);
    assert_eq!(t.staged_ops(), vec![(Op::Rem, "gone.txt".to_string())]);
}

#[test]
fn stage_dir_limits_to_the_directory() {
    let t = TestRepo::new();
    t.write("docs/a.md", "a");
    t.write("docs/deep/b.md", "b");
    t.write("src/c.rs", "c");

    let reports = t.repo.stage_dir(&rp("docs"), false).unwrap();
    let staged: Vec<String> = reports.iter().map(|r| r.path.to_string()).collect();
    assert_eq!(staged, vec!["docs/a.md", "docs/deep/b.md"]);
}

// =============================================================================
// Unstaging
// =============================================================================

#[test]
fn unstage_discards_entry_and_copy() {
    let t = TestRepo::new();
    t.write("a.txt", "a");
    let report = t.repo.stage(&rp("a.txt"), false).unwrap();
    let copy_dir = t
        .repo
        .paths()
        .staged_copy_dir(Op::Add, &report.entry_id.unwrap());
    assert!(copy_dir.is_dir());

    let removed = t.repo.unstage(&rp("a.txt")).unwrap().unwrap();
    assert_eq!(removed.op, Op::Add);
    assert!(!copy_dir.exists());
    assert!(t.staged_ops().is_empty());
    assert!(t.path().join("a.txt").is_file());

    assert!(t.repo.unstage(&rp("a.txt")).unwrap().is_none());
}

#[test]
fn staging_state_survives_reopening() {
    let t = TestRepo::new();
    t.write("a.txt", "a");
    t.stage("a.txt");

    let reopened = Repository::open(t.path()).unwrap();
    let staged = reopened.staged().unwrap();
    assert_eq!(staged.len(), 1);
    assert_eq!(staged[0].path, rp("a.txt"));
}

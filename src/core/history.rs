//! core::history
//!
//! Reading a branch's commits back with their metadata.

use log::debug;

use crate::core::chain::CommitChain;
use crate::core::error::Result;
use crate::core::metadata::{self, CommitMetadata, CommitRecord, StagingEntry};
use crate::core::paths::SheafPaths;
use crate::core::types::BranchName;

/// One commit as shown by `history`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub record: CommitRecord,
    pub metadata: CommitMetadata,
    /// The staging log as it was when the commit was made.
    pub changes: Vec<StagingEntry>,
}

/// The commits of `branch`, newest first, at most `limit` of them.
pub fn history(
    paths: &SheafPaths,
    branch: &BranchName,
    limit: Option<usize>,
) -> Result<Vec<HistoryEntry>> {
    let chain = CommitChain::load(paths, branch)?;
    let ordered = chain.ordered()?;
    let take = limit.unwrap_or(ordered.len());
    debug!("history of {}: {} commits, showing {}", branch, ordered.len(), take);

    ordered
        .into_iter()
        .rev()
        .take(take)
        .map(|record| -> Result<HistoryEntry> {
            let meta = metadata::read_record(&paths.commit_metadata_path(&record.id))?;
            let changes = metadata::read_json_or_default(&paths.commit_log_path(&record.id))?;
            Ok(HistoryEntry {
                record: record.clone(),
                metadata: meta,
                changes,
            })
        })
        .collect()
}

//! core::metadata::schema
//!
//! On-disk record shapes.
//!
//! # Schema Design
//!
//! - Field names are PascalCase (`Id`, `Op`, `Path`, `CommitId`, ...)
//! - Unknown fields are rejected
//! - A commit's successor pointer is written as `""` when absent, so a
//!   chain tail reads `"Next": ""`
//!
//! # Example
//!
//! ```
//! use sheaf::core::metadata::schema::StagingEntry;
//! use sheaf::core::types::{Op, RepoPath};
//!
//! let entry = StagingEntry::new(Op::Add, RepoPath::new("a.txt").unwrap());
//! let json = serde_json::to_string(&entry).unwrap();
//! assert!(json.contains("\"Op\":\"ADD\""));
//! assert!(json.contains("\"Path\":\"a.txt\""));
//! ```

use serde::{Deserialize, Serialize};

use crate::core::types::{BranchName, CommitId, EntryId, FileId, Op, RepoPath, UtcTimestamp};

/// One pending operation in the staging log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct StagingEntry {
    pub id: EntryId,
    pub op: Op,
    pub path: RepoPath,
}

impl StagingEntry {
    /// Create an entry with a freshly generated id.
    pub fn new(op: Op, path: RepoPath) -> Self {
        Self {
            id: EntryId::generate(),
            op,
            path,
        }
    }
}

/// One tracked path in a commit's file-list snapshot.
///
/// `commit_id` names the commit whose content area holds the bytes, which
/// is usually older than the snapshot's own commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct FileListEntry {
    pub id: FileId,
    pub commit_id: CommitId,
    pub path: RepoPath,
}

/// One node of a branch's commit chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct CommitRecord {
    pub id: CommitId,
    pub timestamp: UtcTimestamp,
    /// Successor in the chain; `None` marks the tail.
    #[serde(with = "next_pointer")]
    pub next: Option<CommitId>,
}

impl CommitRecord {
    /// A new chain tail.
    pub fn tail(id: CommitId, timestamp: UtcTimestamp) -> Self {
        Self {
            id,
            timestamp,
            next: None,
        }
    }

    /// Whether this record is a chain tail.
    pub fn is_tail(&self) -> bool {
        self.next.is_none()
    }
}

/// Author and message of a commit. Immutable once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct CommitMetadata {
    /// `"Name <email>"`, or empty when either half is unset.
    pub author: String,
    pub message: String,
}

/// The default and current branch pointers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct BranchesMetadata {
    pub default: BranchName,
    pub current: BranchName,
}

impl BranchesMetadata {
    /// Pointers for a fresh repository where one branch is both.
    pub fn single(branch: BranchName) -> Self {
        Self {
            default: branch.clone(),
            current: branch,
        }
    }
}

mod next_pointer {
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::core::types::CommitId;

    pub fn serialize<S>(next: &Option<CommitId>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(next.as_ref().map(CommitId::as_str).unwrap_or(""))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<CommitId>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        if raw.is_empty() {
            return Ok(None);
        }
        CommitId::new(raw)
            .map(Some)
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staging_entry_field_names() {
        let entry = StagingEntry {
            id: EntryId::new("e1").unwrap(),
            op: Op::Rem,
            path: RepoPath::new("dir/x.txt").unwrap(),
        };
        let json = serde_json::to_string(&entry).unwrap();
        assert_eq!(json, r#"{"Id":"e1","Op":"REM","Path":"dir/x.txt"}"#);
    }

    #[test]
    fn file_list_entry_field_names() {
        let entry = FileListEntry {
            id: EntryId::new("f1").unwrap(),
            commit_id: CommitId::new("c1").unwrap(),
            path: RepoPath::new("a.txt").unwrap(),
        };
        let json = serde_json::to_string(&entry).unwrap();
        assert_eq!(json, r#"{"Id":"f1","CommitId":"c1","Path":"a.txt"}"#);
    }

    #[test]
    fn tail_next_is_empty_string() {
        let record = CommitRecord::tail(CommitId::new("c1").unwrap(), UtcTimestamp::now());
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains(r#""Next":"""#));

        let parsed: CommitRecord = serde_json::from_str(&json).unwrap();
        assert!(parsed.is_tail());
    }

    #[test]
    fn linked_next_roundtrips() {
        let json = r#"{"Id":"c1","Timestamp":"2024-01-02T03:04:05Z","Next":"c2"}"#;
        let parsed: CommitRecord = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.next, Some(CommitId::new("c2").unwrap()));
    }

    #[test]
    fn rejects_unknown_fields() {
        let json = r#"{"Id":"e1","Op":"ADD","Path":"a","Extra":1}"#;
        assert!(serde_json::from_str::<StagingEntry>(json).is_err());
    }

    #[test]
    fn rejects_unknown_op() {
        let json = r#"{"Id":"e1","Op":"MOVE","Path":"a"}"#;
        assert!(serde_json::from_str::<StagingEntry>(json).is_err());
    }

    #[test]
    fn branches_metadata_field_names() {
        let meta = BranchesMetadata::single(BranchName::new("main").unwrap());
        let json = serde_json::to_string(&meta).unwrap();
        assert_eq!(json, r#"{"Default":"main","Current":"main"}"#);
    }
}

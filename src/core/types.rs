//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`BranchName`] - Validated branch name
//! - [`EntryId`] - Opaque id of a staging entry (and of the file copy it becomes)
//! - [`CommitId`] - Opaque id of a commit
//! - [`Op`] - Pending operation kind (ADD / MOD / REM)
//! - [`RepoPath`] - Normalized working-tree relative path
//! - [`UtcTimestamp`] - RFC3339 timestamp
//!
//! # Validation
//!
//! These types enforce validity at construction time. Invalid values
//! cannot be represented, so a branch name that would escape the
//! `branches/` directory or a path that points into `.sheaf/` is rejected
//! before any file is touched.
//!
//! # Examples
//!
//! ```
//! use sheaf::core::types::{BranchName, RepoPath};
//!
//! let branch = BranchName::new("feature/login-form").unwrap();
//! let path = RepoPath::new("src/main.rs").unwrap();
//! assert_eq!(path.file_name(), "main.rs");
//!
//! assert!(BranchName::new("feature//login").is_err());
//! assert!(RepoPath::new("../outside.txt").is_err());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::core::paths::SHEAF_DIR;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid branch name: {0}")]
    InvalidBranchName(String),

    #[error("invalid id: {0}")]
    InvalidId(String),

    #[error("invalid path: {0}")]
    InvalidPath(String),
}

/// A validated branch name.
///
/// Grammar:
/// - Must start with an ASCII letter or digit
/// - May contain ASCII letters, digits, `-`, `_` and `/`
/// - Cannot contain `--`, `__` or `//`
/// - Cannot end with `/`
///
/// `/` is allowed so names like `feature/login` group naturally; each
/// branch lives under `branches/<name>/commits.json`.
///
/// # Example
///
/// ```
/// use sheaf::core::types::BranchName;
///
/// assert!(BranchName::new("main").is_ok());
/// assert!(BranchName::new("release/2024-q1").is_ok());
///
/// assert!(BranchName::new("").is_err());
/// assert!(BranchName::new("-dash").is_err());
/// assert!(BranchName::new("a__b").is_err());
/// assert!(BranchName::new("trailing/").is_err());
/// assert!(BranchName::new("has.dot").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BranchName(String);

impl BranchName {
    /// Create a new validated branch name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidBranchName` if the name violates the grammar.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        Self::validate(&name)?;
        Ok(Self(name))
    }

    fn validate(name: &str) -> Result<(), TypeError> {
        let first = match name.chars().next() {
            Some(c) => c,
            None => {
                return Err(TypeError::InvalidBranchName(
                    "branch name cannot be empty".into(),
                ))
            }
        };

        if !first.is_ascii_alphanumeric() {
            return Err(TypeError::InvalidBranchName(format!(
                "branch name must start with a letter or digit: '{name}'"
            )));
        }

        for doubled in ["--", "__", "//"] {
            if name.contains(doubled) {
                return Err(TypeError::InvalidBranchName(format!(
                    "branch name cannot contain '{doubled}'"
                )));
            }
        }

        if name.ends_with('/') {
            return Err(TypeError::InvalidBranchName(
                "branch name cannot end with '/'".into(),
            ));
        }

        if let Some(c) = name
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '/')))
        {
            return Err(TypeError::InvalidBranchName(format!(
                "branch name cannot contain '{c}'"
            )));
        }

        Ok(())
    }

    /// Get the branch name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for BranchName {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<BranchName> for String {
    fn from(name: BranchName) -> Self {
        name.0
    }
}

impl AsRef<str> for BranchName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BranchName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Generate a fresh random opaque id (32 lowercase hex characters).
fn random_hex() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Ids are opaque tokens, but they become directory names, so only
/// ASCII alphanumerics are accepted.
fn validate_id(kind: &str, id: &str) -> Result<(), TypeError> {
    if id.is_empty() {
        return Err(TypeError::InvalidId(format!("{kind} id cannot be empty")));
    }
    if !id.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(TypeError::InvalidId(format!(
            "{kind} id must be alphanumeric: '{id}'"
        )));
    }
    Ok(())
}

/// Opaque id of a staging entry.
///
/// When the entry is committed the same id names the file's copy inside
/// the commit's content area, so it doubles as the file id of a
/// [`FileListEntry`](crate::core::metadata::FileListEntry).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntryId(String);

impl EntryId {
    /// Generate a new random entry id.
    pub fn generate() -> Self {
        Self(random_hex())
    }

    /// Create an entry id from an existing string.
    pub fn new(id: impl Into<String>) -> Result<Self, TypeError> {
        let id = id.into();
        validate_id("entry", &id)?;
        Ok(Self(id))
    }

    /// Get the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for EntryId {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<EntryId> for String {
    fn from(id: EntryId) -> Self {
        id.0
    }
}

impl std::fmt::Display for EntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Id of a committed file copy. The entry id carries over at commit time.
pub type FileId = EntryId;

/// Opaque id of a commit.
///
/// # Example
///
/// ```
/// use sheaf::core::types::CommitId;
///
/// let id = CommitId::generate();
/// assert_eq!(id.as_str().len(), 32);
/// assert_eq!(id.short(10).len(), 10);
///
/// assert!(CommitId::new("not a commit").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CommitId(String);

impl CommitId {
    /// Generate a new random commit id.
    pub fn generate() -> Self {
        Self(random_hex())
    }

    /// Create a commit id from an existing string.
    pub fn new(id: impl Into<String>) -> Result<Self, TypeError> {
        let id = id.into();
        validate_id("commit", &id)?;
        Ok(Self(id))
    }

    /// Get an abbreviated form of the id.
    pub fn short(&self, len: usize) -> &str {
        let end = len.min(self.0.len());
        &self.0[..end]
    }

    /// Get the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CommitId {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<CommitId> for String {
    fn from(id: CommitId) -> Self {
        id.0
    }
}

impl std::fmt::Display for CommitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of a pending staging operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Op {
    /// A file that was never committed.
    #[serde(rename = "ADD")]
    Add,
    /// A committed file whose content changed.
    #[serde(rename = "MOD")]
    Mod,
    /// A committed file that was deleted from the working tree.
    #[serde(rename = "REM")]
    Rem,
}

impl Op {
    /// Name of the staging subdirectory holding copies for this operation.
    pub fn staging_dir(self) -> &'static str {
        match self {
            Op::Add => "added",
            Op::Mod => "modified",
            Op::Rem => "removed",
        }
    }

    /// The on-disk tag (`ADD`, `MOD`, `REM`).
    pub fn as_str(self) -> &'static str {
        match self {
            Op::Add => "ADD",
            Op::Mod => "MOD",
            Op::Rem => "REM",
        }
    }

    /// All operations, in display order.
    pub const ALL: [Op; 3] = [Op::Add, Op::Mod, Op::Rem];
}

impl std::fmt::Display for Op {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A normalized path relative to the working-tree root.
///
/// Components are joined with `/`, there are no `.` or `..` components,
/// and the path never points into the `.sheaf` directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RepoPath(String);

impl RepoPath {
    /// Create a validated repository path.
    ///
    /// Backslashes are treated as separators so the on-disk form is
    /// stable across platforms.
    pub fn new(path: impl Into<String>) -> Result<Self, TypeError> {
        let raw = path.into();
        let normalized = raw.replace('\\', "/");

        if normalized.starts_with('/') {
            return Err(TypeError::InvalidPath(format!(
                "path must be relative to the working tree: '{raw}'"
            )));
        }

        let mut components = Vec::new();
        for component in normalized.split('/') {
            match component {
                "" | "." => continue,
                ".." => {
                    return Err(TypeError::InvalidPath(format!(
                        "path escapes the working tree: '{raw}'"
                    )))
                }
                c => components.push(c),
            }
        }

        if components.is_empty() {
            return Err(TypeError::InvalidPath(format!(
                "path does not name a file: '{raw}'"
            )));
        }
        if components[0] == SHEAF_DIR {
            return Err(TypeError::InvalidPath(format!(
                "path points into the repository directory: '{raw}'"
            )));
        }

        Ok(Self(components.join("/")))
    }

    /// The final path component.
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Iterate over path components.
    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }

    /// Get the path as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RepoPath {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<RepoPath> for String {
    fn from(path: RepoPath) -> Self {
        path.0
    }
}

impl AsRef<str> for RepoPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RepoPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A UTC timestamp, serialized as RFC3339.
///
/// # Example
///
/// ```
/// use sheaf::core::types::UtcTimestamp;
///
/// let now = UtcTimestamp::now();
/// println!("Current time: {}", now);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UtcTimestamp(chrono::DateTime<chrono::Utc>);

impl UtcTimestamp {
    /// Create a timestamp for the current moment.
    pub fn now() -> Self {
        Self(chrono::Utc::now())
    }

    /// Create a timestamp from a chrono DateTime.
    pub fn from_datetime(dt: chrono::DateTime<chrono::Utc>) -> Self {
        Self(dt)
    }

    /// Get the underlying datetime.
    pub fn as_datetime(&self) -> &chrono::DateTime<chrono::Utc> {
        &self.0
    }

    /// Human-friendly elapsed time relative to now ("3 minutes ago").
    pub fn time_ago(&self) -> String {
        let elapsed = chrono::Utc::now().signed_duration_since(self.0);
        let (value, unit) = if elapsed.num_days() > 0 {
            (elapsed.num_days(), "day")
        } else if elapsed.num_hours() > 0 {
            (elapsed.num_hours(), "hour")
        } else if elapsed.num_minutes() > 0 {
            (elapsed.num_minutes(), "minute")
        } else {
            return "just now".to_string();
        };
        let plural = if value == 1 { "" } else { "s" };
        format!("{value} {unit}{plural} ago")
    }
}

impl std::fmt::Display for UtcTimestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

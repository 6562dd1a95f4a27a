//! core::metadata::store
//!
//! JSON persistence for metadata records.
//!
//! # Atomicity
//!
//! Every write serializes to a sibling temp file, syncs it and renames it
//! over the target, so a reader sees either the old or the new contents
//! and never a torn file. Writers that read-modify-write must still hold
//! the file's [`ResourceLock`](crate::core::ops::lock::ResourceLock).
//!
//! # Empty files
//!
//! A zero-length (or whitespace-only) file reads as the type's default,
//! which for the collection files is an empty list.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Errors from metadata storage.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("failed to read '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write '{}': {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse '{}': {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to serialize '{}': {source}", .path.display())]
    Serialize {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl MetadataError {
    /// Whether the failure was a missing file.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Read { source, .. } if source.kind() == ErrorKind::NotFound)
    }
}

/// Read and parse a JSON file. A missing file is an error.
pub fn read_json<T>(path: &Path) -> Result<T, MetadataError>
where
    T: DeserializeOwned + Default,
{
    let contents = fs::read_to_string(path).map_err(|source| MetadataError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    if contents.trim().is_empty() {
        return Ok(T::default());
    }

    serde_json::from_str(&contents).map_err(|source| MetadataError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Read and parse a JSON object with no meaningful default.
pub fn read_record<T>(path: &Path) -> Result<T, MetadataError>
where
    T: DeserializeOwned,
{
    let contents = fs::read_to_string(path).map_err(|source| MetadataError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&contents).map_err(|source| MetadataError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Read a JSON file, treating a missing file like an empty one.
pub fn read_json_or_default<T>(path: &Path) -> Result<T, MetadataError>
where
    T: DeserializeOwned + Default,
{
    match read_json(path) {
        Err(e) if e.is_not_found() => Ok(T::default()),
        other => other,
    }
}

/// Serialize `value` and atomically replace `path` with it.
pub fn write_json_atomic<T>(path: &Path, value: &T) -> Result<(), MetadataError>
where
    T: Serialize + ?Sized,
{
    let write_err = |source| MetadataError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(write_err)?;
    }

    let contents = serde_json::to_vec_pretty(value).map_err(|source| MetadataError::Serialize {
        path: path.to_path_buf(),
        source,
    })?;

    let temp_path = temp_path_for(path);
    let mut file = fs::File::create(&temp_path).map_err(write_err)?;
    file.write_all(&contents).map_err(write_err)?;
    file.sync_all().map_err(write_err)?;
    drop(file);

    if let Err(source) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(write_err(source));
    }
    Ok(())
}

/// Sibling temp file, unique per process so concurrent writers never share one.
fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.{}.tmp", name, std::process::id()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::metadata::schema::CommitMetadata;
    use tempfile::TempDir;

    #[test]
    fn empty_file_reads_as_empty_collection() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("logs.json");
        fs::write(&path, "").unwrap();

        let entries: Vec<String> = read_json(&path).unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn missing_file_is_error_unless_defaulted() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("missing.json");

        let err = read_json::<Vec<String>>(&path).unwrap_err();
        assert!(err.is_not_found());

        let entries: Vec<String> = read_json_or_default(&path).unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn write_then_read() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested/metadata.json");
        let meta = CommitMetadata {
            author: "Ada <ada@example.com>".into(),
            message: "first".into(),
        };

        write_json_atomic(&path, &meta).unwrap();
        let parsed: CommitMetadata = read_record(&path).unwrap();
        assert_eq!(parsed, meta);
    }

    #[test]
    fn write_leaves_no_temp_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("list.json");
        write_json_atomic(&path, &vec!["a", "b"]).unwrap();

        let names: Vec<_> = fs::read_dir(temp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["list.json".to_string()]);
    }

    #[test]
    fn parse_error_names_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("bad.json");
        fs::write(&path, "{not json").unwrap();

        let err = read_json::<Vec<String>>(&path).unwrap_err();
        assert!(matches!(err, MetadataError::Parse { .. }));
        assert!(err.to_string().contains("bad.json"));
    }
}

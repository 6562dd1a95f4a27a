//! core::store
//!
//! Id-addressed storage of file byte copies.
//!
//! # Architecture
//!
//! Staged copies and committed copies are plain files placed at locations
//! computed by [`SheafPaths`](crate::core::paths::SheafPaths). The
//! [`ContentStore`] trait is the only way the staging machine and the
//! commit engine move bytes around, so a content-addressed implementation
//! can replace [`FsContentStore`] without touching either of them.
//!
//! # Invariants
//!
//! - `store` never leaves a partially written destination behind on success
//! - The destination carries the source's permission bits
//! - `store` only accepts regular files as sources

use std::fs::{self, File};
use std::io::{BufReader, ErrorKind, Read};
use std::path::{Path, PathBuf};

use log::debug;
use thiserror::Error;

/// Errors from content store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The source file does not exist.
    #[error("source does not exist: {}", .0.display())]
    SourceMissing(PathBuf),

    /// The source exists but is not a regular file.
    #[error("not a regular file: {}", .0.display())]
    NotRegularFile(PathBuf),

    /// A path to be removed does not exist.
    #[error("nothing to remove at {}", .0.display())]
    NotFound(PathBuf),

    /// Underlying filesystem failure.
    #[error("i/o error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Storage of byte copies at caller-chosen locations.
pub trait ContentStore {
    /// Copy `source` to `destination`, replacing anything already there.
    fn store(&self, source: &Path, destination: &Path) -> Result<(), StoreError>;

    /// Whether the two files have different contents.
    fn differs(&self, a: &Path, b: &Path) -> Result<bool, StoreError>;

    /// Delete a file or directory tree. Missing paths are an error.
    fn remove(&self, path: &Path) -> Result<(), StoreError>;

    /// Delete a file or directory tree if it exists.
    ///
    /// Returns whether anything was removed.
    fn remove_if_present(&self, path: &Path) -> Result<bool, StoreError> {
        match self.remove(path) {
            Ok(()) => Ok(true),
            Err(StoreError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/// [`ContentStore`] backed directly by the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsContentStore;

const COMPARE_CHUNK: usize = 64 * 1024;

impl ContentStore for FsContentStore {
    fn store(&self, source: &Path, destination: &Path) -> Result<(), StoreError> {
        let meta = match fs::metadata(source) {
            Ok(meta) => meta,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::SourceMissing(source.to_path_buf()))
            }
            Err(e) => return Err(StoreError::io(source, e)),
        };
        if !meta.is_file() {
            return Err(StoreError::NotRegularFile(source.to_path_buf()));
        }

        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }

        // fs::copy would inherit the old destination's read-only bit.
        match fs::remove_file(destination) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(StoreError::io(destination, e)),
        }

        fs::copy(source, destination).map_err(|e| StoreError::io(destination, e))?;
        fs::set_permissions(destination, meta.permissions())
            .map_err(|e| StoreError::io(destination, e))?;

        let file = File::open(destination).map_err(|e| StoreError::io(destination, e))?;
        file.sync_all().map_err(|e| StoreError::io(destination, e))?;

        debug!("stored {} -> {}", source.display(), destination.display());
        Ok(())
    }

    fn differs(&self, a: &Path, b: &Path) -> Result<bool, StoreError> {
        let meta_a = fs::metadata(a).map_err(|e| StoreError::io(a, e))?;
        let meta_b = fs::metadata(b).map_err(|e| StoreError::io(b, e))?;
        if meta_a.len() != meta_b.len() {
            return Ok(true);
        }

        let mut reader_a = BufReader::new(File::open(a).map_err(|e| StoreError::io(a, e))?);
        let mut reader_b = BufReader::new(File::open(b).map_err(|e| StoreError::io(b, e))?);
        let mut buf_a = vec![0u8; COMPARE_CHUNK];
        let mut buf_b = vec![0u8; COMPARE_CHUNK];

        loop {
            let n = read_full(&mut reader_a, &mut buf_a).map_err(|e| StoreError::io(a, e))?;
            let m = read_full(&mut reader_b, &mut buf_b).map_err(|e| StoreError::io(b, e))?;
            if n != m || buf_a[..n] != buf_b[..m] {
                return Ok(true);
            }
            if n == 0 {
                return Ok(false);
            }
        }
    }

    fn remove(&self, path: &Path) -> Result<(), StoreError> {
        let meta = match fs::symlink_metadata(path) {
            Ok(meta) => meta,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::NotFound(path.to_path_buf()))
            }
            Err(e) => return Err(StoreError::io(path, e)),
        };

        let result = if meta.is_dir() {
            fs::remove_dir_all(path)
        } else {
            fs::remove_file(path)
        };
        result.map_err(|e| StoreError::io(path, e))?;
        debug!("removed {}", path.display());
        Ok(())
    }
}

/// Fill `buf` as far as the reader allows, returning the byte count.
fn read_full(reader: &mut impl Read, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

//! core::metadata
//!
//! Metadata record shapes and their JSON storage.
//!
//! # Modules
//!
//! - [`schema`] - Staging entries, file-list entries, commit records,
//!   commit metadata and branch pointers
//! - [`store`] - Atomic JSON read/write helpers
//!
//! # Architecture
//!
//! Every structured file under `.sheaf/` is one JSON document: an array
//! for collections (`logs.json`, `fileList.json`, `commits.json`) and an
//! object for single records (`metadata.json`, `config.json`).

pub mod schema;
pub mod store;

pub use schema::{BranchesMetadata, CommitMetadata, CommitRecord, FileListEntry, StagingEntry};
pub use store::{
    read_json, read_json_or_default, read_record, write_json_atomic, MetadataError,
};

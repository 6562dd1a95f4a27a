//! core
//!
//! Core domain types, storage, and operations for sheaf.
//!
//! # Modules
//!
//! - [`types`] - Strong types: BranchName, EntryId, CommitId, RepoPath, etc.
//! - [`paths`] - Centralized path routing for `.sheaf` storage
//! - [`ops`] - Cross-process locking
//! - [`store`] - Content store for staged and committed file copies
//! - [`metadata`] - JSON record schema and atomic storage
//! - [`staging`] - Staging log and staging state machine
//! - [`snapshot`] - Per-commit file lists
//! - [`chain`] - Branch commit chains
//! - [`commit`] - Commit engine
//! - [`branch`] - Branch pointers, creation and checkout
//! - [`status`] - Working-tree comparison
//! - [`history`] - Commit history
//! - [`config`] - Author configuration
//! - [`ignore`] - Ignore rules
//! - [`error`] - Repository error type
//! - [`repo`] - Repository handle tying the above together
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - Schemas are strict and self-describing
//! - Content is written before anything that makes it reachable

pub mod branch;
pub mod chain;
pub mod commit;
pub mod config;
pub mod error;
pub mod history;
pub mod ignore;
pub mod metadata;
pub mod ops;
pub mod paths;
pub mod repo;
pub mod snapshot;
pub mod staging;
pub mod status;
pub mod store;
pub mod types;

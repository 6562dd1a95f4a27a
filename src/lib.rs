//! sheaf - A minimal file-system-backed version control engine
//!
//! sheaf stages file changes, records them as immutable commits holding
//! full file copies, and keeps per-branch commit chains, all as plain
//! files and JSON under a `.sheaf/` directory.
//!
//! # Architecture
//!
//! The codebase follows a strict layered architecture:
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to core)
//! - [`core`] - Domain types, storage, staging, commits and branches
//! - [`ui`] - User output utilities
//!
//! # Correctness Invariants
//!
//! sheaf maintains the following invariants:
//!
//! 1. Every file mutated by more than one process is written under its lock
//! 2. File content is stored before the record that references it
//! 3. A branch's commit chain is a single linear list with one tail
//! 4. A checkout never overwrites uncommitted work

pub mod cli;
pub mod core;
pub mod ui;

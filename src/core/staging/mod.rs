//! core::staging
//!
//! Pending changes between commits.
//!
//! # Modules
//!
//! - [`log`] - The ordered staging log and its integrity check
//! - [`machine`] - The per-path staging state machine
//!
//! # Storage
//!
//! ```text
//! staging/logs.json
//! staging/added/<id>/<file name>
//! staging/modified/<id>/<file name>
//! staging/removed/<id>/<file name>
//! ```

pub mod log;
pub mod machine;

pub use self::log::{OpFilter, StagingLog};
pub use machine::{StageOutcome, StageReport, StagingMachine};

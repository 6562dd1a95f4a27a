//! ui
//!
//! User interaction utilities.
//!
//! # Modules
//!
//! - [`output`] - Output formatting and display
//!
//! # Design
//!
//! All user-facing text goes through this module so that `--quiet` is
//! honoured in one place. Diagnostics for developers go through the `log`
//! macros instead.

pub mod output;

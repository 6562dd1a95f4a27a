//! cli
//!
//! Command-line interface layer for sheaf.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Install the logger
//! - Delegate to command handlers
//!
//! # Architecture
//!
//! The CLI layer is thin. It parses arguments via clap and dispatches to
//! handlers that call [`crate::core::repo::Repository`]. All repository
//! state changes flow through the core.

pub mod args;
pub mod commands;

pub use args::{Cli, Shell};

use std::path::PathBuf;

use anyhow::{Context as _, Result};

use crate::core::repo::Repository;
use crate::ui::output::Verbosity;

/// Execution context shared by all command handlers.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// Working directory override.
    pub cwd: Option<PathBuf>,
    /// Debug logging enabled.
    pub debug: bool,
    /// Quiet mode (minimal output).
    pub quiet: bool,
}

impl Context {
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.quiet, self.debug)
    }

    /// The directory the command runs in, made absolute.
    pub fn cwd(&self) -> Result<PathBuf> {
        let current = std::env::current_dir().context("Failed to read current directory")?;
        let cwd = match &self.cwd {
            Some(dir) => current.join(dir),
            None => current,
        };
        cwd.canonicalize()
            .with_context(|| format!("Cannot access directory {}", cwd.display()))
    }

    /// Open the repository containing the working directory.
    pub fn open_repo(&self) -> Result<Repository> {
        let cwd = self.cwd()?;
        Repository::open(&cwd).context("Failed to open repository")
    }
}

/// Install `env_logger`, honouring `RUST_LOG` unless `--debug` is given.
fn init_logging(debug: bool) {
    let env = env_logger::Env::default().default_filter_or("warn");
    let mut builder = env_logger::Builder::from_env(env);
    if debug {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.format_timestamp(None);
    let _ = builder.try_init();
}

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();
    init_logging(cli.debug);

    let ctx = Context {
        cwd: cli.cwd.clone(),
        debug: cli.debug,
        quiet: cli.quiet,
    };

    commands::dispatch(cli.command, &ctx)
}

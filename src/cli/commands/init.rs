//! init command - Create a repository in the working directory

use crate::cli::Context;
use crate::core::repo::Repository;
use crate::ui::output;
use anyhow::{Context as _, Result};

/// Create an empty repository in the working directory.
pub fn init(ctx: &Context) -> Result<()> {
    let cwd = ctx.cwd()?;
    let repo = Repository::init(&cwd).context("Failed to initialize repository")?;

    output::success(
        format!(
            "Initialized empty sheaf repository in {}",
            repo.paths().root().display()
        ),
        ctx.verbosity(),
    );
    Ok(())
}

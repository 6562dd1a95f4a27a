//! purge command - Delete the repository

use crate::cli::Context;
use crate::ui::output;
use anyhow::{bail, Context as _, Result};

/// Delete `.sheaf/`. Requires `--yes`.
pub fn purge(ctx: &Context, yes: bool) -> Result<()> {
    let repo = ctx.open_repo()?;
    if !yes {
        bail!(
            "This deletes all history in {}. Re-run with --yes to confirm.",
            repo.paths().root().display()
        );
    }

    let root = repo.paths().root();
    repo.purge().context("Failed to purge repository")?;
    output::success(format!("Removed {}", root.display()), ctx.verbosity());
    Ok(())
}

//! workdir command - List tracked files

use crate::cli::Context;
use crate::ui::output;
use anyhow::{Context as _, Result};

/// Print every path tracked by the latest commit of the current branch.
pub fn workdir(ctx: &Context) -> Result<()> {
    let repo = ctx.open_repo()?;
    let files = repo.tracked_files().context("Failed to read tracked files")?;
    let verbosity = ctx.verbosity();

    if files.is_empty() {
        output::print("No tracked files", verbosity);
        return Ok(());
    }
    for entry in files {
        output::debug(
            format!("{} @ {}/{}", entry.path, entry.commit_id, entry.id),
            verbosity,
        );
        output::print(&entry.path, verbosity);
    }
    Ok(())
}

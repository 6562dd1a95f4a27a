//! commit command - Record staged changes

use crate::cli::Context;
use crate::ui::output;
use anyhow::{bail, Context as _, Result};

/// Commit everything staged onto the current branch.
pub fn commit(ctx: &Context, message: &str) -> Result<()> {
    if message.trim().is_empty() {
        bail!("Commit message cannot be empty");
    }

    let repo = ctx.open_repo()?;
    let summary = repo.commit(message).context("Failed to commit")?;

    let verbosity = ctx.verbosity();
    output::success(
        format!(
            "[{} {}] {}",
            summary.branch,
            summary.commit_id().short(8),
            message.lines().next().unwrap_or(message)
        ),
        verbosity,
    );
    output::print(
        format!(
            " {} added, {} modified, {} removed; {} tracked",
            summary.added,
            summary.modified,
            summary.removed,
            output::plural(summary.file_list.len(), "file", "files")
        ),
        verbosity,
    );
    Ok(())
}

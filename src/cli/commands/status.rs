//! status command - Show the working state of the current branch

use crate::cli::Context;
use crate::ui::output;
use anyhow::{Context as _, Result};

/// Print staged, modified, deleted and untracked paths.
pub fn status(ctx: &Context) -> Result<()> {
    let repo = ctx.open_repo()?;
    let status = repo.status().context("Failed to read status")?;
    let verbosity = ctx.verbosity();

    output::print(format!("On branch {}", status.branch), verbosity);
    if status.is_clean() {
        output::print("Nothing to commit, working tree clean", verbosity);
        return Ok(());
    }

    let staged: Vec<String> = status
        .staged
        .iter()
        .map(|e| format!("{}  {}", e.op, e.path))
        .collect();
    let sections = [
        output::format_section("Staged changes", &staged),
        output::format_section("Modified, not staged", &status.modified),
        output::format_section("Deleted, not staged", &status.deleted),
        output::format_section("Untracked", &status.untracked),
    ];
    for section in sections.into_iter().flatten() {
        output::print("", verbosity);
        output::print(section, verbosity);
    }
    Ok(())
}

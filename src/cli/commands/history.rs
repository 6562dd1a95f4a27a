//! history command - Show the commits of the current branch

use crate::cli::Context;
use crate::ui::output;
use anyhow::{Context as _, Result};

/// Print up to `limit` commits, newest first.
pub fn history(ctx: &Context, limit: usize) -> Result<()> {
    let repo = ctx.open_repo()?;
    let entries = repo.history(Some(limit)).context("Failed to read history")?;
    let verbosity = ctx.verbosity();

    if entries.is_empty() {
        output::print("No commits yet", verbosity);
        return Ok(());
    }

    for (i, entry) in entries.iter().enumerate() {
        if i > 0 {
            output::print("", verbosity);
        }
        output::print(format!("commit {}", entry.record.id), verbosity);
        if !entry.metadata.author.is_empty() {
            output::print(format!("Author: {}", entry.metadata.author), verbosity);
        }
        output::print(
            format!(
                "Date:   {} ({})",
                entry.record.timestamp,
                entry.record.timestamp.time_ago()
            ),
            verbosity,
        );
        output::print("", verbosity);
        for line in entry.metadata.message.lines() {
            output::print(format!("    {line}"), verbosity);
        }
        for change in &entry.changes {
            output::debug(format!("{} {}", change.op, change.path), verbosity);
        }
    }
    Ok(())
}

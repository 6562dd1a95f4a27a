//! rm command - Remove paths from the staging area

use crate::cli::Context;
use crate::ui::output;
use anyhow::{Context as _, Result};

/// Discard the staged change of each path.
pub fn rm(ctx: &Context, inputs: &[String]) -> Result<()> {
    let repo = ctx.open_repo()?;
    let cwd = ctx.cwd()?;
    let verbosity = ctx.verbosity();

    for input in inputs {
        let path = repo.resolve_path(&cwd, input)?;
        match repo
            .unstage(&path)
            .with_context(|| format!("Failed to unstage '{input}'"))?
        {
            Some(entry) => output::success(
                format!("{}: unstaged ({})", entry.path, entry.op),
                verbosity,
            ),
            None => output::warn(format!("{path}: not staged"), verbosity),
        }
    }
    Ok(())
}

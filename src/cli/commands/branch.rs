//! branch command - List, create, delete and switch branches

use crate::cli::Context;
use crate::core::branch::BranchSource;
use crate::core::types::{BranchName, CommitId};
use crate::ui::output;
use anyhow::{Context as _, Result};

/// List all branches, marking the current and the default one.
pub fn list(ctx: &Context) -> Result<()> {
    let repo = ctx.open_repo()?;
    let branches = repo.branches().list().context("Failed to list branches")?;
    let verbosity = ctx.verbosity();

    for info in branches {
        let marker = if info.is_current { "* " } else { "  " };
        let suffix = if info.is_default { " (default)" } else { "" };
        output::print(format!("{marker}{}{suffix}", info.name), verbosity);
    }
    Ok(())
}

/// Print the current branch.
pub fn current(ctx: &Context) -> Result<()> {
    let repo = ctx.open_repo()?;
    println!("{}", repo.current_branch()?);
    Ok(())
}

/// Print the default branch.
pub fn default(ctx: &Context) -> Result<()> {
    let repo = ctx.open_repo()?;
    println!("{}", repo.branches().default_branch()?);
    Ok(())
}

/// Create a branch and switch to it.
pub fn create(
    ctx: &Context,
    name: &str,
    from_commit: Option<&str>,
    from_branch: Option<&str>,
) -> Result<()> {
    let repo = ctx.open_repo()?;
    let name = BranchName::new(name)?;
    let source = BranchSource {
        commit: from_commit.map(CommitId::new).transpose()?,
        branch: from_branch.map(BranchName::new).transpose()?,
    };

    repo.branches()
        .create(&name, &source)
        .with_context(|| format!("Failed to create branch '{name}'"))?;
    output::success(
        format!("Created branch '{name}' and switched to it"),
        ctx.verbosity(),
    );
    Ok(())
}

/// Delete a branch.
pub fn drop_branch(ctx: &Context, name: &str) -> Result<()> {
    let repo = ctx.open_repo()?;
    let name = BranchName::new(name)?;
    repo.branches()
        .drop_branch(&name)
        .with_context(|| format!("Failed to delete branch '{name}'"))?;
    output::success(format!("Deleted branch '{name}'"), ctx.verbosity());
    Ok(())
}

/// Check out a branch.
pub fn switch(ctx: &Context, name: &str) -> Result<()> {
    let repo = ctx.open_repo()?;
    let name = BranchName::new(name)?;
    repo.branches()
        .switch(&name)
        .with_context(|| format!("Failed to switch to branch '{name}'"))?;
    output::success(format!("Switched to branch '{name}'"), ctx.verbosity());
    Ok(())
}

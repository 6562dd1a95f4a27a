//! config command - Get, set, or list configuration values

use crate::cli::Context;
use crate::core::config::{ConfigKey, ConfigScope};
use crate::core::types::BranchName;
use crate::ui::output;
use anyhow::{Context as _, Result};

/// Key naming the default branch, handled by the branch manager.
const DEFAULT_BRANCH_KEY: &str = "default-branch";

fn is_default_branch_key(key: &str) -> bool {
    matches!(key, DEFAULT_BRANCH_KEY | "default" | "branch.default")
}

/// Get a configuration value.
pub fn get(ctx: &Context, key: &str) -> Result<()> {
    let repo = ctx.open_repo()?;

    if is_default_branch_key(key) {
        println!("{}", repo.branches().default_branch()?);
        return Ok(());
    }

    let key: ConfigKey = key.parse()?;
    let config = repo.config().context("Failed to load config")?;
    if let Some(value) = config.get(key) {
        println!("{}", value);
    }
    Ok(())
}

/// Set a configuration value.
pub fn set(ctx: &Context, key: &str, value: &str, global: bool) -> Result<()> {
    let verbosity = ctx.verbosity();

    if is_default_branch_key(key) {
        let repo = ctx.open_repo()?;
        let branch = BranchName::new(value)?;
        repo.branches()
            .set_default(&branch)
            .context("Failed to set default branch")?;
        output::success(format!("Set {} = {}", DEFAULT_BRANCH_KEY, branch), verbosity);
        return Ok(());
    }

    let key: ConfigKey = key.parse()?;
    let mut config = if global {
        crate::core::config::Config::load(None).context("Failed to load config")?
    } else {
        ctx.open_repo()?.config().context("Failed to load config")?
    };
    let scope = if global {
        ConfigScope::Global
    } else {
        ConfigScope::Repo
    };

    let path = config
        .set(scope, key, value)
        .context("Failed to write config")?;
    output::success(format!("Set {} = {}", key, value.trim()), verbosity);
    output::debug(format!("wrote {}", path.display()), verbosity);
    Ok(())
}

/// List all configuration values.
pub fn list(ctx: &Context) -> Result<()> {
    let repo = ctx.open_repo()?;
    let config = repo.config().context("Failed to load config")?;

    for key in ConfigKey::ALL {
        println!("{} = {}", key, config.get(key).unwrap_or(""));
    }
    println!(
        "{} = {}",
        DEFAULT_BRANCH_KEY,
        repo.branches().default_branch()?
    );
    Ok(())
}

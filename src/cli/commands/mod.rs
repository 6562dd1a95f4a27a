//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Opens the repository from the execution context
//! 2. Resolves user input (paths, branch names) into core types
//! 3. Calls the core and formats the result
//!
//! Handlers do NOT touch `.sheaf/` directly.

mod add;
mod branch;
mod commit;
mod completion;
mod config_cmd;
mod history;
mod init;
mod purge;
mod rm;
mod status;
mod workdir;

// Re-export command functions for testing and direct invocation
pub use add::add;
pub use branch::{
    create as branch_create, current as branch_current, default as branch_default,
    drop_branch, list as branch_list, switch as branch_switch,
};
pub use commit::commit;
pub use completion::completion;
pub use config_cmd::{get as config_get, list as config_list, set as config_set};
pub use history::history;
pub use init::init;
pub use purge::purge;
pub use rm::rm;
pub use status::status;
pub use workdir::workdir;

use crate::cli::args::{BranchAction, Command, ConfigAction};
use crate::cli::Context;
use anyhow::Result;

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Init => init::init(ctx),
        Command::Add { paths, force } => add::add(ctx, &paths, force),
        Command::Rm { paths } => rm::rm(ctx, &paths),
        Command::Commit { message } => commit::commit(ctx, &message),
        Command::Status => status::status(ctx),
        Command::Workdir => workdir::workdir(ctx),
        Command::History { limit } => history::history(ctx, limit),
        Command::Branch { action } => match action {
            None => branch::list(ctx),
            Some(BranchAction::Current) => branch::current(ctx),
            Some(BranchAction::DefaultBranch) => branch::default(ctx),
            Some(BranchAction::New {
                name,
                from_commit,
                from_branch,
            }) => branch::create(ctx, &name, from_commit.as_deref(), from_branch.as_deref()),
            Some(BranchAction::Drop { name }) => branch::drop_branch(ctx, &name),
            Some(BranchAction::Switch { name }) => branch::switch(ctx, &name),
        },
        Command::Config { action } => match action {
            ConfigAction::Get { key } => config_cmd::get(ctx, &key),
            ConfigAction::Set { key, value, global } => config_cmd::set(ctx, &key, &value, global),
            ConfigAction::List => config_cmd::list(ctx),
        },
        Command::Purge { yes } => purge::purge(ctx, yes),
        Command::Completion { shell } => completion::completion(shell),
    }
}

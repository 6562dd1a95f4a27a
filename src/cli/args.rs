//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--cwd <path>`: Run as if in that directory
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// sheaf - A minimal file-system-backed version control engine
#[derive(Parser, Debug)]
#[command(name = "sheaf")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Run as if sheaf was started in this directory
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create an empty repository in the current directory
    #[command(
        name = "init",
        long_about = "Create an empty repository in the current directory.\n\n\
            Creates the .sheaf directory with an empty staging area, an empty \
            commit store and a single branch named main, which is both the \
            current and the default branch.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Start tracking a directory
    sheaf init

    # Initialize somewhere else
    sheaf --cwd ~/notes init"
    )]
    Init,

    /// Stage files for the next commit
    #[command(
        name = "add",
        long_about = "Stage files for the next commit.\n\n\
            Each path is compared against the staging area and the latest commit, \
            and exactly one change is recorded: a new file, a modification or a \
            removal. Staging a path again after further edits refreshes its staged \
            copy; staging a deleted file records its removal. Paths matching \
            .sheafignore rules are skipped unless --force is given.\n\n\
            '.' stages every change in the working tree; a directory stages every \
            change below it.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Stage one file
    sheaf add notes.txt

    # Stage everything
    sheaf add .

    # Stage a file even though it matches an ignore rule
    sheaf add --force build/keep.log"
    )]
    Add {
        /// Paths to stage
        #[arg(required = true)]
        paths: Vec<String>,

        /// Stage paths even if they match an ignore rule
        #[arg(short, long)]
        force: bool,
    },

    /// Remove paths from the staging area
    #[command(
        name = "rm",
        long_about = "Remove paths from the staging area.\n\n\
            Discards the staged change for each path. The working tree is not \
            touched."
    )]
    Rm {
        /// Paths to unstage
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Record the staged changes as a new commit
    #[command(
        name = "commit",
        long_about = "Record the staged changes as a new commit on the current branch.\n\n\
            The commit stores a full copy of every added or modified file, a \
            snapshot of all tracked paths, and the author from the configured \
            name and email.",
        after_help = "\
WORKFLOW EXAMPLES:
    sheaf add .
    sheaf commit -m \"describe the change\""
    )]
    Commit {
        /// Commit message
        #[arg(short, long)]
        message: String,
    },

    /// Show staged, modified and untracked files
    Status,

    /// List files tracked by the latest commit
    Workdir,

    /// Show the commits of the current branch
    History {
        /// Show at most this many commits
        #[arg(short = 'n', long, default_value_t = 20)]
        limit: usize,
    },

    /// List, create, delete and switch branches
    #[command(
        name = "branch",
        long_about = "List, create, delete and switch branches.\n\n\
            Without a subcommand, lists every branch. The current branch is \
            marked with '*', the default branch with '(default)'.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Start a branch from the current one and switch to it
    sheaf branch new feature

    # Start a branch from an earlier commit
    sheaf branch new hotfix -c <commit-id>

    # Go back
    sheaf branch switch main"
    )]
    Branch {
        #[command(subcommand)]
        action: Option<BranchAction>,
    },

    /// Get or set configuration values
    #[command(
        name = "config",
        long_about = "Get or set configuration values.\n\n\
            Keys: name, email (commit author) and default-branch. Author values \
            are written to the repository config unless --global is given.",
        after_help = "\
WORKFLOW EXAMPLES:
    sheaf config set name \"Ada Lovelace\"
    sheaf config set email ada@example.com --global
    sheaf config get email
    sheaf config list"
    )]
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Delete the repository (the .sheaf directory)
    #[command(
        name = "purge",
        long_about = "Delete the .sheaf directory with all commits, branches and staged \
            changes. Working files are left in place. This cannot be undone."
    )]
    Purge {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },

    /// Generate shell completion scripts
    #[command(
        name = "completion",
        after_help = "\
WORKFLOW EXAMPLES:
    # Bash (add to ~/.bashrc)
    sheaf completion bash >> ~/.bashrc

    # Zsh (add to ~/.zshrc)
    sheaf completion zsh >> ~/.zshrc

    # Fish
    sheaf completion fish > ~/.config/fish/completions/sheaf.fish"
    )]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Branch subcommands.
#[derive(Subcommand, Debug)]
pub enum BranchAction {
    /// Print the current branch
    Current,
    /// Print the default branch
    #[command(name = "default")]
    DefaultBranch,
    /// Create a branch and switch to it
    New {
        /// Name of the new branch
        name: String,
        /// Start from this commit of the source branch
        #[arg(short = 'c', long = "from-commit", value_name = "COMMIT")]
        from_commit: Option<String>,
        /// Copy this branch instead of the current one
        #[arg(short = 'b', long = "from-branch", value_name = "BRANCH")]
        from_branch: Option<String>,
    },
    /// Delete a branch
    Drop {
        /// Branch to delete
        name: String,
    },
    /// Check out a branch
    Switch {
        /// Branch to switch to
        name: String,
    },
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Get a configuration value
    Get {
        /// Configuration key
        key: String,
    },
    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,
        /// Value to set
        value: String,
        /// Write to the user-level config instead of the repository
        #[arg(long)]
        global: bool,
    },
    /// List all configuration values
    List,
}

/// Supported shells for completion
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("sheaf").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn add_takes_paths_and_force() {
        let cli = parse(&["add", "-f", "a.txt", "b.txt"]);
        match cli.command {
            Command::Add { paths, force } => {
                assert_eq!(paths, vec!["a.txt", "b.txt"]);
                assert!(force);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn add_requires_a_path() {
        assert!(Cli::try_parse_from(["sheaf", "add"]).is_err());
    }

    #[test]
    fn history_limit_default() {
        match parse(&["history"]).command {
            Command::History { limit } => assert_eq!(limit, 20),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn branch_new_sources() {
        let cli = parse(&["branch", "new", "x", "-c", "abc", "-b", "main"]);
        match cli.command {
            Command::Branch {
                action:
                    Some(BranchAction::New {
                        name,
                        from_commit,
                        from_branch,
                    }),
            } => {
                assert_eq!(name, "x");
                assert_eq!(from_commit.as_deref(), Some("abc"));
                assert_eq!(from_branch.as_deref(), Some("main"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn bare_branch_lists() {
        assert!(matches!(
            parse(&["branch"]).command,
            Command::Branch { action: None }
        ));
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = parse(&["status", "--debug", "--cwd", "/tmp"]);
        assert!(cli.debug);
        assert_eq!(cli.cwd, Some(PathBuf::from("/tmp")));
    }
}

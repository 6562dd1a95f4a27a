//! add command - Stage paths for the next commit

use std::path::Path;

use crate::cli::Context;
use crate::core::repo::Repository;
use crate::core::staging::StageReport;
use crate::ui::output::{self, Verbosity};
use anyhow::{Context as _, Result};

/// Stage each of `inputs`.
///
/// A directory stages every change below it; the working-tree root stages
/// everything.
pub fn add(ctx: &Context, inputs: &[String], force: bool) -> Result<()> {
    let repo = ctx.open_repo()?;
    let cwd = ctx.cwd()?;
    let verbosity = ctx.verbosity();

    for input in inputs {
        let reports = stage_input(&repo, &cwd, input, force)
            .with_context(|| format!("Failed to stage '{input}'"))?;
        for report in &reports {
            print_report(report, verbosity);
        }
    }
    Ok(())
}

fn stage_input(
    repo: &Repository,
    cwd: &Path,
    input: &str,
    force: bool,
) -> Result<Vec<StageReport>> {
    let target = cwd.join(input);
    if target.is_dir() {
        let canonical = target.canonicalize()?;
        if canonical == repo.work_dir() {
            return Ok(repo.stage_all(force)?);
        }
        let dir = repo.resolve_path(cwd, input)?;
        return Ok(repo.stage_dir(&dir, force)?);
    }

    let path = repo.resolve_path(cwd, input)?;
    Ok(vec![repo.stage(&path, force)?])
}

fn print_report(report: &StageReport, verbosity: Verbosity) {
    output::debug(
        format!("{} -> code {}", report.path, report.outcome.code()),
        verbosity,
    );
    if report.outcome.is_noop() {
        output::print(format!("{}: {}", report.path, report.outcome), verbosity);
    } else {
        output::success(format!("{}: {}", report.path, report.outcome), verbosity);
    }
}

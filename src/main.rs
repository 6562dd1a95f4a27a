//! sheaf binary entry point.

use std::process::ExitCode;

fn main() -> ExitCode {
    match sheaf::cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            sheaf::ui::output::error(format!("{err:#}"));
            ExitCode::FAILURE
        }
    }
}

use std::process::ExitCode;

use sirsim::runner::run_simulation;

fn main() -> ExitCode {
    match run_simulation() {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

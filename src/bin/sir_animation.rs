use std::process::ExitCode;

use sirsim::runner::run_animation;

fn main() -> ExitCode {
    match run_animation() {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

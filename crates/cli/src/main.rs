use std::process::ExitCode;

fn main() -> ExitCode {
    callpilot_cli::run()
}

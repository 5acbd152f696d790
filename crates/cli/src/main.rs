use std::process::ExitCode;

fn main() -> ExitCode {
    yatra_cli::run()
}

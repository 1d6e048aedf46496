use std::process::ExitCode;

fn main() -> ExitCode {
    medbook_cli::run()
}

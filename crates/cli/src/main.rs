use std::process::ExitCode;

fn main() -> ExitCode {
    valet_cli::run()
}

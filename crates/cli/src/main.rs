use std::process::ExitCode;

fn main() -> ExitCode {
    wegroup_cli::run()
}

use std::process::ExitCode;

fn main() -> ExitCode {
    snomed_usage_loader::run()
}

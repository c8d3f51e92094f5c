use std::process::ExitCode;

fn main() -> ExitCode {
    soul_harvest::app::run()
}

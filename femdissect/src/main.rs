use std::process::ExitCode;

fn main() -> ExitCode {
    femdissect::init::run()
}

use std::process::ExitCode;

fn main() -> ExitCode {
    paramconf_cli::run()
}

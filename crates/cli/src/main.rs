use std::process::ExitCode;

fn main() -> ExitCode {
    crewdesk_cli::run()
}

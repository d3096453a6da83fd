use std::process::ExitCode;

fn main() -> anyhow::Result<ExitCode> {
    quotedesk_cli::run()
}

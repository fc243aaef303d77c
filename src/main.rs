use clap::Parser;
use std::process::ExitCode;
use tidywatch::cli::{Cli, Command, run_check, run_watch};
use tidywatch::output::OutputFormatter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let config_path = cli.config.clone();

    match cli.command_or_default() {
        Command::Watch(args) => match run_watch(args, config_path.as_deref()).await {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                let message = format!("{:#}", e);
                tracing::error!(error = %message, "Startup failed");
                OutputFormatter::error(&format!("Error: {}", message));
                ExitCode::FAILURE
            }
        },
        Command::Check { root } => {
            if run_check(root.as_deref(), config_path.as_deref()) {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

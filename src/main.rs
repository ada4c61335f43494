use clap::Parser;
use offerings::cli::{Args, Command};
use offerings::commands;
use offerings::config::Config;
use offerings::logging::setup_logging;
use std::process::ExitCode;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };
    setup_logging(&config.log_level, args.tracing);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        commit = env!("GIT_COMMIT_SHORT"),
        agent_url = %config.agent_url,
        output_dir = %config.output_dir.display(),
        "starting offerings"
    );

    let command = args.command.unwrap_or(Command::Scrape);
    tokio::select! {
        result = commands::run(command, &config) => match result {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                commands::log_failure(&e);
                ExitCode::FAILURE
            }
        },
        _ = tokio::signal::ctrl_c() => {
            warn!("Process interrupted by user.");
            ExitCode::from(130)
        }
    }
}

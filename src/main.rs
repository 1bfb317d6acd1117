//! fc-harness - function-calling evaluation harness
//!
//! Binary entry point: parses arguments, sets up logging and configuration,
//! then dispatches to the subcommand handlers in [`cli`].

use anyhow::Result;
use clap::Parser;
use harness_core::ConfigManager;
use harness_core::config::load_dotenv;
use tracing_subscriber::EnvFilter;

mod cli;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.verbose);
    load_dotenv();

    match args.command {
        Commands::Run(run) => {
            let manager = match &args.config {
                Some(path) => ConfigManager::load_from_file(path)?,
                None => ConfigManager::load()?,
            };
            cli::handle_run_command(manager.into_config(), &run).await
        }
        Commands::Init { output, force } => cli::handle_init_command(&output, force),
        Commands::Tools { daily_context } => cli::handle_tools_command(daily_context),
    }
}

/// Logs go to stderr so they never interleave with result output. `RUST_LOG`
/// wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

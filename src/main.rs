mod cli;
mod cli_commands;
mod config;
mod error;
mod output;
mod registry;
mod runner;
mod verdict;

use clap::Parser;
use cli::Cli;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Exit status for failures before or outside the checks themselves
const USAGE_EXIT: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
    .with_writer(std::io::stderr)
    .init();

  // clap exits with status 2 on its own for bad arguments
  let cli = Cli::parse();

  match cli_commands::run_check(&cli).await {
    Ok(verdict) => ExitCode::from(verdict.exit_code()),
    Err(e) => {
      eprintln!("error: {:#}", e);
      ExitCode::from(USAGE_EXIT)
    }
  }
}

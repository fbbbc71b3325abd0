use crate::cli::Cli;
use crate::config::Config;
use crate::output::{self, Printer};
use crate::registry;
use crate::runner;
use crate::verdict::Verdict;
use anyhow::{bail, Result};
use std::io;
use tracing::debug;

/// Check `cli.name` against the selected registries and print the report.
pub async fn run_check(cli: &Cli) -> Result<Verdict> {
  let config = Config::load()?;
  let (only, skip) = cli.selection(&config.skip);
  let checkers = registry::select(registry::default_checkers(&config), &only, &skip);

  if checkers.is_empty() {
    bail!("no registries selected after filtering");
  }

  let timeout = cli.timeout.unwrap_or_else(|| config.timeout());
  debug!(name = %cli.name, registries = checkers.len(), ?timeout, "Checking name");

  let results = runner::run_with_timeout(&checkers, &cli.name, timeout).await;

  let mut out = io::stdout().lock();
  if cli.json {
    output::print_json(&mut out, &cli.name, &results)?;
  } else {
    Printer::new(out, output::should_use_color(cli.no_color)).print(&cli.name, &results)?;
  }

  let verdict = Verdict::from_results(&results);
  debug!(%verdict, "Check complete");
  Ok(verdict)
}

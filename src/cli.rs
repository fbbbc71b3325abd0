use clap::Parser;
use std::time::Duration;

const REGISTRIES_HELP: &str = "\
Registries:
  domain       DNS lookup of <name>.com/.io/.net/.app/.ai/.sh/.tech
  npm          npm package
  crates       crates.io crate
  github       GitHub user or organization
  github-repo  GitHub repository (exact name match in search)
  dockerhub    Docker Hub namespace
  homebrew     Homebrew formula or cask

Exit status: 0 all available, 1 name taken somewhere, 2 errors or bad usage.
Set GITHUB_TOKEN to raise GitHub rate limits.

Examples:
  nmchk myproject
  nmchk --only npm,github myproject
  nmchk --skip domain --timeout 5s myproject";

#[derive(Parser, Debug)]
#[command(name = "nmchk", version)]
#[command(about = "Check whether a name is free across domains, package registries, GitHub and Docker Hub", long_about = None)]
#[command(after_help = REGISTRIES_HELP)]
pub struct Cli {
  /// Name to check
  #[arg(value_parser = parse_name)]
  pub name: String,

  /// Only check these registries (comma-separated, e.g. npm,github)
  #[arg(long, value_delimiter = ',', conflicts_with = "skip")]
  pub only: Vec<String>,

  /// Skip these registries (comma-separated, e.g. domain)
  #[arg(long, value_delimiter = ',')]
  pub skip: Vec<String>,

  /// Deadline for all checks together (e.g. 10s, 500ms, 1m30s)
  #[arg(short, long, value_parser = parse_duration)]
  pub timeout: Option<Duration>,

  /// Disable colored output
  #[arg(long)]
  pub no_color: bool,

  /// Output as JSON
  #[arg(short, long)]
  pub json: bool,
}

impl Cli {
  /// Normalized `(only, skip)` lists; `default_skip` applies only when
  /// neither flag was given.
  pub fn selection(&self, default_skip: &[String]) -> (Vec<String>, Vec<String>) {
    let only = normalize(&self.only);
    let skip = if only.is_empty() && self.skip.is_empty() {
      normalize(default_skip)
    } else {
      normalize(&self.skip)
    };
    (only, skip)
  }
}

fn normalize(names: &[String]) -> Vec<String> {
  names
    .iter()
    .map(|n| n.trim().to_lowercase())
    .filter(|n| !n.is_empty())
    .collect()
}

fn parse_name(s: &str) -> Result<String, String> {
  let name = s.trim();
  if name.is_empty() {
    return Err("name must not be empty".to_string());
  }
  Ok(name.to_string())
}

/// Anything `humantime` accepts (`500ms`, `1m30s`, `1h`), or a bare number
/// of seconds
fn parse_duration(s: &str) -> Result<Duration, String> {
  let s = s.trim();
  let duration = match s.parse::<u64>() {
    Ok(secs) => Duration::from_secs(secs),
    Err(_) => humantime::parse_duration(s).map_err(|e| format!("invalid duration {:?}: {}", s, e))?,
  };
  if duration.is_zero() {
    return Err("duration must be positive".to_string());
  }
  Ok(duration)
}

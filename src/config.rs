use crate::registry::{brew, crates, dockerhub, domain, github, npm};
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const APP_NAME: &str = "nmchk";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Base URLs of the HTTP registries, overridable for mirrors and testing
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Endpoints {
  pub npm: String,
  pub crates: String,
  pub github: String,
  pub dockerhub: String,
  pub homebrew: String,
}

impl Default for Endpoints {
  fn default() -> Self {
    Self {
      npm: npm::NPM_REGISTRY_URL.to_string(),
      crates: crates::CRATES_API_URL.to_string(),
      github: github::GITHUB_API_URL.to_string(),
      dockerhub: dockerhub::DOCKER_HUB_URL.to_string(),
      homebrew: brew::BREW_API_URL.to_string(),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
  /// Deadline for the whole run, in seconds
  pub timeout: u64,
  /// Domain TLDs to probe, in report order
  pub tlds: Vec<String>,
  /// Registries skipped unless `--only` or `--skip` is given
  pub skip: Vec<String>,
  pub endpoints: Endpoints,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      timeout: DEFAULT_TIMEOUT_SECS,
      tlds: domain::DEFAULT_TLDS.iter().map(|t| t.to_string()).collect(),
      skip: Vec::new(),
      endpoints: Endpoints::default(),
    }
  }
}

impl Config {
  /// Get the config file path
  fn config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().join("config.toml"))
  }

  /// Load config from the user config dir, or defaults when there is none
  pub fn load() -> Result<Self> {
    match Self::config_path() {
      Some(path) if path.exists() => Self::load_from(&path),
      _ => Ok(Self::default()),
    }
  }

  pub fn load_from(path: &Path) -> Result<Self> {
    let content =
      fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let config: Config =
      toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
    Ok(config)
  }

  /// Zero in the file means "use the default", not "cancel immediately"
  pub fn timeout(&self) -> Duration {
    match self.timeout {
      0 => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
      secs => Duration::from_secs(secs),
    }
  }

  /// GitHub token from environment only (never stored in config)
  pub fn github_token(&self) -> Option<String> {
    std::env::var("GITHUB_TOKEN").ok().filter(|t| !t.trim().is_empty())
  }
}

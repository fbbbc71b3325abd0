pub mod brew;
pub mod crates;
pub mod dockerhub;
pub mod domain;
pub mod github;
pub mod github_repo;
pub mod npm;

use crate::config::Config;
use crate::error::CheckError;
use async_trait::async_trait;
use reqwest::{header, Client, Method, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde::{Serialize, Serializer};
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Sent with every outbound request; crates.io rejects anonymous clients.
pub const USER_AGENT: &str = concat!("nmchk/", env!("CARGO_PKG_VERSION"));

/// Availability verdict of a single registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
  Available,
  Taken,
  Unknown,
}

impl std::fmt::Display for Status {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Status::Available => write!(f, "available"),
      Status::Taken => write!(f, "taken"),
      Status::Unknown => write!(f, "unknown"),
    }
  }
}

/// Outcome of probing one registry for one name
#[derive(Debug, Serialize)]
pub struct CheckResult {
  pub registry: String,
  pub name: String,
  pub status: Status,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub detail: Option<String>,
  #[serde(serialize_with = "serialize_error", skip_serializing_if = "Option::is_none")]
  pub error: Option<CheckError>,
}

fn serialize_error<S: Serializer>(error: &Option<CheckError>, s: S) -> Result<S::Ok, S::Error> {
  match error {
    Some(err) => s.collect_str(err),
    None => s.serialize_none(),
  }
}

impl CheckResult {
  pub fn available(registry: &str, name: &str) -> Self {
    Self {
      registry: registry.to_string(),
      name: name.to_string(),
      status: Status::Available,
      detail: None,
      error: None,
    }
  }

  pub fn taken(registry: &str, name: &str, detail: Option<String>) -> Self {
    Self {
      registry: registry.to_string(),
      name: name.to_string(),
      status: Status::Taken,
      detail: detail.filter(|d| !d.is_empty()),
      error: None,
    }
  }

  pub fn unknown(registry: &str, name: &str, error: CheckError) -> Self {
    Self {
      registry: registry.to_string(),
      name: name.to_string(),
      status: Status::Unknown,
      detail: None,
      error: Some(error),
    }
  }
}

/// One registry probe.
///
/// `check` never fails outward: transport errors, odd status codes and
/// cancellation all come back as a `Status::Unknown` result.
#[async_trait]
pub trait Checker: Send + Sync {
  /// Lowercase identifier matched by `--only` / `--skip`
  fn name(&self) -> &str;

  /// Label shown in output and stored in `CheckResult::registry`
  fn display_name(&self) -> &str;

  async fn check(&self, ctx: &CancellationToken, name: &str) -> CheckResult;
}

/// Build `base` + path segments, percent-encoding each segment.
pub(crate) fn endpoint(base: &str, segments: &[&str]) -> Result<Url, CheckError> {
  let mut url = Url::parse(base).map_err(|e| CheckError::InvalidUrl(format!("{}: {}", base, e)))?;
  url
    .path_segments_mut()
    .map_err(|_| CheckError::InvalidUrl(format!("{}: not a base url", base)))?
    .pop_if_empty()
    .extend(segments);
  Ok(url)
}

pub(crate) fn request(client: &Client, method: Method, url: Url, token: Option<&str>) -> RequestBuilder {
  let builder = client.request(method, url).header(header::USER_AGENT, USER_AGENT);
  match token {
    Some(token) => builder.bearer_auth(token),
    None => builder,
  }
}

/// Race `fut` against `ctx`; a cancelled future is dropped, which aborts
/// whatever transport call it was driving.
pub(crate) async fn cancellable<F, T, E>(ctx: &CancellationToken, fut: F) -> Result<T, CheckError>
where
  F: Future<Output = Result<T, E>>,
  E: Into<CheckError>,
{
  tokio::select! {
    biased;
    _ = ctx.cancelled() => Err(CheckError::Cancelled),
    res = fut => res.map_err(Into::into),
  }
}

pub(crate) async fn send(ctx: &CancellationToken, builder: RequestBuilder) -> Result<Response, CheckError> {
  cancellable(ctx, builder.send()).await
}

/// Read at most `limit` bytes of body and decode them as JSON.
///
/// Transport errors and cancellation are errors; a body that does not decode
/// is `Ok(None)`.
pub(crate) async fn read_json<T: DeserializeOwned>(
  ctx: &CancellationToken,
  mut response: Response,
  limit: usize,
) -> Result<Option<T>, CheckError> {
  let mut body = Vec::new();
  while body.len() < limit {
    match cancellable(ctx, response.chunk()).await? {
      Some(chunk) => body.extend_from_slice(&chunk),
      None => break,
    }
  }
  body.truncate(limit);
  Ok(serde_json::from_slice(&body).ok())
}

/// Every checker this tool knows, in report order.
///
/// All HTTP checkers share one client and all domain checkers share one
/// resolver.
pub fn default_checkers(config: &Config) -> Vec<Arc<dyn Checker>> {
  let client = Client::new();
  let token = config.github_token();
  let endpoints = &config.endpoints;
  let resolver: Arc<dyn domain::HostLookup> = Arc::new(domain::DnsLookup::new());

  let mut checkers: Vec<Arc<dyn Checker>> = config
    .tlds
    .iter()
    .map(|tld| Arc::new(domain::DomainChecker::new(Arc::clone(&resolver), tld)) as Arc<dyn Checker>)
    .collect();

  checkers.push(Arc::new(npm::NpmChecker::new(client.clone(), &endpoints.npm)));
  checkers.push(Arc::new(crates::CratesChecker::new(client.clone(), &endpoints.crates)));
  checkers.push(Arc::new(github::GitHubChecker::new(
    client.clone(),
    &endpoints.github,
    token.clone(),
  )));
  checkers.push(Arc::new(github_repo::GitHubRepoChecker::new(
    client.clone(),
    &endpoints.github,
    token,
  )));
  checkers.push(Arc::new(dockerhub::DockerHubChecker::new(client.clone(), &endpoints.dockerhub)));
  checkers.push(Arc::new(brew::BrewChecker::new(client, &endpoints.homebrew)));
  checkers
}

/// Keep checkers named in `only`, or drop those named in `skip`.
///
/// Both are lowercase names as returned by [`Checker::name`]; an empty
/// `only` means "everything".
pub fn select(checkers: Vec<Arc<dyn Checker>>, only: &[String], skip: &[String]) -> Vec<Arc<dyn Checker>> {
  checkers
    .into_iter()
    .filter(|c| only.is_empty() || only.iter().any(|n| n == c.name()))
    .filter(|c| !skip.iter().any(|n| n == c.name()))
    .collect()
}

use super::{endpoint, request, send, CheckResult, Checker};
use crate::error::CheckError;
use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use tokio_util::sync::CancellationToken;

pub const DOCKER_HUB_URL: &str = "https://hub.docker.com";

/// Check if a namespace (user or org) is free on Docker Hub
///
/// API: GET https://hub.docker.com/v2/users/{name}
/// - 200: Namespace exists (not available)
/// - 404: Namespace not found (available)
/// - 429: Rate limited
pub struct DockerHubChecker {
  client: Client,
  base_url: String,
}

impl DockerHubChecker {
  pub fn new(client: Client, base_url: &str) -> Self {
    Self {
      client,
      base_url: base_url.to_string(),
    }
  }
}

#[async_trait]
impl Checker for DockerHubChecker {
  fn name(&self) -> &str {
    "dockerhub"
  }

  fn display_name(&self) -> &str {
    "Docker Hub"
  }

  async fn check(&self, ctx: &CancellationToken, name: &str) -> CheckResult {
    let url = match endpoint(&self.base_url, &["v2", "users", name]) {
      Ok(url) => url,
      Err(e) => return CheckResult::unknown(self.display_name(), name, e),
    };

    let response = match send(ctx, request(&self.client, Method::GET, url, None)).await {
      Ok(response) => response,
      Err(e) => return CheckResult::unknown(self.display_name(), name, e),
    };

    match response.status() {
      StatusCode::OK => CheckResult::taken(self.display_name(), name, None),
      StatusCode::NOT_FOUND => CheckResult::available(self.display_name(), name),
      StatusCode::TOO_MANY_REQUESTS => {
        CheckResult::unknown(self.display_name(), name, CheckError::RateLimited)
      }
      status => CheckResult::unknown(
        self.display_name(),
        name,
        CheckError::UnexpectedStatus(status.as_u16()),
      ),
    }
  }
}

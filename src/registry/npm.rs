use super::{endpoint, request, send, CheckResult, Checker};
use crate::error::CheckError;
use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use tokio_util::sync::CancellationToken;

pub const NPM_REGISTRY_URL: &str = "https://registry.npmjs.org";

/// Check if a package name is available on npm
///
/// API: HEAD https://registry.npmjs.org/{package}
/// - 200: Package exists (not available)
/// - 404: Package not found (available)
pub struct NpmChecker {
  client: Client,
  base_url: String,
}

impl NpmChecker {
  pub fn new(client: Client, base_url: &str) -> Self {
    Self {
      client,
      base_url: base_url.to_string(),
    }
  }
}

#[async_trait]
impl Checker for NpmChecker {
  fn name(&self) -> &str {
    "npm"
  }

  fn display_name(&self) -> &str {
    "npm"
  }

  async fn check(&self, ctx: &CancellationToken, name: &str) -> CheckResult {
    let url = match endpoint(&self.base_url, &[name]) {
      Ok(url) => url,
      Err(e) => return CheckResult::unknown(self.display_name(), name, e),
    };

    match send(ctx, request(&self.client, Method::HEAD, url, None)).await {
      Ok(response) => match response.status() {
        StatusCode::NOT_FOUND => CheckResult::available(self.display_name(), name),
        StatusCode::OK => CheckResult::taken(self.display_name(), name, None),
        status => CheckResult::unknown(
          self.display_name(),
          name,
          CheckError::UnexpectedStatus(status.as_u16()),
        ),
      },
      Err(e) => CheckResult::unknown(self.display_name(), name, e),
    }
  }
}

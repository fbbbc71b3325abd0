use super::{endpoint, request, send, CheckResult, Checker};
use crate::error::CheckError;
use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use tokio_util::sync::CancellationToken;

pub const CRATES_API_URL: &str = "https://crates.io";

/// Check if a crate name is available on crates.io
///
/// API: GET https://crates.io/api/v1/crates/{name}
/// - 200: Crate exists (not available)
/// - 404: Crate not found (available)
///
/// Note: crates.io requires a User-Agent header
pub struct CratesChecker {
  client: Client,
  base_url: String,
}

impl CratesChecker {
  pub fn new(client: Client, base_url: &str) -> Self {
    Self {
      client,
      base_url: base_url.to_string(),
    }
  }
}

#[async_trait]
impl Checker for CratesChecker {
  fn name(&self) -> &str {
    "crates"
  }

  fn display_name(&self) -> &str {
    "crates.io"
  }

  async fn check(&self, ctx: &CancellationToken, name: &str) -> CheckResult {
    let url = match endpoint(&self.base_url, &["api", "v1", "crates", name]) {
      Ok(url) => url,
      Err(e) => return CheckResult::unknown(self.display_name(), name, e),
    };

    let response = match send(ctx, request(&self.client, Method::GET, url, None)).await {
      Ok(response) => response,
      Err(e) => return CheckResult::unknown(self.display_name(), name, e),
    };

    match response.status() {
      StatusCode::NOT_FOUND => CheckResult::available(self.display_name(), name),
      StatusCode::OK => CheckResult::taken(self.display_name(), name, None),
      status => CheckResult::unknown(
        self.display_name(),
        name,
        CheckError::UnexpectedStatus(status.as_u16()),
      ),
    }
  }
}

use super::{endpoint, read_json, request, send, CheckResult, Checker};
use crate::error::CheckError;
use async_trait::async_trait;
use reqwest::{header, Client, Method, StatusCode};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

pub const GITHUB_API_URL: &str = "https://api.github.com";

pub(crate) const GITHUB_ACCEPT: &str = "application/vnd.github+json";

const RATE_LIMIT_REMAINING: &str = "x-ratelimit-remaining";
const ACCOUNT_BODY_LIMIT: usize = 4096;

#[derive(Debug, Deserialize)]
struct Account {
  #[serde(rename = "type")]
  kind: String,
}

/// Check if a user or organization login is free on GitHub
///
/// API: GET https://api.github.com/users/{name}
/// - 200: Account exists (not available), detail is "User" or "Organization"
/// - 404: Account not found (available)
/// - 403 with `X-RateLimit-Remaining: 0`: Rate limited
pub struct GitHubChecker {
  client: Client,
  base_url: String,
  token: Option<String>,
}

impl GitHubChecker {
  pub fn new(client: Client, base_url: &str, token: Option<String>) -> Self {
    Self {
      client,
      base_url: base_url.to_string(),
      token,
    }
  }
}

#[async_trait]
impl Checker for GitHubChecker {
  fn name(&self) -> &str {
    "github"
  }

  fn display_name(&self) -> &str {
    "GitHub"
  }

  async fn check(&self, ctx: &CancellationToken, name: &str) -> CheckResult {
    let url = match endpoint(&self.base_url, &["users", name]) {
      Ok(url) => url,
      Err(e) => return CheckResult::unknown(self.display_name(), name, e),
    };

    let builder = request(&self.client, Method::GET, url, self.token.as_deref())
      .header(header::ACCEPT, GITHUB_ACCEPT);
    let response = match send(ctx, builder).await {
      Ok(response) => response,
      Err(e) => return CheckResult::unknown(self.display_name(), name, e),
    };

    match response.status() {
      StatusCode::OK => match read_json::<Account>(ctx, response, ACCOUNT_BODY_LIMIT).await {
        Ok(account) => CheckResult::taken(self.display_name(), name, account.map(|a| a.kind)),
        Err(e) => CheckResult::unknown(self.display_name(), name, e),
      },
      StatusCode::NOT_FOUND => CheckResult::available(self.display_name(), name),
      StatusCode::FORBIDDEN => {
        let exhausted = response
          .headers()
          .get(RATE_LIMIT_REMAINING)
          .is_some_and(|v| v.as_bytes() == b"0");
        let err = if exhausted {
          CheckError::RateLimited
        } else {
          CheckError::Forbidden
        };
        CheckResult::unknown(self.display_name(), name, err)
      }
      status => CheckResult::unknown(
        self.display_name(),
        name,
        CheckError::UnexpectedStatus(status.as_u16()),
      ),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::registry::testing::serve;
  use crate::registry::Status;
  use axum::extract::Path;
  use axum::http::{HeaderMap, StatusCode as HttpStatus};
  use axum::response::IntoResponse;
  use axum::routing::get;
  use axum::Router;
  use std::time::Duration;

  async fn api() -> String {
    serve(Router::new().route(
      "/users/{name}",
      get(|Path(name): Path<String>| async move {
        match name.as_str() {
          "octocat" => (HttpStatus::OK, r#"{"login":"octocat","type":"User"}"#).into_response(),
          "github" => (HttpStatus::OK, r#"{"login":"github","type":"Organization"}"#).into_response(),
          "garbled" => (HttpStatus::OK, "<html>").into_response(),
          "limited" => (HttpStatus::FORBIDDEN, [("x-ratelimit-remaining", "0")], "").into_response(),
          "blocked" => (HttpStatus::FORBIDDEN, [("x-ratelimit-remaining", "42")], "").into_response(),
          "down" => HttpStatus::SERVICE_UNAVAILABLE.into_response(),
          "slow" => {
            tokio::time::sleep(Duration::from_secs(5)).await;
            HttpStatus::NOT_FOUND.into_response()
          }
          _ => HttpStatus::NOT_FOUND.into_response(),
        }
      }),
    ))
    .await
  }

  async fn check(name: &str) -> CheckResult {
    let checker = GitHubChecker::new(Client::new(), &api().await, None);
    checker.check(&CancellationToken::new(), name).await
  }

  #[tokio::test]
  async fn test_check_existing_user() {
    let result = check("octocat").await;
    assert_eq!(result.status, Status::Taken);
    assert_eq!(result.detail.as_deref(), Some("User"));
  }

  #[tokio::test]
  async fn test_check_existing_org() {
    let result = check("github").await;
    assert_eq!(result.status, Status::Taken);
    assert_eq!(result.detail.as_deref(), Some("Organization"));
  }

  #[tokio::test]
  async fn test_check_taken_without_parsable_body() {
    let result = check("garbled").await;
    assert_eq!(result.status, Status::Taken);
    assert!(result.detail.is_none());
  }

  #[tokio::test]
  async fn test_check_available() {
    let result = check("xyzzy-nope").await;
    assert_eq!(result.status, Status::Available);
  }

  #[tokio::test]
  async fn test_check_rate_limited() {
    let result = check("limited").await;
    assert_eq!(result.status, Status::Unknown);
    assert!(matches!(result.error, Some(CheckError::RateLimited)));
  }

  #[tokio::test]
  async fn test_check_forbidden_with_quota_left() {
    let result = check("blocked").await;
    assert_eq!(result.status, Status::Unknown);
    assert_eq!(result.error.unwrap().to_string(), "forbidden (status 403)");
  }

  #[tokio::test]
  async fn test_check_unexpected_status() {
    let result = check("down").await;
    assert_eq!(result.status, Status::Unknown);
    assert!(matches!(result.error, Some(CheckError::UnexpectedStatus(503))));
  }

  #[tokio::test]
  async fn test_check_forwards_token() {
    let base = serve(Router::new().route(
      "/users/{name}",
      get(|headers: HeaderMap| async move {
        let auth = headers.get("authorization").and_then(|v| v.to_str().ok());
        let accept = headers.get("accept").and_then(|v| v.to_str().ok());
        if auth == Some("Bearer s3cret") && accept == Some(GITHUB_ACCEPT) {
          HttpStatus::NOT_FOUND
        } else {
          HttpStatus::UNAUTHORIZED
        }
      }),
    ))
    .await;
    let checker = GitHubChecker::new(Client::new(), &base, Some("s3cret".to_string()));
    let result = checker.check(&CancellationToken::new(), "someone").await;
    assert_eq!(result.status, Status::Available);
  }

  #[tokio::test]
  async fn test_check_cancelled_mid_flight() {
    let checker = GitHubChecker::new(Client::new(), &api().await, None);
    let ctx = CancellationToken::new();
    let cancel = ctx.clone();
    tokio::spawn(async move {
      tokio::time::sleep(Duration::from_millis(20)).await;
      cancel.cancel();
    });

    let started = std::time::Instant::now();
    let result = checker.check(&ctx, "slow").await;
    assert_eq!(result.status, Status::Unknown);
    assert!(matches!(result.error, Some(CheckError::Cancelled)));
    assert!(started.elapsed() < Duration::from_secs(1));
  }
}

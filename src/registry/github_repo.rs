use super::github::GITHUB_ACCEPT;
use super::{endpoint, read_json, request, send, CheckResult, Checker};
use crate::error::CheckError;
use async_trait::async_trait;
use reqwest::{header, Client, Method, StatusCode};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

const SEARCH_BODY_LIMIT: usize = 64 * 1024;
const SEARCH_PAGE_SIZE: &str = "5";

#[derive(Debug, Deserialize)]
struct SearchResponse {
  #[serde(default)]
  items: Vec<RepoItem>,
}

#[derive(Debug, Deserialize)]
struct RepoItem {
  name: String,
  full_name: String,
}

impl SearchResponse {
  /// Full name of the first hit whose repo name equals `name`, ignoring case.
  fn exact_match(&self, name: &str) -> Option<&str> {
    let wanted = name.to_lowercase();
    self
      .items
      .iter()
      .find(|item| item.name.to_lowercase() == wanted)
      .map(|item| item.full_name.as_str())
  }
}

/// Check if any public repository on GitHub already uses the name
///
/// API: GET https://api.github.com/search/repositories?q={name}+in:name
/// - 200 with an item named exactly {name}: Taken, detail is its full name
/// - 200 without such an item: Available
/// - 403: Rate limited (search has a much lower quota than the REST API)
///
/// Search is fuzzy, so only a case-insensitive exact name match counts.
pub struct GitHubRepoChecker {
  client: Client,
  base_url: String,
  token: Option<String>,
}

impl GitHubRepoChecker {
  pub fn new(client: Client, base_url: &str, token: Option<String>) -> Self {
    Self {
      client,
      base_url: base_url.to_string(),
      token,
    }
  }
}

#[async_trait]
impl Checker for GitHubRepoChecker {
  fn name(&self) -> &str {
    "github-repo"
  }

  fn display_name(&self) -> &str {
    "GitHub Repo"
  }

  async fn check(&self, ctx: &CancellationToken, name: &str) -> CheckResult {
    let mut url = match endpoint(&self.base_url, &["search", "repositories"]) {
      Ok(url) => url,
      Err(e) => return CheckResult::unknown(self.display_name(), name, e),
    };
    url
      .query_pairs_mut()
      .append_pair("q", &format!("{} in:name", name))
      .append_pair("per_page", SEARCH_PAGE_SIZE);

    let builder = request(&self.client, Method::GET, url, self.token.as_deref())
      .header(header::ACCEPT, GITHUB_ACCEPT);
    let response = match send(ctx, builder).await {
      Ok(response) => response,
      Err(e) => return CheckResult::unknown(self.display_name(), name, e),
    };

    match response.status() {
      StatusCode::OK => match read_json::<SearchResponse>(ctx, response, SEARCH_BODY_LIMIT).await {
        Ok(search) => match search.as_ref().and_then(|s| s.exact_match(name)) {
          Some(full_name) => {
            CheckResult::taken(self.display_name(), name, Some(full_name.to_string()))
          }
          None => CheckResult::available(self.display_name(), name),
        },
        Err(e) => CheckResult::unknown(self.display_name(), name, e),
      },
      StatusCode::FORBIDDEN => {
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

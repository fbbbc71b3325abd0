use super::{endpoint, request, send, CheckResult, Checker};
use crate::error::CheckError;
use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use tokio_util::sync::CancellationToken;

pub const BREW_API_URL: &str = "https://formulae.brew.sh";

/// Check if a name is free on Homebrew, as either a formula or a cask
///
/// API: GET https://formulae.brew.sh/api/formula/{name}.json
///      GET https://formulae.brew.sh/api/cask/{name}.json
/// - 200 on either: Taken, detail lists which ("formula", "cask")
/// - 404 on both: Available
///
/// When only one lookup fails, the other one decides.
pub struct BrewChecker {
  client: Client,
  base_url: String,
}

impl BrewChecker {
  pub fn new(client: Client, base_url: &str) -> Self {
    Self {
      client,
      base_url: base_url.to_string(),
    }
  }

  /// Whether `/api/{kind}/{name}.json` exists.
  async fn exists(&self, ctx: &CancellationToken, kind: &str, name: &str) -> Result<bool, CheckError> {
    let file = format!("{}.json", name);
    let url = endpoint(&self.base_url, &["api", kind, &file])?;
    let response = send(ctx, request(&self.client, Method::GET, url, None)).await?;

    match response.status() {
      StatusCode::OK => Ok(true),
      StatusCode::NOT_FOUND => Ok(false),
      status => Err(CheckError::UnexpectedStatus(status.as_u16())),
    }
  }
}

#[async_trait]
impl Checker for BrewChecker {
  fn name(&self) -> &str {
    "homebrew"
  }

  fn display_name(&self) -> &str {
    "Homebrew"
  }

  async fn check(&self, ctx: &CancellationToken, name: &str) -> CheckResult {
    let (formula, cask) = tokio::join!(
      self.exists(ctx, "formula", name),
      self.exists(ctx, "cask", name),
    );

    let (formula, cask) = match (formula, cask) {
      (Err(formula_err), Err(cask_err)) => {
        return CheckResult::unknown(
          self.display_name(),
          name,
          CheckError::Multiple(vec![("formula", formula_err), ("cask", cask_err)]),
        );
      }
      (formula, cask) => (formula.unwrap_or(false), cask.unwrap_or(false)),
    };

    let found: Vec<&str> = [("formula", formula), ("cask", cask)]
      .into_iter()
      .filter_map(|(kind, exists)| exists.then_some(kind))
      .collect();

    if found.is_empty() {
      CheckResult::available(self.display_name(), name)
    } else {
      CheckResult::taken(self.display_name(), name, Some(found.join(", ")))
    }
  }
}

use thiserror::Error;

/// Why a probe could not decide between available and taken.
///
/// Every variant ends up in a [`crate::registry::CheckResult`] with
/// `Status::Unknown`; nothing here is ever raised past a checker.
#[derive(Debug, Error)]
pub enum CheckError {
  #[error("{0}")]
  Http(#[from] reqwest::Error),

  #[error("invalid url: {0}")]
  InvalidUrl(String),

  #[error("unexpected status: {0}")]
  UnexpectedStatus(u16),

  #[error("rate limited")]
  RateLimited,

  #[error("forbidden (status 403)")]
  Forbidden,

  #[error("{0}")]
  Dns(String),

  #[error("cancelled")]
  Cancelled,

  /// The probe task died before reporting (panic or forced abort).
  #[error("cancelled: {0}")]
  TaskAborted(String),

  /// Several sub-probes failed, each tagged with what it was probing.
  #[error("{}", join_labeled(.0))]
  Multiple(Vec<(&'static str, CheckError)>),
}

fn join_labeled(errors: &[(&'static str, CheckError)]) -> String {
  errors
    .iter()
    .map(|(label, err)| format!("{}: {}", label, err))
    .collect::<Vec<_>>()
    .join("; ")
}

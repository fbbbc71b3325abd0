use crate::registry::{CheckResult, Status};
use serde::Serialize;

/// Overall answer for one name across every registry checked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
  /// Every registry confirmed the name is free
  Available,
  /// At least one registry already has the name
  Taken,
  /// Nothing taken, but at least one registry could not be checked
  Indeterminate,
}

impl Verdict {
  /// A single confirmed collision outranks any number of failed probes.
  pub fn from_results(results: &[CheckResult]) -> Self {
    if results.iter().any(|r| r.status == Status::Taken) {
      Verdict::Taken
    } else if results.iter().any(|r| r.status == Status::Unknown) {
      Verdict::Indeterminate
    } else {
      Verdict::Available
    }
  }

  pub fn exit_code(self) -> u8 {
    match self {
      Verdict::Available => 0,
      Verdict::Taken => 1,
      Verdict::Indeterminate => 2,
    }
  }
}

impl std::fmt::Display for Verdict {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Verdict::Available => write!(f, "available"),
      Verdict::Taken => write!(f, "taken"),
      Verdict::Indeterminate => write!(f, "indeterminate"),
    }
  }
}

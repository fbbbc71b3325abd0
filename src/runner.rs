//! Fan-out/fan-in execution of a set of checkers against one name

use crate::error::CheckError;
use crate::registry::{CheckResult, Checker};
use futures::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, Receiver};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// How long collection keeps listening after cancellation for probes to
/// report their own `Unknown` result before they are aborted.
const CANCEL_GRACE: Duration = Duration::from_millis(250);

/// Run every checker concurrently against `name` under one shared deadline.
///
/// The returned results line up with `checkers` one-to-one, whatever order
/// the probes finish in.
pub async fn run_with_timeout(checkers: &[Arc<dyn Checker>], name: &str, timeout: Duration) -> Vec<CheckResult> {
  let ctx = CancellationToken::new();
  let deadline = ctx.clone();
  let timer = tokio::spawn(async move {
    tokio::time::sleep(timeout).await;
    debug!(?timeout, "Deadline reached, cancelling outstanding checks");
    deadline.cancel();
  });

  let results = run(&ctx, checkers, name).await;
  timer.abort();
  results
}

/// Run every checker concurrently against `name`, all observing `ctx`.
///
/// Each probe runs in its own task. A probe that panics, or that is still
/// running [`CANCEL_GRACE`] after `ctx` is cancelled, gets an `Unknown`
/// result in its slot; the other slots are unaffected.
pub async fn run(ctx: &CancellationToken, checkers: &[Arc<dyn Checker>], name: &str) -> Vec<CheckResult> {
  if checkers.is_empty() {
    return Vec::new();
  }

  let (tx, mut rx) = mpsc::channel(checkers.len());
  let handles: Vec<_> = checkers
    .iter()
    .enumerate()
    .map(|(index, checker)| {
      let checker = Arc::clone(checker);
      let ctx = ctx.clone();
      let name = name.to_string();
      let tx = tx.clone();
      tokio::spawn(async move {
        debug!(registry = checker.display_name(), "Check started");
        let result = match AssertUnwindSafe(checker.check(&ctx, &name)).catch_unwind().await {
          Ok(result) => result,
          Err(panic) => {
            let message = panic_message(panic.as_ref());
            warn!(registry = checker.display_name(), panic = message, "Checker panicked");
            CheckResult::unknown(
              checker.display_name(),
              &name,
              CheckError::TaskAborted(format!("checker panicked: {}", message)),
            )
          }
        };
        debug!(registry = checker.display_name(), status = %result.status, "Check finished");
        // The channel holds one slot per checker, so this never waits.
        let _ = tx.send((index, result)).await;
      })
    })
    .collect();
  drop(tx);

  let mut slots: Vec<Option<CheckResult>> = std::iter::repeat_with(|| None).take(checkers.len()).collect();

  if collect(&mut rx, &mut slots, ctx.cancelled()).await {
    collect(&mut rx, &mut slots, tokio::time::sleep(CANCEL_GRACE)).await;
  }

  slots
    .into_iter()
    .zip(checkers.iter().zip(handles))
    .map(|(slot, (checker, handle))| {
      slot.unwrap_or_else(|| {
        warn!(registry = checker.display_name(), "Check ignored cancellation, aborting");
        handle.abort();
        CheckResult::unknown(checker.display_name(), name, CheckError::Cancelled)
      })
    })
    .collect()
}

/// Place results from `rx` into their slots until every task has reported
/// or `stop` completes. Returns whether `stop` cut collection short.
async fn collect(
  rx: &mut Receiver<(usize, CheckResult)>,
  slots: &mut [Option<CheckResult>],
  stop: impl Future<Output = ()>,
) -> bool {
  tokio::pin!(stop);
  loop {
    tokio::select! {
      biased;
      received = rx.recv() => match received {
        Some((index, result)) => slots[index] = Some(result),
        None => return false,
      },
      _ = &mut stop => return true,
    }
  }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
  panic
    .downcast_ref::<&str>()
    .copied()
    .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
    .unwrap_or("unknown panic")
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::registry::domain::{DomainChecker, HostLookup, LookupError};
  use crate::registry::npm::NpmChecker;
  use crate::registry::testing::serve;
  use crate::registry::Status;
  use crate::verdict::Verdict;
  use async_trait::async_trait;
  use std::net::IpAddr;
  use std::time::Instant;

  struct MockChecker {
    display_name: &'static str,
    delay: Duration,
    status: Status,
    honors_cancel: bool,
    panics: bool,
  }

  impl MockChecker {
    fn new(display_name: &'static str, delay_ms: u64, status: Status) -> Self {
      Self {
        display_name,
        delay: Duration::from_millis(delay_ms),
        status,
        honors_cancel: true,
        panics: false,
      }
    }
  }

  #[async_trait]
  impl Checker for MockChecker {
    fn name(&self) -> &str {
      "mock"
    }

    fn display_name(&self) -> &str {
      self.display_name
    }

    async fn check(&self, ctx: &CancellationToken, name: &str) -> CheckResult {
      if self.panics {
        panic!("registry exploded");
      }
      if self.honors_cancel {
        tokio::select! {
          _ = tokio::time::sleep(self.delay) => {}
          _ = ctx.cancelled() => {
            return CheckResult::unknown(self.display_name, name, CheckError::Cancelled);
          }
        }
      } else {
        tokio::time::sleep(self.delay).await;
      }
      match self.status {
        Status::Available => CheckResult::available(self.display_name, name),
        Status::Taken => CheckResult::taken(self.display_name, name, None),
        Status::Unknown => CheckResult::unknown(self.display_name, name, CheckError::RateLimited),
      }
    }
  }

  fn checkers(list: Vec<MockChecker>) -> Vec<Arc<dyn Checker>> {
    list
      .into_iter()
      .map(|c| Arc::new(c) as Arc<dyn Checker>)
      .collect()
  }

  #[tokio::test]
  async fn test_run_all_complete() {
    let list = checkers(vec![
      MockChecker::new("Registry A", 10, Status::Available),
      MockChecker::new("Registry B", 10, Status::Taken),
      MockChecker::new("Registry C", 10, Status::Unknown),
    ]);
    let results = run(&CancellationToken::new(), &list, "testname").await;

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].registry, "Registry A");
    assert_eq!(results[0].status, Status::Available);
    assert_eq!(results[1].registry, "Registry B");
    assert_eq!(results[1].status, Status::Taken);
    assert_eq!(results[2].registry, "Registry C");
    assert_eq!(results[2].status, Status::Unknown);
    assert!(results.iter().all(|r| r.name == "testname"));
  }

  #[tokio::test]
  async fn test_run_preserves_input_order() {
    let list = checkers(vec![
      MockChecker::new("Slow", 150, Status::Available),
      MockChecker::new("Medium", 50, Status::Taken),
      MockChecker::new("Fast", 1, Status::Taken),
    ]);
    let results = run(&CancellationToken::new(), &list, "test").await;
    let order: Vec<&str> = results.iter().map(|r| r.registry.as_str()).collect();
    assert_eq!(order, vec!["Slow", "Medium", "Fast"]);
  }

  #[tokio::test]
  async fn test_run_empty() {
    let results = run(&CancellationToken::new(), &[], "test").await;
    assert!(results.is_empty());
  }

  #[tokio::test]
  async fn test_run_deadline_yields_unknown() {
    let list = checkers(vec![MockChecker::new("Slow", 5_000, Status::Available)]);
    let started = Instant::now();
    let results = run_with_timeout(&list, "test", Duration::from_millis(20)).await;

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].status, Status::Unknown);
    assert!(results[0].error.is_some());
    assert!(started.elapsed() < Duration::from_secs(1));
  }

  #[tokio::test]
  async fn test_run_deadline_keeps_finished_results() {
    let list = checkers(vec![
      MockChecker::new("Slow", 5_000, Status::Available),
      MockChecker::new("Fast", 1, Status::Taken),
    ]);
    let results = run_with_timeout(&list, "test", Duration::from_millis(50)).await;
    assert_eq!(results[0].status, Status::Unknown);
    assert_eq!(results[1].status, Status::Taken);
  }

  #[tokio::test]
  async fn test_run_cancelled_before_start() {
    let ctx = CancellationToken::new();
    ctx.cancel();
    let list = checkers(vec![
      MockChecker::new("A", 1_000, Status::Available),
      MockChecker::new("B", 1_000, Status::Taken),
    ]);
    let results = run(&ctx, &list, "test").await;
    assert!(results.iter().all(|r| r.status == Status::Unknown));
  }

  #[tokio::test]
  async fn test_run_panic_is_isolated() {
    let mut exploding = MockChecker::new("Boom", 0, Status::Available);
    exploding.panics = true;
    let list = checkers(vec![
      MockChecker::new("Before", 20, Status::Taken),
      exploding,
      MockChecker::new("After", 20, Status::Available),
    ]);
    let results = run(&CancellationToken::new(), &list, "test").await;

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].status, Status::Taken);
    assert_eq!(results[1].registry, "Boom");
    assert_eq!(results[1].status, Status::Unknown);
    assert!(matches!(results[1].error, Some(CheckError::TaskAborted(_))));
    assert!(results[1].error.as_ref().unwrap().to_string().contains("registry exploded"));
    assert_eq!(results[2].status, Status::Available);
  }

  #[tokio::test]
  async fn test_run_aborts_checker_ignoring_cancellation() {
    let mut stubborn = MockChecker::new("Stubborn", 10_000, Status::Available);
    stubborn.honors_cancel = false;
    let list = checkers(vec![stubborn, MockChecker::new("Quick", 1, Status::Available)]);

    let started = Instant::now();
    let results = run_with_timeout(&list, "test", Duration::from_millis(20)).await;

    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(results[0].registry, "Stubborn");
    assert!(matches!(results[0].error, Some(CheckError::Cancelled)));
    assert_eq!(results[1].status, Status::Available);
  }

  struct OneAddress;

  #[async_trait]
  impl HostLookup for OneAddress {
    async fn lookup_host(&self, _host: &str) -> Result<Vec<IpAddr>, LookupError> {
      Ok(vec!["93.184.216.34".parse().unwrap()])
    }
  }

  #[tokio::test]
  async fn test_run_domain_and_npm_scenario() {
    use axum::http::StatusCode as HttpStatus;
    use axum::routing::get;
    use axum::Router;

    let npm = serve(Router::new().route("/{package}", get(|| async { HttpStatus::NOT_FOUND }))).await;
    let list: Vec<Arc<dyn Checker>> = vec![
      Arc::new(DomainChecker::new(Arc::new(OneAddress), "com")),
      Arc::new(NpmChecker::new(reqwest::Client::new(), &npm)),
    ];

    let results = run_with_timeout(&list, "example", Duration::from_secs(5)).await;

    assert_eq!(results[0].registry, "Domain (.com)");
    assert_eq!(results[0].status, Status::Taken);
    assert_eq!(results[0].detail.as_deref(), Some("93.184.216.34"));
    assert_eq!(results[1].registry, "npm");
    assert_eq!(results[1].status, Status::Available);
    assert_eq!(Verdict::from_results(&results), Verdict::Taken);
  }
}

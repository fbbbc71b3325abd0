use super::{CheckResult, Checker};
use crate::error::CheckError;
use async_trait::async_trait;
use std::net::IpAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use trust_dns_resolver::config::{ResolverConfig, ResolverOpts};
use trust_dns_resolver::error::ResolveErrorKind;
use trust_dns_resolver::proto::op::ResponseCode;
use trust_dns_resolver::TokioAsyncResolver;

/// TLDs probed when the config does not list its own
pub const DEFAULT_TLDS: &[&str] = &["com", "io", "net", "app", "ai", "sh", "tech"];

#[derive(Debug, thiserror::Error)]
pub enum LookupError {
  /// NXDOMAIN, or a NOERROR answer without address records
  #[error("no such host")]
  NotFound,

  #[error("{0}")]
  Failed(String),
}

/// Host name to addresses, swappable for a fake in tests
#[async_trait]
pub trait HostLookup: Send + Sync {
  async fn lookup_host(&self, host: &str) -> Result<Vec<IpAddr>, LookupError>;
}

/// [`HostLookup`] over a real resolver: the system configuration when it
/// can be read, Google DNS otherwise.
pub struct DnsLookup {
  resolver: TokioAsyncResolver,
}

impl DnsLookup {
  pub fn new() -> Self {
    match TokioAsyncResolver::tokio_from_system_conf() {
      Ok(resolver) => Self { resolver },
      Err(e) => {
        debug!(error = %e, "System resolver config unavailable, using Google DNS");
        Self::with_config(ResolverConfig::google(), ResolverOpts::default())
      }
    }
  }

  pub fn with_config(config: ResolverConfig, opts: ResolverOpts) -> Self {
    Self {
      resolver: TokioAsyncResolver::tokio(config, opts),
    }
  }
}

impl Default for DnsLookup {
  fn default() -> Self {
    Self::new()
  }
}

#[async_trait]
impl HostLookup for DnsLookup {
  async fn lookup_host(&self, host: &str) -> Result<Vec<IpAddr>, LookupError> {
    match self.resolver.lookup_ip(host).await {
      Ok(response) => Ok(response.iter().collect()),
      // SERVFAIL, REFUSED and friends also surface as NoRecordsFound; only
      // an authoritative "no such name" or an empty answer counts as free.
      Err(e) => match e.kind() {
        ResolveErrorKind::NoRecordsFound {
          response_code: ResponseCode::NXDomain | ResponseCode::NoError,
          ..
        } => Err(LookupError::NotFound),
        _ => Err(LookupError::Failed(e.to_string())),
      },
    }
  }
}

/// Check if `{name}.{tld}` is unregistered
///
/// Uses a DNS address lookup, so a registered domain with no A/AAAA records
/// still reads as available.
/// - addresses found: Taken, detail lists them
/// - not found / no addresses: Available
pub struct DomainChecker {
  resolver: Arc<dyn HostLookup>,
  tld: String,
  display_name: String,
}

impl DomainChecker {
  pub fn new(resolver: Arc<dyn HostLookup>, tld: &str) -> Self {
    let tld = tld.trim_start_matches('.').to_lowercase();
    Self {
      resolver,
      display_name: format!("Domain (.{})", tld),
      tld,
    }
  }
}

#[async_trait]
impl Checker for DomainChecker {
  /// Shared by every TLD so `--skip domain` drops them all
  fn name(&self) -> &str {
    "domain"
  }

  fn display_name(&self) -> &str {
    &self.display_name
  }

  async fn check(&self, ctx: &CancellationToken, name: &str) -> CheckResult {
    let fqdn = format!("{}.{}", name, self.tld);

    let lookup = tokio::select! {
      biased;
      _ = ctx.cancelled() => {
        return CheckResult::unknown(self.display_name(), name, CheckError::Cancelled);
      }
      lookup = self.resolver.lookup_host(&fqdn) => lookup,
    };

    match lookup {
      Ok(addrs) if addrs.is_empty() => CheckResult::available(self.display_name(), name),
      Ok(addrs) => {
        let detail = addrs
          .iter()
          .map(IpAddr::to_string)
          .collect::<Vec<_>>()
          .join(", ");
        CheckResult::taken(self.display_name(), name, Some(detail))
      }
      Err(LookupError::NotFound) => CheckResult::available(self.display_name(), name),
      Err(LookupError::Failed(e)) => CheckResult::unknown(self.display_name(), name, CheckError::Dns(e)),
    }
  }
}

//! A-record lookups: resolver configuration, outcomes and the trust-dns backend.
use std::future::Future;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use log::debug;
use trust_dns_resolver::config::{
    LookupIpStrategy, NameServerConfig, Protocol, ResolverConfig as UpstreamConfig, ResolverOpts,
};
use trust_dns_resolver::error::{ResolveError, ResolveErrorKind};
use trust_dns_resolver::proto::op::ResponseCode;
use trust_dns_resolver::TokioAsyncResolver;

/// Public resolvers used when the caller does not name any (Google, Cloudflare).
pub const DEFAULT_RESOLVERS: [&str; 2] = ["8.8.8.8", "1.1.1.1"];

/// Lifetime of a single A-record query.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);

const DNS_PORT: u16 = 53;

/// Nameservers and per-query timeout for one brute-force invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    nameservers: Vec<String>,
    timeout: Duration,
}

impl ResolverConfig {
    /// Replaces the per-query timeout. A zero duration keeps the default.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = if timeout.is_zero() { DEFAULT_TIMEOUT } else { timeout };
        self
    }

    /// Nameservers in the order given.
    pub fn nameservers(&self) -> &[String] {
        &self.nameservers
    }

    /// Per-query timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        new_resolver(None)
    }
}

/// Builds a resolver configuration, falling back to [`DEFAULT_RESOLVERS`]
/// when `nameservers` is unset or empty.
///
/// Addresses are not validated here; a malformed entry shows up later as
/// failed lookups.
pub fn new_resolver(nameservers: Option<Vec<String>>) -> ResolverConfig {
    let nameservers = match nameservers {
        Some(list) if !list.is_empty() => list,
        _ => DEFAULT_RESOLVERS.iter().map(|s| s.to_string()).collect(),
    };

    ResolverConfig {
        nameservers,
        timeout: DEFAULT_TIMEOUT,
    }
}

/// Why a lookup produced no answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupFailure {
    /// No answer within the configured lifetime.
    Timeout,
    /// No nameserver could be reached.
    NoConnections,
    /// Any other resolver error, rendered.
    Other(String),
}

/// Outcome of one A-record lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Sorted, deduplicated, never empty.
    Found(Vec<Ipv4Addr>),
    /// NXDOMAIN or an answer without A records.
    NoRecord,
    /// The lookup itself went wrong.
    Failed(LookupFailure),
}

impl Resolution {
    /// Normalizes a raw answer; an empty one becomes [`Resolution::NoRecord`].
    pub fn from_addresses(mut ips: Vec<Ipv4Addr>) -> Self {
        if ips.is_empty() {
            return Resolution::NoRecord;
        }
        ips.sort_unstable();
        ips.dedup();
        Resolution::Found(ips)
    }

    /// Resolved addresses; empty for anything but `Found`.
    pub fn addresses(&self) -> &[Ipv4Addr] {
        match self {
            Resolution::Found(ips) => ips,
            _ => &[],
        }
    }

    /// True for [`Resolution::Found`].
    pub fn is_found(&self) -> bool {
        matches!(self, Resolution::Found(_))
    }
}

impl From<ResolveError> for Resolution {
    fn from(err: ResolveError) -> Self {
        match err.kind() {
            ResolveErrorKind::NoRecordsFound { response_code, .. }
                if *response_code == ResponseCode::NXDomain
                    || *response_code == ResponseCode::NoError =>
            {
                Resolution::NoRecord
            }
            ResolveErrorKind::Timeout => Resolution::Failed(LookupFailure::Timeout),
            ResolveErrorKind::NoConnections => Resolution::Failed(LookupFailure::NoConnections),
            _ => Resolution::Failed(LookupFailure::Other(err.to_string())),
        }
    }
}

/// Anything that can answer A-record queries for the engine.
pub trait ARecordLookup: Send + Sync + 'static {
    /// Resolves `fqdn` to its IPv4 addresses. Must not panic on DNS errors.
    fn lookup_a(&self, fqdn: &str) -> impl Future<Output = Resolution> + Send;
}

/// A-record resolver backed by trust-dns.
#[derive(Clone)]
pub struct DnsResolver {
    resolver: TokioAsyncResolver,
    lifetime: Duration,
}

impl DnsResolver {
    /// Builds the resolver for `config`. Entries that are neither `ip` nor
    /// `ip:port` are dropped; with none left every query fails.
    pub fn from_config(config: &ResolverConfig) -> Self {
        let mut upstream = UpstreamConfig::new();
        for server in config.nameservers() {
            match parse_nameserver(server) {
                Some(socket_addr) => {
                    upstream.add_name_server(NameServerConfig::new(socket_addr, Protocol::Udp))
                }
                None => debug!("ignoring malformed nameserver {:?}", server),
            }
        }

        let mut options = ResolverOpts::default();
        options.timeout = config.timeout();
        options.attempts = 1;
        options.ip_strategy = LookupIpStrategy::Ipv4Only;
        options.ndots = 0;

        DnsResolver {
            resolver: TokioAsyncResolver::tokio(upstream, options),
            lifetime: config.timeout(),
        }
    }
}

impl ARecordLookup for DnsResolver {
    async fn lookup_a(&self, fqdn: &str) -> Resolution {
        let absolute = format!("{}.", fqdn.trim_end_matches('.'));

        match tokio::time::timeout(self.lifetime, self.resolver.lookup_ip(absolute)).await {
            Ok(Ok(response)) => Resolution::from_addresses(
                response
                    .iter()
                    .filter_map(|ip| match ip {
                        IpAddr::V4(ipv4) => Some(ipv4),
                        IpAddr::V6(_) => None,
                    })
                    .collect(),
            ),
            Ok(Err(err)) => Resolution::from(err),
            Err(_) => Resolution::Failed(LookupFailure::Timeout),
        }
    }
}

fn parse_nameserver(server: &str) -> Option<SocketAddr> {
    let server = server.trim();
    server
        .parse::<SocketAddr>()
        .ok()
        .or_else(|| server.parse::<IpAddr>().ok().map(|ip| SocketAddr::new(ip, DNS_PORT)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_or_missing_nameservers_fall_back_to_defaults() {
        let defaults: Vec<String> = DEFAULT_RESOLVERS.iter().map(|s| s.to_string()).collect();
        assert_eq!(new_resolver(None).nameservers(), defaults.as_slice());
        assert_eq!(new_resolver(Some(vec![])).nameservers(), defaults.as_slice());
        assert_eq!(new_resolver(None).timeout(), DEFAULT_TIMEOUT);
    }

    #[test]
    fn custom_nameservers_are_kept_in_order_without_validation() {
        let config = new_resolver(Some(vec!["9.9.9.9".into(), "not-an-ip".into()]));
        assert_eq!(config.nameservers(), ["9.9.9.9", "not-an-ip"]);
    }

    #[test]
    fn zero_timeout_keeps_default() {
        let config = new_resolver(None).with_timeout(Duration::ZERO);
        assert_eq!(config.timeout(), DEFAULT_TIMEOUT);
        let config = new_resolver(None).with_timeout(Duration::from_millis(500));
        assert_eq!(config.timeout(), Duration::from_millis(500));
    }

    #[test]
    fn nameserver_parsing() {
        assert_eq!(
            parse_nameserver("1.1.1.1"),
            Some("1.1.1.1:53".parse().unwrap())
        );
        assert_eq!(
            parse_nameserver(" 127.0.0.1:5353 "),
            Some("127.0.0.1:5353".parse().unwrap())
        );
        assert_eq!(parse_nameserver("dns.example"), None);
    }

    #[test]
    fn resolution_is_sorted_and_deduplicated() {
        let ips = vec![
            Ipv4Addr::new(10, 0, 0, 2),
            Ipv4Addr::new(10, 0, 0, 1),
            Ipv4Addr::new(10, 0, 0, 2),
        ];
        assert_eq!(
            Resolution::from_addresses(ips),
            Resolution::Found(vec![Ipv4Addr::new(10, 0, 0, 1), Ipv4Addr::new(10, 0, 0, 2)])
        );
        assert_eq!(Resolution::from_addresses(vec![]), Resolution::NoRecord);
        assert!(Resolution::NoRecord.addresses().is_empty());
    }

    #[tokio::test]
    async fn resolver_without_usable_nameservers_fails_per_query() {
        let config = new_resolver(Some(vec!["bogus".into()])).with_timeout(Duration::from_millis(200));
        let resolver = DnsResolver::from_config(&config);
        let resolution = resolver.lookup_a("www.example.com").await;
        assert!(!resolution.is_found());
    }
}

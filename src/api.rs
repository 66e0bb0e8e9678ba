//! The subdomain brute-force engine.
use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, error, info, warn};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::dns_resolver::{ARecordLookup, DnsResolver, Resolution, ResolverConfig};
use crate::error::{Error, Result};
use crate::wildcard::{detect_wildcard, recheck_label, WildcardVerdict};

/// Upper bound for the default worker count.
pub const MAX_DEFAULT_WORKERS: usize = 200;

/// FQDN to the IP addresses it resolved to.
pub type ResultSet = HashMap<String, Vec<String>>;

/// Default concurrency: ten lookups per available core, capped at 200.
pub fn default_workers() -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    (cores * 10).min(MAX_DEFAULT_WORKERS)
}

/// Brute-force configuration
#[derive(Debug, Clone)]
pub struct SubdomainBruteConfig {
    /// Maximum simultaneously in-flight candidate lookups
    pub concurrency: usize,
    /// Nameservers and per-query timeout
    pub resolver: ResolverConfig,
}

impl Default for SubdomainBruteConfig {
    fn default() -> Self {
        SubdomainBruteConfig {
            concurrency: default_workers(),
            resolver: ResolverConfig::default(),
        }
    }
}

/// A confirmed subdomain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hit {
    /// `<word>.<domain>`
    pub fqdn: String,
    /// Sorted, deduplicated A records.
    pub ips: Vec<Ipv4Addr>,
}

impl Hit {
    fn ip_strings(&self) -> Vec<String> {
        self.ips.iter().map(|ip| ip.to_string()).collect()
    }
}

/// Per-run counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Non-blank wordlist entries.
    pub candidates: usize,
    /// Hits kept in the result set.
    pub accepted: usize,
    /// Hits dropped as wildcard artifacts.
    pub suppressed: usize,
    /// NXDOMAIN or empty answers.
    pub no_record: usize,
    /// Timeouts, unreachable resolvers and aborted tasks.
    pub failed: usize,
    /// Candidates never dispatched because the run was stopped.
    pub skipped: usize,
}

/// Everything a brute-force run produced.
#[derive(Debug, Clone)]
pub struct BruteForceReport {
    /// Accepted hits.
    pub results: ResultSet,
    /// Outcome of the up-front wildcard probes.
    pub wildcard: WildcardVerdict,
    /// Per-run counters.
    pub stats: RunStats,
}

/// Stops dispatching new lookups. Lookups already in flight still finish.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    /// Requests the stop; later calls are no-ops.
    pub fn stop(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether [`StopHandle::stop`] was called on any clone.
    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

enum CandidateOutcome {
    Accepted(Hit),
    Suppressed(Hit),
    Missed(String, Resolution),
}

/// Subdomain brute-force engine
pub struct SubdomainBruteEngine<R = DnsResolver> {
    resolver: Arc<R>,
    concurrency: usize,
    stop: StopHandle,
}

impl SubdomainBruteEngine<DnsResolver> {
    /// Creates an engine backed by a fresh trust-dns resolver.
    pub fn new(config: SubdomainBruteConfig) -> Result<Self> {
        if config.concurrency == 0 {
            return Err(Error::InvalidConcurrency(0));
        }
        let resolver = DnsResolver::from_config(&config.resolver);
        Self::with_resolver(resolver, config.concurrency)
    }
}

impl<R: ARecordLookup> SubdomainBruteEngine<R> {
    /// Creates an engine over any A-record lookup.
    pub fn with_resolver(resolver: R, concurrency: usize) -> Result<Self> {
        if concurrency == 0 {
            return Err(Error::InvalidConcurrency(concurrency));
        }

        Ok(SubdomainBruteEngine {
            resolver: Arc::new(resolver),
            concurrency,
            stop: StopHandle::default(),
        })
    }

    /// Handle that stops this engine's runs from another task.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Resolves `<word>.<domain>` for every word and keeps the confirmed hits.
    ///
    /// Wildcard detection runs once up front. When the zone is wildcard, every
    /// hit costs one extra query: a fresh random label is resolved and the hit
    /// is dropped if that sample returns exactly the same addresses. Lookup
    /// failures only remove the affected candidate.
    pub async fn run(&self, domain: &str, wordlist: &[String]) -> Result<BruteForceReport> {
        let domain = domain.trim().trim_end_matches('.');
        if domain.is_empty() {
            return Err(Error::EmptyDomain);
        }

        let wildcard = detect_wildcard(domain, self.resolver.as_ref()).await;
        if wildcard.is_wildcard {
            warn!(
                "wildcard DNS detected for {} ({:?}); results may contain false positives",
                domain, wildcard.sample
            );
        }

        let candidates: Vec<&str> = wordlist
            .iter()
            .map(|word| word.trim())
            .filter(|word| !word.is_empty())
            .collect();

        let mut stats = RunStats {
            candidates: candidates.len(),
            ..Default::default()
        };
        let mut results = ResultSet::with_capacity(candidates.len().min(1024));

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();

        for (dispatched, word) in candidates.iter().enumerate() {
            if self.stop.is_stopped() {
                stats.skipped = candidates.len() - dispatched;
                break;
            }

            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|e| Error::Schedule(e.to_string()))?;

            if self.stop.is_stopped() {
                stats.skipped = candidates.len() - dispatched;
                break;
            }

            let resolver = Arc::clone(&self.resolver);
            let fqdn = format!("{}.{}", word, domain);
            let domain = domain.to_string();
            let recheck = wildcard.is_wildcard;

            tasks.spawn(async move {
                let _permit = permit;
                resolve_candidate(resolver.as_ref(), fqdn, &domain, recheck).await
            });

            // Keep the collector draining while dispatch is still going.
            while let Some(joined) = tasks.try_join_next() {
                collect(joined, &mut results, &mut stats);
            }
        }

        while let Some(joined) = tasks.join_next().await {
            collect(joined, &mut results, &mut stats);
        }

        debug!("brute force for {} finished: {:?}", domain, stats);

        Ok(BruteForceReport {
            results,
            wildcard,
            stats,
        })
    }
}

async fn resolve_candidate<R: ARecordLookup>(
    resolver: &R,
    fqdn: String,
    domain: &str,
    recheck: bool,
) -> CandidateOutcome {
    let resolution = resolver.lookup_a(&fqdn).await;
    let ips = match resolution {
        Resolution::Found(ips) => ips,
        other => return CandidateOutcome::Missed(fqdn, other),
    };
    let hit = Hit { fqdn, ips };

    if recheck {
        let sample = resolver
            .lookup_a(&format!("{}.{}", recheck_label(), domain))
            .await;
        // An empty or failed sample is no evidence of masking.
        if sample.is_found() && sample.addresses() == hit.ips.as_slice() {
            return CandidateOutcome::Suppressed(hit);
        }
    }

    CandidateOutcome::Accepted(hit)
}

fn collect(
    joined: std::result::Result<CandidateOutcome, tokio::task::JoinError>,
    results: &mut ResultSet,
    stats: &mut RunStats,
) {
    match joined {
        Ok(CandidateOutcome::Accepted(hit)) => {
            let ips = hit.ip_strings();
            info!("found: {} -> {:?}", hit.fqdn, ips);
            results.insert(hit.fqdn, ips);
            stats.accepted += 1;
        }
        Ok(CandidateOutcome::Suppressed(hit)) => {
            debug!("dropping wildcard artifact {} -> {:?}", hit.fqdn, hit.ips);
            stats.suppressed += 1;
        }
        Ok(CandidateOutcome::Missed(fqdn, Resolution::Failed(cause))) => {
            debug!("lookup failed for {}: {:?}", fqdn, cause);
            stats.failed += 1;
        }
        Ok(CandidateOutcome::Missed(_, _)) => stats.no_record += 1,
        Err(e) => {
            error!("lookup task aborted: {}", e);
            stats.failed += 1;
        }
    }
}

/// Convenience wrapper: builds a resolver from `config` and returns only the hits.
pub async fn bruteforce(
    domain: &str,
    wordlist: &[String],
    concurrency: usize,
    config: ResolverConfig,
) -> Result<ResultSet> {
    let engine = SubdomainBruteEngine::new(SubdomainBruteConfig {
        concurrency,
        resolver: config,
    })?;
    Ok(engine.run(domain, wordlist).await?.results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dns_resolver::LookupFailure;
    use std::sync::atomic::AtomicUsize;

    /// In-memory zone; unknown labels resolve to `wildcard` when set.
    #[derive(Default)]
    struct Zone {
        records: HashMap<String, Vec<Ipv4Addr>>,
        failing: Vec<String>,
        wildcard: Option<Vec<Ipv4Addr>>,
        recheck: Option<Resolution>,
        calls: AtomicUsize,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    impl Zone {
        fn record(mut self, fqdn: &str, ips: &[[u8; 4]]) -> Self {
            self.records
                .insert(fqdn.to_string(), ips.iter().map(|o| Ipv4Addr::from(*o)).collect());
            self
        }

        fn wildcard(mut self, ips: &[[u8; 4]]) -> Self {
            self.wildcard = Some(ips.iter().map(|o| Ipv4Addr::from(*o)).collect());
            self
        }

        /// Answer for recheck labels, overriding the wildcard set.
        fn recheck(mut self, answer: Resolution) -> Self {
            self.recheck = Some(answer);
            self
        }

        fn failing(mut self, fqdn: &str) -> Self {
            self.failing.push(fqdn.to_string());
            self
        }
    }

    impl ARecordLookup for Zone {
        async fn lookup_a(&self, fqdn: &str) -> Resolution {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::task::yield_now().await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if let Some(answer) = &self.recheck {
                if fqdn.starts_with("random-skip-") {
                    return answer.clone();
                }
            }
            if self.failing.iter().any(|f| f == fqdn) {
                return Resolution::Failed(LookupFailure::Timeout);
            }
            match (self.records.get(fqdn), &self.wildcard) {
                (Some(ips), _) => Resolution::from_addresses(ips.clone()),
                (None, Some(ips)) => Resolution::from_addresses(ips.clone()),
                (None, None) => Resolution::NoRecord,
            }
        }
    }

    fn words(list: &[&str]) -> Vec<String> {
        list.iter().map(|w| w.to_string()).collect()
    }

    #[tokio::test]
    async fn finds_existing_and_skips_missing() {
        let zone = Zone::default().record("www.example.com", &[[1, 2, 3, 4]]);
        let engine = SubdomainBruteEngine::with_resolver(zone, 4).unwrap();
        let report = engine
            .run("example.com", &words(&["www", "ghost123xyz"]))
            .await
            .unwrap();

        let expected: ResultSet =
            [("www.example.com".to_string(), vec!["1.2.3.4".to_string()])].into();
        assert_eq!(report.results, expected);
        assert!(!report.wildcard.is_wildcard);
        assert_eq!(report.stats.accepted, 1);
        assert_eq!(report.stats.no_record, 1);
    }

    #[tokio::test]
    async fn wildcard_artifacts_are_suppressed() {
        let zone = Zone::default()
            .wildcard(&[[9, 9, 9, 9]])
            .record("www.example.com", &[[9, 9, 9, 9]])
            .record("api.example.com", &[[10, 0, 0, 1]]);
        let engine = SubdomainBruteEngine::with_resolver(zone, 8).unwrap();
        let report = engine
            .run("example.com", &words(&["www", "api", "fake1", "fake2"]))
            .await
            .unwrap();

        assert!(report.wildcard.is_wildcard);
        assert_eq!(report.results.len(), 1);
        assert_eq!(report.results["api.example.com"], vec!["10.0.0.1"]);
        assert_eq!(report.stats.suppressed, 3);
    }

    #[tokio::test]
    async fn every_hit_costs_one_recheck_under_wildcard() {
        let zone = Zone::default()
            .wildcard(&[[9, 9, 9, 9]])
            .record("api.example.com", &[[10, 0, 0, 1]]);
        let engine = SubdomainBruteEngine::with_resolver(zone, 2).unwrap();
        engine.run("example.com", &words(&["api", "www"])).await.unwrap();

        // 3 probes + 2 candidates + 2 rechecks
        assert_eq!(engine.resolver.calls.load(Ordering::SeqCst), 7);
    }

    async fn run_with_recheck(answer: Resolution) -> BruteForceReport {
        let zone = Zone::default().wildcard(&[[9, 9, 9, 9]]).recheck(answer);
        let engine = SubdomainBruteEngine::with_resolver(zone, 2).unwrap();
        let report = engine.run("example.com", &words(&["www"])).await.unwrap();

        // 3 probes + 1 candidate + 1 recheck
        assert_eq!(engine.resolver.calls.load(Ordering::SeqCst), 5);
        report
    }

    #[tokio::test]
    async fn failed_recheck_keeps_the_hit() {
        let report = run_with_recheck(Resolution::Failed(LookupFailure::Timeout)).await;

        assert!(report.wildcard.is_wildcard);
        assert_eq!(report.results["www.example.com"], vec!["9.9.9.9"]);
        assert_eq!(report.stats.accepted, 1);
        assert_eq!(report.stats.suppressed, 0);
    }

    #[tokio::test]
    async fn empty_recheck_keeps_the_hit() {
        let report = run_with_recheck(Resolution::NoRecord).await;

        assert!(report.wildcard.is_wildcard);
        assert_eq!(report.results["www.example.com"], vec!["9.9.9.9"]);
        assert_eq!(report.stats.accepted, 1);
    }

    #[tokio::test]
    async fn recheck_with_other_addresses_keeps_the_hit() {
        let report = run_with_recheck(Resolution::from_addresses(vec![Ipv4Addr::new(9, 9, 9, 10)])).await;

        assert_eq!(report.results.len(), 1);
        assert_eq!(report.stats.suppressed, 0);
    }

    #[tokio::test]
    async fn failures_only_drop_their_candidate() {
        let zone = Zone::default()
            .record("www.example.com", &[[1, 2, 3, 4]])
            .record("mail.example.com", &[[1, 2, 3, 5]])
            .failing("mail.example.com");
        let engine = SubdomainBruteEngine::with_resolver(zone, 2).unwrap();
        let report = engine.run("example.com", &words(&["www", "mail"])).await.unwrap();

        assert_eq!(report.results.len(), 1);
        assert!(report.results.contains_key("www.example.com"));
        assert_eq!(report.stats.failed, 1);
    }

    #[tokio::test]
    async fn empty_wordlist_only_probes() {
        let engine = SubdomainBruteEngine::with_resolver(Zone::default(), 4).unwrap();
        let report = engine.run("example.com", &[]).await.unwrap();

        assert!(report.results.is_empty());
        assert_eq!(engine.resolver.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn concurrency_is_bounded() {
        let mut zone = Zone::default();
        for i in 0..50 {
            zone = zone.record(&format!("h{}.example.com", i), &[[10, 0, 0, i as u8]]);
        }
        let list: Vec<String> = (0..50).map(|i| format!("h{}", i)).collect();
        let engine = SubdomainBruteEngine::with_resolver(zone, 5).unwrap();
        let report = engine.run("example.com", &list).await.unwrap();

        assert_eq!(report.results.len(), 50);
        assert!(engine.resolver.peak.load(Ordering::SeqCst) <= 5);
    }

    #[tokio::test]
    async fn stopped_engine_dispatches_nothing() {
        let zone = Zone::default().record("www.example.com", &[[1, 2, 3, 4]]);
        let engine = SubdomainBruteEngine::with_resolver(zone, 4).unwrap();
        engine.stop_handle().stop();
        let report = engine.run("example.com", &words(&["www", "mail"])).await.unwrap();

        assert!(report.results.is_empty());
        assert_eq!(report.stats.skipped, 2);
    }

    #[tokio::test]
    async fn invalid_arguments_are_errors() {
        assert!(matches!(
            SubdomainBruteEngine::with_resolver(Zone::default(), 0),
            Err(Error::InvalidConcurrency(0))
        ));

        let engine = SubdomainBruteEngine::with_resolver(Zone::default(), 1).unwrap();
        assert!(matches!(
            engine.run("  ", &words(&["www"])).await,
            Err(Error::EmptyDomain)
        ));
    }

    #[tokio::test]
    async fn domain_is_normalized_and_blank_words_ignored() {
        let zone = Zone::default().record("www.example.com", &[[1, 2, 3, 4]]);
        let engine = SubdomainBruteEngine::with_resolver(zone, 1).unwrap();
        let report = engine
            .run(" example.com. ", &words(&["", "  www  ", " "]))
            .await
            .unwrap();

        assert_eq!(report.stats.candidates, 1);
        assert!(report.results.contains_key("www.example.com"));
    }

    #[test]
    fn default_workers_is_capped() {
        let workers = default_workers();
        assert!(workers >= 1 && workers <= MAX_DEFAULT_WORKERS);
    }
}

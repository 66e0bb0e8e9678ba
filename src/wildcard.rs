//! Wildcard-DNS detection.
use std::net::Ipv4Addr;

use log::debug;
use rand::Rng;

use crate::dns_resolver::ARecordLookup;

/// Random labels resolved per detection.
const PROBE_COUNT: usize = 3;

/// Identical non-empty probe answers needed to call a zone wildcard.
const MIN_AGREEING_PROBES: usize = 2;

/// Result of probing a domain for wildcard DNS.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WildcardVerdict {
    /// Unknown labels resolve, so hits need a recheck.
    pub is_wildcard: bool,
    /// First non-empty probe answer, sorted. Empty if every probe came back empty.
    pub sample: Vec<Ipv4Addr>,
}

/// Label for the up-front probes: a coarse clock component plus a random suffix.
pub fn probe_label() -> String {
    let millis = chrono::Utc::now().timestamp_millis().rem_euclid(100_000);
    let suffix: u16 = rand::thread_rng().gen_range(1000..=9999);
    format!("w{}-{}", millis, suffix)
}

/// Label for the per-hit recheck under wildcard mode.
pub fn recheck_label() -> String {
    let suffix: u32 = rand::thread_rng().gen_range(10_000..=99_999);
    format!("random-skip-{}", suffix)
}

/// Probes `domain` with random, almost certainly nonexistent labels.
///
/// Failed lookups count as empty answers. The domain is flagged when at least
/// two probes answered and all answers are identical; fewer answers are not
/// enough evidence and yield "not wildcard".
pub async fn detect_wildcard<R: ARecordLookup>(domain: &str, resolver: &R) -> WildcardVerdict {
    let mut answers: Vec<Vec<Ipv4Addr>> = Vec::with_capacity(PROBE_COUNT);

    for _ in 0..PROBE_COUNT {
        let probe = format!("{}.{}", probe_label(), domain);
        let resolution = resolver.lookup_a(&probe).await;
        debug!("wildcard probe {} -> {:?}", probe, resolution);

        if resolution.is_found() {
            answers.push(resolution.addresses().to_vec());
        }
    }

    let is_wildcard =
        answers.len() >= MIN_AGREEING_PROBES && answers.iter().all(|ips| *ips == answers[0]);

    WildcardVerdict {
        is_wildcard,
        sample: answers.into_iter().next().unwrap_or_default(),
    }
}

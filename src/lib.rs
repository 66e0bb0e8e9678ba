//! # husk
//!
//! Recon helper built around a DNS subdomain brute-forcer.
//!
//! ## Features
//!
//! - **Subdomain discovery**: concurrent A-record lookups of `<word>.<domain>`
//!   with wildcard-DNS detection and per-hit false-positive rechecks
//! - **Liveness**: keeps the subdomains that answer over HTTP or HTTPS
//! - **Follow-up probes**: screenshots, nmap port scan and path fuzzing of live hosts
//! - **Results**: indented JSON files, optionally timestamped
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use husk::{bruteforce, new_resolver};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), husk::Error> {
//!     let words = vec!["www".to_string(), "mail".to_string()];
//!     let found = bruteforce("example.com", &words, 50, new_resolver(None)).await?;
//!
//!     for (fqdn, ips) in &found {
//!         println!("{} -> {:?}", fqdn, ips);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Custom resolvers and cancellation
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use husk::{new_resolver, SubdomainBruteConfig, SubdomainBruteEngine};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), husk::Error> {
//!     let config = SubdomainBruteConfig {
//!         concurrency: 100,
//!         resolver: new_resolver(Some(vec!["9.9.9.9".into()]))
//!             .with_timeout(Duration::from_secs(2)),
//!     };
//!
//!     let engine = SubdomainBruteEngine::new(config)?;
//!     let stop = engine.stop_handle();
//!     tokio::spawn(async move {
//!         let _ = tokio::signal::ctrl_c().await;
//!         stop.stop();
//!     });
//!
//!     let report = engine.run("example.com", &["www".to_string()]).await?;
//!     println!("{:?}", report.stats);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod api;
pub mod config;
pub mod dns_resolver;
pub mod error;
pub mod input;
pub mod logger;
pub mod wildcard;

#[cfg(any(feature = "verify", feature = "fuzz"))]
pub mod http;

#[cfg(feature = "verify")]
pub mod verify;

#[cfg(feature = "fuzz")]
pub mod fuzz;

#[cfg(feature = "nmap")]
pub mod nmap;

#[cfg(feature = "output")]
pub mod output;

#[cfg(feature = "screenshot")]
pub mod screenshot;

pub use api::{
    bruteforce, default_workers, BruteForceReport, Hit, ResultSet, RunStats, StopHandle,
    SubdomainBruteConfig, SubdomainBruteEngine,
};
pub use dns_resolver::{
    new_resolver, ARecordLookup, DnsResolver, LookupFailure, Resolution, ResolverConfig,
    DEFAULT_RESOLVERS,
};
pub use error::{Error, Result};
pub use input::{load_wordlist, parse_wordlist};
pub use wildcard::{detect_wildcard, WildcardVerdict};

#[cfg(feature = "verify")]
pub use verify::DomainVerifier;

#[cfg(feature = "fuzz")]
pub use fuzz::{PathFuzzer, PathHit};

#[cfg(feature = "nmap")]
pub use nmap::{parse_nmap_xml, run_nmap, NmapHost, NmapPort};

#[cfg(feature = "output")]
pub use output::{pretty, save_json};

#[cfg(feature = "screenshot")]
pub use screenshot::screenshot_url;

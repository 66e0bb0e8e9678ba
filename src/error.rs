//! Crate error type.
use std::path::PathBuf;
use thiserror::Error;

/// Errors that stop a whole operation.
///
/// A single DNS lookup failing is never one of these: per-candidate failures
/// are carried as [`Resolution`](crate::dns_resolver::Resolution) values.
#[derive(Error, Debug)]
pub enum Error {
    /// The target domain was empty after trimming.
    #[error("target domain is empty")]
    EmptyDomain,

    /// Concurrency must allow at least one in-flight lookup.
    #[error("concurrency must be a positive integer, got {0}")]
    InvalidConcurrency(usize),

    /// The engine could not dispatch lookups.
    #[error("could not schedule lookups: {0}")]
    Schedule(String),

    /// A wordlist could not be read.
    #[error("could not read wordlist {path}: {source}")]
    Wordlist {
        /// Path that was opened.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// Filesystem failure while persisting results.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Results could not be serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The HTTP client could not be built.
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// nmap output was not well-formed XML.
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// nmap could not be started or exited abnormally.
    #[error("nmap failed: {0}")]
    Nmap(String),

    /// The headless browser could not render or capture a page.
    #[error("screenshot failed: {0}")]
    Screenshot(String),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

//! Deployment settings resolved from flags and environment.
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::warn;

use crate::input::GlobalOpts;

/// Loads `path`, or `.env` from the working directory or its parents, into
/// the process environment. Variables that are already set are kept.
/// Returns the file that was read.
pub fn load_dotenv(path: Option<&Path>) -> Option<PathBuf> {
    match path {
        Some(path) => dotenvy::from_path(path).ok().map(|_| path.to_path_buf()),
        None => dotenvy::dotenv().ok(),
    }
}

/// Paths and tool settings for one invocation of the binary.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Holds the default wordlists.
    pub data_dir: PathBuf,
    /// Receives the JSON result files.
    pub results_dir: PathBuf,
    /// Receives page screenshots.
    pub screenshot_dir: PathBuf,
    /// Subdomain wordlist used when a command names none.
    pub default_wordlist: PathBuf,
    /// Path wordlist used when a command names none.
    pub path_wordlist: PathBuf,
    /// Per-request HTTP timeout, at least one second.
    pub http_timeout: Duration,
    /// Value of nmap's `-p`.
    pub nmap_ports: String,
    /// Arguments placed before `-p` on the nmap command line.
    pub nmap_extra_args: Vec<String>,
}

impl Settings {
    /// Creates the data, results and screenshot directories. Failures are
    /// logged, not fatal.
    pub fn ensure_dirs(&self) {
        for dir in [&self.data_dir, &self.results_dir, &self.screenshot_dir] {
            if let Err(e) = fs::create_dir_all(dir) {
                warn!("could not create dir {}: {}", dir.display(), e);
            }
        }
    }
}

impl From<&GlobalOpts> for Settings {
    fn from(opts: &GlobalOpts) -> Self {
        let data_dir = opts.data_dir.clone();
        Settings {
            default_wordlist: opts
                .default_wordlist
                .clone()
                .unwrap_or_else(|| data_dir.join("subdomains.txt")),
            path_wordlist: opts
                .path_wordlist
                .clone()
                .unwrap_or_else(|| data_dir.join("paths.txt")),
            results_dir: opts.results_dir.clone(),
            screenshot_dir: opts.screenshot_dir.clone(),
            http_timeout: Duration::from_secs(opts.http_timeout.max(1)),
            nmap_ports: opts.nmap_ports.clone(),
            nmap_extra_args: opts
                .nmap_extra_args
                .split_whitespace()
                .map(str::to_owned)
                .collect(),
            data_dir,
        }
    }
}

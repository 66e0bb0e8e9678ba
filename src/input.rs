//! Wordlists and the command line.
use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};

use crate::error::{Error, Result};

/// Candidate labels in `contents`: trimmed, non-empty, not starting with `#`.
pub fn parse_wordlist(contents: &str) -> Vec<String> {
    contents
        .lines()
        .filter(|line| !line.starts_with('#'))
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Reads and parses a wordlist file.
pub fn load_wordlist(path: &Path) -> Result<Vec<String>> {
    let contents = fs::read_to_string(path).map_err(|source| Error::Wordlist {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_wordlist(&contents))
}

/// Like [`load_wordlist`] but a missing file is an empty list.
pub fn load_wordlist_or_empty(path: &Path) -> Result<Vec<String>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    load_wordlist(path)
}

/// Command line of the `husk` binary.
#[derive(Parser, Debug)]
#[command(name = "husk")]
#[command(version)]
#[command(about = "Recon automation helper (use responsibly)", long_about = None, arg_required_else_help = true)]
pub struct Opts {
    /// Flags accepted by every subcommand
    #[command(flatten)]
    pub global: GlobalOpts,

    /// Stage to run
    #[command(subcommand)]
    pub command: Command,
}

/// Flags shared by every subcommand; paths and tuning fall back to the environment.
#[derive(Args, Debug, Clone)]
pub struct GlobalOpts {
    /// append UTC timestamp to results filenames
    #[arg(short, long, global = true)]
    pub timestamp: bool,

    /// enable debug logging
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// directory holding default wordlists
    #[arg(long, global = true, env = "DATA_DIR", default_value = "data")]
    pub data_dir: PathBuf,

    /// directory receiving JSON results
    #[arg(long, global = true, env = "RESULTS_DIR", default_value = "results")]
    pub results_dir: PathBuf,

    /// default subdomain wordlist (DATA_DIR/subdomains.txt when unset)
    #[arg(long, global = true, env = "DEFAULT_WORDLIST")]
    pub default_wordlist: Option<PathBuf>,

    /// default path wordlist (DATA_DIR/paths.txt when unset)
    #[arg(long, global = true, env = "PATH_WORDLIST")]
    pub path_wordlist: Option<PathBuf>,

    /// directory receiving page screenshots
    #[arg(long, global = true, env = "SCREENSHOT_DIR", default_value = "screenshots")]
    pub screenshot_dir: PathBuf,

    /// HTTP timeout in seconds
    #[arg(long, global = true, env = "HTTP_TIMEOUT", default_value_t = 6)]
    pub http_timeout: u64,

    /// ports passed to nmap -p
    #[arg(long, global = true, env = "NMAP_PORTS", default_value = "1-1000")]
    pub nmap_ports: String,

    /// extra nmap arguments, whitespace separated
    #[arg(long, global = true, env = "NMAP_EXTRA_ARGS", default_value = "-sV -sC", allow_hyphen_values = true)]
    pub nmap_extra_args: String,
}

/// Subcommands, one per recon stage plus the full pipeline.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run subdomain bruteforce resolution and save results
    Subs(SubsArgs),
    /// Find live hosts from the subdomain wordlist and save results
    Hosts(TargetArgs),
    /// Take screenshots of live hosts and save the mapping
    Screenshots(ScreenshotsArgs),
    /// Run nmap on a target host and save results
    Nmap(NmapArgs),
    /// Fuzz paths on the first live host found and save results
    Fuzz(FuzzArgs),
    /// Full recon pipeline (subdomains -> hosts -> screenshots -> nmap -> fuzz)
    Recon(ReconArgs),
}

/// Arguments of `subs`.
#[derive(Args, Debug)]
pub struct SubsArgs {
    /// target domain
    pub domain: String,

    /// subdomain wordlist
    #[arg(short, long)]
    pub wordlist: Option<PathBuf>,

    /// number of concurrent lookups (auto if omitted)
    #[arg(long)]
    pub workers: Option<usize>,

    /// comma-separated DNS resolvers, e.g. 8.8.8.8,1.1.1.1
    #[arg(short, long, value_delimiter = ',')]
    pub resolvers: Vec<String>,

    /// per-query DNS timeout in seconds
    #[arg(long, default_value_t = 3)]
    pub dns_timeout: u64,
}

/// Arguments of `hosts`.
#[derive(Args, Debug)]
pub struct TargetArgs {
    /// target domain
    pub domain: String,

    /// subdomain wordlist
    #[arg(short, long)]
    pub wordlist: Option<PathBuf>,
}

/// Arguments of `screenshots`.
#[derive(Args, Debug)]
pub struct ScreenshotsArgs {
    /// target domain
    pub domain: String,

    /// subdomain wordlist
    #[arg(short, long)]
    pub wordlist: Option<PathBuf>,

    /// output directory for screenshots (SCREENSHOT_DIR when unset)
    #[arg(short, long)]
    pub outdir: Option<PathBuf>,
}

/// Arguments of `nmap`.
#[derive(Args, Debug)]
pub struct NmapArgs {
    /// host or address to scan
    pub target: String,
}

/// Arguments of `fuzz`.
#[derive(Args, Debug)]
pub struct FuzzArgs {
    /// target domain
    pub domain: String,

    /// paths wordlist
    #[arg(short, long)]
    pub paths: Option<PathBuf>,
}

/// Arguments of `recon`.
#[derive(Args, Debug)]
pub struct ReconArgs {
    /// target domain
    pub domain: String,

    /// subdomain wordlist
    #[arg(short, long)]
    pub wordlist: Option<PathBuf>,

    /// paths wordlist
    #[arg(short, long)]
    pub paths: Option<PathBuf>,

    /// skip screenshots
    #[arg(short, long)]
    pub no_screenshots: bool,

    /// skip the nmap stage
    #[arg(long)]
    pub no_nmap: bool,
}

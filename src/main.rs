use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;
use colored::Colorize;
use serde_json::json;

use husk::config::{load_dotenv, Settings};
use husk::fuzz::PathFuzzer;
use husk::input::{
    load_wordlist, load_wordlist_or_empty, Command, FuzzArgs, NmapArgs, Opts, ReconArgs,
    ScreenshotsArgs, SubsArgs, TargetArgs,
};
use husk::logger::init_logger;
use husk::output::{pretty, save_json};
use husk::screenshot::screenshot_url;
use husk::verify::DomainVerifier;
use husk::{
    default_workers, http, new_resolver, nmap, ResultSet, SubdomainBruteConfig,
    SubdomainBruteEngine,
};

const BANNER: &str = r"
========================================
 _   _ _   _ ____  _  __
| | | | | | / ___|| |/ /
| |_| | | | \___ \| ' /
|  _  | |_| |___) | . \
|_| |_|\___/|____/|_|\_\
========================================
";

#[tokio::main]
async fn main() {
    load_dotenv(None);
    let opts = Opts::parse();
    init_logger(opts.global.debug);

    println!("{}", BANNER.green().bold());
    println!("{}", format!("husk v{}", env!("CARGO_PKG_VERSION")).cyan().bold());
    println!("{}", "Use responsibly. Only run against authorized targets.\n".yellow());

    let settings = Settings::from(&opts.global);
    settings.ensure_dirs();
    let timestamp = opts.global.timestamp;

    let outcome = match opts.command {
        Command::Subs(args) => run_subs(&settings, args, timestamp).await,
        Command::Hosts(args) => run_hosts(&settings, args, timestamp).await,
        Command::Screenshots(args) => run_screenshots(&settings, args, timestamp).await,
        Command::Nmap(args) => run_nmap_cmd(&settings, args, timestamp).await,
        Command::Fuzz(args) => run_fuzz(&settings, args, timestamp).await,
        Command::Recon(args) => run_recon(&settings, args, timestamp).await,
    };

    if let Err(e) = outcome {
        eprintln!("{} {:#}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}

/// Brute-forces `domain`; Ctrl-C stops dispatching and keeps what was found.
async fn discover(
    domain: &str,
    words: &[String],
    config: SubdomainBruteConfig,
) -> anyhow::Result<ResultSet> {
    let engine = SubdomainBruteEngine::new(config)?;
    let stop = engine.stop_handle();
    let watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("{}", "interrupted, waiting for in-flight lookups".yellow());
            stop.stop();
        }
    });

    let report = engine.run(domain, words).await;
    watcher.abort();
    let report = report.with_context(|| format!("subdomain brute force for {} failed", domain))?;

    if report.stats.skipped > 0 {
        println!(
            "{}",
            format!("[subs] stopped early, {} candidates not tried", report.stats.skipped).yellow()
        );
    }
    Ok(report.results)
}

fn save(settings: &Settings, name: &str, data: &impl serde::Serialize, timestamp: bool) -> anyhow::Result<PathBuf> {
    let path = save_json(&settings.results_dir, name, data, timestamp)
        .with_context(|| format!("could not save {}", name))?;
    Ok(path)
}

fn absolute(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

async fn run_subs(settings: &Settings, args: SubsArgs, timestamp: bool) -> anyhow::Result<()> {
    let workers = args.workers.unwrap_or_else(default_workers);
    let wordlist = args.wordlist.unwrap_or_else(|| settings.default_wordlist.clone());
    if !wordlist.exists() {
        bail!("[subs] Wordlist not found: {}", absolute(&wordlist).display());
    }

    let entries = load_wordlist(&wordlist)?;
    println!(
        "{}",
        format!(
            "[subs] domain={} wordlist={} entries={} workers={}",
            args.domain,
            absolute(&wordlist).display(),
            entries.len(),
            workers
        )
        .blue()
    );

    let resolvers: Vec<String> = args
        .resolvers
        .iter()
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty())
        .collect();
    if resolvers.is_empty() {
        println!("{}", "[subs] using default public resolvers (Google/Cloudflare)".magenta());
    } else {
        println!("{}", format!("[subs] using resolvers: {:?}", resolvers).magenta());
    }

    let config = SubdomainBruteConfig {
        concurrency: workers,
        resolver: new_resolver(Some(resolvers)).with_timeout(Duration::from_secs(args.dns_timeout)),
    };
    let found = discover(&args.domain, &entries, config).await?;

    let saved = save(settings, &format!("{}_subdomains", args.domain), &found, timestamp)?;
    println!("{}", format!("[subs] saved results -> {}", absolute(&saved).display()).green());
    println!("{}", pretty(&found));
    Ok(())
}

/// Subdomains of `domain` that answer over HTTP(S).
async fn live_hosts(
    settings: &Settings,
    domain: &str,
    wordlist: Option<PathBuf>,
) -> anyhow::Result<(ResultSet, Vec<String>)> {
    let words = load_wordlist_or_empty(&wordlist.unwrap_or_else(|| settings.default_wordlist.clone()))?;
    let found = discover(domain, &words, SubdomainBruteConfig::default()).await?;

    let verifier = DomainVerifier::new(settings.http_timeout)?;
    let mut hosts: Vec<String> = found.keys().cloned().collect();
    hosts.sort();
    let live = verifier.filter_live(hosts).await;
    Ok((found, live))
}

async fn run_hosts(settings: &Settings, args: TargetArgs, timestamp: bool) -> anyhow::Result<()> {
    println!("{}", format!("[hosts] domain={}", args.domain).blue());
    let (_, live) = live_hosts(settings, &args.domain, args.wordlist).await?;

    let data = json!({ "live": live });
    let saved = save(settings, &format!("{}_live", args.domain), &data, timestamp)?;
    println!(
        "{}",
        format!("[hosts] found {} live hosts, saved -> {}", live.len(), absolute(&saved).display()).green()
    );
    println!("{}", pretty(&data));
    Ok(())
}

/// Host to screenshot path, or `error:<msg>` when the capture failed.
async fn take_screenshots(live: &[String], outdir: &Path, tag: &str) -> BTreeMap<String, String> {
    let mut shots = BTreeMap::new();
    for host in live {
        let url = format!("https://{}", host);
        match screenshot_url(&url, outdir).await {
            Ok(path) => {
                println!("{}", format!("[{}] screenshot -> {}", tag, path.display()).green());
                shots.insert(host.clone(), path.display().to_string());
            }
            Err(e) => {
                println!("{}", format!("[{}] error for {}: {}", tag, host, e).red());
                shots.insert(host.clone(), format!("error:{}", e));
            }
        }
    }
    shots
}

async fn run_screenshots(settings: &Settings, args: ScreenshotsArgs, timestamp: bool) -> anyhow::Result<()> {
    let (_, live) = live_hosts(settings, &args.domain, args.wordlist).await?;
    let outdir = args.outdir.unwrap_or_else(|| settings.screenshot_dir.clone());
    println!(
        "{}",
        format!("[screenshots] taking screenshots of {} live hosts", live.len()).blue()
    );

    let shots = take_screenshots(&live, &outdir, "screenshots").await;

    let saved = save(settings, &format!("{}_screenshots", args.domain), &shots, timestamp)?;
    println!(
        "{}",
        format!("[screenshots] saved mapping -> {}", absolute(&saved).display()).green()
    );
    println!("{}", pretty(&shots));
    Ok(())
}

async fn scan(settings: &Settings, target: &str) -> serde_json::Value {
    match nmap::run_nmap(target, &settings.nmap_ports, &settings.nmap_extra_args).await {
        Ok(hosts) => json!(hosts),
        Err(e) => json!({ "error": e.to_string() }),
    }
}

async fn run_nmap_cmd(settings: &Settings, args: NmapArgs, timestamp: bool) -> anyhow::Result<()> {
    println!(
        "{}",
        format!("[nmap] running nmap against {} (this requires system 'nmap' installed)", args.target).blue()
    );
    let result = scan(settings, &args.target).await;

    let saved = save(settings, &format!("{}_nmap", args.target), &result, timestamp)?;
    println!("{}", format!("[nmap] saved -> {}", absolute(&saved).display()).green());
    println!("{}", pretty(&result));
    Ok(())
}

async fn run_fuzz(settings: &Settings, args: FuzzArgs, timestamp: bool) -> anyhow::Result<()> {
    let (_, live) = live_hosts(settings, &args.domain, None).await?;
    let Some(first) = live.first() else {
        bail!("[fuzz] no live hosts found for fuzzing.");
    };

    let target = format!("https://{}", first);
    let paths_file = args.paths.unwrap_or_else(|| settings.path_wordlist.clone());
    let paths = load_wordlist_or_empty(&paths_file)?;
    println!("{}", format!("[fuzz] fuzzing {} with {} entries", target, paths.len()).blue());

    let fuzzer = PathFuzzer::new(http::build_client(settings.http_timeout)?);
    let hits = fuzzer.fuzz(&target, &paths).await;

    let saved = save(settings, &format!("{}_fuzz_first", args.domain), &hits, timestamp)?;
    println!("{}", format!("[fuzz] saved -> {}", absolute(&saved).display()).green());
    println!("{}", pretty(&hits));
    Ok(())
}

async fn run_recon(settings: &Settings, args: ReconArgs, timestamp: bool) -> anyhow::Result<()> {
    let domain = args.domain.as_str();
    println!("{}", format!("[recon] running subdomain brute force for {}", domain).blue());
    let (found, live) = live_hosts(settings, domain, args.wordlist).await?;
    save(settings, &format!("{}_subdomains", domain), &found, timestamp)?;
    save(settings, &format!("{}_live", domain), &json!({ "live": live }), timestamp)?;
    println!("{}", format!("[recon] {} live hosts found", live.len()).blue());

    let shots = if args.no_screenshots {
        BTreeMap::new()
    } else {
        take_screenshots(&live, &settings.screenshot_dir, "recon").await
    };
    save(settings, &format!("{}_screenshots", domain), &shots, timestamp)?;

    let nmap_result = match (live.first(), args.no_nmap) {
        (Some(first), false) => scan(settings, first).await,
        _ => json!([]),
    };
    save(settings, &format!("{}_nmap_first", domain), &nmap_result, timestamp)?;

    let fuzz_result = match live.first() {
        Some(first) => {
            let paths = load_wordlist_or_empty(&args.paths.unwrap_or_else(|| settings.path_wordlist.clone()))?;
            let fuzzer = PathFuzzer::new(http::build_client(settings.http_timeout)?);
            json!(fuzzer.fuzz(&format!("https://{}", first), &paths).await)
        }
        None => json!([]),
    };
    save(settings, &format!("{}_fuzz_first", domain), &fuzz_result, timestamp)?;

    println!(
        "{}",
        format!(
            "Recon for {} complete. Results saved in {}",
            domain,
            absolute(&settings.results_dir).display()
        )
        .cyan()
    );
    Ok(())
}

//! Console logger for the binary.
use std::io::Write;

use colored::Colorize;
use log::{Level, LevelFilter};

fn label(level: Level) -> colored::ColoredString {
    match level {
        Level::Error => "ERROR".red(),
        Level::Warn => "WARN".yellow(),
        Level::Info => "INFO".blue(),
        Level::Debug => "DEBUG".magenta(),
        Level::Trace => "TRACE".normal(),
    }
}

/// Installs the process logger. `RUST_LOG` overrides the chosen level.
/// Calling it again is a no-op.
pub fn init_logger(debug: bool) {
    let level = if debug { LevelFilter::Debug } else { LevelFilter::Info };

    let _ = env_logger::Builder::new()
        .filter_level(level)
        .filter_module("trust_dns_proto", LevelFilter::Warn)
        .filter_module("trust_dns_resolver", LevelFilter::Warn)
        .filter_module("hyper", LevelFilter::Warn)
        .filter_module("reqwest", LevelFilter::Warn)
        .parse_default_env()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] {}",
                chrono::Local::now().format("%H:%M:%S"),
                label(record.level()),
                record.args()
            )
        })
        .try_init();
}

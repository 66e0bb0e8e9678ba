//! Page screenshots through a headless Chrome/Chromium.
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use headless_chrome::protocol::cdp::Page::CaptureScreenshotFormatOption;
use headless_chrome::{Browser, LaunchOptions};
use log::debug;
use reqwest::Url;

use crate::error::{Error, Result};

/// Idle timeout handed to the browser and navigation timeout for the tab.
pub const SCREENSHOT_TIMEOUT: Duration = Duration::from_secs(30);

const WINDOW_SIZE: (u32, u32) = (1366, 768);

/// PNG file name for `url`: host, plus `_<port>` when one is given.
pub fn screenshot_file_name(url: &Url) -> String {
    let host: String = url
        .host_str()
        .unwrap_or("unknown")
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
        .collect();

    match url.port() {
        Some(port) => format!("{}_{}.png", host, port),
        None => format!("{}.png", host),
    }
}

/// Renders `url` and writes a PNG into `outdir`, returning the file path.
pub async fn screenshot_url(url: &str, outdir: &Path) -> Result<PathBuf> {
    let parsed = Url::parse(url).map_err(|e| Error::Screenshot(format!("invalid url {}: {}", url, e)))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(Error::Screenshot(format!("unsupported scheme in {}", url)));
    }

    fs::create_dir_all(outdir)?;
    let path = outdir.join(screenshot_file_name(&parsed));

    let target = parsed.to_string();
    let png = tokio::task::spawn_blocking(move || capture(&target, SCREENSHOT_TIMEOUT))
        .await
        .map_err(|e| Error::Screenshot(format!("browser task aborted: {}", e)))?
        .map_err(|e| Error::Screenshot(format!("{:#}", e)))?;

    fs::write(&path, png)?;
    debug!("screenshot of {} -> {}", url, path.display());
    Ok(path)
}

/// headless_chrome is synchronous; runs on a blocking thread.
fn capture(url: &str, timeout: Duration) -> anyhow::Result<Vec<u8>> {
    let options = LaunchOptions::default_builder()
        .headless(true)
        .ignore_certificate_errors(true)
        .window_size(Some(WINDOW_SIZE))
        .idle_browser_timeout(timeout)
        .build()
        .map_err(|e| anyhow::anyhow!("browser launch options: {}", e))?;
    let browser = Browser::new(options).context("failed to launch Chrome/Chromium")?;

    let tab = browser.new_tab().context("failed to open a tab")?;
    tab.set_default_timeout(timeout);
    tab.navigate_to(url).context("navigation failed")?;
    tab.wait_until_navigated().context("navigation timeout")?;

    tab.capture_screenshot(CaptureScreenshotFormatOption::Png, None, None, true)
        .context("capture failed")
}

//! Path fuzzing against a live host.
use std::sync::Arc;

use log::debug;
use reqwest::{Client, StatusCode, Url};
use serde::Serialize;
use tokio::sync::Semaphore;

use crate::http::get_with_retry;

/// Concurrent requests in [`PathFuzzer::fuzz`].
pub const DEFAULT_FUZZ_WORKERS: usize = 30;

/// A path that answered with something other than 404 and a non-empty body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathHit {
    /// Requested URL.
    pub url: String,
    /// HTTP status code.
    pub status: u16,
    /// Body length in bytes.
    pub len: usize,
}

/// Resolves `path` against `base` treated as a directory: relative paths
/// land under it, `/rooted` paths replace its path and absolute URLs win.
pub fn join_url(base: &str, path: &str) -> String {
    let base = if base.ends_with('/') {
        base.to_string()
    } else {
        format!("{}/", base)
    };

    match Url::parse(&base).and_then(|url| url.join(path)) {
        Ok(url) => url.to_string(),
        Err(_) => format!("{}{}", base, path.trim_start_matches('/')),
    }
}

/// Requests candidate paths under a base URL.
pub struct PathFuzzer {
    client: Client,
    workers: usize,
}

impl PathFuzzer {
    /// Fuzzer over `client` with [`DEFAULT_FUZZ_WORKERS`] workers.
    pub fn new(client: Client) -> Self {
        PathFuzzer {
            client,
            workers: DEFAULT_FUZZ_WORKERS,
        }
    }

    async fn check(client: &Client, url: String) -> Option<PathHit> {
        let response = match get_with_retry(client, &url).await {
            Ok(response) => response,
            Err(e) => {
                debug!("{}: {}", url, e);
                return None;
            }
        };

        let status = response.status();
        let body = response.bytes().await.ok()?;
        if status == StatusCode::NOT_FOUND || body.is_empty() {
            return None;
        }

        Some(PathHit {
            url,
            status: status.as_u16(),
            len: body.len(),
        })
    }

    /// Hits among `paths`, in input order. Request failures are skipped.
    pub async fn fuzz(&self, base_url: &str, paths: &[String]) -> Vec<PathHit> {
        let semaphore = Arc::new(Semaphore::new(self.workers));

        let mut tasks = Vec::with_capacity(paths.len());
        for path in paths {
            let permit = Arc::clone(&semaphore);
            let client = self.client.clone();
            let url = join_url(base_url, path);

            tasks.push(tokio::spawn(async move {
                let _permit = permit.acquire().await.ok()?;
                Self::check(&client, url).await
            }));
        }

        let mut hits = Vec::new();
        for task in tasks {
            if let Ok(Some(hit)) = task.await {
                hits.push(hit);
            }
        }
        hits
    }
}

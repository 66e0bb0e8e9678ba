//! HTTP(S) liveness checks.
use std::sync::Arc;
use std::time::Duration;

use log::debug;
use reqwest::Client;
use tokio::sync::Semaphore;

use crate::error::Result;
use crate::http::{build_client, get_with_retry};

/// Concurrent liveness checks in [`DomainVerifier::filter_live`].
pub const DEFAULT_VERIFY_WORKERS: usize = 20;

/// HTTP(S) liveness prober
#[derive(Clone)]
pub struct DomainVerifier {
    client: Client,
    workers: usize,
}

impl DomainVerifier {
    /// Verifier with its own client and [`DEFAULT_VERIFY_WORKERS`] workers.
    pub fn new(timeout: Duration) -> Result<Self> {
        Ok(DomainVerifier {
            client: build_client(timeout)?,
            workers: DEFAULT_VERIFY_WORKERS,
        })
    }

    /// Uses a caller-built client as is.
    pub fn from_client(client: Client) -> Self {
        DomainVerifier {
            client,
            workers: DEFAULT_VERIFY_WORKERS,
        }
    }

    /// Overrides the concurrency; at least one.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// True when `host` answers any HTTP status over http:// or https://.
    pub async fn is_live(&self, host: &str) -> bool {
        for scheme in ["http://", "https://"] {
            let url = format!("{}{}", scheme, host);
            match get_with_retry(&self.client, &url).await {
                Ok(response) if (100..600).contains(&response.status().as_u16()) => return true,
                Ok(response) => debug!("{} answered {}", url, response.status()),
                Err(e) => debug!("{} unreachable: {}", url, e),
            }
        }
        false
    }

    /// Live hosts out of `hosts`, in input order.
    pub async fn filter_live(&self, hosts: Vec<String>) -> Vec<String> {
        let semaphore = Arc::new(Semaphore::new(self.workers));

        let mut tasks = Vec::with_capacity(hosts.len());
        for host in hosts {
            let permit = Arc::clone(&semaphore);
            let verifier = self.clone();

            tasks.push(tokio::spawn(async move {
                let _permit = permit.acquire().await.ok()?;
                verifier.is_live(&host).await.then_some(host)
            }));
        }

        let mut live = Vec::new();
        for task in tasks {
            if let Ok(Some(host)) = task.await {
                live.push(host);
            }
        }
        live
    }
}

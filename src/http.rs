//! HTTP client shared by the liveness probe and the path fuzzer.
use std::time::Duration;

use log::debug;
use reqwest::{Client, Response, StatusCode};

use crate::error::Result;

/// User-Agent sent with every request.
pub const USER_AGENT: &str = "husk-recon/0.1";

/// Retries after the first attempt.
pub const MAX_RETRIES: u32 = 3;

const BACKOFF_FACTOR: Duration = Duration::from_millis(300);

const RETRY_STATUSES: [StatusCode; 5] = [
    StatusCode::TOO_MANY_REQUESTS,
    StatusCode::INTERNAL_SERVER_ERROR,
    StatusCode::BAD_GATEWAY,
    StatusCode::SERVICE_UNAVAILABLE,
    StatusCode::GATEWAY_TIMEOUT,
];

/// Client with timeout, redirect following and relaxed TLS checks.
pub fn build_client(timeout: Duration) -> Result<Client> {
    let client = Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .danger_accept_invalid_certs(true)
        .build()?;
    Ok(client)
}

fn backoff(retry: u32) -> Duration {
    BACKOFF_FACTOR * 2u32.pow(retry)
}

/// GET `url`, retrying transport errors and throttling/5xx responses.
///
/// Returns the last response when retries run out on a retryable status.
pub async fn get_with_retry(client: &Client, url: &str) -> reqwest::Result<Response> {
    let mut retry = 0;
    loop {
        let result = client.get(url).send().await;
        let retryable = match &result {
            Ok(response) => RETRY_STATUSES.contains(&response.status()),
            Err(e) => !e.is_builder(),
        };

        if !retryable || retry >= MAX_RETRIES {
            return result;
        }

        debug!("retrying {} ({}/{})", url, retry + 1, MAX_RETRIES);
        tokio::time::sleep(backoff(retry)).await;
        retry += 1;
    }
}

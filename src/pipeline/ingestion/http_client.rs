use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;
use tracing::{debug, warn};

use super::rate_limiter::PolitenessLimiter;
use crate::config::ScraperConfig;
use crate::error::Result;

/// Retrieves page markup. `None` means the page could not be fetched; callers
/// treat that as an empty page rather than an error.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Option<String>;
}

/// reqwest-backed fetcher with a browser User-Agent, a politeness delay
/// between requests, and linear-backoff retries on transient failures.
pub struct HttpPageFetcher {
    client: reqwest::Client,
    limiter: PolitenessLimiter,
    max_retries: u32,
    backoff: Duration,
}

enum Attempt {
    Done(Option<String>),
    Retry(String),
}

impl HttpPageFetcher {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_seconds))
            .gzip(true)
            .deflate(true)
            .build()?;
        let delay = Duration::from_millis(config.delay_ms);
        Ok(Self {
            client,
            limiter: PolitenessLimiter::new(delay),
            max_retries: config.max_retries,
            backoff: delay,
        })
    }

    async fn attempt(&self, url: &str) -> Attempt {
        self.limiter.acquire().await;
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => return Attempt::Retry(e.to_string()),
        };

        let status = response.status();
        if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            return Attempt::Retry(format!("status {}", status.as_u16()));
        }
        if !status.is_success() {
            warn!("GET {} returned {}, not retrying", url, status.as_u16());
            return Attempt::Done(None);
        }

        match response.text().await {
            Ok(body) => Attempt::Done(Some(body)),
            Err(e) => Attempt::Retry(e.to_string()),
        }
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &str) -> Option<String> {
        let mut attempt = 0;
        loop {
            match self.attempt(url).await {
                Attempt::Done(body) => {
                    if let Some(body) = &body {
                        debug!("Fetched {} ({} bytes)", url, body.len());
                    }
                    return body;
                }
                Attempt::Retry(reason) if attempt < self.max_retries => {
                    attempt += 1;
                    let delay = self.backoff * attempt;
                    warn!(
                        "GET {} failed ({}), retry {}/{} in {:?}",
                        url, reason, attempt, self.max_retries, delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Attempt::Retry(reason) => {
                    warn!("GET {} failed after {} attempts: {}", url, attempt + 1, reason);
                    return None;
                }
            }
        }
    }
}

//! HTTP fetcher implementation
//!
//! This module issues every GET the harvester makes:
//! - Attaching the `app-id` and `User-Agent` headers
//! - Retrying transport failures on the backoff schedule
//! - Returning the first response that arrives, whatever its status

use crate::config::{Config, RetryConfig};
use crate::crawler::retry::Backoff;
use crate::crawler::transport::{
    build_http_client, HttpResponse, ReqwestTransport, RequestHeaders, Transport,
};
use crate::HarvestError;
use std::sync::Arc;
use url::Url;

/// Response returned by the fetch client
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// HTTP status code, reported but not acted on
    pub status: u16,

    /// Response body
    pub body: String,

    /// Number of attempts it took, including the successful one
    pub attempts: u32,
}

/// GET client with a bounded retry policy
///
/// Cloning is cheap; clones share the transport.
#[derive(Clone)]
pub struct FetchClient {
    transport: Arc<dyn Transport>,
    headers: Arc<RequestHeaders>,
    retry: RetryConfig,
}

impl FetchClient {
    pub fn new(transport: Arc<dyn Transport>, headers: RequestHeaders, retry: RetryConfig) -> Self {
        Self {
            transport,
            headers: Arc::new(headers),
            retry,
        }
    }

    /// Builds a client talking to the configured source over reqwest
    pub fn from_config(config: &Config) -> Result<Self, HarvestError> {
        let client = build_http_client(&config.source)?;
        Ok(Self::new(
            Arc::new(ReqwestTransport::new(client)),
            RequestHeaders::from_config(&config.source),
            config.retry.clone(),
        ))
    }

    /// Fetches a URL, retrying transport failures
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | Any HTTP response (2xx/4xx/5xx) | Return immediately |
    /// | Transport failure, attempts left | Sleep per backoff, retry |
    /// | Transport failure, attempts or wait budget spent | `TransientFetch` with the last cause |
    pub async fn get(&self, url: &Url) -> Result<FetchResponse, HarvestError> {
        let mut backoff = Backoff::new(&self.retry);
        let mut attempt = 0;

        loop {
            attempt += 1;

            match self.transport.get(url, &self.headers).await {
                Ok(HttpResponse { status, body }) => {
                    if attempt > 1 {
                        tracing::info!(url = %url, attempts = attempt, "Request succeeded after retry");
                    }
                    tracing::debug!(url = %url, status, bytes = body.len(), "Fetched");
                    return Ok(FetchResponse {
                        status,
                        body,
                        attempts: attempt,
                    });
                }
                Err(e) => {
                    let delay = if attempt < self.retry.max_attempts {
                        backoff.next_delay()
                    } else {
                        None
                    };

                    let Some(delay) = delay else {
                        tracing::error!(
                            url = %url,
                            error = %e,
                            attempts = attempt,
                            "Request failed after all retry attempts"
                        );
                        return Err(HarvestError::TransientFetch {
                            url: url.to_string(),
                            attempts: attempt,
                            source: e,
                        });
                    };

                    tracing::warn!(
                        url = %url,
                        error = %e,
                        attempt,
                        max_attempts = self.retry.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        "Request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

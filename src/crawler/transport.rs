//! Network transport underneath the fetch client
//!
//! The fetch client only sees the `Transport` trait, so the retry policy can
//! be driven by a scripted transport in tests while production uses reqwest.

use crate::config::SourceConfig;
use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;
use url::Url;

/// Transport-level failure (the request produced no response)
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("Request timeout")]
    Timeout,

    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Failed to read response body: {0}")]
    Body(String),

    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_connect() {
            Self::Connect(e.to_string())
        } else if e.is_body() || e.is_decode() {
            Self::Body(e.to_string())
        } else {
            Self::Other(e.to_string())
        }
    }
}

/// Headers sent with every request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestHeaders {
    /// Value of the `app-id` header
    pub app_id: String,

    /// Value of the `User-Agent` header
    pub user_agent: String,
}

impl RequestHeaders {
    pub fn from_config(config: &SourceConfig) -> Self {
        Self {
            app_id: config.app_id.clone(),
            user_agent: config.user_agent.clone(),
        }
    }
}

/// A raw HTTP response. The status is carried but never interpreted here.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// One GET, no retries
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &Url, headers: &RequestHeaders) -> Result<HttpResponse, TransportError>;
}

/// Builds the HTTP client used against the remote source
///
/// The request timeout bounds each individual attempt.
pub fn build_http_client(config: &SourceConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(config.request_timeout())
        .connect_timeout(config.request_timeout())
        .gzip(true)
        .brotli(true)
        .build()
}

/// Transport backed by a reqwest client
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, url: &Url, headers: &RequestHeaders) -> Result<HttpResponse, TransportError> {
        let response = self
            .client
            .get(url.clone())
            .header("app-id", &headers.app_id)
            .header(reqwest::header::USER_AGENT, &headers.user_agent)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(HttpResponse { status, body })
    }
}

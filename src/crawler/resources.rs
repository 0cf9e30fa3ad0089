//! Resource fetchers for the three record kinds
//!
//! Every kind is one list request per page. Posts and comments come back
//! complete; the people list only carries identifiers, which are handed to
//! the detail enricher.

use crate::config::Config;
use crate::crawler::enricher::{DetailEnricher, DetailSource, FailedDetail};
use crate::crawler::fetcher::{FetchClient, FetchResponse};
use crate::model::{Comment, ListEnvelope, PageRequest, Person, PersonRef, Post, Record, ResourceKind};
use crate::HarvestError;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use url::Url;

/// Records retrieved for one (page, kind) unit
#[derive(Debug, Clone, Default)]
pub struct PageFetch {
    pub records: Vec<Record>,

    /// People whose detail lookup failed; always empty for posts and comments
    pub missing: Vec<FailedDetail>,
}

/// Source of pages for the coordinator
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_page(&self, request: PageRequest) -> Result<PageFetch, HarvestError>;
}

/// Client for the remote data source
#[derive(Clone)]
pub struct SourceApi {
    client: FetchClient,
    base_url: Url,
    page_size: u32,
    enricher: DetailEnricher,
}

impl SourceApi {
    pub fn new(client: FetchClient, base_url: Url, page_size: u32, enricher: DetailEnricher) -> Self {
        Self {
            client,
            base_url,
            page_size,
            enricher,
        }
    }

    /// Builds the API client from configuration
    pub fn from_config(config: &Config) -> Result<Self, HarvestError> {
        let client = FetchClient::from_config(config)?;
        let base_url = Url::parse(&config.source.base_url)?;
        let enricher = DetailEnricher::new(config.pipeline.max_concurrent_details as usize);
        Ok(Self::new(client, base_url, config.source.page_size, enricher))
    }

    /// `GET /user?page=P&limit=L`, then one detail lookup per identifier
    pub async fn fetch_people(&self, page: u32) -> Result<PageFetch, HarvestError> {
        let url = self.list_url(ResourceKind::Person, page)?;
        let refs: Vec<PersonRef> = self.fetch_list(&url).await?;

        let ids = refs.into_iter().map(|r| r.id).collect();
        let enrichment = self.enricher.enrich(self, ids).await;

        Ok(PageFetch {
            records: enrichment.people.into_iter().map(Record::from).collect(),
            missing: enrichment.failed,
        })
    }

    /// `GET /post?page=P&limit=L`
    pub async fn fetch_posts(&self, page: u32) -> Result<Vec<Post>, HarvestError> {
        let url = self.list_url(ResourceKind::Post, page)?;
        self.fetch_list(&url).await
    }

    /// `GET /comment?page=P&limit=L`
    pub async fn fetch_comments(&self, page: u32) -> Result<Vec<Comment>, HarvestError> {
        let url = self.list_url(ResourceKind::Comment, page)?;
        self.fetch_list(&url).await
    }

    /// `GET /user/{id}`
    pub async fn fetch_person(&self, id: &str) -> Result<Person, HarvestError> {
        let url = self.endpoint_url(&[ResourceKind::Person.endpoint(), id])?;
        let response = self.client.get(&url).await?;
        decode(&url, &response)
    }

    async fn fetch_list<T: DeserializeOwned>(&self, url: &Url) -> Result<Vec<T>, HarvestError> {
        let response = self.client.get(url).await?;
        let envelope: ListEnvelope<T> = decode(url, &response)?;
        Ok(envelope.data)
    }

    fn list_url(&self, kind: ResourceKind, page: u32) -> Result<Url, HarvestError> {
        let mut url = self.endpoint_url(&[kind.endpoint()])?;
        url.query_pairs_mut()
            .append_pair("page", &page.to_string())
            .append_pair("limit", &self.page_size.to_string());
        Ok(url)
    }

    /// Appends path segments to the base URL, keeping any base path
    fn endpoint_url(&self, segments: &[&str]) -> Result<Url, HarvestError> {
        let mut url = self.base_url.clone();
        url.set_query(None);
        url.path_segments_mut()
            .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

/// Decodes a JSON body. Decode errors are final and never retried.
fn decode<T: DeserializeOwned>(url: &Url, response: &FetchResponse) -> Result<T, HarvestError> {
    serde_json::from_str(&response.body).map_err(|source| {
        tracing::debug!(url = %url, status = response.status, "Response body did not decode");
        HarvestError::Decode {
            url: url.to_string(),
            source,
        }
    })
}

#[async_trait]
impl DetailSource for SourceApi {
    async fn fetch_detail(&self, id: &str) -> Result<Person, HarvestError> {
        self.fetch_person(id).await
    }
}

#[async_trait]
impl PageSource for SourceApi {
    async fn fetch_page(&self, request: PageRequest) -> Result<PageFetch, HarvestError> {
        match request.kind {
            ResourceKind::Person => self.fetch_people(request.page).await,
            ResourceKind::Post => Ok(PageFetch {
                records: self
                    .fetch_posts(request.page)
                    .await?
                    .into_iter()
                    .map(Record::from)
                    .collect(),
                missing: Vec::new(),
            }),
            ResourceKind::Comment => Ok(PageFetch {
                records: self
                    .fetch_comments(request.page)
                    .await?
                    .into_iter()
                    .map(Record::from)
                    .collect(),
                missing: Vec::new(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RetryConfig;
    use crate::crawler::transport::{RequestHeaders, ReqwestTransport};
    use std::sync::Arc;
    use std::time::Duration;

    fn api(base: &str) -> SourceApi {
        let client = FetchClient::new(
            Arc::new(ReqwestTransport::new(reqwest::Client::new())),
            RequestHeaders {
                app_id: "test-app".to_string(),
                user_agent: "TestAgent/1.0".to_string(),
            },
            RetryConfig::fixed(1, Duration::ZERO),
        );
        SourceApi::new(client, Url::parse(base).unwrap(), 10, DetailEnricher::new(4))
    }

    #[test]
    fn test_list_url_keeps_base_path() {
        let posts_api = api("https://dummyapi.io/data/v1");
        let url = posts_api.list_url(ResourceKind::Post, 3).unwrap();
        assert_eq!(url.as_str(), "https://dummyapi.io/data/v1/post?page=3&limit=10");

        let people_api = api("https://dummyapi.io/data/v1/");
        let url = people_api.list_url(ResourceKind::Person, 1).unwrap();
        assert_eq!(url.as_str(), "https://dummyapi.io/data/v1/user?page=1&limit=10");
    }

    #[test]
    fn test_detail_url() {
        let detail_api = api("http://127.0.0.1:8080");
        let url = detail_api
            .endpoint_url(&[ResourceKind::Person.endpoint(), "60d0fe4f5311236168a109ca"])
            .unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8080/user/60d0fe4f5311236168a109ca");
    }

    #[test]
    fn test_decode_error_carries_url() {
        let url = Url::parse("http://127.0.0.1/post?page=1&limit=10").unwrap();
        let response = FetchResponse {
            status: 404,
            body: "{\"error\":\"PATH_NOT_FOUND\"}".to_string(),
            attempts: 1,
        };

        let err = decode::<ListEnvelope<Post>>(&url, &response).unwrap_err();
        match err {
            HarvestError::Decode { url, .. } => assert!(url.ends_with("/post?page=1&limit=10")),
            other => panic!("unexpected error: {}", other),
        }
    }
}

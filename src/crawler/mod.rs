//! Crawler module for fetching and orchestrating the harvest
//!
//! This module contains the core collection logic, including:
//! - HTTP fetching with bounded retry
//! - The people, posts and comments fetchers
//! - Person detail enrichment
//! - Run coordination and the completion barrier

mod barrier;
mod coordinator;
mod enricher;
mod fetcher;
mod resources;
mod retry;
mod transport;

pub use barrier::{BarrierResult, CompletionBarrier};
pub use coordinator::Coordinator;
pub use enricher::{DetailEnricher, DetailSource, Enrichment, FailedDetail};
pub use fetcher::{FetchClient, FetchResponse};
pub use resources::{PageFetch, PageSource, SourceApi};
pub use retry::Backoff;
pub use transport::{
    build_http_client, HttpResponse, ReqwestTransport, RequestHeaders, Transport, TransportError,
};

use crate::config::Config;
use crate::output::{Publisher, RunSummary};
use crate::HarvestError;

/// Runs a complete harvest
///
/// This is the main entry point for a run. It will:
/// 1. Build the HTTP client and source API from the configuration
/// 2. Launch one unit per (page, kind) pair
/// 3. Publish every retrieved record through `publisher`
/// 4. Join all units and return their aggregated outcomes
///
/// # Returns
///
/// * `Ok(RunSummary)` - Every unit finished (individual units may have failed)
/// * `Err(HarvestError)` - The run could not be set up
pub async fn harvest(config: &Config, publisher: Publisher) -> Result<RunSummary, HarvestError> {
    let coordinator = Coordinator::from_config(config, publisher)?;
    Ok(coordinator.run().await)
}

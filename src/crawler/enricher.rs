//! Person detail enrichment
//!
//! The people list call only returns identifiers. The enricher fetches each
//! full record concurrently, bounded by a semaphore shared across all pages.
//! Tasks report back over a channel to a single collector, so the result
//! vector has exactly one owner.

use crate::model::Person;
use crate::HarvestError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};

/// Anything that can resolve a person identifier into a full record
#[async_trait]
pub trait DetailSource: Send + Sync {
    async fn fetch_detail(&self, id: &str) -> Result<Person, HarvestError>;
}

/// An identifier whose detail lookup failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedDetail {
    pub id: String,
    pub error: String,
}

/// Result of enriching one page of identifiers
#[derive(Debug, Clone, Default)]
pub struct Enrichment {
    /// Successfully fetched people, in arrival order
    pub people: Vec<Person>,

    /// Identifiers left out of `people`
    pub failed: Vec<FailedDetail>,
}

/// Fetches full person records for a batch of identifiers
#[derive(Debug, Clone)]
pub struct DetailEnricher {
    permits: Arc<Semaphore>,
}

impl DetailEnricher {
    /// Creates an enricher allowing at most `max_in_flight` concurrent lookups
    pub fn new(max_in_flight: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(max_in_flight.max(1))),
        }
    }

    /// Fetches every identifier and returns whatever subset succeeded
    ///
    /// Never fails as a whole: a failed lookup is logged and reported in
    /// `Enrichment::failed`. Returns only after every lookup has finished.
    pub async fn enrich<S>(&self, source: &S, ids: Vec<String>) -> Enrichment
    where
        S: DetailSource + Clone + 'static,
    {
        let mut outstanding: HashMap<String, usize> = HashMap::new();
        let (tx, mut rx) = mpsc::channel(ids.len().max(1));

        for id in ids {
            *outstanding.entry(id.clone()).or_default() += 1;

            let tx = tx.clone();
            let source = source.clone();
            let permits = Arc::clone(&self.permits);

            tokio::spawn(async move {
                // The semaphore is never closed, so this only yields None on shutdown
                let _permit = permits.acquire_owned().await.ok();
                let result = source.fetch_detail(&id).await;
                let _ = tx.send((id, result)).await;
            });
        }
        drop(tx);

        let mut enrichment = Enrichment::default();

        while let Some((id, result)) = rx.recv().await {
            if let Some(count) = outstanding.get_mut(&id) {
                *count -= 1;
                if *count == 0 {
                    outstanding.remove(&id);
                }
            }

            match result {
                Ok(person) => enrichment.people.push(person),
                Err(e) => {
                    tracing::warn!(id = %id, error = %e, "Dropping person after failed detail fetch");
                    enrichment.failed.push(FailedDetail {
                        id,
                        error: e.to_string(),
                    });
                }
            }
        }

        // A lookup task that panicked never reported back
        for (id, count) in outstanding {
            tracing::error!(id = %id, "Detail task ended without a result");
            for _ in 0..count {
                enrichment.failed.push(FailedDetail {
                    id: id.clone(),
                    error: "detail task ended without a result".to_string(),
                });
            }
        }

        enrichment
    }
}

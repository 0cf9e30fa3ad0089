//! Harvest coordinator - main orchestration logic
//!
//! This module drives a run:
//! - Launching one unit per (page, kind) pair, bounded by a semaphore
//! - Wrapping each fetch in a trace span
//! - Publishing the records of successful units
//! - Joining every unit and aggregating their outcomes

use crate::config::Config;
use crate::crawler::barrier::CompletionBarrier;
use crate::crawler::resources::{PageSource, SourceApi};
use crate::model::{PageRequest, ResourceKind};
use crate::output::{Publisher, RunSummary, UnitOutcome, UnitStatus};
use crate::state::UnitState;
use crate::HarvestError;
use chrono::Utc;
use std::ops::RangeInclusive;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::Instrument;

/// Main harvest coordinator structure
pub struct Coordinator {
    pages: RangeInclusive<u32>,
    source: Arc<dyn PageSource>,
    publisher: Publisher,
    unit_permits: Arc<Semaphore>,
}

impl Coordinator {
    /// Creates a coordinator from its parts
    ///
    /// # Arguments
    ///
    /// * `config` - Supplies the page range and the unit concurrency limit
    /// * `source` - Where pages are fetched from
    /// * `publisher` - Where records are written
    pub fn new(config: &Config, source: Arc<dyn PageSource>, publisher: Publisher) -> Self {
        Self {
            pages: config.pages.range(),
            source,
            publisher,
            unit_permits: Arc::new(Semaphore::new(
                config.pipeline.max_concurrent_units.max(1) as usize,
            )),
        }
    }

    /// Creates a coordinator fetching from the configured remote source
    pub fn from_config(config: &Config, publisher: Publisher) -> Result<Self, HarvestError> {
        let source = SourceApi::from_config(config)?;
        Ok(Self::new(config, Arc::new(source), publisher))
    }

    /// Runs every unit and returns once all of them are done
    ///
    /// Unit failures never abort the run; they are reported in the summary.
    pub async fn run(&self) -> RunSummary {
        let started_at = Utc::now();
        let mut barrier = CompletionBarrier::new();

        for page in self.pages.clone() {
            for kind in ResourceKind::ALL {
                let request = PageRequest::new(page, kind);
                let source = Arc::clone(&self.source);
                let publisher = self.publisher.clone();
                let permits = Arc::clone(&self.unit_permits);

                barrier.spawn(async move {
                    // The semaphore is never closed, so this only yields None on shutdown
                    let _permit = permits.acquire_owned().await.ok();
                    run_unit(request, source.as_ref(), &publisher).await
                });
            }
        }

        tracing::info!(
            units = barrier.launched(),
            pages = ?self.pages,
            "Launched all units"
        );

        let joined = barrier.wait().await;
        let summary = RunSummary::from_outcomes(started_at, joined.completed, joined.aborted);

        let overall = summary.overall();
        tracing::info!(
            units = summary.total_units(),
            succeeded = overall.units_succeeded,
            partial = overall.units_partial,
            failed = overall.units_failed,
            aborted = summary.aborted_units,
            published = overall.publish.log_written,
            "Harvest completed"
        );

        summary
    }
}

/// Processes a single (page, kind) unit
///
/// The span covers the fetch only and is closed before the result is
/// inspected, whether the fetch succeeded or not.
async fn run_unit(request: PageRequest, source: &dyn PageSource, publisher: &Publisher) -> UnitOutcome {
    let mut state = UnitState::Started;
    advance(&mut state, UnitState::Fetching, &request);

    let span = tracing::info_span!(
        "harvest_unit",
        name = %request.span_label(),
        kind = %request.kind,
        page = request.page
    );
    let fetched = source.fetch_page(request).instrument(span.clone()).await;
    drop(span);

    let status = match fetched {
        Err(e) => {
            advance(&mut state, UnitState::Failed, &request);
            tracing::error!(
                kind = %request.kind,
                page = request.page,
                error = %e,
                "Error harvesting page"
            );
            UnitStatus::Failed {
                error: e.to_string(),
            }
        }
        Ok(page) if page.records.is_empty() && !page.missing.is_empty() => {
            advance(&mut state, UnitState::Failed, &request);
            let missing: Vec<String> = page.missing.into_iter().map(|m| m.id).collect();
            tracing::error!(
                kind = %request.kind,
                page = request.page,
                missing = missing.len(),
                "Every detail lookup on the page failed"
            );
            UnitStatus::Failed {
                error: format!(
                    "all {} detail lookups failed: {}",
                    missing.len(),
                    missing.join(", ")
                ),
            }
        }
        Ok(page) => {
            advance(&mut state, UnitState::Succeeded, &request);
            let fetched = page.records.len();
            let publish = publisher.publish_all(&page.records).await;

            tracing::info!(
                kind = %request.kind,
                page = request.page,
                fetched,
                log_written = publish.log_written,
                kv_written = publish.kv_written,
                "Page harvested"
            );

            if page.missing.is_empty() {
                UnitStatus::Succeeded { fetched, publish }
            } else {
                UnitStatus::Partial {
                    fetched,
                    missing: page.missing.into_iter().map(|m| m.id).collect(),
                    publish,
                }
            }
        }
    };

    advance(&mut state, UnitState::Done, &request);
    UnitOutcome { request, status }
}

/// Moves a unit to its next state, logging transitions that should not happen
fn advance(state: &mut UnitState, next: UnitState, request: &PageRequest) {
    if state.can_transition_to(next) {
        tracing::trace!(unit = %request, from = %state, to = %next, "Unit state change");
        *state = next;
    } else {
        tracing::error!(unit = %request, from = %state, to = %next, "Invalid unit state transition");
    }
}

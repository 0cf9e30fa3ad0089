//! Run summary built from unit outcomes
//!
//! This module aggregates the outcome of every (page, kind) unit into
//! per-kind totals and prints them at the end of a run.

use crate::model::ResourceKind;
use crate::output::traits::{PublishReport, UnitOutcome, UnitStatus};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Totals for one record kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KindTotals {
    pub units_succeeded: usize,
    pub units_partial: usize,
    pub units_failed: usize,
    pub records_fetched: usize,
    /// Person identifiers dropped after a failed detail lookup
    pub details_missing: usize,
    pub publish: PublishReport,
}

impl KindTotals {
    pub fn units(&self) -> usize {
        self.units_succeeded + self.units_partial + self.units_failed
    }

    fn record(&mut self, outcome: &UnitOutcome) {
        match &outcome.status {
            UnitStatus::Succeeded { .. } => self.units_succeeded += 1,
            UnitStatus::Partial { missing, .. } => {
                self.units_partial += 1;
                self.details_missing += missing.len();
            }
            UnitStatus::Failed { .. } => self.units_failed += 1,
        }
        self.records_fetched += outcome.fetched();
        self.publish += outcome.publish();
    }
}

/// Summary of a whole harvest run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,

    /// Totals keyed by kind
    pub per_kind: BTreeMap<ResourceKind, KindTotals>,

    /// Every unit outcome, in completion order
    pub outcomes: Vec<UnitOutcome>,

    /// Units whose task panicked before producing an outcome
    pub aborted_units: usize,
}

impl RunSummary {
    /// Aggregates unit outcomes into a summary
    pub fn from_outcomes(
        started_at: DateTime<Utc>,
        outcomes: Vec<UnitOutcome>,
        aborted_units: usize,
    ) -> Self {
        let mut per_kind: BTreeMap<ResourceKind, KindTotals> = BTreeMap::new();
        for outcome in &outcomes {
            per_kind
                .entry(outcome.request.kind)
                .or_default()
                .record(outcome);
        }

        Self {
            started_at,
            finished_at: Utc::now(),
            per_kind,
            outcomes,
            aborted_units,
        }
    }

    /// Totals for one kind (zeroes if no unit of that kind ran)
    pub fn kind(&self, kind: ResourceKind) -> KindTotals {
        self.per_kind.get(&kind).copied().unwrap_or_default()
    }

    /// Totals across all kinds
    pub fn overall(&self) -> KindTotals {
        let mut total = KindTotals::default();
        for totals in self.per_kind.values() {
            total.units_succeeded += totals.units_succeeded;
            total.units_partial += totals.units_partial;
            total.units_failed += totals.units_failed;
            total.records_fetched += totals.records_fetched;
            total.details_missing += totals.details_missing;
            total.publish += totals.publish;
        }
        total
    }

    /// Number of units launched, including aborted ones
    pub fn total_units(&self) -> usize {
        self.outcomes.len() + self.aborted_units
    }

    /// Returns true if any unit failed, aborted, or was partial
    pub fn has_failures(&self) -> bool {
        let overall = self.overall();
        overall.units_failed > 0 || overall.units_partial > 0 || self.aborted_units > 0
    }

    /// Returns true if at least one unit ran and none of them completed
    pub fn is_complete_failure(&self) -> bool {
        let overall = self.overall();
        self.total_units() > 0 && overall.units_succeeded == 0 && overall.units_partial == 0
    }

    /// Run duration in whole seconds
    pub fn duration_seconds(&self) -> i64 {
        (self.finished_at - self.started_at).num_seconds()
    }
}

/// Prints the summary to stdout in a formatted manner
pub fn print_summary(summary: &RunSummary, config_hash: Option<&str>) {
    println!("=== Harvest Summary ===\n");

    println!("Started:  {}", summary.started_at.to_rfc3339());
    println!("Finished: {}", summary.finished_at.to_rfc3339());
    println!("Duration: {}s", summary.duration_seconds());
    if let Some(hash) = config_hash {
        println!("Config:   {}", hash);
    }
    println!();

    for kind in ResourceKind::ALL {
        let totals = summary.kind(kind);
        println!("{}:", kind);
        println!(
            "  Units: {} ok, {} partial, {} failed",
            totals.units_succeeded, totals.units_partial, totals.units_failed
        );
        println!("  Records fetched: {}", totals.records_fetched);
        if totals.details_missing > 0 {
            println!("  Details missing: {}", totals.details_missing);
        }
        println!(
            "  Log writes: {} ok, {} failed",
            totals.publish.log_written, totals.publish.log_failed
        );
        println!(
            "  Key/value writes: {} ok, {} failed",
            totals.publish.kv_written, totals.publish.kv_failed
        );
    }
    println!();

    let failed: Vec<_> = summary.outcomes.iter().filter(|o| o.is_failed()).collect();
    if !failed.is_empty() {
        println!("Failed Units ({}):", failed.len());
        for outcome in failed {
            if let UnitStatus::Failed { error } = &outcome.status {
                println!("  - {}: {}", outcome.request, error);
            }
        }
        println!();
    }

    if summary.aborted_units > 0 {
        println!("Aborted Units: {}\n", summary.aborted_units);
    }

    let overall = summary.overall();
    println!(
        "Result: {} / {} units completed, {} records fetched",
        overall.units_succeeded + overall.units_partial,
        summary.total_units(),
        overall.records_fetched
    );
}

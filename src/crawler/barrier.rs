//! Completion barrier for units of work
//!
//! A counting join: every spawned unit is awaited, and a unit that panics is
//! counted rather than allowed to cancel its siblings.

use std::future::Future;
use tokio::task::JoinSet;

/// Results gathered once every unit has finished
#[derive(Debug)]
pub struct BarrierResult<T> {
    /// Outputs of units that ran to completion, in completion order
    pub completed: Vec<T>,

    /// Units that panicked or were cancelled
    pub aborted: usize,
}

/// Tracks launched units and waits for all of them
pub struct CompletionBarrier<T> {
    tasks: JoinSet<T>,
    launched: usize,
}

impl<T: Send + 'static> CompletionBarrier<T> {
    pub fn new() -> Self {
        Self {
            tasks: JoinSet::new(),
            launched: 0,
        }
    }

    /// Launches one unit immediately
    pub fn spawn<F>(&mut self, unit: F)
    where
        F: Future<Output = T> + Send + 'static,
    {
        self.tasks.spawn(unit);
        self.launched += 1;
    }

    /// Number of units launched so far
    pub fn launched(&self) -> usize {
        self.launched
    }

    /// Waits until every launched unit has finished
    pub async fn wait(mut self) -> BarrierResult<T> {
        let mut completed = Vec::with_capacity(self.launched);
        let mut aborted = 0;

        while let Some(joined) = self.tasks.join_next().await {
            match joined {
                Ok(output) => completed.push(output),
                Err(e) => {
                    tracing::error!(error = %e, "Unit task ended abnormally");
                    aborted += 1;
                }
            }
        }

        tracing::debug!(
            launched = self.launched,
            completed = completed.len(),
            aborted,
            "All units joined"
        );

        BarrierResult { completed, aborted }
    }
}

impl<T: Send + 'static> Default for CompletionBarrier<T> {
    fn default() -> Self {
        Self::new()
    }
}

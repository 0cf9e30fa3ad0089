/// Unit state definitions for tracking the progress of one (page, kind) unit
///
/// Every unit walks `Started -> Fetching -> (Succeeded | Failed) -> Done`.
/// Publishing only happens while a unit is `Succeeded`.
use std::fmt;

/// Represents the current state of a unit of work
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitState {
    /// Unit has been launched but has not issued its request yet
    Started,

    /// The resource fetcher is running
    Fetching,

    /// Records were retrieved; the publisher is running
    Succeeded,

    /// The fetch failed; nothing will be published
    Failed,

    /// Unit finished and has been handed to the completion barrier
    Done,
}

impl UnitState {
    /// Returns true if no further transition is possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Returns true if the unit reached the fetch result stage
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }

    /// Returns true if moving to `next` is a legal transition
    pub fn can_transition_to(&self, next: UnitState) -> bool {
        matches!(
            (self, next),
            (Self::Started, Self::Fetching)
                | (Self::Fetching, Self::Succeeded)
                | (Self::Fetching, Self::Failed)
                | (Self::Succeeded, Self::Done)
                | (Self::Failed, Self::Done)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Started => "started",
            Self::Fetching => "fetching",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Done => "done",
        }
    }

    /// Returns all possible unit states
    pub fn all_states() -> Vec<Self> {
        vec![
            Self::Started,
            Self::Fetching,
            Self::Succeeded,
            Self::Failed,
            Self::Done,
        ]
    }
}

impl fmt::Display for UnitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

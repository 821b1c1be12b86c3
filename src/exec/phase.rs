//! Execution phases
//!
//! The phase of a query request is an explicit tagged enumeration with a
//! total transition function. The driver is the single source of truth
//! for phase ordering; every emitted response is tagged with the phase it
//! was produced in, and downstream components never infer phase from
//! message ordering.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Phase of a query request's execution
///
/// Valid sequences are `ANALYSIS → PREPARING → COMPUTING* → SUCCESS` and
/// any non-terminal phase `→ FAILED`. A dry run stops after ANALYSIS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Token resolution and query analysis
    Analysis,
    /// Output allocation before compute streams
    Preparing,
    /// Aggregation running; batches streaming out
    Computing,
    /// Terminal: completed with final metrics
    Success,
    /// Terminal: a phase raised a terminal error
    Failed,
}

impl Phase {
    /// The entry phase of every request.
    pub fn initial() -> Self {
        Phase::Analysis
    }

    /// Whether `next` is a legal successor of `self`.
    ///
    /// COMPUTING may repeat (one response per batch); terminal phases
    /// have no successors.
    pub fn can_transition(self, next: Phase) -> bool {
        matches!(
            (self, next),
            (Phase::Analysis, Phase::Preparing)
                | (Phase::Analysis, Phase::Failed)
                | (Phase::Preparing, Phase::Computing)
                | (Phase::Preparing, Phase::Failed)
                | (Phase::Computing, Phase::Computing)
                | (Phase::Computing, Phase::Success)
                | (Phase::Computing, Phase::Failed)
        )
    }

    /// Whether this phase ends the stream.
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Success | Phase::Failed)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Analysis => write!(f, "ANALYSIS"),
            Phase::Preparing => write!(f, "PREPARING"),
            Phase::Computing => write!(f, "COMPUTING"),
            Phase::Success => write!(f, "SUCCESS"),
            Phase::Failed => write!(f, "FAILED"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        assert!(Phase::Analysis.can_transition(Phase::Preparing));
        assert!(Phase::Preparing.can_transition(Phase::Computing));
        assert!(Phase::Computing.can_transition(Phase::Computing));
        assert!(Phase::Computing.can_transition(Phase::Success));
    }

    #[test]
    fn test_failure_from_any_non_terminal() {
        assert!(Phase::Analysis.can_transition(Phase::Failed));
        assert!(Phase::Preparing.can_transition(Phase::Failed));
        assert!(Phase::Computing.can_transition(Phase::Failed));
    }

    #[test]
    fn test_no_skipping_or_reentry() {
        assert!(!Phase::Analysis.can_transition(Phase::Computing));
        assert!(!Phase::Analysis.can_transition(Phase::Success));
        assert!(!Phase::Preparing.can_transition(Phase::Analysis));
        assert!(!Phase::Preparing.can_transition(Phase::Success));
        assert!(!Phase::Computing.can_transition(Phase::Analysis));
        assert!(!Phase::Computing.can_transition(Phase::Preparing));
    }

    #[test]
    fn test_terminal_phases_have_no_successors() {
        for next in [
            Phase::Analysis,
            Phase::Preparing,
            Phase::Computing,
            Phase::Success,
            Phase::Failed,
        ] {
            assert!(!Phase::Success.can_transition(next));
            assert!(!Phase::Failed.can_transition(next));
        }
        assert!(Phase::Success.is_terminal());
        assert!(Phase::Failed.is_terminal());
        assert!(!Phase::Computing.is_terminal());
    }
}

//! Merge readiness evaluation

use crate::types::{CheckRollup, Mergeable, PullRequest, ReviewDecision};

/// Configurable merge gates
///
/// Conflicts and draft state always block; checks and approval can be
/// turned off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessGates {
    /// Require green checks
    pub require_checks: bool,
    /// Require an approving review
    pub require_approval: bool,
}

impl Default for ReadinessGates {
    fn default() -> Self {
        Self {
            require_checks: true,
            require_approval: true,
        }
    }
}

/// Where a PR stands with respect to merging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadinessState {
    /// Waiting on running checks
    Pending,
    /// Can be merged
    Ready,
    /// Cannot be merged without action
    Blocked,
}

impl std::fmt::Display for ReadinessState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Ready => write!(f, "ready"),
            Self::Blocked => write!(f, "blocked"),
        }
    }
}

/// Readiness of one PR, recomputed on every run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Readiness {
    /// Overall state
    pub state: ReadinessState,
    /// Why the PR is blocked or pending
    pub reasons: Vec<String>,
    /// Conditions that could not be verified (merge may still fail)
    pub uncertainties: Vec<String>,
}

impl Readiness {
    /// Whether the PR can be merged
    pub fn is_ready(&self) -> bool {
        self.state == ReadinessState::Ready
    }

    /// Whether some condition is unverified
    pub fn is_uncertain(&self) -> bool {
        !self.uncertainties.is_empty()
    }
}

/// Evaluate a PR (with details filled in) against the gates
pub fn evaluate_readiness(pr: &PullRequest, gates: ReadinessGates) -> Readiness {
    let mut blocked = Vec::new();
    let mut pending = Vec::new();
    let mut uncertainties = Vec::new();

    if pr.is_draft {
        blocked.push("PR is a draft".to_string());
    }

    match pr.mergeable {
        Mergeable::No => blocked.push("Has merge conflicts".to_string()),
        Mergeable::Unknown => {
            uncertainties.push("Merge status unknown (still computing)".to_string());
        }
        Mergeable::Yes => {}
    }

    match pr.review_decision {
        ReviewDecision::Approved => {}
        ReviewDecision::ChangesRequested if gates.require_approval => {
            blocked.push("Changes requested".to_string());
        }
        ReviewDecision::ChangesRequested => uncertainties.push("Changes requested".to_string()),
        ReviewDecision::ReviewRequired | ReviewDecision::None => {
            if gates.require_approval {
                blocked.push("Not approved".to_string());
            } else {
                uncertainties.push("Not approved".to_string());
            }
        }
    }

    match pr.check_rollup {
        CheckRollup::Passing | CheckRollup::None => {}
        CheckRollup::Failing if gates.require_checks => blocked.push("Checks failing".to_string()),
        CheckRollup::Pending if gates.require_checks => {
            pending.push("Checks still running".to_string());
        }
        CheckRollup::Failing => uncertainties.push("Checks failing".to_string()),
        CheckRollup::Pending => uncertainties.push("Checks still running".to_string()),
    }

    let (state, reasons) = if !blocked.is_empty() {
        blocked.extend(pending);
        (ReadinessState::Blocked, blocked)
    } else if !pending.is_empty() {
        (ReadinessState::Pending, pending)
    } else {
        (ReadinessState::Ready, Vec::new())
    };

    Readiness {
        state,
        reasons,
        uncertainties,
    }
}

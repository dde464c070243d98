//! Progress callback trait for interface-agnostic updates
//!
//! Every destructive step is announced here before it happens, so a CLI (or
//! any other front end) can narrate the run.

use crate::error::Error;
use crate::types::PullRequest;
use async_trait::async_trait;

/// Phase of a reconcile or merge run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Reading the local stack and assigning commit ids
    Analyzing,
    /// Matching commits against remote PRs
    Planning,
    /// Pushing branches
    Pushing,
    /// Creating, retargeting and updating PRs
    Synchronizing,
    /// Closing PRs that no longer belong to the stack
    Cleanup,
    /// Merging the ready prefix
    Merging,
    /// Rebasing the remaining stack onto the target
    Restacking,
    /// Run complete
    Complete,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Analyzing => write!(f, "Analyzing stack"),
            Self::Planning => write!(f, "Planning"),
            Self::Pushing => write!(f, "Pushing"),
            Self::Synchronizing => write!(f, "Updating pull requests"),
            Self::Cleanup => write!(f, "Cleaning up"),
            Self::Merging => write!(f, "Merging"),
            Self::Restacking => write!(f, "Restacking"),
            Self::Complete => write!(f, "Done"),
        }
    }
}

/// Push operation status
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushStatus {
    /// Push started
    Started,
    /// Push succeeded
    Success,
    /// Push failed with error message
    Failed(String),
}

impl std::fmt::Display for PushStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Started => write!(f, "started"),
            Self::Success => write!(f, "success"),
            Self::Failed(msg) => write!(f, "failed: {msg}"),
        }
    }
}

/// Progress callback trait
///
/// Implement this trait to receive progress updates during a run.
#[async_trait]
pub trait ProgressCallback: Send + Sync {
    /// Called when entering a new phase
    async fn on_phase(&self, phase: Phase);

    /// Called when a branch is being pushed
    async fn on_branch_push(&self, branch: &str, status: PushStatus);

    /// Called when a PR is created
    async fn on_pr_created(&self, branch: &str, pr: &PullRequest);

    /// Called when a PR is updated
    async fn on_pr_updated(&self, branch: &str, pr: &PullRequest);

    /// Called before a PR is closed
    async fn on_pr_closing(&self, pr_number: u64, reason: &str);

    /// Called when an error occurs (non-fatal)
    async fn on_error(&self, error: &Error);

    /// Called with a general status message
    async fn on_message(&self, message: &str);
}

/// No-op progress callback for testing or when progress isn't needed
pub struct NoopProgress;

#[async_trait]
impl ProgressCallback for NoopProgress {
    async fn on_phase(&self, _phase: Phase) {}
    async fn on_branch_push(&self, _branch: &str, _status: PushStatus) {}
    async fn on_pr_created(&self, _branch: &str, _pr: &PullRequest) {}
    async fn on_pr_updated(&self, _branch: &str, _pr: &PullRequest) {}
    async fn on_pr_closing(&self, _pr_number: u64, _reason: &str) {}
    async fn on_error(&self, _error: &Error) {}
    async fn on_message(&self, _message: &str) {}
}

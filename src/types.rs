//! Core types for stack-pr

use serde::{Deserialize, Serialize};

/// Prefixes that mark a commit as work in progress (compared case-insensitively)
const WIP_MARKERS: [&str; 2] = ["wip", "[wip]"];

/// A single commit in the local stack
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    /// Full commit hash (hex)
    pub hash: String,
    /// First parent hash, when the log carried it
    pub parent: Option<String>,
    /// Stable id from the `commit-id:` trailer (empty when missing)
    pub commit_id: String,
    /// First line of the commit message
    pub subject: String,
    /// Remaining message text, trailer removed
    pub body: String,
}

impl CommitRecord {
    /// Whether the subject starts with a WIP marker
    pub fn is_wip(&self) -> bool {
        let subject = self.subject.trim_start().to_ascii_lowercase();
        WIP_MARKERS.iter().any(|marker| subject.starts_with(marker))
    }

    /// Whether the commit carries a commit-id
    pub fn has_commit_id(&self) -> bool {
        !self.commit_id.is_empty()
    }

    /// Short form of the hash for display
    pub fn short_hash(&self) -> &str {
        self.hash.get(..8).unwrap_or(&self.hash)
    }
}

/// PR state (open, closed, merged)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrState {
    /// PR is open and can be merged
    Open,
    /// PR was closed without merging
    Closed,
    /// PR was merged
    Merged,
}

impl std::fmt::Display for PrState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Closed => write!(f, "closed"),
            Self::Merged => write!(f, "merged"),
        }
    }
}

/// Whether a PR merges cleanly into its base
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Mergeable {
    /// No conflicts
    Yes,
    /// Has conflicts
    No,
    /// Not computed yet (GitHub computes this lazily)
    #[default]
    Unknown,
}

impl From<Option<bool>> for Mergeable {
    fn from(value: Option<bool>) -> Self {
        match value {
            Some(true) => Self::Yes,
            Some(false) => Self::No,
            None => Self::Unknown,
        }
    }
}

/// Aggregated review state of a PR
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReviewDecision {
    /// At least one approval and no outstanding change requests
    Approved,
    /// A reviewer requested changes
    ChangesRequested,
    /// Reviews requested but none approving yet
    ReviewRequired,
    /// No review information
    #[default]
    None,
}

impl std::fmt::Display for ReviewDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Approved => write!(f, "approved"),
            Self::ChangesRequested => write!(f, "changes requested"),
            Self::ReviewRequired => write!(f, "review required"),
            Self::None => write!(f, "no reviews"),
        }
    }
}

/// Aggregated CI state of a PR's head commit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CheckRollup {
    /// Every check finished successfully
    Passing,
    /// At least one check failed
    Failing,
    /// Checks still running
    Pending,
    /// No checks configured
    #[default]
    None,
}

impl std::fmt::Display for CheckRollup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Passing => write!(f, "passing"),
            Self::Failing => write!(f, "failing"),
            Self::Pending => write!(f, "pending"),
            Self::None => write!(f, "none"),
        }
    }
}

/// A pull request / merge request
///
/// Listing endpoints leave the review fields at their defaults;
/// `PlatformService::get_pr_details` fills them in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    /// PR/MR number
    pub number: u64,
    /// Current state
    pub state: PrState,
    /// Web URL for the PR/MR
    pub html_url: String,
    /// Base branch name
    pub base_ref: String,
    /// Head branch name
    pub head_ref: String,
    /// Commit the head branch points at
    pub head_sha: String,
    /// PR/MR title
    pub title: String,
    /// PR/MR description
    pub body: String,
    /// Whether PR is a draft
    pub is_draft: bool,
    /// Conflict state
    pub mergeable: Mergeable,
    /// Review state
    pub review_decision: ReviewDecision,
    /// CI state
    pub check_rollup: CheckRollup,
}

/// Detected platform type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Platform {
    /// GitHub or GitHub Enterprise
    GitHub,
    /// GitLab or self-hosted GitLab
    GitLab,
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::GitHub => write!(f, "GitHub"),
            Self::GitLab => write!(f, "GitLab"),
        }
    }
}

/// Platform configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformConfig {
    /// Platform type
    pub platform: Platform,
    /// Repository owner (user or organization)
    pub owner: String,
    /// Repository name
    pub repo: String,
    /// Custom host (None for github.com/gitlab.com)
    pub host: Option<String>,
}

/// Result of a merge operation
#[derive(Debug, Clone)]
pub struct MergeResult {
    /// Whether the merge was successful
    pub merged: bool,
    /// The SHA of the merge commit (if successful)
    pub sha: Option<String>,
    /// Message from the merge operation (especially on failure)
    pub message: Option<String>,
}

/// Merge strategy/method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeMethod {
    /// Squash all commits into one
    Squash,
    /// Create a merge commit
    Merge,
    /// Rebase commits onto base branch
    #[default]
    Rebase,
}

impl std::fmt::Display for MergeMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Squash => write!(f, "squash"),
            Self::Merge => write!(f, "merge"),
            Self::Rebase => write!(f, "rebase"),
        }
    }
}

/// A question the core hands back to its caller before continuing
///
/// The core never prompts; the CLI answers and calls back in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Pick which commit of the stack to amend
    ChooseCommit {
        /// Candidate commits, oldest first
        candidates: Vec<CommitRecord>,
    },
    /// Confirm a merge whose readiness is not fully verified
    ConfirmMerge {
        /// PR that would be merged
        pr_number: u64,
        /// Why the merge is uncertain
        reasons: Vec<String>,
    },
}

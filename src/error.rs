//! Error types for stack-pr

use thiserror::Error;

/// Result alias used throughout the library
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced while reconciling a stack
#[derive(Debug, Error)]
pub enum Error {
    /// Commit log text could not be parsed (fatal)
    #[error("malformed commit log: {0}")]
    Parse(String),

    /// History rewrite for commit-id assignment failed (recovered with degraded ids)
    #[error("failed to assign commit ids: {0}")]
    IdentityAssignment(String),

    /// One or more ref updates were rejected
    #[error("push failed for {failed} ref(s): {message}")]
    Push {
        /// Number of refs that failed to update
        failed: usize,
        /// Error output from the push
        message: String,
    },

    /// A rebase stopped on conflicts and was left paused
    #[error(
        "rebase onto {onto} stopped on conflicts.\n  Resolve them and run 'git rebase --continue', or run 'git rebase --abort' to give up."
    )]
    RebaseConflict {
        /// Upstream the rebase was replaying onto
        onto: String,
    },

    /// Replaying the remaining stack after a merge stopped on conflicts
    #[error(
        "restack stopped on conflicts.\n  Resolve them and run 'git cherry-pick --continue', or run 'git cherry-pick --abort && git reset --hard {tip}' to return to the previous stack."
    )]
    RestackConflict {
        /// Tip of the stack before the restack began
        tip: String,
    },

    /// A paused cherry-pick (usually from a conflicted restack) must be finished first
    #[error(
        "a cherry-pick is still in progress.\n  Finish it with 'git cherry-pick --continue', or run 'git cherry-pick --abort' to give up, then run again."
    )]
    CherryPickInProgress,

    /// A git command failed
    #[error("git error: {0}")]
    Git(String),

    /// A review-service call failed
    #[error("remote API error: {0}")]
    RemoteApi(String),

    /// GitHub API error
    #[error("GitHub API error: {0}")]
    GitHubApi(String),

    /// GitLab API error
    #[error("GitLab API error: {0}")]
    GitLabApi(String),

    /// Authentication failure
    #[error("authentication error: {0}")]
    Auth(String),

    /// Invalid configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// No remote pointing at a supported platform
    #[error("no supported remotes found (expected a GitHub or GitLab URL)")]
    NoSupportedRemotes,

    /// Named remote does not exist
    #[error("remote '{0}' not found")]
    RemoteNotFound(String),

    /// Invalid command-line argument
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Unexpected internal failure
    #[error("internal error: {0}")]
    Internal(String),

    /// I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl From<octocrab::Error> for Error {
    fn from(err: octocrab::Error) -> Self {
        Self::GitHubApi(err.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::RemoteApi(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}

impl Error {
    /// Whether this error came from the review service
    ///
    /// Remote API failures are localized to the resource being synchronized;
    /// everything else aborts the run.
    pub const fn is_remote_api(&self) -> bool {
        matches!(
            self,
            Self::RemoteApi(_) | Self::GitHubApi(_) | Self::GitLabApi(_)
        )
    }
}

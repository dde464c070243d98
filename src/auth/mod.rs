//! Token lookup for the hosting platforms
//!
//! Environment variables win over the `gh`/`glab` CLIs so CI runs never
//! shell out.

mod github;
mod gitlab;

pub use github::{GitHubAuthConfig, get_github_auth};
pub use gitlab::{GitLabAuthConfig, get_gitlab_auth};

/// Where a token came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthSource {
    /// `gh auth token` or `glab config get token`
    Cli,
    /// `GITHUB_TOKEN`, `GH_TOKEN` or `GITLAB_TOKEN`
    EnvVar,
}

impl std::fmt::Display for AuthSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => f.write_str("cli"),
            Self::EnvVar => f.write_str("env"),
        }
    }
}

//! Platform services for GitHub and GitLab
//!
//! Provides a unified interface for PR/MR operations across platforms.

mod detection;
mod factory;
mod github;
mod gitlab;

pub use detection::{detect_platform, parse_repo_info};
pub use factory::create_platform_service;
pub use github::GitHubService;
pub use gitlab::GitLabService;

use crate::error::Result;
use crate::types::{MergeMethod, MergeResult, PlatformConfig, PullRequest};
use async_trait::async_trait;

/// Platform service trait for PR/MR operations
///
/// This trait abstracts GitHub and GitLab operations, allowing the same
/// reconciliation logic to work with either platform.
#[async_trait]
pub trait PlatformService: Send + Sync {
    /// List open PRs authored by the authenticated user
    ///
    /// Review decision and check rollup are left at their defaults;
    /// use [`get_pr_details`] when they matter.
    ///
    /// [`get_pr_details`]: Self::get_pr_details
    async fn list_open_prs(&self) -> Result<Vec<PullRequest>>;

    /// Get a single PR with mergeability, review decision and checks filled in
    async fn get_pr_details(&self, pr_number: u64) -> Result<PullRequest>;

    /// Create a new PR with default options (non-draft, no body).
    ///
    /// This is a convenience method that delegates to [`create_pr_with_options`]
    /// with `body: None` and `draft: false`. Implementors should override
    /// `create_pr_with_options`, not this method.
    ///
    /// [`create_pr_with_options`]: Self::create_pr_with_options
    async fn create_pr(&self, head: &str, base: &str, title: &str) -> Result<PullRequest> {
        self.create_pr_with_options(head, base, title, None, false)
            .await
    }

    /// Create a new PR with explicit body and draft options.
    ///
    /// Implementors must provide this method. The default [`create_pr`] method
    /// delegates here with `body: None` and `draft: false`.
    ///
    /// [`create_pr`]: Self::create_pr
    async fn create_pr_with_options(
        &self,
        head: &str,
        base: &str,
        title: &str,
        body: Option<&str>,
        draft: bool,
    ) -> Result<PullRequest>;

    /// Update the base branch of an existing PR
    async fn update_pr_base(&self, pr_number: u64, new_base: &str) -> Result<PullRequest>;

    /// Replace the description of an existing PR
    async fn update_pr_body(&self, pr_number: u64, body: &str) -> Result<PullRequest>;

    /// Request reviews from users (by login/username)
    async fn request_reviewers(&self, pr_number: u64, reviewers: &[String]) -> Result<()>;

    /// Create a comment on a PR
    async fn create_pr_comment(&self, pr_number: u64, body: &str) -> Result<()>;

    /// Close a PR without merging
    async fn close_pr(&self, pr_number: u64) -> Result<()>;

    /// Merge a PR with the specified method, keeping its head branch
    async fn merge_pr(&self, pr_number: u64, method: MergeMethod) -> Result<MergeResult>;

    /// Delete a branch on the remote
    async fn delete_branch(&self, branch: &str) -> Result<()>;

    /// Get the platform configuration
    fn config(&self) -> &PlatformConfig;
}

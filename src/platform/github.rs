//! GitHub platform service implementation

use crate::error::{Error, Result};
use crate::platform::PlatformService;
use crate::types::{
    CheckRollup, MergeMethod, MergeResult, Mergeable, Platform, PlatformConfig, PrState,
    PullRequest, ReviewDecision,
};
use async_trait::async_trait;
use octocrab::Octocrab;
use octocrab::models::pulls::ReviewState;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;

/// GitHub service using octocrab
pub struct GitHubService {
    client: Octocrab,
    config: PlatformConfig,
    /// Token for raw HTTP requests (CI status, branch deletion)
    token: String,
    /// HTTP client for raw requests
    http_client: Client,
    /// API host for raw requests
    api_host: String,
}

impl GitHubService {
    /// Create a new GitHub service
    pub fn new(token: &str, owner: String, repo: String, host: Option<String>) -> Result<Self> {
        let mut builder = Octocrab::builder().personal_token(token.to_string());

        let api_host = if let Some(ref h) = host {
            let base_url = format!("https://{h}/api/v3");
            builder = builder
                .base_uri(&base_url)
                .map_err(|e| Error::GitHubApi(e.to_string()))?;
            format!("{h}/api/v3")
        } else {
            "api.github.com".to_string()
        };

        let client = builder
            .build()
            .map_err(|e| Error::GitHubApi(e.to_string()))?;

        let http_client = Client::builder()
            .user_agent("stack-pr")
            .build()
            .map_err(|e| Error::GitHubApi(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            config: PlatformConfig {
                platform: Platform::GitHub,
                owner,
                repo,
                host,
            },
            token: token.to_string(),
            http_client,
            api_host,
        })
    }

    fn pulls(&self) -> octocrab::pulls::PullRequestHandler<'_> {
        self.client.pulls(&self.config.owner, &self.config.repo)
    }

    fn issues(&self) -> octocrab::issues::IssueHandler<'_> {
        self.client.issues(&self.config.owner, &self.config.repo)
    }

    fn repo_url(&self, path: &str) -> String {
        format!(
            "https://{}/repos/{}/{}/{path}",
            self.api_host, self.config.owner, self.config.repo
        )
    }

    fn raw_request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        self.http_client
            .request(method, url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
    }

    /// Roll up CI state by querying both commit statuses and check runs
    ///
    /// GitHub has two CI systems:
    /// 1. Commit Status API (legacy) - used by external CI services
    /// 2. Check Runs API (modern) - used by GitHub Actions
    async fn check_rollup(&self, sha: &str) -> CheckRollup {
        let statuses = self.commit_status_rollup(sha).await.unwrap_or_else(|e| {
            debug!(error = %e, "commit status lookup failed");
            CheckRollup::None
        });
        let runs = self.check_run_rollup(sha).await.unwrap_or_else(|e| {
            debug!(error = %e, "check run lookup failed");
            CheckRollup::None
        });
        combine_rollups(statuses, runs)
    }

    /// Legacy commit statuses via the combined status API
    async fn commit_status_rollup(&self, sha: &str) -> Result<CheckRollup> {
        #[derive(Deserialize)]
        struct CombinedStatus {
            state: String,
            total_count: u32,
        }

        let response = self
            .raw_request(reqwest::Method::GET, &self.repo_url(&format!("commits/{sha}/status")))
            .send()
            .await
            .map_err(|e| Error::GitHubApi(format!("Failed to fetch commit status: {e}")))?;

        if !response.status().is_success() {
            debug!(
                status = %response.status(),
                "Commit status check returned non-success, assuming no statuses configured"
            );
            return Ok(CheckRollup::None);
        }

        let status: CombinedStatus = response
            .json()
            .await
            .map_err(|e| Error::GitHubApi(format!("Failed to parse commit status: {e}")))?;

        if status.total_count == 0 {
            debug!("No commit statuses configured");
            return Ok(CheckRollup::None);
        }

        debug!(state = %status.state, count = status.total_count, "Commit status result");
        Ok(match status.state.as_str() {
            "success" => CheckRollup::Passing,
            "pending" => CheckRollup::Pending,
            _ => CheckRollup::Failing,
        })
    }

    /// GitHub Actions check runs
    async fn check_run_rollup(&self, sha: &str) -> Result<CheckRollup> {
        #[derive(Deserialize)]
        struct CheckRunsResponse {
            total_count: u32,
            check_runs: Vec<CheckRun>,
        }

        #[derive(Deserialize)]
        struct CheckRun {
            status: String,
            conclusion: Option<String>,
        }

        let response = self
            .raw_request(
                reqwest::Method::GET,
                &self.repo_url(&format!("commits/{sha}/check-runs")),
            )
            .send()
            .await
            .map_err(|e| Error::GitHubApi(format!("Failed to fetch check runs: {e}")))?;

        if !response.status().is_success() {
            debug!(
                status = %response.status(),
                "Check runs returned non-success, assuming no checks configured"
            );
            return Ok(CheckRollup::None);
        }

        let check_runs: CheckRunsResponse = response
            .json()
            .await
            .map_err(|e| Error::GitHubApi(format!("Failed to parse check runs: {e}")))?;

        if check_runs.total_count == 0 {
            debug!("No check runs configured");
            return Ok(CheckRollup::None);
        }

        let mut rollup = CheckRollup::Passing;
        for run in &check_runs.check_runs {
            if run.status != "completed" {
                debug!(status = %run.status, "Check run still in progress");
                rollup = CheckRollup::Pending;
                continue;
            }

            match run.conclusion.as_deref() {
                Some("success" | "neutral" | "skipped") => {}
                Some(conclusion) => {
                    debug!(conclusion = %conclusion, "Check run failed");
                    return Ok(CheckRollup::Failing);
                }
                None => {
                    debug!("Check run completed but no conclusion");
                    return Ok(CheckRollup::Failing);
                }
            }
        }

        debug!(count = check_runs.total_count, ?rollup, "Check runs evaluated");
        Ok(rollup)
    }

    /// Review decision from the latest verdict of each reviewer
    async fn review_decision(&self, pr: &octocrab::models::pulls::PullRequest) -> Result<ReviewDecision> {
        let reviews = self
            .pulls()
            .list_reviews(pr.number)
            .send()
            .await?;

        // Reviews arrive oldest first; later verdicts replace earlier ones
        let mut latest: HashMap<String, bool> = HashMap::new();
        for review in &reviews.items {
            let Some(user) = review.user.as_ref() else {
                continue;
            };
            match review.state {
                Some(ReviewState::Approved) => {
                    latest.insert(user.login.clone(), true);
                }
                Some(ReviewState::ChangesRequested) => {
                    latest.insert(user.login.clone(), false);
                }
                Some(ReviewState::Dismissed) => {
                    latest.remove(&user.login);
                }
                _ => {}
            }
        }

        let review_requested = pr
            .requested_reviewers
            .as_ref()
            .is_some_and(|r| !r.is_empty());

        Ok(if latest.values().any(|approved| !approved) {
            ReviewDecision::ChangesRequested
        } else if latest.values().any(|approved| *approved) {
            ReviewDecision::Approved
        } else if review_requested {
            ReviewDecision::ReviewRequired
        } else {
            ReviewDecision::None
        })
    }
}

/// Combine the two CI systems: any failure wins, then anything running
fn combine_rollups(a: CheckRollup, b: CheckRollup) -> CheckRollup {
    match (a, b) {
        (CheckRollup::Failing, _) | (_, CheckRollup::Failing) => CheckRollup::Failing,
        (CheckRollup::Pending, _) | (_, CheckRollup::Pending) => CheckRollup::Pending,
        (CheckRollup::Passing, _) | (_, CheckRollup::Passing) => CheckRollup::Passing,
        (CheckRollup::None, CheckRollup::None) => CheckRollup::None,
    }
}

/// Helper to convert octocrab PR to our `PullRequest` type
fn pr_from_octocrab(pr: &octocrab::models::pulls::PullRequest) -> PullRequest {
    let state = match pr.state {
        Some(octocrab::models::IssueState::Open) => PrState::Open,
        Some(_) if pr.merged_at.is_some() => PrState::Merged,
        // IssueState is non-exhaustive, so anything else counts as closed
        Some(_) | None => PrState::Closed,
    };

    PullRequest {
        number: pr.number,
        state,
        html_url: pr
            .html_url
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default(),
        base_ref: pr.base.ref_field.clone(),
        head_ref: pr.head.ref_field.clone(),
        head_sha: pr.head.sha.clone(),
        title: pr.title.as_deref().unwrap_or_default().to_string(),
        body: pr.body.clone().unwrap_or_default(),
        is_draft: pr.draft.unwrap_or(false),
        mergeable: Mergeable::from(pr.mergeable),
        review_decision: ReviewDecision::None,
        check_rollup: CheckRollup::None,
    }
}

#[async_trait]
impl PlatformService for GitHubService {
    async fn list_open_prs(&self) -> Result<Vec<PullRequest>> {
        let login = self.client.current().user().await?.login;
        debug!(login = %login, "listing open PRs");

        let first_page = self
            .pulls()
            .list()
            .state(octocrab::params::State::Open)
            .per_page(100)
            .send()
            .await?;
        let prs = self.client.all_pages(first_page).await?;

        let result: Vec<PullRequest> = prs
            .iter()
            .filter(|pr| pr.user.as_ref().is_some_and(|u| u.login == login))
            .map(pr_from_octocrab)
            .collect();
        debug!(count = result.len(), "listed open PRs");
        Ok(result)
    }

    async fn get_pr_details(&self, pr_number: u64) -> Result<PullRequest> {
        debug!(pr_number, "getting PR details");

        let pr = self
            .pulls()
            .get(pr_number)
            .await?;

        let mut details = pr_from_octocrab(&pr);
        details.review_decision = self.review_decision(&pr).await?;
        details.check_rollup = self.check_rollup(&details.head_sha).await;

        debug!(
            pr_number,
            state = %details.state,
            review = %details.review_decision,
            checks = %details.check_rollup,
            "got PR details"
        );
        Ok(details)
    }

    async fn create_pr_with_options(
        &self,
        head: &str,
        base: &str,
        title: &str,
        body: Option<&str>,
        draft: bool,
    ) -> Result<PullRequest> {
        debug!(head, base, draft, "creating PR");
        let pulls = self.pulls();
        let mut builder = pulls.create(title, head, base).draft(draft);

        if let Some(body_text) = body {
            builder = builder.body(body_text);
        }

        let pr = builder.send().await?;

        let result = pr_from_octocrab(&pr);
        debug!(pr_number = result.number, "created PR");
        Ok(result)
    }

    async fn update_pr_base(&self, pr_number: u64, new_base: &str) -> Result<PullRequest> {
        debug!(pr_number, new_base, "updating PR base");
        let pr = self
            .pulls()
            .update(pr_number)
            .base(new_base)
            .send()
            .await?;

        debug!(pr_number, "updated PR base");
        Ok(pr_from_octocrab(&pr))
    }

    async fn update_pr_body(&self, pr_number: u64, body: &str) -> Result<PullRequest> {
        debug!(pr_number, "updating PR body");
        let pr = self
            .pulls()
            .update(pr_number)
            .body(body)
            .send()
            .await?;

        debug!(pr_number, "updated PR body");
        Ok(pr_from_octocrab(&pr))
    }

    async fn request_reviewers(&self, pr_number: u64, reviewers: &[String]) -> Result<()> {
        if reviewers.is_empty() {
            return Ok(());
        }
        debug!(pr_number, ?reviewers, "requesting reviewers");
        self.pulls()
            .request_reviews(pr_number, reviewers.to_vec(), Vec::<String>::new())
            .await?;
        Ok(())
    }

    async fn create_pr_comment(&self, pr_number: u64, body: &str) -> Result<()> {
        debug!(pr_number, "creating PR comment");
        self.issues()
            .create_comment(pr_number, body)
            .await?;
        debug!(pr_number, "created PR comment");
        Ok(())
    }

    async fn close_pr(&self, pr_number: u64) -> Result<()> {
        debug!(pr_number, "closing PR");
        self.issues()
            .update(pr_number)
            .state(octocrab::models::IssueState::Closed)
            .send()
            .await?;
        debug!(pr_number, "closed PR");
        Ok(())
    }

    async fn merge_pr(&self, pr_number: u64, method: MergeMethod) -> Result<MergeResult> {
        debug!(pr_number, %method, "merging PR");

        let pr = self
            .pulls()
            .get(pr_number)
            .await?;
        let details = pr_from_octocrab(&pr);

        let octocrab_method = match method {
            MergeMethod::Squash => octocrab::params::pulls::MergeMethod::Squash,
            MergeMethod::Merge => octocrab::params::pulls::MergeMethod::Merge,
            MergeMethod::Rebase => octocrab::params::pulls::MergeMethod::Rebase,
        };

        let pulls = self.pulls();

        // For squash, use PR title and body as commit message
        let result = if method == MergeMethod::Squash {
            let mut builder = pulls.merge(pr_number).method(octocrab_method);
            builder = builder.title(format!("{} (#{})", details.title, pr_number));
            if !details.body.is_empty() {
                builder = builder.message(&details.body);
            }
            builder.send().await
        } else {
            pulls.merge(pr_number).method(octocrab_method).send().await
        }
        .map_err(|e| Error::GitHubApi(format!("Merge failed: {e}")))?;

        let merge_result = MergeResult {
            merged: result.merged,
            sha: result.sha,
            message: result.message,
        };

        debug!(
            pr_number,
            merged = merge_result.merged,
            sha = ?merge_result.sha,
            "merge complete"
        );
        Ok(merge_result)
    }

    async fn delete_branch(&self, branch: &str) -> Result<()> {
        let url = self.repo_url(&format!(
            "git/refs/heads/{}",
            urlencoding::encode(branch).replace("%2F", "/")
        ));
        let response = self
            .raw_request(reqwest::Method::DELETE, &url)
            .send()
            .await
            .map_err(|e| Error::GitHubApi(format!("Failed to delete branch: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::GitHubApi(format!(
                "Failed to delete branch {branch}: {}",
                response.status()
            )));
        }
        Ok(())
    }

    fn config(&self) -> &PlatformConfig {
        &self.config
    }
}

//! GitLab platform service implementation

use crate::error::{Error, Result};
use crate::platform::PlatformService;
use crate::types::{
    CheckRollup, MergeMethod, MergeResult, Mergeable, Platform, PlatformConfig, PrState,
    PullRequest, ReviewDecision,
};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// GitLab service using reqwest
pub struct GitLabService {
    client: Client,
    token: String,
    /// API root, e.g. `https://gitlab.com/api/v4`
    api_base: String,
    config: PlatformConfig,
    project_path: String,
}

#[derive(Deserialize)]
struct MergeRequest {
    iid: u64,
    web_url: String,
    source_branch: String,
    target_branch: String,
    title: String,
    #[serde(default)]
    description: Option<String>,
    state: String, // "opened", "closed", "merged", "locked"
    #[serde(default)]
    draft: bool,
    #[serde(default)]
    sha: Option<String>,
    #[serde(default)]
    merge_status: Option<String>, // "can_be_merged", "cannot_be_merged", "unchecked", ...
    #[serde(default)]
    has_conflicts: bool,
}

/// MR approvals response
#[derive(Deserialize)]
struct MrApprovals {
    approved: bool,
    #[serde(default)]
    approvals_required: u32,
    #[serde(default)]
    approved_by: Vec<serde_json::Value>,
}

/// Pipeline status
#[derive(Deserialize)]
struct Pipeline {
    status: String, // "success", "failed", "running", "pending", ...
}

/// Entry of the user search endpoint
#[derive(Deserialize)]
struct GitLabUser {
    id: u64,
}

/// Merge response
#[derive(Deserialize)]
struct MergeResponse {
    state: String,
    merge_commit_sha: Option<String>,
}

impl From<MergeRequest> for PullRequest {
    fn from(mr: MergeRequest) -> Self {
        let state = match mr.state.as_str() {
            "opened" => PrState::Open,
            "merged" => PrState::Merged,
            _ => PrState::Closed,
        };
        let mergeable = if mr.has_conflicts {
            Mergeable::No
        } else {
            match mr.merge_status.as_deref() {
                Some("can_be_merged") => Mergeable::Yes,
                Some("cannot_be_merged") => Mergeable::No,
                _ => Mergeable::Unknown,
            }
        };

        Self {
            number: mr.iid,
            state,
            html_url: mr.web_url,
            base_ref: mr.target_branch,
            head_ref: mr.source_branch,
            head_sha: mr.sha.unwrap_or_default(),
            title: mr.title,
            body: mr.description.unwrap_or_default(),
            is_draft: mr.draft,
            mergeable,
            review_decision: ReviewDecision::None,
            check_rollup: CheckRollup::None,
        }
    }
}

#[derive(Serialize)]
struct CreateMrPayload {
    source_branch: String,
    target_branch: String,
    title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    draft: Option<bool>,
}

/// Default request timeout in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Page size for list endpoints
const PER_PAGE: &str = "100";

/// Map the most recent pipeline status to a rollup
fn rollup_from_pipeline(pipeline: Option<&Pipeline>) -> CheckRollup {
    match pipeline.map(|p| p.status.as_str()) {
        None | Some("skipped") => CheckRollup::None,
        Some("success") => CheckRollup::Passing,
        Some("failed" | "canceled") => CheckRollup::Failing,
        Some(_) => CheckRollup::Pending,
    }
}

impl GitLabService {
    /// Create a new GitLab service
    pub fn new(token: String, owner: String, repo: String, host: Option<String>) -> Result<Self> {
        let host = host.unwrap_or_else(|| "gitlab.com".to_string());
        let api_base = format!("https://{host}/api/v4");
        let config_host = (host != "gitlab.com").then_some(host);
        Self::build(token, owner, repo, api_base, config_host)
    }

    /// Create a service against an explicit API root (self-hosted proxies, tests)
    pub fn with_base_url(token: String, owner: String, repo: String, api_base: &str) -> Result<Self> {
        let api_base = api_base.trim_end_matches('/').to_string();
        let host = url::Url::parse(&api_base)
            .ok()
            .and_then(|u| u.host_str().map(ToString::to_string));
        Self::build(token, owner, repo, api_base, host)
    }

    fn build(
        token: String,
        owner: String,
        repo: String,
        api_base: String,
        host: Option<String>,
    ) -> Result<Self> {
        let project_path = format!("{owner}/{repo}");

        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| Error::GitLabApi(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            token,
            api_base,
            config: PlatformConfig {
                platform: Platform::GitLab,
                owner,
                repo,
                host,
            },
            project_path,
        })
    }

    fn encoded_project(&self) -> String {
        urlencoding::encode(&self.project_path).into_owned()
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.api_base, path))
            .header("PRIVATE-TOKEN", &self.token)
    }

    fn mr_path(&self, pr_number: u64) -> String {
        format!(
            "/projects/{}/merge_requests/{}",
            self.encoded_project(),
            pr_number
        )
    }

    async fn fetch_mr(&self, pr_number: u64) -> Result<MergeRequest> {
        let mr = self
            .request(Method::GET, &self.mr_path(pr_number))
            .send()
            .await?
            .error_for_status()
            .map_err(|e| Error::GitLabApi(e.to_string()))?
            .json()
            .await?;
        Ok(mr)
    }

    async fn edit_mr(&self, pr_number: u64, payload: serde_json::Value) -> Result<PullRequest> {
        let mr: MergeRequest = self
            .request(Method::PUT, &self.mr_path(pr_number))
            .json(&payload)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| Error::GitLabApi(e.to_string()))?
            .json()
            .await?;
        Ok(mr.into())
    }

    /// Review decision from the approvals endpoint
    ///
    /// An unavailable endpoint (approvals are a paid feature on some tiers)
    /// yields `ReviewDecision::None`.
    async fn review_decision(&self, pr_number: u64) -> ReviewDecision {
        let response = match self
            .request(
                Method::GET,
                &format!("{}/approvals", self.mr_path(pr_number)),
            )
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                debug!(status = %response.status(), "approvals endpoint unavailable");
                return ReviewDecision::None;
            }
            Err(e) => {
                debug!(error = %e, "approvals lookup failed");
                return ReviewDecision::None;
            }
        };

        match response.json::<MrApprovals>().await {
            // `approved` is also true when no approval rule exists
            Ok(approvals)
                if approvals.approved
                    && (approvals.approvals_required > 0 || !approvals.approved_by.is_empty()) =>
            {
                ReviewDecision::Approved
            }
            Ok(approvals) if !approvals.approved => ReviewDecision::ReviewRequired,
            Ok(_) => ReviewDecision::None,
            Err(e) => {
                debug!(error = %e, "failed to parse approvals");
                ReviewDecision::None
            }
        }
    }

    /// CI state from the most recent pipeline of the MR
    async fn check_rollup(&self, pr_number: u64) -> CheckRollup {
        let response = match self
            .request(
                Method::GET,
                &format!("{}/pipelines", self.mr_path(pr_number)),
            )
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                debug!(status = %response.status(), "pipelines endpoint unavailable");
                return CheckRollup::None;
            }
            Err(e) => {
                debug!(error = %e, "pipelines lookup failed");
                return CheckRollup::None;
            }
        };

        let pipelines: Vec<Pipeline> = response.json().await.unwrap_or_default();
        rollup_from_pipeline(pipelines.first())
    }

    async fn user_id(&self, username: &str) -> Result<u64> {
        let users: Vec<GitLabUser> = self
            .request(Method::GET, "/users")
            .query(&[("username", username)])
            .send()
            .await?
            .error_for_status()
            .map_err(|e| Error::GitLabApi(e.to_string()))?
            .json()
            .await?;

        users
            .first()
            .map(|u| u.id)
            .ok_or_else(|| Error::GitLabApi(format!("unknown user '{username}'")))
    }
}

#[async_trait]
impl PlatformService for GitLabService {
    async fn list_open_prs(&self) -> Result<Vec<PullRequest>> {
        debug!("listing open MRs");
        let path = format!("/projects/{}/merge_requests", self.encoded_project());

        let mut result = Vec::new();
        let mut page: u32 = 1;
        loop {
            let page_param = page.to_string();
            let response = self
                .request(Method::GET, &path)
                .query(&[
                    ("state", "opened"),
                    ("scope", "created_by_me"),
                    ("per_page", PER_PAGE),
                    ("page", page_param.as_str()),
                ])
                .send()
                .await?
                .error_for_status()
                .map_err(|e| Error::GitLabApi(e.to_string()))?;

            let next_page = response
                .headers()
                .get("x-next-page")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u32>().ok());

            let mrs: Vec<MergeRequest> = response.json().await?;
            result.extend(mrs.into_iter().map(PullRequest::from));

            match next_page {
                Some(next) if next > page => page = next,
                _ => break,
            }
        }

        debug!(count = result.len(), "listed open MRs");
        Ok(result)
    }

    async fn get_pr_details(&self, pr_number: u64) -> Result<PullRequest> {
        debug!(mr_iid = pr_number, "getting MR details");

        let mut details: PullRequest = self.fetch_mr(pr_number).await?.into();
        details.review_decision = self.review_decision(pr_number).await;
        details.check_rollup = self.check_rollup(pr_number).await;

        debug!(
            mr_iid = pr_number,
            state = %details.state,
            review = %details.review_decision,
            checks = %details.check_rollup,
            "got MR details"
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
        debug!(head, base, draft, "creating MR");
        let payload = CreateMrPayload {
            source_branch: head.to_string(),
            target_branch: base.to_string(),
            title: title.to_string(),
            description: body.map(ToString::to_string),
            draft: draft.then_some(true),
        };

        let mr: MergeRequest = self
            .request(
                Method::POST,
                &format!("/projects/{}/merge_requests", self.encoded_project()),
            )
            .json(&payload)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| Error::GitLabApi(e.to_string()))?
            .json()
            .await?;

        let pr: PullRequest = mr.into();
        debug!(mr_iid = pr.number, "created MR");
        Ok(pr)
    }

    async fn update_pr_base(&self, pr_number: u64, new_base: &str) -> Result<PullRequest> {
        debug!(mr_iid = pr_number, new_base, "updating MR base");
        let pr = self
            .edit_mr(pr_number, serde_json::json!({ "target_branch": new_base }))
            .await?;
        debug!(mr_iid = pr_number, "updated MR base");
        Ok(pr)
    }

    async fn update_pr_body(&self, pr_number: u64, body: &str) -> Result<PullRequest> {
        debug!(mr_iid = pr_number, "updating MR description");
        let pr = self
            .edit_mr(pr_number, serde_json::json!({ "description": body }))
            .await?;
        debug!(mr_iid = pr_number, "updated MR description");
        Ok(pr)
    }

    async fn request_reviewers(&self, pr_number: u64, reviewers: &[String]) -> Result<()> {
        if reviewers.is_empty() {
            return Ok(());
        }
        debug!(mr_iid = pr_number, ?reviewers, "requesting reviewers");

        let mut ids = Vec::with_capacity(reviewers.len());
        for username in reviewers {
            ids.push(self.user_id(username).await?);
        }

        self.edit_mr(pr_number, serde_json::json!({ "reviewer_ids": ids }))
            .await?;
        Ok(())
    }

    async fn create_pr_comment(&self, pr_number: u64, body: &str) -> Result<()> {
        debug!(mr_iid = pr_number, "creating MR comment");
        self.request(Method::POST, &format!("{}/notes", self.mr_path(pr_number)))
            .json(&serde_json::json!({ "body": body }))
            .send()
            .await?
            .error_for_status()
            .map_err(|e| Error::GitLabApi(e.to_string()))?;

        debug!(mr_iid = pr_number, "created MR comment");
        Ok(())
    }

    async fn close_pr(&self, pr_number: u64) -> Result<()> {
        debug!(mr_iid = pr_number, "closing MR");
        self.edit_mr(pr_number, serde_json::json!({ "state_event": "close" }))
            .await?;
        debug!(mr_iid = pr_number, "closed MR");
        Ok(())
    }

    async fn merge_pr(&self, pr_number: u64, method: MergeMethod) -> Result<MergeResult> {
        debug!(mr_iid = pr_number, %method, "merging MR");

        let mut body = serde_json::json!({
            "should_remove_source_branch": false,
        });
        if method == MergeMethod::Squash {
            let mr = self.fetch_mr(pr_number).await?;
            body["squash"] = serde_json::Value::Bool(true);
            body["squash_commit_message"] = serde_json::Value::String(format!(
                "{} (!{})\n\n{}",
                mr.title,
                pr_number,
                mr.description.unwrap_or_default()
            ));
        }

        let response: MergeResponse = self
            .request(Method::PUT, &format!("{}/merge", self.mr_path(pr_number)))
            .json(&body)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| Error::GitLabApi(format!("Merge failed: {e}")))?
            .json()
            .await?;

        let merge_result = MergeResult {
            merged: response.state == "merged",
            sha: response.merge_commit_sha,
            message: None,
        };

        debug!(
            mr_iid = pr_number,
            merged = merge_result.merged,
            sha = ?merge_result.sha,
            "merge complete"
        );
        Ok(merge_result)
    }

    async fn delete_branch(&self, branch: &str) -> Result<()> {
        debug!(branch, "deleting branch");
        self.request(
            Method::DELETE,
            &format!(
                "/projects/{}/repository/branches/{}",
                self.encoded_project(),
                urlencoding::encode(branch)
            ),
        )
        .send()
        .await?
        .error_for_status()
        .map_err(|e| Error::GitLabApi(format!("Failed to delete branch {branch}: {e}")))?;
        Ok(())
    }

    fn config(&self) -> &PlatformConfig {
        &self.config
    }
}

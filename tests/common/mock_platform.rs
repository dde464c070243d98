//! Mock platform service for testing
//!
//! These are test utilities - not all may be used in every test binary.

#![allow(dead_code)]

use async_trait::async_trait;
use stack_pr::error::{Error, Result};
use stack_pr::platform::PlatformService;
use stack_pr::types::{MergeMethod, MergeResult, PlatformConfig, PrState, PullRequest};
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// Call record for `create_pr_with_options`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatePrCall {
    pub head: String,
    pub base: String,
    pub title: String,
    pub body: Option<String>,
    pub draft: bool,
}

/// Call record for `update_pr_base`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateBaseCall {
    pub pr_number: u64,
    pub new_base: String,
}

/// Call record for `update_pr_body`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateBodyCall {
    pub pr_number: u64,
    pub body: String,
}

/// Call record for `create_pr_comment`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateCommentCall {
    pub pr_number: u64,
    pub body: String,
}

/// Call record for `merge_pr`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergePrCall {
    pub pr_number: u64,
    pub method: MergeMethod,
}

/// Stateful mock platform service
///
/// Keeps an in-memory set of PRs so consecutive runs see the effects of
/// earlier ones, and records every call for verification.
///
/// Features:
/// - Auto-incrementing PR numbers
/// - Call tracking for verification
/// - Error injection for failure path testing
pub struct MockPlatformService {
    config: PlatformConfig,
    next_pr_number: AtomicU64,
    prs: Mutex<BTreeMap<u64, PullRequest>>,
    merge_responses: Mutex<HashMap<u64, MergeResult>>,
    // Call tracking
    list_calls: AtomicU64,
    create_pr_calls: Mutex<Vec<CreatePrCall>>,
    update_base_calls: Mutex<Vec<UpdateBaseCall>>,
    update_body_calls: Mutex<Vec<UpdateBodyCall>>,
    create_comment_calls: Mutex<Vec<CreateCommentCall>>,
    close_calls: Mutex<Vec<u64>>,
    reviewer_calls: Mutex<Vec<(u64, Vec<String>)>>,
    get_pr_details_calls: Mutex<Vec<u64>>,
    merge_pr_calls: Mutex<Vec<MergePrCall>>,
    deleted_branches: Mutex<Vec<String>>,
    // Ordered log of mutating calls
    events: Mutex<Vec<String>>,
    // Error injection
    error_on_list: Mutex<Option<String>>,
    error_on_create_pr: Mutex<Option<String>>,
    error_on_create_for_head: Mutex<Option<String>>,
    error_on_update_base: Mutex<Option<String>>,
    error_on_update_body: Mutex<Option<String>>,
    error_on_close: Mutex<Option<String>>,
    error_on_merge_pr: Mutex<Option<String>>,
    error_on_delete_branch: Mutex<Option<String>>,
}

impl MockPlatformService {
    /// Create a new mock with the given config
    pub fn with_config(config: PlatformConfig) -> Self {
        Self {
            config,
            next_pr_number: AtomicU64::new(1),
            prs: Mutex::new(BTreeMap::new()),
            merge_responses: Mutex::new(HashMap::new()),
            list_calls: AtomicU64::new(0),
            create_pr_calls: Mutex::new(Vec::new()),
            update_base_calls: Mutex::new(Vec::new()),
            update_body_calls: Mutex::new(Vec::new()),
            create_comment_calls: Mutex::new(Vec::new()),
            close_calls: Mutex::new(Vec::new()),
            reviewer_calls: Mutex::new(Vec::new()),
            get_pr_details_calls: Mutex::new(Vec::new()),
            merge_pr_calls: Mutex::new(Vec::new()),
            deleted_branches: Mutex::new(Vec::new()),
            events: Mutex::new(Vec::new()),
            error_on_list: Mutex::new(None),
            error_on_create_pr: Mutex::new(None),
            error_on_create_for_head: Mutex::new(None),
            error_on_update_base: Mutex::new(None),
            error_on_update_body: Mutex::new(None),
            error_on_close: Mutex::new(None),
            error_on_merge_pr: Mutex::new(None),
            error_on_delete_branch: Mutex::new(None),
        }
    }

    // === State setup ===

    /// Seed an existing PR; later creates get higher numbers
    pub fn add_pr(&self, pr: PullRequest) {
        let number = pr.number;
        self.prs.lock().unwrap().insert(number, pr);
        self.next_pr_number.fetch_max(number + 1, Ordering::SeqCst);
    }

    /// Current stored state of a PR
    pub fn pr(&self, number: u64) -> Option<PullRequest> {
        self.prs.lock().unwrap().get(&number).cloned()
    }

    /// Open PR for a head branch
    pub fn pr_for_head(&self, head: &str) -> Option<PullRequest> {
        self.prs
            .lock()
            .unwrap()
            .values()
            .find(|pr| pr.head_ref == head && pr.state == PrState::Open)
            .cloned()
    }

    /// All open PRs, by number
    pub fn open_prs(&self) -> Vec<PullRequest> {
        self.prs
            .lock()
            .unwrap()
            .values()
            .filter(|pr| pr.state == PrState::Open)
            .cloned()
            .collect()
    }

    /// Point the PR for `head` at `sha` (what a push does remotely)
    pub fn set_head_sha(&self, head: &str, sha: &str) {
        for pr in self.prs.lock().unwrap().values_mut() {
            if pr.head_ref == head {
                pr.head_sha = sha.to_string();
            }
        }
    }

    /// Overwrite a stored PR body (a user edit)
    pub fn set_body(&self, number: u64, body: &str) {
        if let Some(pr) = self.prs.lock().unwrap().get_mut(&number) {
            pr.body = body.to_string();
        }
    }

    /// Apply `edit` to a stored PR
    pub fn edit_pr(&self, number: u64, edit: impl FnOnce(&mut PullRequest)) {
        if let Some(pr) = self.prs.lock().unwrap().get_mut(&number) {
            edit(pr);
        }
    }

    /// Set the response for `merge_pr` for a specific PR
    pub fn set_merge_response(&self, pr_number: u64, result: MergeResult) {
        self.merge_responses
            .lock()
            .unwrap()
            .insert(pr_number, result);
    }

    // === Error injection methods ===

    /// Make `list_open_prs` return an error
    pub fn fail_list(&self, msg: &str) {
        *self.error_on_list.lock().unwrap() = Some(msg.to_string());
    }

    /// Make every `create_pr_with_options` return an error
    pub fn fail_create_pr(&self, msg: &str) {
        *self.error_on_create_pr.lock().unwrap() = Some(msg.to_string());
    }

    /// Make `create_pr_with_options` fail only for this head branch
    pub fn fail_create_pr_for(&self, head: &str) {
        *self.error_on_create_for_head.lock().unwrap() = Some(head.to_string());
    }

    /// Make `update_pr_base` return an error
    pub fn fail_update_base(&self, msg: &str) {
        *self.error_on_update_base.lock().unwrap() = Some(msg.to_string());
    }

    /// Make `update_pr_body` return an error
    pub fn fail_update_body(&self, msg: &str) {
        *self.error_on_update_body.lock().unwrap() = Some(msg.to_string());
    }

    /// Make `close_pr` return an error
    pub fn fail_close(&self, msg: &str) {
        *self.error_on_close.lock().unwrap() = Some(msg.to_string());
    }

    /// Make `merge_pr` return an error
    pub fn fail_merge_pr(&self, msg: &str) {
        *self.error_on_merge_pr.lock().unwrap() = Some(msg.to_string());
    }

    /// Make `delete_branch` return an error
    pub fn fail_delete_branch(&self, msg: &str) {
        *self.error_on_delete_branch.lock().unwrap() = Some(msg.to_string());
    }

    // === Call verification methods ===

    /// Number of `list_open_prs` calls
    pub fn list_call_count(&self) -> u64 {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Get all `create_pr_with_options` calls
    pub fn get_create_pr_calls(&self) -> Vec<CreatePrCall> {
        self.create_pr_calls.lock().unwrap().clone()
    }

    /// Get all `update_pr_base` calls
    pub fn get_update_base_calls(&self) -> Vec<UpdateBaseCall> {
        self.update_base_calls.lock().unwrap().clone()
    }

    /// Get all `update_pr_body` calls
    pub fn get_update_body_calls(&self) -> Vec<UpdateBodyCall> {
        self.update_body_calls.lock().unwrap().clone()
    }

    /// Get all `create_pr_comment` calls
    pub fn get_create_comment_calls(&self) -> Vec<CreateCommentCall> {
        self.create_comment_calls.lock().unwrap().clone()
    }

    /// Get all `close_pr` calls
    pub fn get_close_calls(&self) -> Vec<u64> {
        self.close_calls.lock().unwrap().clone()
    }

    /// Get all `request_reviewers` calls
    pub fn get_reviewer_calls(&self) -> Vec<(u64, Vec<String>)> {
        self.reviewer_calls.lock().unwrap().clone()
    }

    /// Get all `get_pr_details` calls
    pub fn get_pr_details_calls(&self) -> Vec<u64> {
        self.get_pr_details_calls.lock().unwrap().clone()
    }

    /// Get all `merge_pr` calls
    pub fn get_merge_pr_calls(&self) -> Vec<MergePrCall> {
        self.merge_pr_calls.lock().unwrap().clone()
    }

    /// Branches deleted through `delete_branch`
    pub fn deleted_branches(&self) -> Vec<String> {
        self.deleted_branches.lock().unwrap().clone()
    }

    /// Mutating calls in the order they happened, e.g. `"base #2 -> main"`
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    /// Whether any mutating call was made
    pub fn is_untouched(&self) -> bool {
        self.events.lock().unwrap().is_empty()
    }

    /// Assert that a PR was created with specific head and base
    pub fn assert_create_pr_called(&self, head: &str, base: &str) {
        let calls = self.get_create_pr_calls();
        assert!(
            calls.iter().any(|c| c.head == head && c.base == base),
            "Expected create_pr({head}, {base}) but got: {calls:?}"
        );
    }

    /// Assert that `update_pr_base` was called with specific args
    pub fn assert_update_base_called(&self, pr_number: u64, new_base: &str) {
        let calls = self.get_update_base_calls();
        assert!(
            calls
                .iter()
                .any(|c| c.pr_number == pr_number && c.new_base == new_base),
            "Expected update_pr_base({pr_number}, {new_base}) but got: {calls:?}"
        );
    }

    /// Assert that a PR was closed
    pub fn assert_closed(&self, pr_number: u64) {
        let calls = self.get_close_calls();
        assert!(
            calls.contains(&pr_number),
            "Expected close_pr({pr_number}) but got: {calls:?}"
        );
    }

    /// Assert that no PR was closed
    pub fn assert_nothing_closed(&self) {
        let calls = self.get_close_calls();
        assert!(calls.is_empty(), "Expected no close_pr calls but got: {calls:?}");
    }

    /// Assert that `merge_pr` was called for a specific PR
    pub fn assert_merge_called(&self, pr_number: u64) {
        let calls = self.get_merge_pr_calls();
        assert!(
            calls.iter().any(|c| c.pr_number == pr_number),
            "Expected merge_pr({pr_number}) but got: {calls:?}"
        );
    }

    /// Assert that `merge_pr` was NOT called for a specific PR
    pub fn assert_merge_not_called(&self, pr_number: u64) {
        let calls = self.get_merge_pr_calls();
        assert!(
            !calls.iter().any(|c| c.pr_number == pr_number),
            "Expected merge_pr({pr_number}) NOT to be called but it was: {calls:?}"
        );
    }

    /// Get count of `merge_pr` calls
    pub fn merge_call_count(&self) -> usize {
        self.merge_pr_calls.lock().unwrap().len()
    }

    fn injected(slot: &Mutex<Option<String>>) -> Result<()> {
        slot.lock()
            .unwrap()
            .as_ref()
            .map_or(Ok(()), |msg| Err(Error::RemoteApi(msg.clone())))
    }

    fn event(&self, text: String) {
        self.events.lock().unwrap().push(text);
    }

    fn stored(&self, pr_number: u64) -> Result<PullRequest> {
        self.pr(pr_number)
            .ok_or_else(|| Error::RemoteApi(format!("PR #{pr_number} not found")))
    }
}

#[async_trait]
impl PlatformService for MockPlatformService {
    async fn list_open_prs(&self) -> Result<Vec<PullRequest>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        Self::injected(&self.error_on_list)?;
        Ok(self.open_prs())
    }

    async fn get_pr_details(&self, pr_number: u64) -> Result<PullRequest> {
        self.get_pr_details_calls.lock().unwrap().push(pr_number);
        self.stored(pr_number)
    }

    async fn create_pr_with_options(
        &self,
        head: &str,
        base: &str,
        title: &str,
        body: Option<&str>,
        draft: bool,
    ) -> Result<PullRequest> {
        self.create_pr_calls.lock().unwrap().push(CreatePrCall {
            head: head.to_string(),
            base: base.to_string(),
            title: title.to_string(),
            body: body.map(ToString::to_string),
            draft,
        });

        Self::injected(&self.error_on_create_pr)?;
        if self.error_on_create_for_head.lock().unwrap().as_deref() == Some(head) {
            return Err(Error::RemoteApi(format!("cannot create PR for {head}")));
        }

        let number = self.next_pr_number.fetch_add(1, Ordering::SeqCst);
        let pr = PullRequest {
            number,
            state: PrState::Open,
            html_url: format!("https://github.com/test/repo/pull/{number}"),
            base_ref: base.to_string(),
            head_ref: head.to_string(),
            head_sha: String::new(),
            title: title.to_string(),
            body: body.unwrap_or_default().to_string(),
            is_draft: draft,
            mergeable: stack_pr::types::Mergeable::Unknown,
            review_decision: stack_pr::types::ReviewDecision::None,
            check_rollup: stack_pr::types::CheckRollup::None,
        };
        self.prs.lock().unwrap().insert(number, pr.clone());
        self.event(format!("create #{number} {head} -> {base}"));
        Ok(pr)
    }

    async fn update_pr_base(&self, pr_number: u64, new_base: &str) -> Result<PullRequest> {
        self.update_base_calls.lock().unwrap().push(UpdateBaseCall {
            pr_number,
            new_base: new_base.to_string(),
        });
        Self::injected(&self.error_on_update_base)?;

        self.edit_pr(pr_number, |pr| pr.base_ref = new_base.to_string());
        self.event(format!("base #{pr_number} -> {new_base}"));
        self.stored(pr_number)
    }

    async fn update_pr_body(&self, pr_number: u64, body: &str) -> Result<PullRequest> {
        self.update_body_calls.lock().unwrap().push(UpdateBodyCall {
            pr_number,
            body: body.to_string(),
        });
        Self::injected(&self.error_on_update_body)?;

        self.set_body(pr_number, body);
        self.event(format!("body #{pr_number}"));
        self.stored(pr_number)
    }

    async fn request_reviewers(&self, pr_number: u64, reviewers: &[String]) -> Result<()> {
        self.reviewer_calls
            .lock()
            .unwrap()
            .push((pr_number, reviewers.to_vec()));
        Ok(())
    }

    async fn create_pr_comment(&self, pr_number: u64, body: &str) -> Result<()> {
        self.create_comment_calls
            .lock()
            .unwrap()
            .push(CreateCommentCall {
                pr_number,
                body: body.to_string(),
            });
        self.event(format!("comment #{pr_number}"));
        Ok(())
    }

    async fn close_pr(&self, pr_number: u64) -> Result<()> {
        self.close_calls.lock().unwrap().push(pr_number);
        Self::injected(&self.error_on_close)?;

        self.edit_pr(pr_number, |pr| pr.state = PrState::Closed);
        self.event(format!("close #{pr_number}"));
        Ok(())
    }

    async fn merge_pr(&self, pr_number: u64, method: MergeMethod) -> Result<MergeResult> {
        self.merge_pr_calls
            .lock()
            .unwrap()
            .push(MergePrCall { pr_number, method });
        Self::injected(&self.error_on_merge_pr)?;

        let result = self
            .merge_responses
            .lock()
            .unwrap()
            .get(&pr_number)
            .cloned()
            .unwrap_or_else(|| MergeResult {
                merged: true,
                sha: Some(format!("merged_sha_{pr_number}")),
                message: None,
            });
        if result.merged {
            self.edit_pr(pr_number, |pr| pr.state = PrState::Merged);
            self.event(format!("merge #{pr_number}"));
        }
        Ok(result)
    }

    async fn delete_branch(&self, branch: &str) -> Result<()> {
        Self::injected(&self.error_on_delete_branch)?;
        self.deleted_branches.lock().unwrap().push(branch.to_string());
        self.event(format!("delete {branch}"));
        Ok(())
    }

    fn config(&self) -> &PlatformConfig {
        &self.config
    }
}

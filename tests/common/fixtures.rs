//! Test fixtures for building PRs, commits and options

#![allow(dead_code)]

use crate::common::{MockPlatformService, MockVcs};
use stack_pr::merge::{MergeOptions, ReadinessGates};
use stack_pr::reconcile::{ReconcileOptions, SyncOptions};
use stack_pr::stack::branch_name;
use stack_pr::types::{
    CheckRollup, CommitRecord, MergeMethod, Mergeable, Platform, PlatformConfig, PrState,
    PullRequest, ReviewDecision,
};
use stack_pr::vcs::PushMode;
use std::time::Duration;

/// Target branch used throughout the tests
pub const TARGET: &str = "main";

/// Create a GitHub platform config for testing
pub fn github_config() -> PlatformConfig {
    PlatformConfig {
        platform: Platform::GitHub,
        owner: "test".to_string(),
        repo: "repo".to_string(),
        host: None,
    }
}

/// Mock platform with a GitHub config
pub fn mock_platform() -> MockPlatformService {
    MockPlatformService::with_config(github_config())
}

/// Branch for a commit id on the test target
pub fn stack_branch(commit_id: &str) -> String {
    branch_name(TARGET, commit_id)
}

/// Open PR with the given head and base
pub fn make_pr(number: u64, head: &str, base: &str) -> PullRequest {
    PullRequest {
        number,
        state: PrState::Open,
        html_url: format!("https://github.com/test/repo/pull/{number}"),
        base_ref: base.to_string(),
        head_ref: head.to_string(),
        head_sha: String::new(),
        title: format!("PR {number}"),
        body: String::new(),
        is_draft: false,
        mergeable: Mergeable::Unknown,
        review_decision: ReviewDecision::None,
        check_rollup: CheckRollup::None,
    }
}

/// Open PR that passes every readiness gate
pub fn ready_pr(number: u64, head: &str, base: &str) -> PullRequest {
    PullRequest {
        mergeable: Mergeable::Yes,
        review_decision: ReviewDecision::Approved,
        check_rollup: CheckRollup::Passing,
        ..make_pr(number, head, base)
    }
}

/// Open PR blocked on review
pub fn unapproved_pr(number: u64, head: &str, base: &str) -> PullRequest {
    PullRequest {
        review_decision: ReviewDecision::ReviewRequired,
        ..ready_pr(number, head, base)
    }
}

/// Commit record with a fixed-width hash
pub fn make_commit(hash_seed: u64, subject: &str, commit_id: &str) -> CommitRecord {
    CommitRecord {
        hash: format!("{hash_seed:08x}{}", "b".repeat(32)),
        parent: None,
        commit_id: commit_id.to_string(),
        subject: subject.to_string(),
        body: String::new(),
    }
}

/// Reconcile options for `origin/main`
pub fn reconcile_options() -> ReconcileOptions {
    ReconcileOptions {
        remote: "origin".to_string(),
        target: TARGET.to_string(),
        count: None,
        rebase: false,
        push_mode: PushMode::Atomic,
        sync: SyncOptions::default(),
    }
}

/// Merge options with no settle delay
pub fn merge_options() -> MergeOptions {
    MergeOptions {
        reconcile: reconcile_options(),
        method: MergeMethod::Rebase,
        gates: ReadinessGates::default(),
        confirm: true,
        settle: Duration::ZERO,
        delete_branch: false,
    }
}

/// Mirror the mock's pushes onto the mock platform's PR heads
pub fn mirror_pushes(vcs: &MockVcs, platform: &MockPlatformService) {
    for update in vcs.pushed_refs() {
        platform.set_head_sha(&update.branch, &update.hash);
    }
}

/// Seed open PRs matching the current mock stack, chained bottom-up
///
/// Heads point at the current hashes; returns the PR numbers, bottom first.
pub fn seed_prs_for_stack(
    vcs: &MockVcs,
    platform: &MockPlatformService,
    build: fn(u64, &str, &str) -> PullRequest,
) -> Vec<u64> {
    let mut base = TARGET.to_string();
    let mut numbers = Vec::new();
    for (idx, commit) in vcs.commits().iter().enumerate() {
        let number = 100 + idx as u64;
        let branch = stack_branch(&commit.commit_id);
        let mut pr = build(number, &branch, &base);
        pr.head_sha = commit.hash.clone();
        pr.title = commit.subject.clone();
        platform.add_pr(pr);
        numbers.push(number);
        base = branch;
    }
    numbers
}

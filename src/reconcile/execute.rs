//! Resource synchronization - effectful operations
//!
//! Applies a `ReconciliationPlan` to the review service in a fixed order:
//! base changes, creates, descriptor refresh, orphan cleanup. A failing
//! call is recorded against its PR and the remaining work continues.

use crate::error::{Error, Result};
use crate::platform::PlatformService;
use crate::reconcile::descriptor::{
    StackRef, merge_body, render_descriptor, replace_placeholder,
};
use crate::reconcile::plan::{Action, ReconciliationPlan};
use crate::reconcile::progress::{Phase, ProgressCallback};
use crate::types::PullRequest;
use tracing::{debug, warn};

/// Options for creating PRs
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    /// Create new PRs as drafts
    pub draft: bool,
    /// Reviewers requested on new PRs
    pub reviewers: Vec<String>,
}

/// A remote call that failed during synchronization
#[derive(Debug)]
pub struct SyncFailure {
    /// What was being done (e.g. "create PR for stack/main/1a2b3c4d")
    pub operation: String,
    /// The error
    pub error: Error,
}

/// Outcome of synchronization
#[derive(Debug, Default)]
pub struct SyncResult {
    /// PRs created in this run
    pub created: Vec<PullRequest>,
    /// PR numbers whose base was changed
    pub retargeted: Vec<u64>,
    /// PR numbers whose body was rewritten
    pub updated: Vec<u64>,
    /// PR numbers closed as orphans
    pub closed: Vec<u64>,
    /// Failed operations
    pub failures: Vec<SyncFailure>,
}

impl SyncResult {
    /// Whether every remote call succeeded
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    async fn record(&mut self, operation: String, error: Error, progress: &dyn ProgressCallback) {
        warn!(%operation, error = %error, "remote operation failed");
        progress.on_error(&error).await;
        self.failures.push(SyncFailure { operation, error });
    }
}

/// Comment left on an orphaned PR before it is closed
pub fn orphan_comment(commit_id: Option<&str>) -> String {
    commit_id.map_or_else(
        || "Closing: this commit is no longer part of the stack.".to_string(),
        |id| format!("Closing: commit `{id}` is no longer part of the stack."),
    )
}

/// Apply the plan to the review service
///
/// Only the first `eligible` entries are touched (everything below a push
/// failure). Orphans are only closed when the whole stack was eligible.
pub async fn synchronize(
    platform: &dyn PlatformService,
    plan: &ReconciliationPlan,
    eligible: usize,
    options: &SyncOptions,
    progress: &dyn ProgressCallback,
) -> Result<SyncResult> {
    let mut result = SyncResult::default();
    let entries = &plan.entries[..eligible.min(plan.entries.len())];

    progress.on_phase(Phase::Synchronizing).await;

    // 1. Base changes, before any body update
    for entry in entries.iter().filter(|e| e.base_drift) {
        let Some(pr) = entry.pr.as_ref() else {
            continue;
        };
        progress
            .on_message(&format!(
                "Retargeting #{} from {} to {}",
                pr.number, pr.base_ref, entry.base
            ))
            .await;
        match platform.update_pr_base(pr.number, &entry.base).await {
            Ok(updated) => {
                result.retargeted.push(pr.number);
                progress.on_pr_updated(&entry.branch, &updated).await;
            }
            Err(e) => {
                result
                    .record(format!("retarget #{}", pr.number), e, progress)
                    .await;
            }
        }
    }

    // 2. Creates, bottom up; numbers are filled in as they are assigned
    let mut numbers: Vec<Option<u64>> = entries
        .iter()
        .map(|e| e.pr.as_ref().map(|pr| pr.number))
        .collect();
    let mut bodies: Vec<Option<String>> = vec![None; entries.len()];

    for (idx, entry) in entries.iter().enumerate() {
        if entry.action != Action::Create {
            continue;
        }

        let mut refs: Vec<StackRef> = Vec::new();
        let mut current = 0;
        for (pos, number) in numbers.iter().enumerate() {
            if pos == idx {
                current = refs.len();
                refs.push(StackRef::New);
            } else if let Some(n) = number {
                refs.push(StackRef::Number(*n));
            }
        }
        let descriptor = render_descriptor(&refs, current);
        let body = merge_body(&entry.commit.body, descriptor.as_deref());

        progress
            .on_message(&format!("Creating PR for {}", entry.branch))
            .await;
        let created = match platform
            .create_pr_with_options(
                &entry.branch,
                &entry.base,
                &entry.commit.subject,
                Some(&body),
                options.draft,
            )
            .await
        {
            Ok(pr) => pr,
            Err(e) => {
                result
                    .record(format!("create PR for {}", entry.branch), e, progress)
                    .await;
                continue;
            }
        };

        numbers[idx] = Some(created.number);
        let mut body = body;
        if descriptor.is_some() {
            let patched = replace_placeholder(&body, created.number);
            match platform.update_pr_body(created.number, &patched).await {
                Ok(_) => body = patched,
                Err(e) => {
                    result
                        .record(format!("update body of #{}", created.number), e, progress)
                        .await;
                }
            }
        }
        bodies[idx] = Some(body);

        if !options.reviewers.is_empty()
            && let Err(e) = platform
                .request_reviewers(created.number, &options.reviewers)
                .await
        {
            result
                .record(
                    format!("request reviewers on #{}", created.number),
                    e,
                    progress,
                )
                .await;
        }

        progress.on_pr_created(&entry.branch, &created).await;
        result.created.push(created);
    }

    // 3. Descriptor refresh over the final numbering
    let refs: Vec<StackRef> = numbers.iter().flatten().map(|n| StackRef::Number(*n)).collect();
    let mut position = 0;
    for (idx, entry) in entries.iter().enumerate() {
        let Some(number) = numbers[idx] else {
            continue;
        };
        let current = position;
        position += 1;

        if entry.action == Action::Unchanged {
            continue;
        }

        let existing = match bodies[idx].take() {
            Some(body) => body,
            None => match platform.get_pr_details(number).await {
                Ok(pr) => pr.body,
                Err(e) => {
                    result
                        .record(format!("fetch #{number}"), e, progress)
                        .await;
                    continue;
                }
            },
        };

        let descriptor = render_descriptor(&refs, current);
        let merged = merge_body(&existing, descriptor.as_deref());
        if merged == existing {
            debug!(number, "body already current");
            continue;
        }

        match platform.update_pr_body(number, &merged).await {
            Ok(updated) => {
                result.updated.push(number);
                if entry.action != Action::Create {
                    progress.on_pr_updated(&entry.branch, &updated).await;
                }
            }
            Err(e) => {
                result
                    .record(format!("update body of #{number}"), e, progress)
                    .await;
            }
        }
    }

    // 4. Orphans
    if eligible < plan.entries.len() {
        debug!("partial run, leaving orphans alone");
    } else if plan.orphans_suppressed {
        if !plan.orphans.is_empty() {
            progress
                .on_message("Not closing stale PRs: another PR is stacked on top of this stack")
                .await;
        }
    } else if !plan.orphans.is_empty() {
        progress.on_phase(Phase::Cleanup).await;
        for orphan in &plan.orphans {
            let commit_id =
                crate::stack::commit_id_from_branch(&plan.target, &orphan.head_ref);
            progress
                .on_pr_closing(orphan.number, "commit no longer in stack")
                .await;
            if let Err(e) = platform
                .create_pr_comment(orphan.number, &orphan_comment(commit_id))
                .await
            {
                result
                    .record(format!("comment on #{}", orphan.number), e, progress)
                    .await;
                continue;
            }
            match platform.close_pr(orphan.number).await {
                Ok(()) => result.closed.push(orphan.number),
                Err(e) => {
                    result
                        .record(format!("close #{}", orphan.number), e, progress)
                        .await;
                }
            }
        }
    }

    Ok(result)
}

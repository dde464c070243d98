//! Merge engine for stacked PRs
//!
//! Three-phase pattern matching reconcile/:
//! 1. Gather - fetch PR details and readiness (effectful, bounded)
//! 2. Plan - create `MergePlan` (pure, testable)
//! 3. Execute - retarget, merge, close subsumed PRs, restack (effectful)

mod execute;
mod plan;
mod readiness;
mod restack;

pub use execute::{MergeExecutionResult, execute_merge, subsumed_comment};
pub use plan::{
    MergeConfidence, MergePlan, MergePlanOptions, MergeStep, PrInfo, create_merge_plan,
};
pub use readiness::{Readiness, ReadinessGates, ReadinessState, evaluate_readiness};
pub use restack::{RestackOutcome, rebase_on_target, restack};

use crate::error::{Error, Result};
use crate::platform::PlatformService;
use crate::reconcile::{
    Phase, ProgressCallback, ReconcileOptions, ReconcileOutcome, list_remote_resources,
    reconcile, recover_stale_rebase,
};
use crate::stack::{branch_name, publishable, read_stack};
use crate::types::{Decision, MergeMethod};
use crate::vcs::Vcs;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Options for a merge run
#[derive(Debug, Clone)]
pub struct MergeOptions {
    /// Remote, target and count; reused for the follow-up reconcile
    pub reconcile: ReconcileOptions,
    /// Merge strategy
    pub method: MergeMethod,
    /// Readiness gates
    pub gates: ReadinessGates,
    /// Ask before merging when readiness is uncertain
    pub confirm: bool,
    /// Wait after retargeting and after merging
    pub settle: Duration,
    /// Delete the merged head branch once the PRs above are retargeted
    pub delete_branch: bool,
}

/// How a merge run ended
#[derive(Debug)]
pub enum MergeOutcome {
    /// The bottom of the stack is not ready
    NothingMergeable {
        /// The first PR that is not ready, with reasons
        blocked: Option<MergeStep>,
    },
    /// The caller must answer before anything is merged
    NeedsDecision(Decision),
    /// The prefix was merged and the rest of the stack restacked
    Merged {
        /// What was merged and closed
        result: MergeExecutionResult,
        /// Local restack
        restacked: RestackOutcome,
        /// Follow-up reconcile of the remaining stack
        reconciled: Box<ReconcileOutcome>,
    },
}

/// Pair each commit of the stack with its PR and readiness, bottom first
///
/// Stops at the first commit without an open PR: nothing above it can merge.
pub async fn gather_merge_info(
    vcs: &dyn Vcs,
    platform: &dyn PlatformService,
    options: &MergeOptions,
) -> Result<Vec<PrInfo>> {
    let target = &options.reconcile.target;
    let commits = read_stack(vcs, &options.reconcile.upstream())?;
    let resources = list_remote_resources(platform, target).await?;

    let mut by_id: HashMap<String, u64> = resources
        .into_iter()
        .filter_map(|r| r.commit_id.map(|id| (id, r.pr.number)))
        .collect();

    let mut infos = Vec::new();
    for commit in publishable(&commits) {
        let Some(number) = by_id.remove(&commit.commit_id) else {
            debug!(commit = commit.short_hash(), "no open PR, stopping");
            break;
        };
        let pr = platform.get_pr_details(number).await?;
        let readiness = evaluate_readiness(&pr, options.gates);
        infos.push(PrInfo {
            branch: branch_name(target, &commit.commit_id),
            commit: commit.clone(),
            pr,
            readiness,
        });
    }
    Ok(infos)
}

/// Merge the ready bottom of the stack, then restack and reconcile the rest
///
/// Returns `NeedsDecision` instead of merging when readiness is uncertain
/// and confirmation is on; call again with `confirmed = true` to proceed.
pub async fn merge_stack(
    vcs: &dyn Vcs,
    platform: &dyn PlatformService,
    options: &MergeOptions,
    confirmed: bool,
    progress: &dyn ProgressCallback,
) -> Result<MergeOutcome> {
    recover_stale_rebase(vcs)?;
    let remote = &options.reconcile.remote;
    let target = &options.reconcile.target;

    progress.on_phase(Phase::Analyzing).await;
    vcs.fetch(remote)?;
    let infos = gather_merge_info(vcs, platform, options).await?;

    progress.on_phase(Phase::Planning).await;
    let plan = create_merge_plan(
        &infos,
        &MergePlanOptions {
            target: target.clone(),
            count: options.reconcile.count,
            method: options.method,
            confirm: options.confirm && !confirmed,
        },
    );

    if plan.is_empty() {
        return Ok(MergeOutcome::NothingMergeable {
            blocked: plan.blocker().cloned(),
        });
    }
    if let Some(decision) = plan.decision.clone() {
        return Ok(MergeOutcome::NeedsDecision(decision));
    }

    progress.on_phase(Phase::Merging).await;
    let result = execute_merge(&plan, platform, options.settle, progress).await?;

    if !result.has_merges() {
        let step = result
            .failed_step
            .as_ref()
            .map_or_else(|| "merge".to_string(), ToString::to_string);
        let reason = result.error_message.as_deref().unwrap_or("unknown error");
        return Err(Error::RemoteApi(format!("{step} failed: {reason}")));
    }

    let merged_top = plan
        .rebase_from
        .as_deref()
        .ok_or_else(|| Error::Internal("merge plan has no top commit".to_string()))?;

    progress.on_phase(Phase::Restacking).await;
    let restacked = restack(vcs, remote, target, merged_top)?;
    info!(
        merged = ?result.merged,
        closed = result.closed.len(),
        replayed = restacked.replayed,
        "merge cascade finished"
    );

    let follow_up = ReconcileOptions {
        rebase: false,
        count: None,
        ..options.reconcile.clone()
    };
    let reconciled = reconcile(vcs, platform, &follow_up, progress).await?;

    // Children were retargeted by the follow-up, so the old base can go
    if options.delete_branch
        && let Some(branch) = result.merged_branch.as_deref()
    {
        if let Err(e) = platform.delete_branch(branch).await {
            warn!(error = %e, branch, "failed to delete merged branch");
        } else {
            debug!(branch, "deleted merged branch");
        }
    }

    Ok(MergeOutcome::Merged {
        result,
        restacked,
        reconciled: Box::new(reconciled),
    })
}

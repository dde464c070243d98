//! Merge execution - effectful operations
//!
//! This module contains the effectful code that actually performs merges.
//! It takes a `MergePlan` (created by the pure planning functions) and
//! executes the merge operations via the platform API.

use crate::error::Result;
use crate::merge::plan::{MergePlan, MergeStep};
use crate::platform::PlatformService;
use crate::reconcile::ProgressCallback;
use std::time::Duration;
use tracing::{debug, warn};

/// Comment left on a PR whose commit landed through another PR
pub fn subsumed_comment(into: u64) -> String {
    format!("Merged as part of #{into}")
}

/// Result of merge execution
#[derive(Debug, Clone, Default)]
pub struct MergeExecutionResult {
    /// PR that was merged, if the merge went through
    pub merged: Option<u64>,
    /// Head branch of the merged PR, still present on the remote
    pub merged_branch: Option<String>,
    /// PRs closed as subsumed
    pub closed: Vec<u64>,
    /// Step where execution stopped (if any)
    pub failed_step: Option<MergeStep>,
    /// Error message from the failed step (if any)
    pub error_message: Option<String>,
}

impl MergeExecutionResult {
    /// Check if every step succeeded
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.failed_step.is_none()
    }

    /// Check if the merge itself went through (trunk changed)
    ///
    /// This decides whether the remaining stack needs a restack.
    #[must_use]
    pub const fn has_merges(&self) -> bool {
        self.merged.is_some()
    }
}

/// Execute the merge plan (EFFECTFUL)
///
/// Steps run in plan order. A failed retarget or merge stops execution;
/// a failed subsumed close is recorded and the remaining closes continue.
/// `settle` is awaited after the retarget and again after the merge so the
/// platform has observed each change before the next one.
///
/// The merged head branch is never deleted here: PRs above still use it as
/// their base until they are retargeted.
pub async fn execute_merge(
    plan: &MergePlan,
    platform: &dyn PlatformService,
    settle: Duration,
    progress: &dyn ProgressCallback,
) -> Result<MergeExecutionResult> {
    let mut result = MergeExecutionResult::default();

    for step in &plan.steps {
        match step {
            MergeStep::Retarget {
                pr_number, base, ..
            } => {
                progress
                    .on_message(&format!("Retargeting PR #{pr_number} onto {base}"))
                    .await;
                if let Err(e) = platform.update_pr_base(*pr_number, base).await {
                    progress.on_error(&e).await;
                    result.failed_step = Some(step.clone());
                    result.error_message = Some(e.to_string());
                    break;
                }
                settle_for(settle).await;
            }
            MergeStep::Merge {
                branch,
                pr_number,
                pr_title,
                method,
                ..
            } => {
                progress
                    .on_message(&format!("Merging PR #{pr_number}: {pr_title}"))
                    .await;

                match platform.merge_pr(*pr_number, *method).await {
                    Ok(merge_result) if merge_result.merged => {
                        let sha_display = merge_result.sha.as_deref().unwrap_or("(no sha)");
                        progress
                            .on_message(&format!("Merged PR #{pr_number}: {sha_display}"))
                            .await;
                        result.merged = Some(*pr_number);
                        result.merged_branch = Some(branch.clone());
                        settle_for(settle).await;
                    }
                    Ok(merge_result) => {
                        // Merge API returned but didn't merge
                        result.failed_step = Some(step.clone());
                        result.error_message = merge_result.message;
                        break;
                    }
                    Err(e) => {
                        progress.on_error(&e).await;
                        result.failed_step = Some(step.clone());
                        result.error_message = Some(e.to_string());
                        break;
                    }
                }
            }
            MergeStep::CloseSubsumed {
                pr_number, into, ..
            } => {
                let comment = subsumed_comment(*into);
                progress.on_pr_closing(*pr_number, &comment).await;

                let closed = async {
                    platform.create_pr_comment(*pr_number, &comment).await?;
                    platform.close_pr(*pr_number).await
                }
                .await;

                match closed {
                    Ok(()) => result.closed.push(*pr_number),
                    Err(e) => {
                        warn!(pr = pr_number, error = %e, "failed to close subsumed PR");
                        progress.on_error(&e).await;
                        if result.failed_step.is_none() {
                            result.failed_step = Some(step.clone());
                            result.error_message = Some(e.to_string());
                        }
                    }
                }
            }
            MergeStep::Skip { .. } => {
                // Informational; the plan ends here
                break;
            }
        }
    }

    Ok(result)
}

async fn settle_for(delay: Duration) {
    if delay.is_zero() {
        return;
    }
    debug!(?delay, "waiting for the platform to settle");
    tokio::time::sleep(delay).await;
}

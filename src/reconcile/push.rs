//! Push execution

use crate::error::Result;
use crate::reconcile::plan::ReconciliationPlan;
use crate::reconcile::progress::{ProgressCallback, PushStatus};
use crate::vcs::{PushMode, RefUpdate, StashGuard, Vcs};
use tracing::{debug, info};

/// Which branches made it to the remote
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PushReport {
    /// Branches updated on the remote
    pub pushed: Vec<String>,
    /// Branches rejected, with the reason
    pub failed: Vec<(String, String)>,
    /// Index (into plan entries) of the lowest entry whose push failed
    pub first_failure: Option<usize>,
}

impl PushReport {
    /// Whether every branch was pushed
    pub const fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// Number of plan entries safe to synchronize: everything below the first failure
    pub fn safe_prefix(&self, total: usize) -> usize {
        self.first_failure.unwrap_or(total)
    }

    /// Combined failure message
    pub fn failure_message(&self) -> String {
        self.failed
            .iter()
            .map(|(branch, reason)| format!("{branch}: {reason}"))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Force-push every entry that needs it
///
/// Uncommitted changes are stashed for the duration and restored on every
/// exit path.
pub async fn push_stack(
    vcs: &dyn Vcs,
    plan: &ReconciliationPlan,
    remote: &str,
    mode: PushMode,
    progress: &dyn ProgressCallback,
) -> Result<PushReport> {
    let to_push = plan.commits_to_push();
    if to_push.is_empty() {
        debug!("nothing to push");
        return Ok(PushReport::default());
    }

    let refs: Vec<RefUpdate> = to_push
        .iter()
        .map(|entry| RefUpdate {
            hash: entry.commit.hash.clone(),
            branch: entry.branch.clone(),
        })
        .collect();

    for update in &refs {
        progress
            .on_branch_push(&update.branch, PushStatus::Started)
            .await;
    }

    let outcome = {
        let stash = StashGuard::acquire(vcs)?;
        let outcome = vcs.push(remote, &refs, mode)?;
        stash.release()?;
        outcome
    };

    for branch in &outcome.pushed {
        progress.on_branch_push(branch, PushStatus::Success).await;
    }
    for (branch, reason) in &outcome.failed {
        progress
            .on_branch_push(branch, PushStatus::Failed(reason.clone()))
            .await;
    }

    let first_failure = plan
        .entries
        .iter()
        .position(|e| outcome.failed.iter().any(|(branch, _)| *branch == e.branch));

    info!(
        pushed = outcome.pushed.len(),
        failed = outcome.failed.len(),
        ?mode,
        "pushed stack"
    );

    Ok(PushReport {
        pushed: outcome.pushed,
        failed: outcome.failed,
        first_failure,
    })
}

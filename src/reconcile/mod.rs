//! Stack reconciliation engine
//!
//! Three-phase pattern:
//! 1. Gather - read the local stack, assign ids, list remote PRs (effectful)
//! 2. Plan - create `ReconciliationPlan` (pure, testable)
//! 3. Execute - push branches, then synchronize PRs (effectful)

pub mod descriptor;
mod execute;
mod plan;
mod progress;
mod push;
mod remote;

pub use execute::{SyncFailure, SyncOptions, SyncResult, orphan_comment, synchronize};
pub use plan::{
    Action, PlanEntry, ReconciliationPlan, build_plan, refine_unchanged, stack_refs,
};
pub use progress::{NoopProgress, Phase, ProgressCallback, PushStatus};
pub use push::{PushReport, push_stack};
pub use remote::{RemoteResource, list_remote_resources};

use crate::error::{Error, Result};
use crate::platform::PlatformService;
use crate::stack::{ensure_commit_ids, read_stack};
use crate::vcs::{BranchGuard, PushMode, Vcs};
use tracing::{info, warn};

/// Options for a reconcile run
#[derive(Debug, Clone)]
pub struct ReconcileOptions {
    /// Remote to push to
    pub remote: String,
    /// Branch the stack lands on
    pub target: String,
    /// Only reconcile the bottom N commits
    pub count: Option<usize>,
    /// Fetch and rebase onto the remote target first
    pub rebase: bool,
    /// Atomic or sequential push
    pub push_mode: PushMode,
    /// PR creation options
    pub sync: SyncOptions,
}

impl ReconcileOptions {
    /// `remote/target`, the base of the local stack
    pub fn upstream(&self) -> String {
        format!("{}/{}", self.remote, self.target)
    }
}

/// Everything a reconcile run did
#[derive(Debug)]
pub struct ReconcileOutcome {
    /// The plan that was executed
    pub plan: ReconciliationPlan,
    /// Push results
    pub push: PushReport,
    /// Synchronization results
    pub sync: SyncResult,
    /// Commit ids fell back to hash-derived values
    pub degraded: bool,
}

/// Abort a rebase left behind by an earlier, interrupted run
///
/// Returns whether one was found. A paused cherry-pick is never aborted: the
/// branch was already reset onto the target, so the replayed commits only
/// exist in the sequencer state. It fails with `Error::CherryPickInProgress`.
pub fn recover_stale_rebase(vcs: &dyn Vcs) -> Result<bool> {
    if vcs.cherry_pick_in_progress()? {
        return Err(Error::CherryPickInProgress);
    }
    if !vcs.rebase_in_progress()? {
        return Ok(false);
    }
    warn!("found an interrupted rebase, aborting it");
    vcs.abort_rebase()?;
    Ok(true)
}

/// Read the stack and make sure every commit carries an id
///
/// Returns the records (bottom first) and whether ids are degraded.
pub fn prepare_stack(
    vcs: &dyn Vcs,
    upstream: &str,
) -> Result<(Vec<crate::types::CommitRecord>, bool)> {
    let commits = read_stack(vcs, upstream)?;
    let resolution = ensure_commit_ids(vcs, upstream, commits)?;
    Ok((resolution.commits, resolution.degraded))
}

/// Analyze the stack and produce a plan without changing anything
pub async fn plan_reconcile(
    vcs: &dyn Vcs,
    platform: &dyn PlatformService,
    options: &ReconcileOptions,
) -> Result<(ReconciliationPlan, bool)> {
    let upstream = options.upstream();
    let (commits, degraded) = prepare_stack(vcs, &upstream)?;
    let resources = list_remote_resources(platform, &options.target).await?;

    let mut plan = build_plan(&options.target, &commits, &resources, options.count);
    refine_unchanged(&mut plan);
    Ok((plan, degraded))
}

/// Make the remote PRs match the local stack
///
/// A push failure still synchronizes everything below the failed branch,
/// then returns `Error::Push`.
pub async fn reconcile(
    vcs: &dyn Vcs,
    platform: &dyn PlatformService,
    options: &ReconcileOptions,
    progress: &dyn ProgressCallback,
) -> Result<ReconcileOutcome> {
    recover_stale_rebase(vcs)?;
    let branch = BranchGuard::acquire(vcs)?;

    progress.on_phase(Phase::Analyzing).await;
    if options.rebase {
        progress
            .on_message(&format!("Rebasing onto {}", options.upstream()))
            .await;
        vcs.fetch(&options.remote)?;
        vcs.rebase_onto(&options.upstream())?;
    }

    progress.on_phase(Phase::Planning).await;
    let (plan, degraded) = plan_reconcile(vcs, platform, options).await?;
    if degraded {
        progress
            .on_message("Could not write commit ids into history; using hash-based ids for this run")
            .await;
    }

    if plan.entries.is_empty() {
        progress.on_message("No commits to reconcile").await;
        branch.release()?;
        progress.on_phase(Phase::Complete).await;
        return Ok(ReconcileOutcome {
            plan,
            push: PushReport::default(),
            sync: SyncResult::default(),
            degraded,
        });
    }

    progress.on_phase(Phase::Pushing).await;
    let push = push_stack(vcs, &plan, &options.remote, options.push_mode, progress).await?;
    let eligible = push.safe_prefix(plan.entries.len());

    let sync = synchronize(platform, &plan, eligible, &options.sync, progress).await?;
    branch.release()?;

    info!(
        created = sync.created.len(),
        updated = sync.updated.len(),
        retargeted = sync.retargeted.len(),
        closed = sync.closed.len(),
        failures = sync.failures.len(),
        "reconciled stack"
    );

    if !push.is_success() {
        return Err(Error::Push {
            failed: push.failed.len(),
            message: push.failure_message(),
        });
    }

    progress.on_phase(Phase::Complete).await;
    Ok(ReconcileOutcome {
        plan,
        push,
        sync,
        degraded,
    })
}

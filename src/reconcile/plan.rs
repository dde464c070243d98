//! Reconciliation planning - pure functions
//!
//! Pairs local commits with remote PRs by commit id and decides what each
//! entry needs. No I/O happens here; everything is passed in.

use crate::reconcile::descriptor::{StackRef, merge_body, render_descriptor};
use crate::reconcile::remote::RemoteResource;
use crate::stack::topology::{Placement, has_base_drift, plan_topology};
use crate::types::{CommitRecord, PullRequest};
use std::collections::{HashMap, HashSet};

/// What an entry of the stack needs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// No PR yet: push and create
    Create,
    /// PR exists but points at another commit: push and sync
    Update,
    /// PR head already matches; only base or body may need syncing
    PushOnly,
    /// Nothing to do
    Unchanged,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Create => write!(f, "create"),
            Self::Update => write!(f, "update"),
            Self::PushOnly => write!(f, "sync"),
            Self::Unchanged => write!(f, "unchanged"),
        }
    }
}

/// One commit of the stack with its remote counterpart
#[derive(Debug, Clone)]
pub struct PlanEntry {
    /// Local commit
    pub commit: CommitRecord,
    /// Matched PR, if any
    pub pr: Option<PullRequest>,
    /// What to do
    pub action: Action,
    /// Head branch
    pub branch: String,
    /// Planned base branch
    pub base: String,
    /// Matched PR targets a different base than planned
    pub base_drift: bool,
}

impl PlanEntry {
    /// Whether the branch must be pushed
    pub const fn needs_push(&self) -> bool {
        matches!(self.action, Action::Create | Action::Update)
    }
}

/// The reconciliation plan - the functional core output
#[derive(Debug, Clone, Default)]
pub struct ReconciliationPlan {
    /// Target branch the stack lands on
    pub target: String,
    /// Stack entries, bottom first
    pub entries: Vec<PlanEntry>,
    /// Owned PRs whose commit is gone from the stack
    pub orphans: Vec<PullRequest>,
    /// Orphan closing is skipped because something is stacked on top
    pub orphans_suppressed: bool,
    /// Owned PRs listed when the stack is empty (nothing is changed)
    pub known: Vec<PullRequest>,
    /// Commits left out because they sit at or above a WIP commit
    pub wip_excluded: usize,
}

impl ReconciliationPlan {
    /// Entries to push: creates and updates, stopping at the first WIP
    pub fn commits_to_push(&self) -> Vec<&PlanEntry> {
        self.entries
            .iter()
            .take_while(|e| !e.commit.is_wip())
            .filter(|e| e.needs_push())
            .collect()
    }

    /// Whether any entry needs a PR created
    pub fn has_creates(&self) -> bool {
        self.entries.iter().any(|e| e.action == Action::Create)
    }

    /// Head branch of the topmost entry
    pub fn top_branch(&self) -> Option<&str> {
        self.entries.last().map(|e| e.branch.as_str())
    }

    /// Whether the plan changes nothing remotely
    pub fn is_noop(&self) -> bool {
        self.entries.iter().all(|e| e.action == Action::Unchanged)
            && (self.orphans.is_empty() || self.orphans_suppressed)
    }

    /// Count entries with the given action
    pub fn count(&self, action: Action) -> usize {
        self.entries.iter().filter(|e| e.action == action).count()
    }
}

/// Build the plan (PURE - no I/O, easily testable)
///
/// `commits` is the whole local stack, bottom first. Entries stop at the
/// first WIP commit and at `limit` when given; commits beyond either are
/// still local, so their PRs are neither matched nor orphaned.
pub fn build_plan(
    target: &str,
    commits: &[CommitRecord],
    resources: &[RemoteResource],
    limit: Option<usize>,
) -> ReconciliationPlan {
    let publishable = commits
        .iter()
        .position(CommitRecord::is_wip)
        .unwrap_or(commits.len());
    let take = limit.map_or(publishable, |n| n.min(publishable));
    let stack = &commits[..take];

    let by_id: HashMap<&str, &PullRequest> = resources
        .iter()
        .filter_map(|r| r.commit_id.as_deref().map(|id| (id, &r.pr)))
        .collect();

    if stack.is_empty() {
        return ReconciliationPlan {
            target: target.to_string(),
            known: resources
                .iter()
                .filter(|r| r.is_owned())
                .map(|r| r.pr.clone())
                .collect(),
            wip_excluded: commits.len() - publishable,
            ..ReconciliationPlan::default()
        };
    }

    let ids: Vec<&str> = stack.iter().map(|c| c.commit_id.as_str()).collect();
    let placements = plan_topology(target, &ids);

    let entries: Vec<PlanEntry> = stack
        .iter()
        .zip(placements)
        .map(|(commit, Placement { branch, base })| {
            let pr = by_id.get(commit.commit_id.as_str()).map(|pr| (*pr).clone());
            let action = match &pr {
                None => Action::Create,
                Some(pr) if pr.head_sha == commit.hash => Action::PushOnly,
                Some(_) => Action::Update,
            };
            let base_drift = pr.as_ref().is_some_and(|pr| has_base_drift(pr, &base));
            PlanEntry {
                commit: commit.clone(),
                pr,
                action,
                branch,
                base,
                base_drift,
            }
        })
        .collect();

    // Every local id counts, including commits beyond the limit or above a WIP
    let local_ids: HashSet<&str> = commits
        .iter()
        .filter(|c| c.has_commit_id())
        .map(|c| c.commit_id.as_str())
        .collect();
    let matched: HashSet<u64> = entries
        .iter()
        .filter_map(|e| e.pr.as_ref().map(|pr| pr.number))
        .collect();

    let orphans: Vec<PullRequest> = resources
        .iter()
        .filter(|r| r.commit_id.as_deref().is_some_and(|id| !local_ids.contains(id)))
        .map(|r| r.pr.clone())
        .collect();

    // Anything unmatched stacked on our top branch is downstream work
    let top = entries.last().map(|e| e.branch.as_str()).unwrap_or_default();
    let orphans_suppressed = resources
        .iter()
        .any(|r| !matched.contains(&r.pr.number) && r.pr.base_ref == top);

    ReconciliationPlan {
        target: target.to_string(),
        entries,
        orphans,
        orphans_suppressed,
        known: Vec::new(),
        wip_excluded: commits.len() - publishable,
    }
}

/// PR numbers of the stack, bottom first, `#NEW` where no PR exists yet
pub fn stack_refs(entries: &[PlanEntry]) -> Vec<StackRef> {
    entries
        .iter()
        .map(|e| e.pr.as_ref().map_or(StackRef::New, |pr| StackRef::Number(pr.number)))
        .collect()
}

/// Demote `PushOnly` entries whose base and body are already current
///
/// Only possible when no PR is about to be created: a create changes every
/// descriptor in the stack.
pub fn refine_unchanged(plan: &mut ReconciliationPlan) {
    if plan.has_creates() {
        return;
    }

    let refs = stack_refs(&plan.entries);
    for (idx, entry) in plan.entries.iter_mut().enumerate() {
        if entry.action != Action::PushOnly || entry.base_drift {
            continue;
        }
        let Some(pr) = entry.pr.as_ref() else {
            continue;
        };
        let descriptor = render_descriptor(&refs, idx);
        if merge_body(&pr.body, descriptor.as_deref()) == pr.body {
            entry.action = Action::Unchanged;
        }
    }
}

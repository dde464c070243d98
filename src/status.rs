//! Read-only stack status
//!
//! Pairs the local stack with its PRs without touching history or the
//! remote. Readiness is only fetched when details are requested, since it
//! costs a few API calls per PR.

use crate::error::Result;
use crate::merge::{Readiness, ReadinessGates, evaluate_readiness};
use crate::platform::PlatformService;
use crate::reconcile::list_remote_resources;
use crate::stack::{StackGraph, branch_name, publishable, read_stack};
use crate::types::{CommitRecord, PullRequest};
use crate::vcs::Vcs;
use std::collections::{HashMap, HashSet};

/// One commit of the stack as it stands remotely
#[derive(Debug, Clone)]
pub struct StatusEntry {
    /// Local commit
    pub commit: CommitRecord,
    /// Head branch, when the commit has an id yet
    pub branch: Option<String>,
    /// Open PR for the commit
    pub pr: Option<PullRequest>,
    /// Merge readiness (detail mode only)
    pub readiness: Option<Readiness>,
}

/// Status of the whole stack
#[derive(Debug, Clone, Default)]
pub struct StatusReport {
    /// Branch the stack lands on
    pub target: String,
    /// Publishable commits, bottom first
    pub entries: Vec<StatusEntry>,
    /// Commits at or above the first WIP commit
    pub wip: Vec<CommitRecord>,
    /// Open PRs stacked on top of the stack's top branch
    pub downstream: Vec<PullRequest>,
    /// Owned PRs whose commit is no longer local
    pub orphans: Vec<PullRequest>,
}

impl StatusReport {
    /// Entries that still need a PR
    pub fn unsubmitted(&self) -> usize {
        self.entries.iter().filter(|e| e.pr.is_none()).count()
    }
}

/// Build the status report
pub async fn stack_status(
    vcs: &dyn Vcs,
    platform: &dyn PlatformService,
    upstream: &str,
    target: &str,
    gates: Option<ReadinessGates>,
) -> Result<StatusReport> {
    let commits = read_stack(vcs, upstream)?;
    let resources = list_remote_resources(platform, target).await?;

    let by_id: HashMap<&str, &PullRequest> = resources
        .iter()
        .filter_map(|r| r.commit_id.as_deref().map(|id| (id, &r.pr)))
        .collect();

    let stack = publishable(&commits);
    let mut entries = Vec::with_capacity(stack.len());
    for commit in stack {
        let branch = commit
            .has_commit_id()
            .then(|| branch_name(target, &commit.commit_id));
        let listed = by_id.get(commit.commit_id.as_str()).copied();

        let (pr, readiness) = match (listed, gates) {
            (Some(pr), Some(gates)) => {
                let details = platform.get_pr_details(pr.number).await?;
                let readiness = evaluate_readiness(&details, gates);
                (Some(details), Some(readiness))
            }
            (pr, _) => (pr.cloned(), None),
        };

        entries.push(StatusEntry {
            commit: commit.clone(),
            branch,
            pr,
            readiness,
        });
    }

    let local_ids: HashSet<&str> = commits
        .iter()
        .filter(|c| c.has_commit_id())
        .map(|c| c.commit_id.as_str())
        .collect();
    let is_local = |id: Option<&str>| id.is_some_and(|id| local_ids.contains(id));

    // PRs stacked on the top branch that are not part of this stack
    let graph = StackGraph::from_prs(resources.iter().map(|r| &r.pr));
    let above: HashSet<String> = entries
        .iter()
        .rev()
        .find_map(|e| e.branch.as_deref())
        .map(|top| graph.stacked_above(top).into_iter().collect())
        .unwrap_or_default();
    let downstream: Vec<PullRequest> = resources
        .iter()
        .filter(|r| above.contains(&r.pr.head_ref) && !is_local(r.commit_id.as_deref()))
        .map(|r| r.pr.clone())
        .collect();

    let orphans = resources
        .iter()
        .filter(|r| r.is_owned() && !is_local(r.commit_id.as_deref()))
        .filter(|r| !above.contains(&r.pr.head_ref))
        .map(|r| r.pr.clone())
        .collect();

    Ok(StatusReport {
        target: target.to_string(),
        entries,
        wip: commits[stack.len()..].to_vec(),
        downstream,
        orphans,
    })
}

//! Branch naming and the base-branch chain

use crate::types::PullRequest;
use std::collections::{HashMap, HashSet};

/// Namespace for branches owned by this tool
pub const BRANCH_PREFIX: &str = "stack";

/// Remote branch for a commit: `stack/{target}/{commit_id}`
pub fn branch_name(target: &str, commit_id: &str) -> String {
    format!("{BRANCH_PREFIX}/{target}/{commit_id}")
}

/// Commit id encoded in a branch name, if the branch belongs to this stack
pub fn commit_id_from_branch<'a>(target: &str, head_ref: &'a str) -> Option<&'a str> {
    let id = head_ref
        .strip_prefix(BRANCH_PREFIX)?
        .strip_prefix('/')?
        .strip_prefix(target)?
        .strip_prefix('/')?;
    (!id.is_empty() && !id.contains('/')).then_some(id)
}

/// Where one stack entry lives on the remote
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    /// Head branch
    pub branch: String,
    /// Branch the PR should target
    pub base: String,
}

/// Branch and base for each commit id, bottom of the stack first
///
/// The bottom entry targets `target`; every other entry targets the branch
/// of the entry below it.
pub fn plan_topology(target: &str, commit_ids: &[&str]) -> Vec<Placement> {
    let mut placements: Vec<Placement> = Vec::with_capacity(commit_ids.len());
    for id in commit_ids {
        let base = placements
            .last()
            .map_or_else(|| target.to_string(), |below| below.branch.clone());
        placements.push(Placement {
            branch: branch_name(target, id),
            base,
        });
    }
    placements
}

/// Whether an existing PR targets a different base than planned
pub fn has_base_drift(pr: &PullRequest, planned_base: &str) -> bool {
    pr.base_ref != planned_base
}

/// `head → base` graph of open PRs
#[derive(Debug, Clone, Default)]
pub struct StackGraph {
    children: HashMap<String, Vec<String>>,
}

impl StackGraph {
    /// Build from open PRs
    pub fn from_prs<'a>(prs: impl IntoIterator<Item = &'a PullRequest>) -> Self {
        let mut graph = Self::default();
        for pr in prs {
            graph.add_edge(&pr.head_ref, &pr.base_ref);
        }
        graph
    }

    /// Record that `head` targets `base`
    pub fn add_edge(&mut self, head: &str, base: &str) {
        self.children
            .entry(base.to_string())
            .or_default()
            .push(head.to_string());
    }

    /// Branches directly targeting `base`
    pub fn children_of(&self, base: &str) -> &[String] {
        self.children
            .get(base)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Every branch stacked (transitively) on top of `branch`
    ///
    /// Iterative DFS; the visited set keeps cyclic base chains from looping.
    pub fn stacked_above(&self, branch: &str) -> Vec<String> {
        let mut visited: HashSet<&str> = HashSet::new();
        visited.insert(branch);
        let mut stack: Vec<&str> = vec![branch];
        let mut found = Vec::new();

        while let Some(current) = stack.pop() {
            for child in self.children_of(current) {
                if visited.insert(child.as_str()) {
                    found.push(child.clone());
                    stack.push(child.as_str());
                }
            }
        }

        found
    }
}

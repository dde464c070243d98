//! Merge planning - pure functions for creating merge plans
//!
//! This module contains the pure, testable logic for creating merge plans.
//! No I/O happens here - all data is passed in, making it easy to unit test.

use crate::merge::readiness::Readiness;
use crate::types::{CommitRecord, Decision, MergeMethod, PullRequest};

/// Gathered PR information for planning
///
/// This struct holds all the information needed to plan a merge,
/// fetched beforehand by the orchestrator.
#[derive(Debug, Clone)]
pub struct PrInfo {
    /// Head branch of the PR
    pub branch: String,
    /// Local commit the PR carries
    pub commit: CommitRecord,
    /// Full PR details including review and check state
    pub pr: PullRequest,
    /// Readiness evaluated against the configured gates
    pub readiness: Readiness,
}

/// Confidence level for a merge attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeConfidence {
    /// All conditions verified - merge should succeed
    Certain,
    /// Some conditions unknown - merge may fail
    Uncertain(String),
}

/// A single step in the merge plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeStep {
    /// Point the top of the prefix at the target branch
    Retarget {
        /// Branch name
        branch: String,
        /// PR number
        pr_number: u64,
        /// New base
        base: String,
    },
    /// Merge this PR (it carries every commit below it)
    Merge {
        /// Branch name
        branch: String,
        /// PR number
        pr_number: u64,
        /// PR title (for display)
        pr_title: String,
        /// Merge method to use
        method: MergeMethod,
        /// Confidence level for this merge
        confidence: MergeConfidence,
    },
    /// Close a PR whose commit landed with the merged one
    CloseSubsumed {
        /// Branch name
        branch: String,
        /// PR number
        pr_number: u64,
        /// PR that carried it in
        into: u64,
    },
    /// First PR that is not ready (informational; nothing above it merges)
    Skip {
        /// Branch name
        branch: String,
        /// PR number
        pr_number: u64,
        /// Reasons why this PR cannot be merged
        reasons: Vec<String>,
    },
}

impl MergeStep {
    /// Get the branch name for this step
    pub fn branch_name(&self) -> &str {
        match self {
            Self::Retarget { branch, .. }
            | Self::Merge { branch, .. }
            | Self::CloseSubsumed { branch, .. }
            | Self::Skip { branch, .. } => branch,
        }
    }
}

impl std::fmt::Display for MergeStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Retarget {
                pr_number, base, ..
            } => write!(f, "retarget PR #{pr_number} onto {base}"),
            Self::Merge {
                pr_number,
                pr_title,
                method,
                confidence,
                ..
            } => {
                let prefix = match confidence {
                    MergeConfidence::Certain => "merge",
                    MergeConfidence::Uncertain(_) => "merge (uncertain)",
                };
                write!(f, "{prefix} PR #{pr_number} ({method}): {pr_title}")
            }
            Self::CloseSubsumed {
                pr_number, into, ..
            } => write!(f, "close PR #{pr_number} (included in #{into})"),
            Self::Skip {
                pr_number,
                branch,
                reasons,
            } => {
                write!(f, "stop at PR #{pr_number} ({branch})")?;
                if !reasons.is_empty() {
                    write!(f, ": {}", reasons.join(", "))?;
                }
                Ok(())
            }
        }
    }
}

/// Options for merge planning
#[derive(Debug, Clone)]
pub struct MergePlanOptions {
    /// Branch the stack lands on
    pub target: String,
    /// Merge at most this many PRs from the bottom
    pub count: Option<usize>,
    /// Merge strategy
    pub method: MergeMethod,
    /// Ask before merging when readiness is uncertain
    pub confirm: bool,
}

/// Merge plan - the functional core output
///
/// This is a pure data structure that describes what merge operations
/// should be performed. Created by `create_merge_plan()` (pure)
/// and executed by `execute_merge()` (effectful).
#[derive(Debug, Clone, Default)]
pub struct MergePlan {
    /// Ordered steps to perform
    pub steps: Vec<MergeStep>,
    /// PR numbers landing in this merge, bottom first
    pub selected: Vec<u64>,
    /// Local hash of the topmost commit being merged (restack starts above it)
    pub rebase_from: Option<String>,
    /// Question to answer before executing
    pub decision: Option<Decision>,
}

impl MergePlan {
    /// Check if the plan merges nothing
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Count PRs landing
    #[must_use]
    pub fn merge_count(&self) -> usize {
        self.selected.len()
    }

    /// The step explaining where merging stops, if any
    #[must_use]
    pub fn blocker(&self) -> Option<&MergeStep> {
        self.steps
            .iter()
            .find(|s| matches!(s, MergeStep::Skip { .. }))
    }
}

/// Create a merge plan (PURE - no I/O, easily testable)
///
/// Selects the longest bottom-up run of ready PRs (truncated to `count`).
/// Only the top of that run is merged; it carries every commit below it,
/// so the rest are closed as subsumed.
#[must_use]
pub fn create_merge_plan(infos: &[PrInfo], options: &MergePlanOptions) -> MergePlan {
    let ready = infos
        .iter()
        .take_while(|info| info.readiness.is_ready())
        .count();
    let selected_len = options.count.map_or(ready, |n| n.min(ready));

    let mut steps = Vec::new();
    let selected = &infos[..selected_len];

    if let Some(top) = selected.last() {
        if top.pr.base_ref != options.target {
            steps.push(MergeStep::Retarget {
                branch: top.branch.clone(),
                pr_number: top.pr.number,
                base: options.target.clone(),
            });
        }

        let uncertainties: Vec<String> = selected
            .iter()
            .flat_map(|info| {
                info.readiness
                    .uncertainties
                    .iter()
                    .map(move |reason| format!("#{}: {reason}", info.pr.number))
            })
            .collect();
        let confidence = if uncertainties.is_empty() {
            MergeConfidence::Certain
        } else {
            MergeConfidence::Uncertain(uncertainties.join(", "))
        };

        steps.push(MergeStep::Merge {
            branch: top.branch.clone(),
            pr_number: top.pr.number,
            pr_title: top.pr.title.clone(),
            method: options.method,
            confidence,
        });

        for below in &selected[..selected_len - 1] {
            steps.push(MergeStep::CloseSubsumed {
                branch: below.branch.clone(),
                pr_number: below.pr.number,
                into: top.pr.number,
            });
        }

        let decision = (options.confirm && !uncertainties.is_empty()).then(|| {
            Decision::ConfirmMerge {
                pr_number: top.pr.number,
                reasons: uncertainties,
            }
        });

        // Readiness stopped the run (not the count): say why
        if selected_len == ready
            && let Some(next) = infos.get(ready)
        {
            steps.push(skip_step(next));
        }

        return MergePlan {
            steps,
            selected: selected.iter().map(|info| info.pr.number).collect(),
            rebase_from: Some(top.commit.hash.clone()),
            decision,
        };
    }

    // A zero count merges nothing, but nothing blocks either
    if ready == 0
        && let Some(first) = infos.first()
    {
        steps.push(skip_step(first));
    }
    MergePlan {
        steps,
        ..MergePlan::default()
    }
}

fn skip_step(info: &PrInfo) -> MergeStep {
    MergeStep::Skip {
        branch: info.branch.clone(),
        pr_number: info.pr.number,
        reasons: info.readiness.reasons.clone(),
    }
}

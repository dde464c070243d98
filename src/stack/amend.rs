//! Folding staged changes into a commit of the stack

use crate::error::{Error, Result};
use crate::stack::read_stack;
use crate::types::{CommitRecord, Decision};
use crate::vcs::Vcs;
use tracing::info;

/// How an amend request ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AmendOutcome {
    /// The caller must pick a commit
    NeedsDecision(Decision),
    /// Changes were folded into this commit (pre-rewrite record)
    Amended(CommitRecord),
}

/// Fold the staged changes into commit `index` of the stack
///
/// `index` counts from 1 at the bottom. Without one, the candidates come
/// back as `Decision::ChooseCommit`.
pub fn amend_commit(vcs: &dyn Vcs, upstream: &str, index: Option<usize>) -> Result<AmendOutcome> {
    let commits = read_stack(vcs, upstream)?;
    if commits.is_empty() {
        return Err(Error::InvalidArgument(format!(
            "no commits between {upstream} and HEAD"
        )));
    }

    let Some(index) = index else {
        return Ok(AmendOutcome::NeedsDecision(Decision::ChooseCommit {
            candidates: commits,
        }));
    };

    if index == 0 || index > commits.len() {
        return Err(Error::InvalidArgument(format!(
            "index {index} is out of range (stack has {} commit(s))",
            commits.len()
        )));
    }

    if !vcs.is_dirty()? {
        return Err(Error::InvalidArgument(
            "nothing to amend; stage some changes first".to_string(),
        ));
    }

    let commit = commits[index - 1].clone();
    vcs.fixup_into(upstream, &commit.hash)?;
    info!(commit = commit.short_hash(), index, "amended commit");
    Ok(AmendOutcome::Amended(commit))
}

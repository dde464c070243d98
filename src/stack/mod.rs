//! Local commit stack: parsing, identity, topology

pub mod amend;
pub mod identity;
pub mod parse;
pub mod topology;

pub use amend::{AmendOutcome, amend_commit};
pub use identity::{IdentityResolution, ensure_commit_ids, generate_commit_id};
pub use parse::{COMMIT_ID_TRAILER, parse_commit_log, with_commit_id};
pub use topology::{Placement, StackGraph, branch_name, commit_id_from_branch, plan_topology};

use crate::error::Result;
use crate::types::CommitRecord;
use crate::vcs::Vcs;

/// Read and parse `base..HEAD`, oldest first
pub fn read_stack(vcs: &dyn Vcs, base: &str) -> Result<Vec<CommitRecord>> {
    let raw = vcs.log(base, "HEAD")?;
    parse_commit_log(&raw)
}

/// Records below the first WIP commit
pub fn publishable(commits: &[CommitRecord]) -> &[CommitRecord] {
    let end = commits
        .iter()
        .position(CommitRecord::is_wip)
        .unwrap_or(commits.len());
    &commits[..end]
}

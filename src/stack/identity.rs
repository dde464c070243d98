//! Commit identity assignment
//!
//! Every non-WIP commit needs a stable `commit-id` trailer so it can be matched
//! to its PR after amends and rebases change its hash.

use crate::error::Result;
use crate::stack::parse::{parse_commit_log, with_commit_id};
use crate::types::CommitRecord;
use crate::vcs::{MessageRewrite, Vcs};
use std::collections::HashSet;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Length of generated commit ids
const COMMIT_ID_LEN: usize = 8;

/// Stack records after identity assignment
#[derive(Debug, Clone)]
pub struct IdentityResolution {
    /// Records, oldest first, every non-WIP record carrying an id
    pub commits: Vec<CommitRecord>,
    /// Ids were derived from hashes because the history rewrite failed
    ///
    /// Degraded ids change on the next amend, so PRs created with them will
    /// be orphaned later.
    pub degraded: bool,
}

/// Random 8-hex commit id
pub fn generate_commit_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(COMMIT_ID_LEN);
    id
}

/// Ensure every commit below the first WIP in `base..HEAD` carries a unique commit id
///
/// Missing ids and later duplicates get fresh ids, appended to the stored
/// commit messages with one scripted rebase. Commits at or above a WIP commit
/// are never touched. The log is re-read afterwards since every rewritten
/// commit (and everything above it) has a new hash.
pub fn ensure_commit_ids(
    vcs: &dyn Vcs,
    base: &str,
    commits: Vec<CommitRecord>,
) -> Result<IdentityResolution> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut needs_id: Vec<usize> = Vec::new();

    for (idx, commit) in commits.iter().enumerate() {
        if commit.is_wip() {
            break;
        }
        if !commit.has_commit_id() || !seen.insert(commit.commit_id.clone()) {
            needs_id.push(idx);
        }
    }

    if needs_id.is_empty() {
        return Ok(IdentityResolution {
            commits,
            degraded: false,
        });
    }

    let mut rewrites: Vec<MessageRewrite> = Vec::with_capacity(needs_id.len());
    for &idx in &needs_id {
        let mut id = generate_commit_id();
        while !seen.insert(id.clone()) {
            id = generate_commit_id();
        }
        let commit = &commits[idx];
        debug!(hash = commit.short_hash(), commit_id = %id, "assigning commit id");
        let stored = vcs.commit_message(&commit.hash)?;
        rewrites.push(MessageRewrite {
            hash: commit.hash.clone(),
            message: with_commit_id(&stored, &id),
        });
    }

    info!(count = rewrites.len(), "writing commit ids into history");

    match vcs.rewrite_messages(base, &rewrites) {
        Ok(()) => {
            let rewritten = parse_commit_log(&vcs.log(base, "HEAD")?)?;
            Ok(finish(rewritten))
        }
        Err(e) => {
            warn!(error = %e, "failed to rewrite history; using hash-derived commit ids");
            if vcs.rebase_in_progress().unwrap_or(false)
                && let Err(abort_err) = vcs.abort_rebase()
            {
                warn!(error = %abort_err, "failed to abort rebase");
            }
            Ok(degrade(commits, &needs_id))
        }
    }
}

/// Check the re-read stack; anything still missing an id falls back to its hash
fn finish(commits: Vec<CommitRecord>) -> IdentityResolution {
    let mut seen = HashSet::new();
    let missing: Vec<usize> = commits
        .iter()
        .enumerate()
        .take_while(|(_, c)| !c.is_wip())
        .filter(|(_, c)| !c.has_commit_id() || !seen.insert(c.commit_id.clone()))
        .map(|(idx, _)| idx)
        .collect();

    if missing.is_empty() {
        return IdentityResolution {
            commits,
            degraded: false,
        };
    }

    warn!(
        count = missing.len(),
        "commit ids missing after rewrite; using hash-derived ids"
    );
    degrade(commits, &missing)
}

fn degrade(mut commits: Vec<CommitRecord>, indices: &[usize]) -> IdentityResolution {
    for &idx in indices {
        let commit = &mut commits[idx];
        commit.commit_id = commit.short_hash().to_string();
    }
    IdentityResolution {
        commits,
        degraded: true,
    }
}

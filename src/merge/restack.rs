//! Restacking the local branch after the target moved

use crate::error::{Error, Result};
use crate::stack::read_stack;
use crate::vcs::{StashGuard, Vcs};
use tracing::{debug, info};

/// What a restack did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestackOutcome {
    /// Branch that was rewritten
    pub branch: String,
    /// Commits replayed onto the target
    pub replayed: usize,
}

/// Fetch and rebase the current branch onto `remote/target`
pub fn rebase_on_target(vcs: &dyn Vcs, remote: &str, target: &str) -> Result<()> {
    let upstream = format!("{remote}/{target}");
    vcs.fetch(remote)?;
    info!(%upstream, "rebasing onto target");
    vcs.rebase_onto(&upstream)
}

/// Move the commits above `merged_top` onto the freshly merged target
///
/// The merged commits may land under new hashes (squash or rebase merges),
/// so the branch is reset to `remote/target` and everything above
/// `merged_top` is cherry-picked back on. On conflict the cherry-pick is
/// left paused and local changes stay stashed.
pub fn restack(
    vcs: &dyn Vcs,
    remote: &str,
    target: &str,
    merged_top: &str,
) -> Result<RestackOutcome> {
    let upstream = format!("{remote}/{target}");
    vcs.fetch(remote)?;

    let branch = vcs
        .current_branch()?
        .ok_or_else(|| Error::InvalidArgument("cannot restack a detached HEAD".to_string()))?;

    let remaining = read_stack(vcs, merged_top)?;
    let Some(tip) = remaining.last().map(|c| c.hash.clone()) else {
        debug!(%branch, "nothing above the merged commit");
        vcs.reset_branch(&branch, &upstream)?;
        return Ok(RestackOutcome {
            branch,
            replayed: 0,
        });
    };

    let stash = StashGuard::acquire(vcs)?;
    vcs.reset_branch(&branch, &upstream)?;

    match vcs.cherry_pick_range(merged_top, &tip) {
        Ok(()) => {
            stash.release()?;
            info!(%branch, replayed = remaining.len(), "restacked");
            Ok(RestackOutcome {
                branch,
                replayed: remaining.len(),
            })
        }
        Err(e @ Error::RestackConflict { .. }) => {
            stash.keep();
            Err(e)
        }
        Err(e) => {
            // Put the branch back where it was before popping the stash
            vcs.reset_branch(&branch, &tip)?;
            stash.release()?;
            Err(e)
        }
    }
}

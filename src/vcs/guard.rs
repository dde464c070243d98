//! Scoped working-tree state
//!
//! Both guards restore on drop. `release` restores explicitly and surfaces the
//! error; a guard dropped on an error path only logs. The branch guard leaves
//! HEAD alone while a rebase or cherry-pick is paused.

use crate::error::Result;
use crate::vcs::Vcs;
use tracing::{debug, warn};

/// Stashes uncommitted changes for the guard's lifetime
pub struct StashGuard<'a> {
    vcs: &'a dyn Vcs,
    stashed: bool,
}

impl<'a> StashGuard<'a> {
    /// Stash local changes if the working tree is dirty
    pub fn acquire(vcs: &'a dyn Vcs) -> Result<Self> {
        let stashed = vcs.is_dirty()?;
        if stashed {
            debug!("stashing uncommitted changes");
            vcs.stash_push()?;
        }
        Ok(Self { vcs, stashed })
    }

    /// Whether anything was stashed
    pub const fn stashed(&self) -> bool {
        self.stashed
    }

    /// Pop the stash now
    pub fn release(mut self) -> Result<()> {
        if std::mem::take(&mut self.stashed) {
            debug!("restoring stashed changes");
            self.vcs.stash_pop()?;
        }
        Ok(())
    }

    /// Leave the changes in the stash (the tree is mid-conflict)
    pub fn keep(mut self) {
        if std::mem::take(&mut self.stashed) {
            warn!("uncommitted changes were left in the stash; run 'git stash pop' when done");
        }
    }
}

impl Drop for StashGuard<'_> {
    fn drop(&mut self) {
        if self.stashed
            && let Err(e) = self.vcs.stash_pop()
        {
            warn!(error = %e, "failed to restore stashed changes; run 'git stash pop' manually");
        }
    }
}

/// Returns to the branch that was checked out when the guard was taken
pub struct BranchGuard<'a> {
    vcs: &'a dyn Vcs,
    branch: Option<String>,
}

impl<'a> BranchGuard<'a> {
    /// Remember the current branch
    pub fn acquire(vcs: &'a dyn Vcs) -> Result<Self> {
        let branch = vcs.current_branch()?;
        Ok(Self { vcs, branch })
    }

    /// Branch that will be restored
    pub fn branch(&self) -> Option<&str> {
        self.branch.as_deref()
    }

    /// Check the original branch out again now
    pub fn release(mut self) -> Result<()> {
        if let Some(branch) = self.branch.take() {
            restore_branch(self.vcs, &branch)?;
        }
        Ok(())
    }
}

impl Drop for BranchGuard<'_> {
    fn drop(&mut self) {
        if let Some(branch) = self.branch.take()
            && let Err(e) = restore_branch(self.vcs, &branch)
        {
            warn!(error = %e, branch, "failed to switch back to original branch");
        }
    }
}

fn restore_branch(vcs: &dyn Vcs, branch: &str) -> Result<()> {
    if vcs.rebase_in_progress()? || vcs.cherry_pick_in_progress()? {
        debug!(branch, "history edit paused; staying put");
        return Ok(());
    }
    if vcs.current_branch()?.as_deref() == Some(branch) {
        return Ok(());
    }
    debug!(branch, "restoring original branch");
    vcs.checkout(branch)
}

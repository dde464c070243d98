//! Version-control collaborator
//!
//! The reconciler only needs a handful of git operations; they sit behind the
//! `Vcs` trait so the core can be driven by a scripted mock in tests.

mod git;
mod guard;

pub use git::GitCli;
pub use guard::{BranchGuard, StashGuard};

use crate::error::Result;
use std::path::Path;

/// How a multi-ref push is shipped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushMode {
    /// Single `--atomic` push: all refs update or none do
    Atomic,
    /// One push per ref; earlier refs stay pushed if a later one fails
    Sequential,
}

/// A forced update of one remote branch to one commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefUpdate {
    /// Commit to point the branch at
    pub hash: String,
    /// Branch name (without `refs/heads/`)
    pub branch: String,
}

impl RefUpdate {
    /// Refspec in `{hash}:refs/heads/{branch}` form
    pub fn refspec(&self) -> String {
        format!("{}:refs/heads/{}", self.hash, self.branch)
    }
}

/// Per-ref outcome of a push
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PushOutcome {
    /// Branches updated on the remote
    pub pushed: Vec<String>,
    /// Branches rejected, with the reason
    pub failed: Vec<(String, String)>,
}

impl PushOutcome {
    /// Whether every ref was updated
    pub const fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// New message for one commit during a history rewrite
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRewrite {
    /// Commit to reword
    pub hash: String,
    /// Full replacement message
    pub message: String,
}

/// Operations consumed from the version-control system
pub trait Vcs: Send + Sync {
    /// Root of the working tree
    fn repo_root(&self) -> &Path;

    /// Checked-out branch, `None` when HEAD is detached
    fn current_branch(&self) -> Result<Option<String>>;

    /// Fetch URL of a remote
    fn remote_url(&self, remote: &str) -> Result<String>;

    /// Raw `git log --parents` text for `base..head`, newest first
    fn log(&self, base: &str, head: &str) -> Result<String>;

    /// Message of `hash` exactly as stored in the commit object
    fn commit_message(&self, hash: &str) -> Result<String>;

    /// Whether the working tree or index has uncommitted changes
    fn is_dirty(&self) -> Result<bool>;

    /// Set uncommitted changes aside
    fn stash_push(&self) -> Result<()>;

    /// Restore the most recently stashed changes
    fn stash_pop(&self) -> Result<()>;

    /// Switch to a branch
    fn checkout(&self, branch: &str) -> Result<()>;

    /// Create or force-update `branch` to `commit` and check it out
    fn reset_branch(&self, branch: &str, commit: &str) -> Result<()>;

    /// Fetch from a remote
    fn fetch(&self, remote: &str) -> Result<()>;

    /// Force-push ref updates
    fn push(&self, remote: &str, refs: &[RefUpdate], mode: PushMode) -> Result<PushOutcome>;

    /// Rebase the current branch onto `upstream`, autostashing local changes
    fn rebase_onto(&self, upstream: &str) -> Result<()>;

    /// Cherry-pick `from..to` onto HEAD
    fn cherry_pick_range(&self, from: &str, to: &str) -> Result<()>;

    /// Reword commits in `base..HEAD` without an editor, carrying local changes across
    fn rewrite_messages(&self, base: &str, rewrites: &[MessageRewrite]) -> Result<()>;

    /// Fold staged changes into `hash` (a commit in `base..HEAD`)
    fn fixup_into(&self, base: &str, hash: &str) -> Result<()>;

    /// Whether a rebase is paused in the repository
    fn rebase_in_progress(&self) -> Result<bool>;

    /// Whether a cherry-pick is paused in the repository
    fn cherry_pick_in_progress(&self) -> Result<bool>;

    /// Abort a paused rebase
    fn abort_rebase(&self) -> Result<()>;
}

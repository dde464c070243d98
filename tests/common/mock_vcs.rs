//! Scripted in-memory `Vcs` for testing
//!
//! Holds the stack as a list of commits and renders it as `git log --parents`
//! text, so the real parser runs against it. History edits hand out fresh
//! hashes the way git does.

#![allow(dead_code)]

use stack_pr::error::{Error, Result};
use stack_pr::stack::COMMIT_ID_TRAILER;
use stack_pr::types::CommitRecord;
use stack_pr::vcs::{MessageRewrite, PushMode, PushOutcome, RefUpdate, Vcs};
use std::collections::HashSet;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// Parent of the bottom commit (the tip of `origin/main`)
pub const BASE_HASH: &str = "0000000000000000000000000000000000000000";

/// One recorded push
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushCall {
    pub remote: String,
    pub refs: Vec<RefUpdate>,
    pub mode: PushMode,
}

/// In-memory repository
pub struct MockVcs {
    root: PathBuf,
    next_hash: AtomicU64,
    commits: Mutex<Vec<CommitRecord>>,
    // Commits set aside by a reset onto the target, replayed by cherry-pick
    reset_pool: Mutex<Vec<CommitRecord>>,
    branch: Mutex<Option<String>>,
    dirty: Mutex<bool>,
    stash_depth: Mutex<usize>,
    rebase_in_progress: Mutex<bool>,
    cherry_pick_in_progress: Mutex<bool>,
    // Branch left behind when a rebase stopped with HEAD detached
    rebase_branch: Mutex<Option<String>>,
    // Call tracking
    ops: Mutex<Vec<String>>,
    pushes: Mutex<Vec<PushCall>>,
    // Error injection
    rejected: Mutex<HashSet<String>>,
    fail_rewrite: Mutex<bool>,
    fail_cherry_pick: Mutex<bool>,
    fail_rebase: Mutex<bool>,
}

impl Default for MockVcs {
    fn default() -> Self {
        Self::new()
    }
}

impl MockVcs {
    /// Empty stack on branch `feature`
    pub fn new() -> Self {
        Self {
            root: PathBuf::from("/mock/repo"),
            next_hash: AtomicU64::new(1),
            commits: Mutex::new(Vec::new()),
            reset_pool: Mutex::new(Vec::new()),
            branch: Mutex::new(Some("feature".to_string())),
            dirty: Mutex::new(false),
            stash_depth: Mutex::new(0),
            rebase_in_progress: Mutex::new(false),
            cherry_pick_in_progress: Mutex::new(false),
            rebase_branch: Mutex::new(None),
            ops: Mutex::new(Vec::new()),
            pushes: Mutex::new(Vec::new()),
            rejected: Mutex::new(HashSet::new()),
            fail_rewrite: Mutex::new(false),
            fail_cherry_pick: Mutex::new(false),
            fail_rebase: Mutex::new(false),
        }
    }

    /// Stack of commits with the given `(subject, commit_id)` pairs, bottom first
    pub fn with_stack(entries: &[(&str, Option<&str>)]) -> Self {
        let vcs = Self::new();
        for (subject, id) in entries {
            vcs.push_commit(subject, "", *id);
        }
        vcs
    }

    /// Unique in the first 8 hex digits, so short hashes differ too
    fn fresh_hash(&self) -> String {
        let n = self.next_hash.fetch_add(1, Ordering::SeqCst);
        format!("{n:08x}{}", "a".repeat(32))
    }

    // === Stack editing ===

    /// Commit on top of the stack; returns the hash
    pub fn push_commit(&self, subject: &str, body: &str, commit_id: Option<&str>) -> String {
        let hash = self.fresh_hash();
        let mut commits = self.commits.lock().unwrap();
        let parent = commits
            .last()
            .map_or_else(|| BASE_HASH.to_string(), |c| c.hash.clone());
        commits.push(CommitRecord {
            hash: hash.clone(),
            parent: Some(parent),
            commit_id: commit_id.unwrap_or_default().to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        hash
    }

    /// Drop the commit at `idx` (interactive rebase `drop`)
    pub fn remove_commit(&self, idx: usize) {
        self.commits.lock().unwrap().remove(idx);
        self.rehash_from(idx);
    }

    /// Amend the commit at `idx`: it and everything above get new hashes
    pub fn amend_commit(&self, idx: usize) {
        self.rehash_from(idx);
    }

    /// Current stack, bottom first
    pub fn commits(&self) -> Vec<CommitRecord> {
        self.commits.lock().unwrap().clone()
    }

    fn rehash_from(&self, idx: usize) {
        let count = self.commits.lock().unwrap().len();
        let fresh: Vec<String> = (idx..count).map(|_| self.fresh_hash()).collect();
        let mut commits = self.commits.lock().unwrap();
        for (offset, hash) in fresh.into_iter().enumerate() {
            commits[idx + offset].hash = hash;
        }
        relink(&mut commits);
    }

    // === State setup ===

    /// Mark the working tree dirty
    pub fn set_dirty(&self, dirty: bool) {
        *self.dirty.lock().unwrap() = dirty;
    }

    /// Detach HEAD
    pub fn detach(&self) {
        *self.branch.lock().unwrap() = None;
    }

    /// Pretend an earlier run left a rebase paused
    pub fn set_rebase_in_progress(&self) {
        *self.rebase_in_progress.lock().unwrap() = true;
    }

    /// Pretend an earlier run left a cherry-pick paused
    pub fn set_cherry_pick_in_progress(&self) {
        *self.cherry_pick_in_progress.lock().unwrap() = true;
    }

    // === Error injection methods ===

    /// Reject pushes of this branch
    pub fn reject_push(&self, branch: &str) {
        self.rejected.lock().unwrap().insert(branch.to_string());
    }

    /// Make `rewrite_messages` fail mid-rebase
    pub fn fail_rewrite(&self) {
        *self.fail_rewrite.lock().unwrap() = true;
    }

    /// Make `cherry_pick_range` stop on a conflict
    pub fn fail_cherry_pick(&self) {
        *self.fail_cherry_pick.lock().unwrap() = true;
    }

    /// Make `rebase_onto` stop on a conflict
    pub fn fail_rebase(&self) {
        *self.fail_rebase.lock().unwrap() = true;
    }

    // === Call verification methods ===

    /// Operations in call order, e.g. `"stash push"`, `"checkout feature"`
    pub fn ops(&self) -> Vec<String> {
        self.ops.lock().unwrap().clone()
    }

    /// Get all push calls
    pub fn pushes(&self) -> Vec<PushCall> {
        self.pushes.lock().unwrap().clone()
    }

    /// Every ref update sent, across pushes
    pub fn pushed_refs(&self) -> Vec<RefUpdate> {
        self.pushes
            .lock()
            .unwrap()
            .iter()
            .flat_map(|p| p.refs.clone())
            .collect()
    }

    /// Stash entries not yet popped
    pub fn stash_depth(&self) -> usize {
        *self.stash_depth.lock().unwrap()
    }

    /// Whether a rebase is paused
    pub fn is_rebasing(&self) -> bool {
        *self.rebase_in_progress.lock().unwrap()
    }

    /// Whether a cherry-pick is paused
    pub fn is_cherry_picking(&self) -> bool {
        *self.cherry_pick_in_progress.lock().unwrap()
    }

    /// Checked-out branch
    pub fn branch(&self) -> Option<String> {
        self.branch.lock().unwrap().clone()
    }

    fn op(&self, text: impl Into<String>) {
        self.ops.lock().unwrap().push(text.into());
    }
}

/// Re-link parents after hashes changed
fn relink(commits: &mut [CommitRecord]) {
    let mut parent = BASE_HASH.to_string();
    for commit in commits.iter_mut() {
        commit.parent = Some(parent.clone());
        parent = commit.hash.clone();
    }
}

/// Render commits (bottom first) as `git log --parents` output, newest first
pub fn render_log(commits: &[CommitRecord]) -> String {
    let mut out = String::new();
    for commit in commits.iter().rev() {
        let parent = commit.parent.as_deref().unwrap_or(BASE_HASH);
        let _ = writeln!(out, "commit {} {parent}", commit.hash);
        let _ = writeln!(out, "Author: Test User <test@example.com>");
        let _ = writeln!(out, "Date:   Mon Jan 1 00:00:00 2024 +0000");
        let _ = writeln!(out);
        let _ = writeln!(out, "    {}", commit.subject);
        if !commit.body.is_empty() {
            let _ = writeln!(out, "    ");
            for line in commit.body.lines() {
                let _ = writeln!(out, "    {line}");
            }
        }
        if commit.has_commit_id() {
            let _ = writeln!(out, "    ");
            let _ = writeln!(out, "    {COMMIT_ID_TRAILER}: {}", commit.commit_id);
        }
        let _ = writeln!(out);
    }
    out
}

/// Stored message of one commit
fn render_message(commit: &CommitRecord) -> String {
    let mut message = format!("{}\n", commit.subject);
    if !commit.body.is_empty() {
        let _ = write!(message, "\n{}\n", commit.body);
    }
    if commit.has_commit_id() {
        let _ = write!(message, "\n{COMMIT_ID_TRAILER}: {}\n", commit.commit_id);
    }
    message
}

/// Commit id from the trailer line of a rewritten message
fn trailer_id(message: &str) -> Option<String> {
    message.lines().rev().find_map(|line| {
        line.strip_prefix(COMMIT_ID_TRAILER)
            .and_then(|rest| rest.strip_prefix(':'))
            .map(|id| id.trim().to_string())
    })
}

impl Vcs for MockVcs {
    fn repo_root(&self) -> &Path {
        &self.root
    }

    fn current_branch(&self) -> Result<Option<String>> {
        Ok(self.branch())
    }

    fn remote_url(&self, remote: &str) -> Result<String> {
        if remote == "origin" {
            Ok("git@github.com:test/repo.git".to_string())
        } else {
            Err(Error::RemoteNotFound(remote.to_string()))
        }
    }

    fn log(&self, base: &str, _head: &str) -> Result<String> {
        let commits = self.commits.lock().unwrap();
        let start = commits
            .iter()
            .position(|c| c.hash == base)
            .map_or(0, |idx| idx + 1);
        Ok(render_log(&commits[start..]))
    }

    fn commit_message(&self, hash: &str) -> Result<String> {
        self.commits
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.hash == hash)
            .map(render_message)
            .ok_or_else(|| Error::Git(format!("unknown commit {hash}")))
    }

    fn is_dirty(&self) -> Result<bool> {
        Ok(*self.dirty.lock().unwrap())
    }

    fn stash_push(&self) -> Result<()> {
        self.op("stash push");
        *self.dirty.lock().unwrap() = false;
        *self.stash_depth.lock().unwrap() += 1;
        Ok(())
    }

    fn stash_pop(&self) -> Result<()> {
        self.op("stash pop");
        let mut depth = self.stash_depth.lock().unwrap();
        if *depth == 0 {
            return Err(Error::Git("no stash entries found".to_string()));
        }
        *depth -= 1;
        *self.dirty.lock().unwrap() = true;
        Ok(())
    }

    fn checkout(&self, branch: &str) -> Result<()> {
        self.op(format!("checkout {branch}"));
        *self.branch.lock().unwrap() = Some(branch.to_string());
        Ok(())
    }

    fn reset_branch(&self, branch: &str, commit: &str) -> Result<()> {
        self.op(format!("reset {branch} {commit}"));
        *self.branch.lock().unwrap() = Some(branch.to_string());

        let mut commits = self.commits.lock().unwrap();
        let mut pool = self.reset_pool.lock().unwrap();
        if let Some(idx) = pool.iter().position(|c| c.hash == commit) {
            // Back to a commit set aside earlier
            *commits = pool[..=idx].to_vec();
        } else if let Some(idx) = commits.iter().position(|c| c.hash == commit) {
            commits.truncate(idx + 1);
        } else {
            // Onto the target: the stack is set aside
            *pool = std::mem::take(&mut *commits);
        }
        Ok(())
    }

    fn fetch(&self, remote: &str) -> Result<()> {
        self.op(format!("fetch {remote}"));
        Ok(())
    }

    fn push(&self, remote: &str, refs: &[RefUpdate], mode: PushMode) -> Result<PushOutcome> {
        self.op(format!("push {remote}"));
        self.pushes.lock().unwrap().push(PushCall {
            remote: remote.to_string(),
            refs: refs.to_vec(),
            mode,
        });

        let rejected = self.rejected.lock().unwrap();
        let any_rejected = refs.iter().any(|r| rejected.contains(&r.branch));
        let mut outcome = PushOutcome::default();
        for update in refs {
            let fails = match mode {
                PushMode::Atomic => any_rejected,
                PushMode::Sequential => rejected.contains(&update.branch),
            };
            if fails {
                outcome
                    .failed
                    .push((update.branch.clone(), "rejected".to_string()));
            } else {
                outcome.pushed.push(update.branch.clone());
            }
        }
        Ok(outcome)
    }

    fn rebase_onto(&self, upstream: &str) -> Result<()> {
        self.op(format!("rebase {upstream}"));
        if *self.fail_rebase.lock().unwrap() {
            // git stops a conflicted rebase with HEAD detached
            *self.rebase_in_progress.lock().unwrap() = true;
            *self.rebase_branch.lock().unwrap() = self.branch.lock().unwrap().take();
            return Err(Error::RebaseConflict {
                onto: upstream.to_string(),
            });
        }
        self.rehash_from(0);
        Ok(())
    }

    fn cherry_pick_range(&self, from: &str, to: &str) -> Result<()> {
        self.op(format!("cherry-pick {from}..{to}"));
        if *self.fail_cherry_pick.lock().unwrap() {
            *self.cherry_pick_in_progress.lock().unwrap() = true;
            return Err(Error::RestackConflict {
                tip: to.to_string(),
            });
        }

        let pool = self.reset_pool.lock().unwrap().clone();
        let start = pool.iter().position(|c| c.hash == from).map_or(0, |i| i + 1);
        let end = pool
            .iter()
            .position(|c| c.hash == to)
            .map_or(pool.len(), |i| i + 1);
        let picked: Vec<CommitRecord> = pool.get(start..end).unwrap_or_default().to_vec();

        let base = self.commits.lock().unwrap().len();
        self.commits.lock().unwrap().extend(picked);
        self.rehash_from(base);
        Ok(())
    }

    fn rewrite_messages(&self, _base: &str, rewrites: &[MessageRewrite]) -> Result<()> {
        self.op("rewrite messages");
        if *self.fail_rewrite.lock().unwrap() {
            *self.rebase_in_progress.lock().unwrap() = true;
            return Err(Error::IdentityAssignment("could not apply reword".to_string()));
        }

        let mut first = None;
        {
            let mut commits = self.commits.lock().unwrap();
            for (idx, commit) in commits.iter_mut().enumerate() {
                if let Some(rewrite) = rewrites.iter().find(|r| r.hash == commit.hash) {
                    commit.commit_id = trailer_id(&rewrite.message).unwrap_or_default();
                    first.get_or_insert(idx);
                }
            }
        }
        if let Some(idx) = first {
            self.rehash_from(idx);
        }
        Ok(())
    }

    fn fixup_into(&self, _base: &str, hash: &str) -> Result<()> {
        self.op(format!("fixup {hash}"));
        let idx = self
            .commits
            .lock()
            .unwrap()
            .iter()
            .position(|c| c.hash == hash)
            .ok_or_else(|| Error::Git(format!("unknown commit {hash}")))?;
        *self.dirty.lock().unwrap() = false;
        self.rehash_from(idx);
        Ok(())
    }

    fn rebase_in_progress(&self) -> Result<bool> {
        Ok(self.is_rebasing())
    }

    fn abort_rebase(&self) -> Result<()> {
        self.op("rebase abort");
        *self.rebase_in_progress.lock().unwrap() = false;
        if let Some(branch) = self.rebase_branch.lock().unwrap().take() {
            *self.branch.lock().unwrap() = Some(branch);
        }
        Ok(())
    }

    fn cherry_pick_in_progress(&self) -> Result<bool> {
        Ok(self.is_cherry_picking())
    }
}

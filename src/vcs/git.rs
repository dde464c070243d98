//! `Vcs` implementation backed by the git executable
//!
//! Read-only queries (branch, remotes, repository state) go through gix.
//! Everything that rewrites history or talks to a remote shells out to git,
//! which already knows how to run rebases and use the user's credentials.

use crate::error::{Error, Result};
use crate::vcs::{MessageRewrite, PushMode, PushOutcome, RefUpdate, Vcs};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;
use tracing::debug;

/// Git repository driven through the `git` CLI
#[derive(Debug, Clone)]
pub struct GitCli {
    root: PathBuf,
}

impl GitCli {
    /// Open the repository containing `path`
    pub fn open(path: &Path) -> Result<Self> {
        let repo = gix::discover(path)
            .map_err(|e| Error::Git(format!("not a git repository ({}): {e}", path.display())))?;
        let root = repo
            .workdir()
            .map(Path::to_path_buf)
            .ok_or_else(|| Error::Git("bare repositories are not supported".to_string()))?;
        Ok(Self { root })
    }

    fn repo(&self) -> Result<gix::Repository> {
        gix::open(&self.root).map_err(|e| Error::Git(e.to_string()))
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new("git");
        cmd.current_dir(&self.root)
            .env("GIT_EDITOR", "true")
            .env("GIT_TERMINAL_PROMPT", "0");
        cmd
    }

    fn run(&self, cmd: &mut Command) -> Result<Output> {
        debug!(?cmd, "running git");
        cmd.output()
            .map_err(|e| Error::Git(format!("failed to run git: {e}")))
    }

    /// Run git and return stdout, failing on non-zero exit
    fn git(&self, args: &[&str]) -> Result<String> {
        let output = self.run(self.command().args(args))?;
        if !output.status.success() {
            return Err(Error::Git(format!(
                "'git {}' failed: {}",
                args.join(" "),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Map a failed history-editing command to a conflict if it left a rebase paused
    fn rebase_failure(&self, output: &Output, onto: &str) -> Error {
        if self.rebase_in_progress().unwrap_or(false) {
            Error::RebaseConflict {
                onto: onto.to_string(),
            }
        } else {
            Error::Git(String::from_utf8_lossy(&output.stderr).trim().to_string())
        }
    }
}

/// Quote a path for the shell git runs editor commands through
fn shell_quote(path: &Path) -> String {
    format!("'{}'", path.display().to_string().replace('\'', r"'\''"))
}

impl Vcs for GitCli {
    fn repo_root(&self) -> &Path {
        &self.root
    }

    fn current_branch(&self) -> Result<Option<String>> {
        let repo = self.repo()?;
        let head = repo.head_name().map_err(|e| Error::Git(e.to_string()))?;
        Ok(head.map(|name| name.shorten().to_string()))
    }

    fn remote_url(&self, remote: &str) -> Result<String> {
        let repo = self.repo()?;
        let found = repo
            .find_remote(remote)
            .map_err(|_| Error::RemoteNotFound(remote.to_string()))?;
        found
            .url(gix::remote::Direction::Fetch)
            .map(|url| url.to_bstring().to_string())
            .ok_or_else(|| Error::RemoteNotFound(remote.to_string()))
    }

    fn log(&self, base: &str, head: &str) -> Result<String> {
        self.git(&[
            "log",
            "--parents",
            "--no-color",
            "--no-decorate",
            "--format=medium",
            &format!("{base}..{head}"),
        ])
    }

    fn commit_message(&self, hash: &str) -> Result<String> {
        let raw = self.git(&["cat-file", "commit", hash])?;
        raw.split_once("\n\n")
            .map(|(_, message)| message.to_string())
            .ok_or_else(|| Error::Git(format!("commit {hash} has no message section")))
    }

    fn is_dirty(&self) -> Result<bool> {
        let status = self.git(&["status", "--porcelain", "--untracked-files=no"])?;
        Ok(!status.trim().is_empty())
    }

    fn stash_push(&self) -> Result<()> {
        self.git(&["stash", "push", "--message", "stack-pr: autostash"])?;
        Ok(())
    }

    fn stash_pop(&self) -> Result<()> {
        self.git(&["stash", "pop"])?;
        Ok(())
    }

    fn checkout(&self, branch: &str) -> Result<()> {
        self.git(&["checkout", "--quiet", branch])?;
        Ok(())
    }

    fn reset_branch(&self, branch: &str, commit: &str) -> Result<()> {
        self.git(&["checkout", "--quiet", "-B", branch, commit])?;
        Ok(())
    }

    fn fetch(&self, remote: &str) -> Result<()> {
        self.git(&["fetch", "--quiet", remote])?;
        Ok(())
    }

    fn push(&self, remote: &str, refs: &[RefUpdate], mode: PushMode) -> Result<PushOutcome> {
        let mut outcome = PushOutcome::default();
        if refs.is_empty() {
            return Ok(outcome);
        }

        match mode {
            PushMode::Atomic => {
                let refspecs: Vec<String> = refs.iter().map(RefUpdate::refspec).collect();
                let output = self.run(
                    self.command()
                        .args(["push", "--atomic", "--force", "--quiet", remote])
                        .args(&refspecs),
                )?;
                if output.status.success() {
                    outcome.pushed = refs.iter().map(|r| r.branch.clone()).collect();
                } else {
                    let reason = String::from_utf8_lossy(&output.stderr).trim().to_string();
                    outcome.failed = refs
                        .iter()
                        .map(|r| (r.branch.clone(), reason.clone()))
                        .collect();
                }
            }
            PushMode::Sequential => {
                for update in refs {
                    let output = self.run(
                        self.command()
                            .args(["push", "--force", "--quiet", remote])
                            .arg(update.refspec()),
                    )?;
                    if output.status.success() {
                        outcome.pushed.push(update.branch.clone());
                    } else {
                        let reason = String::from_utf8_lossy(&output.stderr).trim().to_string();
                        outcome.failed.push((update.branch.clone(), reason));
                    }
                }
            }
        }

        debug!(
            pushed = outcome.pushed.len(),
            failed = outcome.failed.len(),
            "push finished"
        );
        Ok(outcome)
    }

    fn rebase_onto(&self, upstream: &str) -> Result<()> {
        let output = self.run(
            self.command()
                .args(["rebase", "--autostash", "--quiet", upstream]),
        )?;
        if output.status.success() {
            return Ok(());
        }
        Err(self.rebase_failure(&output, upstream))
    }

    fn cherry_pick_range(&self, from: &str, to: &str) -> Result<()> {
        let output = self.run(
            self.command()
                .args(["cherry-pick", "--allow-empty"])
                .arg(format!("{from}..{to}")),
        )?;
        if output.status.success() {
            return Ok(());
        }
        if self.cherry_pick_in_progress()? {
            return Err(Error::RestackConflict { tip: to.to_string() });
        }
        Err(Error::Git(
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        ))
    }

    fn rewrite_messages(&self, base: &str, rewrites: &[MessageRewrite]) -> Result<()> {
        if rewrites.is_empty() {
            return Ok(());
        }

        let commits = self.git(&["rev-list", "--reverse", &format!("{base}..HEAD")])?;
        let scratch = TempDir::new()?;

        // The todo list is written up front; the sequence editor just copies it into place
        let mut todo = String::new();
        for (idx, hash) in commits.lines().map(str::trim).filter(|l| !l.is_empty()).enumerate() {
            let _ = writeln!(todo, "pick {hash}");
            if let Some(rewrite) = rewrites.iter().find(|r| r.hash == hash) {
                let message_path = scratch.path().join(format!("msg-{idx}"));
                fs::write(&message_path, &rewrite.message)?;
                let _ = writeln!(
                    todo,
                    "exec git commit --quiet --amend --allow-empty --no-verify --cleanup=verbatim -F {}",
                    shell_quote(&message_path)
                );
            }
        }

        let todo_path = scratch.path().join("todo");
        fs::write(&todo_path, todo)?;

        let output = self.run(
            self.command()
                .env("GIT_SEQUENCE_EDITOR", format!("cp {}", shell_quote(&todo_path)))
                .args(["rebase", "-i", "--no-autosquash", "--autostash", "--quiet", base]),
        )?;
        if output.status.success() {
            return Ok(());
        }
        Err(Error::IdentityAssignment(
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        ))
    }

    fn fixup_into(&self, base: &str, hash: &str) -> Result<()> {
        self.git(&["commit", "--quiet", "--no-verify", &format!("--fixup={hash}")])?;

        let output = self.run(
            self.command()
                .env("GIT_SEQUENCE_EDITOR", "true")
                .args(["rebase", "-i", "--autosquash", "--autostash", "--quiet", base]),
        )?;
        if output.status.success() {
            return Ok(());
        }
        Err(self.rebase_failure(&output, base))
    }

    fn rebase_in_progress(&self) -> Result<bool> {
        let repo = self.repo()?;
        Ok(matches!(
            repo.state(),
            Some(gix::state::InProgress::Rebase | gix::state::InProgress::RebaseInteractive)
        ))
    }

    fn cherry_pick_in_progress(&self) -> Result<bool> {
        let repo = self.repo()?;
        Ok(matches!(
            repo.state(),
            Some(gix::state::InProgress::CherryPick | gix::state::InProgress::CherryPickSequence)
        ))
    }

    fn abort_rebase(&self) -> Result<()> {
        self.git(&["rebase", "--abort"])?;
        Ok(())
    }
}

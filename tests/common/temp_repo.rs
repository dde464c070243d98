//! Temporary git repository for integration tests
//!
//! Creates a bare `origin` and a clone with `main` pushed, so the real
//! `GitCli` can fetch, push and rebase without touching the network.

#![allow(dead_code)]

use stack_pr::vcs::GitCli;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// A temporary clone with a local bare remote
pub struct TempGitRepo {
    dir: TempDir,
    work: PathBuf,
    remote: PathBuf,
}

impl TempGitRepo {
    /// Create the remote and clone, with one commit on `main` and a
    /// `feature` branch checked out
    pub fn new() -> Self {
        let dir = TempDir::new().expect("create temp dir");
        let remote = dir.path().join("origin.git");
        let work = dir.path().join("work");

        run_git(dir.path(), &["init", "--quiet", "--bare", "-b", "main", "origin.git"]);
        run_git(dir.path(), &["init", "--quiet", "-b", "main", "work"]);

        let repo = Self { dir, work, remote };
        repo.git(&["config", "user.name", "Test User"]);
        repo.git(&["config", "user.email", "test@example.com"]);
        repo.git(&["config", "commit.gpgsign", "false"]);
        repo.git(&["remote", "add", "origin", repo.remote.to_str().expect("utf-8 path")]);

        repo.commit_file("README.md", "hello\n", "Initial commit");
        repo.git(&["push", "--quiet", "origin", "main"]);
        repo.git(&["fetch", "--quiet", "origin"]);
        repo.git(&["checkout", "--quiet", "-b", "feature"]);
        repo
    }

    /// Working tree path
    pub fn path(&self) -> &Path {
        &self.work
    }

    /// `GitCli` for the working tree
    pub fn vcs(&self) -> GitCli {
        GitCli::open(&self.work).expect("open repo")
    }

    /// Run git in the working tree, returning stdout
    pub fn git(&self, args: &[&str]) -> String {
        run_git(&self.work, args)
    }

    /// Run git against the bare remote, returning stdout
    pub fn remote_git(&self, args: &[&str]) -> String {
        run_git(&self.remote, args)
    }

    /// Write a file and commit it with `message`
    pub fn commit_file(&self, name: &str, content: &str, message: &str) -> String {
        fs::write(self.work.join(name), content).expect("write file");
        self.git(&["add", name]);
        self.git(&["commit", "--quiet", "-m", message]);
        self.head()
    }

    /// Build a stack of commits, one file per commit
    pub fn build_stack(&self, subjects: &[&str]) {
        for (idx, subject) in subjects.iter().enumerate() {
            self.commit_file(&format!("file{idx}.txt"), subject, subject);
        }
    }

    /// Current HEAD hash
    pub fn head(&self) -> String {
        self.git(&["rev-parse", "HEAD"]).trim().to_string()
    }

    /// Full message of a commit
    pub fn message(&self, rev: &str) -> String {
        self.git(&["log", "-1", "--format=%B", rev])
    }

    /// Hash a branch points at on the remote, if it exists
    pub fn remote_branch(&self, branch: &str) -> Option<String> {
        let out = Command::new("git")
            .args(["rev-parse", "--verify", "--quiet", &format!("refs/heads/{branch}")])
            .current_dir(&self.remote)
            .output()
            .expect("run git");
        out.status
            .success()
            .then(|| String::from_utf8_lossy(&out.stdout).trim().to_string())
    }

    /// Leave an uncommitted change in a tracked file
    pub fn make_dirty(&self) {
        fs::write(self.work.join("README.md"), "hello, dirty\n").expect("write file");
    }

    /// Keep the directory alive for the test's duration
    pub fn temp_dir(&self) -> &Path {
        self.dir.path()
    }
}

impl Default for TempGitRepo {
    fn default() -> Self {
        Self::new()
    }
}

fn run_git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .env("GIT_CONFIG_NOSYSTEM", "1")
        .output()
        .expect("run git");
    assert!(
        output.status.success(),
        "git {} failed: {}",
        args.join(" "),
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

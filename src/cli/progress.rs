//! Shared CLI progress callback

use crate::cli::style::{Stylize, arrow, check, cross};
use anstream::{eprintln, print, println};
use async_trait::async_trait;
use stack_pr::error::Error;
use stack_pr::reconcile::{Phase, ProgressCallback, PushStatus};
use stack_pr::types::PullRequest;

/// CLI progress callback that prints to stdout
///
/// Two modes:
/// - verbose (update): shows all phases, detailed messages
/// - compact (merge): inline status updates, indented for nested output
pub struct CliProgress {
    /// Verbose mode shows all phases and detailed output
    pub verbose: bool,
}

impl CliProgress {
    /// Create verbose progress (for update command)
    pub const fn verbose() -> Self {
        Self { verbose: true }
    }

    /// Create compact progress (for merge command)
    pub const fn compact() -> Self {
        Self { verbose: false }
    }
}

#[async_trait]
impl ProgressCallback for CliProgress {
    async fn on_phase(&self, phase: Phase) {
        if self.verbose {
            if phase != Phase::Complete {
                println!("{}", format!("{phase}...").emphasis());
            }
        } else {
            match phase {
                Phase::Merging | Phase::Restacking | Phase::Pushing => {
                    println!("  {}", format!("{phase}...").emphasis());
                }
                _ => {}
            }
        }
    }

    async fn on_branch_push(&self, branch: &str, status: PushStatus) {
        if self.verbose {
            match &status {
                PushStatus::Started => println!("  Pushing {}...", branch.accent()),
                PushStatus::Success => println!("  {} Pushed {}", check(), branch.accent()),
                PushStatus::Failed(msg) => {
                    println!("  {} Failed to push {}: {msg}", cross(), branch.accent());
                }
            }
        } else {
            match &status {
                PushStatus::Started => print!("    Pushing {branch}... "),
                PushStatus::Success => println!("done"),
                PushStatus::Failed(msg) => println!("{}", format!("failed: {msg}").error()),
            }
        }
    }

    async fn on_pr_created(&self, branch: &str, pr: &PullRequest) {
        if self.verbose {
            println!("  {} Created PR #{} for {}", check(), pr.number, branch.accent());
            println!("    {}", pr.html_url.muted());
        } else {
            println!(
                "    Created PR #{} for {} ({})",
                pr.number, branch, pr.html_url
            );
        }
    }

    async fn on_pr_updated(&self, branch: &str, pr: &PullRequest) {
        if self.verbose {
            println!("  {} Updated PR #{} for {}", check(), pr.number, branch.accent());
        } else {
            println!("    Updated PR #{} for {}", pr.number, branch);
        }
    }

    async fn on_pr_closing(&self, pr_number: u64, reason: &str) {
        let indent = if self.verbose { "  " } else { "    " };
        println!(
            "{indent}{} Closing PR #{pr_number}: {}",
            arrow(),
            reason.muted()
        );
    }

    async fn on_error(&self, error: &Error) {
        if self.verbose {
            eprintln!("  {} {error}", "Error:".error());
        } else {
            eprintln!("    {} {error}", "Error:".error());
        }
    }

    async fn on_message(&self, message: &str) {
        if self.verbose {
            println!("  {message}");
        } else {
            println!("    {message}");
        }
    }
}

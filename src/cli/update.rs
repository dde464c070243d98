//! Update command - push the stack and sync its PRs

use crate::cli::CliProgress;
use crate::cli::context::{CommandContext, Scope};
use crate::cli::style::{CHECK, Stylize, arrow};
use anstream::println;
use stack_pr::error::{Error, Result};
use stack_pr::reconcile::{ReconcileOutcome, SyncOptions, reconcile};

/// Options for the update command
#[derive(Debug, Clone, Default)]
pub struct UpdateOptions {
    /// Only submit the bottom N commits
    pub count: Option<usize>,
    /// Reviewers for new PRs (config value when empty)
    pub reviewers: Vec<String>,
    /// Fetch and rebase onto the target first
    pub rebase: bool,
    /// Create new PRs as drafts
    pub draft: bool,
}

/// Run the update command
pub async fn run_update(scope: &Scope, options: UpdateOptions) -> Result<()> {
    let ctx = CommandContext::open(scope)?;
    let platform = ctx.connect().await?;

    let reviewers = if options.reviewers.is_empty() {
        ctx.config.reviewers.clone()
    } else {
        options.reviewers
    };
    let reconcile_options = ctx.reconcile_options(
        options.count,
        options.rebase,
        SyncOptions {
            draft: options.draft || ctx.config.draft,
            reviewers,
        },
    );

    println!(
        "{} {}",
        "Updating stack on".emphasis(),
        ctx.upstream().accent()
    );

    let progress = CliProgress::verbose();
    let outcome = reconcile(&ctx.vcs, platform.as_ref(), &reconcile_options, &progress).await?;

    print_summary(&outcome);

    if outcome.sync.is_success() {
        Ok(())
    } else {
        Err(Error::RemoteApi(format!(
            "{} PR operation(s) failed",
            outcome.sync.failures.len()
        )))
    }
}

fn print_summary(outcome: &ReconcileOutcome) {
    let plan = &outcome.plan;
    println!();

    if plan.entries.is_empty() {
        println!("{}", "No commits to submit".muted());
        if !plan.known.is_empty() {
            println!("{}", "Open PRs from this tool:".muted());
            for pr in &plan.known {
                println!("  {} #{} {}", arrow(), pr.number, pr.title);
            }
        }
        return;
    }

    if plan.wip_excluded > 0 {
        println!(
            "{}",
            format!(
                "{} WIP commit(s) left out of the stack",
                plan.wip_excluded
            )
            .muted()
        );
    }
    if plan.orphans_suppressed && !plan.orphans.is_empty() {
        println!(
            "{}",
            "Left stale PRs open: other PRs are stacked on top of this stack".warn()
        );
    }

    println!(
        "{} {} pushed, {} created, {} updated, {} closed",
        format!("{CHECK} Stack updated:").success(),
        outcome.push.pushed.len().accent(),
        outcome.sync.created.len().accent(),
        outcome.sync.updated.len().accent(),
        outcome.sync.closed.len().accent()
    );

    for failure in &outcome.sync.failures {
        println!(
            "  {} {}: {}",
            "Failed".error(),
            failure.operation,
            failure.error
        );
    }
}

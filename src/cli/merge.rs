//! Merge command - merge the ready bottom of the stack

use crate::cli::CliProgress;
use crate::cli::context::{CommandContext, Scope};
use crate::cli::style::{CHECK, Stylize, arrow};
use anstream::println;
use dialoguer::Confirm;
use stack_pr::error::{Error, Result};
use stack_pr::merge::{MergeOptions, MergeOutcome, MergeStep, merge_stack};
use stack_pr::reconcile::SyncOptions;
use stack_pr::types::Decision;

/// Run the merge command
///
/// `yes` answers the uncertain-readiness confirmation up front.
pub async fn run_merge(scope: &Scope, count: Option<usize>, yes: bool) -> Result<()> {
    let ctx = CommandContext::open(scope)?;
    let platform = ctx.connect().await?;

    let merge = &ctx.config.merge;
    let options = MergeOptions {
        reconcile: ctx.reconcile_options(
            count,
            false,
            SyncOptions {
                draft: ctx.config.draft,
                reviewers: ctx.config.reviewers.clone(),
            },
        ),
        method: merge.method,
        gates: merge.gates(),
        confirm: merge.confirm,
        settle: merge.settle_delay(),
        delete_branch: merge.delete_branch,
    };

    let progress = CliProgress::compact();
    let mut confirmed = yes;

    loop {
        match merge_stack(&ctx.vcs, platform.as_ref(), &options, confirmed, &progress).await? {
            MergeOutcome::NothingMergeable { blocked } => {
                println!("{}", "No PRs are ready to merge.".muted());
                if let Some(step) = blocked {
                    print_blocker(&step);
                }
                return Ok(());
            }
            MergeOutcome::NeedsDecision(Decision::ConfirmMerge { pr_number, reasons }) => {
                if !confirm_uncertain(pr_number, &reasons)? {
                    println!("{}", "Aborted".muted());
                    return Ok(());
                }
                confirmed = true;
            }
            MergeOutcome::NeedsDecision(other) => {
                return Err(Error::Internal(format!(
                    "unexpected decision during merge: {other:?}"
                )));
            }
            MergeOutcome::Merged {
                result,
                restacked,
                reconciled,
            } => {
                println!();
                if let Some(number) = result.merged {
                    println!(
                        "{} PR #{} ({} subsumed PR(s) closed)",
                        format!("{CHECK} Merged").success(),
                        number.accent(),
                        result.closed.len().accent()
                    );
                }
                if let Some(message) = &result.error_message {
                    println!("  {} {message}", "Warning:".warn());
                }
                println!(
                    "  {} restacked {} commit(s) on {}, {} PR(s) remain",
                    arrow(),
                    restacked.replayed,
                    restacked.branch.accent(),
                    reconciled.plan.entries.len()
                );
                return Ok(());
            }
        }
    }
}

fn print_blocker(step: &MergeStep) {
    if let MergeStep::Skip {
        pr_number, reasons, ..
    } = step
    {
        println!("  PR #{} is not ready:", pr_number.accent());
        for reason in reasons {
            println!("    {} {reason}", arrow());
        }
    }
}

fn confirm_uncertain(pr_number: u64, reasons: &[String]) -> Result<bool> {
    println!(
        "{}",
        format!("Merging PR #{pr_number} may fail; these could not be verified:").warn()
    );
    for reason in reasons {
        println!("  {} {reason}", arrow());
    }
    Confirm::new()
        .with_prompt("Merge anyway?")
        .default(false)
        .interact()
        .map_err(|e| Error::Internal(format!("Failed to read confirmation: {e}")))
}

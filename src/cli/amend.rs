//! Amend command - fold staged changes into a commit of the stack

use crate::cli::context::{CommandContext, Scope};
use crate::cli::style::{Stylize, check};
use anstream::println;
use dialoguer::Select;
use stack_pr::error::{Error, Result};
use stack_pr::reconcile::recover_stale_rebase;
use stack_pr::stack::{AmendOutcome, amend_commit};
use stack_pr::types::{CommitRecord, Decision};

/// Run the amend command
pub fn run_amend(scope: &Scope, index: Option<usize>) -> Result<()> {
    let ctx = CommandContext::open(scope)?;
    recover_stale_rebase(&ctx.vcs)?;
    let upstream = ctx.upstream();

    let commit = match amend_commit(&ctx.vcs, &upstream, index)? {
        AmendOutcome::Amended(commit) => commit,
        AmendOutcome::NeedsDecision(Decision::ChooseCommit { candidates }) => {
            let chosen = choose_commit(&candidates)?;
            match amend_commit(&ctx.vcs, &upstream, Some(chosen))? {
                AmendOutcome::Amended(commit) => commit,
                AmendOutcome::NeedsDecision(_) => {
                    return Err(Error::Internal("commit choice was not applied".to_string()));
                }
            }
        }
        AmendOutcome::NeedsDecision(other) => {
            return Err(Error::Internal(format!(
                "unexpected decision during amend: {other:?}"
            )));
        }
    };

    println!(
        "{} Amended {} {}",
        check(),
        commit.short_hash().accent(),
        commit.subject
    );
    println!("{}", "Run 'stack-pr update' to push the change".muted());
    Ok(())
}

/// Prompt for a commit; returns its 1-based index from the bottom
fn choose_commit(candidates: &[CommitRecord]) -> Result<usize> {
    // Top of the stack first, like `status`
    let items: Vec<String> = candidates
        .iter()
        .enumerate()
        .rev()
        .map(|(idx, c)| format!("{:>3}. {} {}", idx + 1, c.short_hash(), c.subject))
        .collect();

    let selected = Select::new()
        .with_prompt("Amend which commit?")
        .items(&items)
        .default(0)
        .interact()
        .map_err(|e| Error::Internal(format!("Failed to read selection: {e}")))?;

    Ok(candidates.len() - selected)
}

//! Sync command - rebase the stack onto the latest target

use crate::cli::context::{CommandContext, Scope};
use crate::cli::style::{Stylize, check, spinner_style};
use indicatif::ProgressBar;
use stack_pr::error::Result;
use stack_pr::merge::rebase_on_target;
use stack_pr::reconcile::recover_stale_rebase;
use std::time::Duration;

/// Run the sync command
pub fn run_sync(scope: &Scope) -> Result<()> {
    let ctx = CommandContext::open(scope)?;
    if recover_stale_rebase(&ctx.vcs)? {
        anstream::println!("{}", "Aborted an interrupted rebase".warn());
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(spinner_style());
    spinner.set_message(format!("Rebasing onto {}...", ctx.upstream().emphasis()));
    spinner.enable_steady_tick(Duration::from_millis(80));

    match rebase_on_target(&ctx.vcs, &ctx.remote, &ctx.target) {
        Ok(()) => {
            spinner.finish_with_message(format!(
                "{} Rebased onto {}",
                check(),
                ctx.upstream().emphasis()
            ));
            Ok(())
        }
        Err(e) => {
            spinner.finish_and_clear();
            Err(e)
        }
    }
}

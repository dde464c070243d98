//! Status command - show the stack and its PRs

use crate::cli::context::{CommandContext, Scope};
use crate::cli::style::{POINTER, Stylize, arrow};
use anstream::println;
use stack_pr::error::Result;
use stack_pr::merge::{Readiness, ReadinessState};
use stack_pr::status::{StatusEntry, StatusReport, stack_status};
use stack_pr::types::PullRequest;
use supports_hyperlinks::Stream;
use terminal_link::Link;

/// Run the status command
pub async fn run_status(scope: &Scope, detail: bool) -> Result<()> {
    let ctx = CommandContext::open(scope)?;
    let platform = ctx.connect().await?;

    let gates = detail.then(|| ctx.config.merge.gates());
    let report = stack_status(
        &ctx.vcs,
        platform.as_ref(),
        &ctx.upstream(),
        &ctx.target,
        gates,
    )
    .await?;

    print_report(&report, &ctx.upstream());
    Ok(())
}

fn print_report(report: &StatusReport, upstream: &str) {
    if report.entries.is_empty() && report.wip.is_empty() {
        println!("{}", format!("No commits on top of {upstream}").muted());
        return;
    }

    if !report.downstream.is_empty() {
        println!("{}", "Stacked on top (not in this stack):".muted());
        for pr in &report.downstream {
            println!("  {} {} {}", arrow(), pr_link(pr), pr.title.muted());
        }
        println!();
    }

    for commit in report.wip.iter().rev() {
        println!(
            "  {} {} {}",
            "wip".warn(),
            commit.short_hash().muted(),
            commit.subject.muted()
        );
    }

    // Top first, numbered from the bottom to match `amend --index`
    let total = report.entries.len();
    for (offset, entry) in report.entries.iter().rev().enumerate() {
        print_entry(total - offset, entry, offset == 0);
    }
    println!("  {}", upstream.muted());

    if !report.orphans.is_empty() {
        println!();
        println!(
            "{}",
            "PRs whose commit left the stack (closed on next update):".warn()
        );
        for pr in &report.orphans {
            println!("  {} {} {}", arrow(), pr_link(pr), pr.title);
        }
    }

    let unsubmitted = report.unsubmitted();
    if unsubmitted > 0 {
        println!();
        println!(
            "{}",
            format!("{unsubmitted} commit(s) without a PR; run 'stack-pr update'").muted()
        );
    }
}

fn print_entry(index: usize, entry: &StatusEntry, is_top: bool) {
    let marker = if is_top {
        format!(" {POINTER}")
    } else {
        String::new()
    };
    let pr = entry
        .pr
        .as_ref()
        .map_or_else(|| "(no PR)".muted(), pr_link);

    println!(
        "{:>3}. {} {} {}{}",
        index,
        entry.commit.short_hash().accent(),
        pr,
        entry.commit.subject,
        marker
    );

    if let Some(readiness) = &entry.readiness {
        println!("       {}", readiness_line(readiness));
    }
}

fn readiness_line(readiness: &Readiness) -> String {
    let label = match readiness.state {
        ReadinessState::Ready => readiness.state.success(),
        ReadinessState::Pending => readiness.state.warn(),
        ReadinessState::Blocked => readiness.state.error(),
    };
    let mut notes: Vec<&str> = readiness.reasons.iter().map(String::as_str).collect();
    notes.extend(readiness.uncertainties.iter().map(String::as_str));
    if notes.is_empty() {
        label
    } else {
        format!("{label} {}", format!("({})", notes.join("; ")).muted())
    }
}

fn pr_link(pr: &PullRequest) -> String {
    let text = format!("#{}", pr.number);
    if supports_hyperlinks::on(Stream::Stdout) {
        Link::new(&text, &pr.html_url).to_string().accent()
    } else {
        text.accent()
    }
}

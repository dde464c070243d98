//! stack-pr - Stacked PRs for git
//!
//! CLI binary for turning a local commit stack into chained pull requests.

use anyhow::{Result, anyhow};
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;

mod cli;

#[derive(Parser)]
#[command(name = "stack-pr")]
#[command(about = "Stacked PRs for git - GitHub & GitLab")]
#[command(version)]
struct Cli {
    /// Path to the git repository (defaults to current directory)
    #[arg(short, long, global = true)]
    path: Option<PathBuf>,

    /// Git remote to push to (defaults to config, then "origin")
    #[arg(long, global = true)]
    remote: Option<String>,

    /// Branch the stack lands on (defaults to config, then "main")
    #[arg(long, global = true)]
    target: Option<String>,

    /// Verbosity level (repeat for more, up to -vvvv)
    #[arg(short, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Push the stack and create or update one PR per commit
    Update {
        /// Only submit the bottom N commits
        #[arg(long, short = 'n')]
        count: Option<usize>,

        /// Request a review from this user on new PRs (repeatable)
        #[arg(long = "reviewer", short = 'r')]
        reviewers: Vec<String>,

        /// Don't fetch and rebase onto the target first
        #[arg(long)]
        no_rebase: bool,

        /// Create new PRs as drafts
        #[arg(long)]
        draft: bool,
    },

    /// Show the stack and its PRs
    Status {
        /// Fetch review and check state for each PR
        #[arg(long, short = 'd')]
        detail: bool,
    },

    /// Merge the ready bottom of the stack
    Merge {
        /// Merge at most the bottom N PRs
        #[arg(long, short = 'n')]
        count: Option<usize>,

        /// Merge without asking when readiness is uncertain
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Fetch and rebase the stack onto the target
    Sync,

    /// Fold staged changes into a commit of the stack
    Amend {
        /// Commit to amend, counting from 1 at the bottom
        #[arg(long, short = 'i')]
        index: Option<usize>,
    },
}

fn init_tracing_subscriber(verbosity: u8) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(match verbosity {
            0 => Level::ERROR,
            1 => Level::WARN,
            2 => Level::INFO,
            3 => Level::DEBUG,
            _ => Level::TRACE,
        })
        .finish();

    tracing::subscriber::set_global_default(subscriber).map_err(|e| anyhow!(e))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing_subscriber(cli.verbose)?;

    let path = cli.path.unwrap_or_else(|| PathBuf::from("."));
    let scope = cli::Scope {
        path,
        remote: cli.remote,
        target: cli.target,
    };

    match cli.command {
        Commands::Update {
            count,
            reviewers,
            no_rebase,
            draft,
        } => {
            cli::run_update(
                &scope,
                cli::UpdateOptions {
                    count,
                    reviewers,
                    rebase: !no_rebase,
                    draft,
                },
            )
            .await?;
        }
        Commands::Status { detail } => cli::run_status(&scope, detail).await?,
        Commands::Merge { count, yes } => cli::run_merge(&scope, count, yes).await?,
        Commands::Sync => cli::run_sync(&scope)?,
        Commands::Amend { index } => cli::run_amend(&scope, index)?,
    }

    Ok(())
}

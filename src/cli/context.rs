//! Shared command context for CLI commands
//!
//! Extracts common setup code shared by update, status, merge, sync and amend.

use stack_pr::config::{Config, load_config};
use stack_pr::error::Result;
use stack_pr::platform::{PlatformService, create_platform_service, parse_repo_info};
use stack_pr::reconcile::{ReconcileOptions, SyncOptions};
use stack_pr::vcs::{GitCli, PushMode, Vcs};
use std::path::PathBuf;
use tracing::debug;

/// Repository and remote selection from the global flags
#[derive(Debug, Clone)]
pub struct Scope {
    /// Path inside the repository
    pub path: PathBuf,
    /// Remote override
    pub remote: Option<String>,
    /// Target branch override
    pub target: Option<String>,
}

/// Shared context for CLI commands
///
/// Flags win over config values. The platform service is only built by
/// commands that talk to the remote (`connect`), so `sync` and `amend` work
/// without credentials.
pub struct CommandContext {
    /// The git repository
    pub vcs: GitCli,
    /// Loaded configuration
    pub config: Config,
    /// Selected remote name
    pub remote: String,
    /// Target branch name (e.g., "main")
    pub target: String,
}

impl CommandContext {
    /// Open the repository and resolve remote and target
    pub fn open(scope: &Scope) -> Result<Self> {
        let vcs = GitCli::open(&scope.path)?;
        let config = load_config(vcs.repo_root())?;

        let remote = scope
            .remote
            .clone()
            .unwrap_or_else(|| config.remote.clone());
        let target = scope
            .target
            .clone()
            .unwrap_or_else(|| config.target.clone());
        debug!(%remote, %target, root = %vcs.repo_root().display(), "opened repository");

        Ok(Self {
            vcs,
            config,
            remote,
            target,
        })
    }

    /// Detect the platform from the remote URL and authenticate
    pub async fn connect(&self) -> Result<Box<dyn PlatformService>> {
        let url = self.vcs.remote_url(&self.remote)?;
        let platform_config = parse_repo_info(&url)?;
        create_platform_service(&platform_config).await
    }

    /// `remote/target`
    pub fn upstream(&self) -> String {
        format!("{}/{}", self.remote, self.target)
    }

    /// Reconcile options with config defaults filled in
    pub fn reconcile_options(
        &self,
        count: Option<usize>,
        rebase: bool,
        sync: SyncOptions,
    ) -> ReconcileOptions {
        ReconcileOptions {
            remote: self.remote.clone(),
            target: self.target.clone(),
            count,
            rebase,
            push_mode: if self.config.push.atomic {
                PushMode::Atomic
            } else {
                PushMode::Sequential
            },
            sync,
        }
    }
}

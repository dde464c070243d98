//! GitHub authentication

use crate::auth::AuthSource;
use crate::error::{Error, Result};
use std::env;
use tokio::process::Command;
use tracing::debug;

/// Environment variables checked for a GitHub token, in order
const TOKEN_VARS: [&str; 2] = ["GITHUB_TOKEN", "GH_TOKEN"];

/// GitHub authentication configuration
#[derive(Debug, Clone)]
pub struct GitHubAuthConfig {
    /// Authentication token
    pub token: String,
    /// Where the token was obtained from
    pub source: AuthSource,
}

/// Get GitHub authentication
///
/// Priority:
/// 1. `GITHUB_TOKEN` environment variable
/// 2. `GH_TOKEN` environment variable
/// 3. gh CLI (`gh auth token`, honoring `GH_HOST`)
pub async fn get_github_auth() -> Result<GitHubAuthConfig> {
    for var in TOKEN_VARS {
        debug!(var, "checking env var");
        if let Ok(token) = env::var(var)
            && !token.trim().is_empty()
        {
            debug!(var, "obtained GitHub token from env var");
            return Ok(GitHubAuthConfig {
                token: token.trim().to_string(),
                source: AuthSource::EnvVar,
            });
        }
    }

    debug!("environment variables not found, attempting to get GitHub token via gh CLI");
    if let Some(token) = get_gh_cli_token().await {
        debug!("obtained GitHub token from gh CLI");
        return Ok(GitHubAuthConfig {
            token,
            source: AuthSource::Cli,
        });
    }

    debug!("no GitHub authentication found");
    Err(Error::Auth(
        "No GitHub authentication found. Run 'gh auth login' or set GITHUB_TOKEN".to_string(),
    ))
}

async fn get_gh_cli_token() -> Option<String> {
    let mut cmd = Command::new("gh");
    cmd.args(["auth", "token"]);
    if let Ok(host) = env::var("GH_HOST") {
        cmd.args(["--hostname", &host]);
    }

    let output = cmd.output().await.ok()?;
    if !output.status.success() {
        return None;
    }

    let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!token.is_empty()).then_some(token)
}

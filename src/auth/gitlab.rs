//! GitLab authentication

use crate::auth::AuthSource;
use crate::error::{Error, Result};
use std::env;
use tokio::process::Command;
use tracing::debug;

/// GitLab authentication configuration
#[derive(Debug, Clone)]
pub struct GitLabAuthConfig {
    /// Authentication token
    pub token: String,
    /// Where the token was obtained from
    pub source: AuthSource,
    /// GitLab host (e.g., "gitlab.com")
    pub host: String,
}

/// Get GitLab authentication
///
/// Priority:
/// 1. `GITLAB_TOKEN` environment variable
/// 2. glab CLI (`glab config get token`)
///
/// The host comes from the argument, then `GITLAB_HOST`, then gitlab.com.
pub async fn get_gitlab_auth(host: Option<&str>) -> Result<GitLabAuthConfig> {
    let host = host
        .map(String::from)
        .or_else(|| env::var("GITLAB_HOST").ok())
        .unwrap_or_else(|| "gitlab.com".to_string());

    debug!("checking GITLAB_TOKEN env var");
    if let Ok(token) = env::var("GITLAB_TOKEN")
        && !token.trim().is_empty()
    {
        debug!("obtained GitLab token from GITLAB_TOKEN env var");
        return Ok(GitLabAuthConfig {
            token: token.trim().to_string(),
            source: AuthSource::EnvVar,
            host,
        });
    }

    debug!(host = %host, "GITLAB_TOKEN not set, attempting to get GitLab token via glab CLI");
    if let Some(token) = get_glab_cli_token(&host).await {
        debug!("obtained GitLab token from glab CLI");
        return Ok(GitLabAuthConfig {
            token,
            source: AuthSource::Cli,
            host,
        });
    }

    debug!("no GitLab authentication found");
    Err(Error::Auth(
        "No GitLab authentication found. Run 'glab auth login' or set GITLAB_TOKEN".to_string(),
    ))
}

async fn get_glab_cli_token(host: &str) -> Option<String> {
    let output = Command::new("glab")
        .args(["config", "get", "token", "--host", host])
        .output()
        .await
        .ok()?;

    if !output.status.success() {
        return None;
    }

    let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!token.is_empty()).then_some(token)
}

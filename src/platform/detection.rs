//! Platform detection from remote URLs

use crate::error::{Error, Result};
use crate::types::{Platform, PlatformConfig};
use regex::Regex;
use std::env;
use std::sync::LazyLock;

/// Regex for SSH URLs: git@host:owner/repo.git
static RE_SSH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:ssh://)?git@[^:/]+[:/](.+?)(?:\.git)?$").unwrap());

/// Regex for HTTPS URLs: `https://host/owner/repo.git`
static RE_HTTPS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https?://(?:[^@/]+@)?[^/]+/(.+?)(?:\.git)?$").unwrap());

/// Detect platform (GitHub or GitLab) from a remote URL
///
/// Self-hosted instances are recognized through `GH_HOST` and `GITLAB_HOST`.
pub fn detect_platform(url: &str) -> Option<Platform> {
    let gh_host = env::var("GH_HOST").ok();
    let gitlab_host = env::var("GITLAB_HOST").ok();

    let hostname = extract_hostname(url)?;

    if hostname == "github.com"
        || hostname.ends_with(".github.com")
        || gh_host.as_ref().is_some_and(|h| hostname == *h)
    {
        return Some(Platform::GitHub);
    }

    if hostname == "gitlab.com"
        || hostname.ends_with(".gitlab.com")
        || gitlab_host.as_ref().is_some_and(|h| hostname == *h)
    {
        return Some(Platform::GitLab);
    }

    None
}

/// Parse repository info (owner/repo) from a remote URL
pub fn parse_repo_info(url: &str) -> Result<PlatformConfig> {
    let url = url.trim().trim_end_matches('/');

    let platform = detect_platform(url).ok_or(Error::NoSupportedRemotes)?;
    let hostname = extract_hostname(url);

    let path = RE_SSH
        .captures(url)
        .or_else(|| RE_HTTPS.captures(url))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .ok_or_else(|| Error::Config(format!("cannot parse remote URL: {url}")))?;

    // GitLab supports nested groups, so everything before the last segment is the owner
    let Some((owner, repo)) = path.rsplit_once('/') else {
        return Err(Error::Config(format!("invalid repo path: {path}")));
    };
    if owner.is_empty() || repo.is_empty() {
        return Err(Error::Config(format!("invalid repo path: {path}")));
    }

    let default_host = match platform {
        Platform::GitHub => "github.com",
        Platform::GitLab => "gitlab.com",
    };
    let host = hostname.filter(|h| h != default_host);

    Ok(PlatformConfig {
        platform,
        owner: owner.to_string(),
        repo: repo.to_string(),
        host,
    })
}

fn extract_hostname(url: &str) -> Option<String> {
    // scp-like SSH format
    if let Some(rest) = url.strip_prefix("git@") {
        return rest.split(':').next().map(ToString::to_string);
    }

    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(ToString::to_string))
}

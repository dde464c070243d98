//! Remote resource listing

use crate::error::Result;
use crate::platform::PlatformService;
use crate::stack::commit_id_from_branch;
use crate::types::PullRequest;
use tracing::debug;

/// An open PR paired with the commit id encoded in its head branch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteResource {
    /// The PR as reported by the platform
    pub pr: PullRequest,
    /// Commit id from `stack/{target}/{id}`; `None` for PRs this tool does not own
    pub commit_id: Option<String>,
}

impl RemoteResource {
    /// Pair a PR with the commit id its head branch encodes for `target`
    pub fn from_pr(target: &str, pr: PullRequest) -> Self {
        let commit_id = commit_id_from_branch(target, &pr.head_ref).map(ToString::to_string);
        Self { pr, commit_id }
    }

    /// Whether the PR belongs to this tool's stack on the target
    pub const fn is_owned(&self) -> bool {
        self.commit_id.is_some()
    }
}

/// List the current user's open PRs and derive their commit ids
pub async fn list_remote_resources(
    platform: &dyn PlatformService,
    target: &str,
) -> Result<Vec<RemoteResource>> {
    let prs = platform.list_open_prs().await?;
    let resources: Vec<RemoteResource> = prs
        .into_iter()
        .map(|pr| RemoteResource::from_pr(target, pr))
        .collect();

    debug!(
        total = resources.len(),
        owned = resources.iter().filter(|r| r.is_owned()).count(),
        "listed remote resources"
    );
    Ok(resources)
}

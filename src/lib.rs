//! stack-pr - stacked pull requests for git
//!
//! Every commit between the target branch and `HEAD` becomes one PR, each
//! based on the PR below it. Commits are matched to PRs through a stable
//! `commit-id:` trailer, so amends and rebases update the right PR.
//!
//! The crate is split into a pure planning core and two collaborators
//! behind traits: [`vcs::Vcs`] for the local repository and
//! [`platform::PlatformService`] for GitHub or GitLab.

pub mod auth;
pub mod config;
pub mod error;
pub mod merge;
pub mod platform;
pub mod reconcile;
pub mod stack;
pub mod status;
pub mod types;
pub mod vcs;

pub use error::{Error, Result};

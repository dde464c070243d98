//! CLI command implementations

mod amend;
mod context;
mod merge;
mod progress;
mod status;
mod style;
mod sync;
mod update;

pub use amend::run_amend;
pub use context::Scope;
pub use merge::run_merge;
pub use progress::CliProgress;
pub use status::run_status;
pub use sync::run_sync;
pub use update::{UpdateOptions, run_update};

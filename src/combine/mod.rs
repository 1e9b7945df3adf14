//! Combine engine
//!
//! - [`criteria`]: pure branch and label matching
//! - [`requirements`]: CI and approval checks against the status source
//! - [`branches`]: the branch/PR state machine for one repository
//! - [`coordinator`]: fetches PRs and drives everything across repositories

pub mod branches;
pub mod coordinator;
pub mod criteria;
pub mod requirements;

pub use branches::{CombineOutcome, combine_prs, generate_pr_body};
pub use coordinator::{CombineContext, fetch_open_pull_requests, process_repository, run};
pub use criteria::{branch_matches, labels_match, matches};
pub use requirements::{is_approved, is_ci_passing, meets_requirements};

use async_trait::async_trait;

/// Progress updates emitted while combining
#[async_trait]
pub trait ProgressCallback: Send + Sync {
    /// A human-readable status line
    async fn on_message(&self, message: &str);
}

/// Progress sink that drops every message
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgress;

#[async_trait]
impl ProgressCallback for NoopProgress {
    async fn on_message(&self, _message: &str) {}
}

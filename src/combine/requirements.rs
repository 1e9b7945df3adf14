//! CI and approval requirement checks

use crate::config::FilterConfig;
use crate::error::{Error, Result};
use crate::platform::StatusSource;
use crate::types::{PrStatus, Repo};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Check whether a PR satisfies the configured CI and approval requirements
///
/// Makes no query when neither requirement is enabled. A triggered
/// `cancel` token takes precedence over everything else and yields
/// [`Error::Cancelled`].
pub async fn meets_requirements(
    status_source: &dyn StatusSource,
    repo: &Repo,
    pr_number: u64,
    config: &FilterConfig,
    cancel: &CancellationToken,
) -> Result<bool> {
    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }

    if !config.has_requirements() {
        return Ok(true);
    }

    let status = tokio::select! {
        biased;
        () = cancel.cancelled() => return Err(Error::Cancelled),
        status = status_source.pr_status(repo, pr_number) => status?,
    };

    if config.require_ci && !is_ci_passing(&status) {
        debug!(%repo, pr_number, "PR does not pass CI");
        return Ok(false);
    }

    if config.require_approved && !is_approved(&status) {
        debug!(%repo, pr_number, review_decision = %status.review_decision, "PR is not approved");
        return Ok(false);
    }

    Ok(true)
}

/// CI passes when every reported rollup is exactly `SUCCESS`
///
/// A commit with no rollup at all (no checks configured) passes. No
/// commits means there is nothing to vouch for, so it fails.
pub fn is_ci_passing(status: &PrStatus) -> bool {
    if status.commits.is_empty() {
        return false;
    }
    status.commits.iter().all(|commit| {
        commit
            .rollup_state
            .as_deref()
            .is_none_or(|state| state == "SUCCESS")
    })
}

/// Approved, or the repository requires no review (empty decision)
pub fn is_approved(status: &PrStatus) -> bool {
    matches!(status.review_decision.as_str(), "APPROVED" | "")
}

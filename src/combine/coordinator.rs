//! Combination coordinator
//!
//! Fetches open PRs, runs them through the criteria and requirement gates,
//! enforces the minimum and hands the survivors to the branch orchestrator.
//! Repositories are processed one after another.

use crate::combine::{ProgressCallback, combine_prs, matches, meets_requirements};
use crate::config::{CombineOptions, FilterConfig};
use crate::error::{Error, Result};
use crate::platform::{RestClient, StatusSource, get_as};
use crate::stats::RunStats;
use crate::types::{PullRequest, Repo};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// PRs requested per page when listing
pub const PAGE_SIZE: usize = 100;

/// Everything a run needs, borrowed for its duration
#[derive(Clone, Copy)]
pub struct CombineContext<'a> {
    /// REST operations
    pub rest: &'a dyn RestClient,
    /// CI and review status lookups
    pub status: &'a dyn StatusSource,
    /// Which PRs qualify
    pub filters: &'a FilterConfig,
    /// How the combined branch and PR are produced
    pub options: &'a CombineOptions,
    /// Progress sink
    pub progress: &'a dyn ProgressCallback,
    /// Run-wide cancellation
    pub cancel: &'a CancellationToken,
}

fn check_cancelled(cancel: &CancellationToken) -> Result<()> {
    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }
    Ok(())
}

/// Fetch every open PR of `repo`, in listing order
///
/// Pages of [`PAGE_SIZE`] are requested until a short page comes back.
pub async fn fetch_open_pull_requests(
    rest: &dyn RestClient,
    repo: &Repo,
    cancel: &CancellationToken,
) -> Result<Vec<PullRequest>> {
    let mut pulls = Vec::new();
    let mut page = 1;

    loop {
        check_cancelled(cancel)?;

        let endpoint = format!(
            "{}/pulls?state=open&page={page}&per_page={PAGE_SIZE}",
            repo.api_path()
        );
        let batch: Vec<PullRequest> = get_as(rest, &endpoint).await?;
        let count = batch.len();
        debug!(%repo, page, count, "fetched pull request page");
        pulls.extend(batch);

        if count < PAGE_SIZE {
            break;
        }
        page += 1;
    }

    Ok(pulls)
}

/// Run one repository end to end, recording into `stats`
///
/// Recoverable per-PR problems only affect the counts. Errors returned from
/// here are fatal for this repository, or [`Error::Cancelled`].
pub async fn process_repository(
    ctx: CombineContext<'_>,
    repo: &Repo,
    stats: &mut RunStats,
) -> Result<()> {
    check_cancelled(ctx.cancel)?;
    ctx.progress
        .on_message(&format!("🔍 Fetching open PRs for {repo}"))
        .await;

    let pulls = fetch_open_pull_requests(ctx.rest, repo, ctx.cancel).await?;
    stats.repo_mut(repo).total_prs = pulls.len();
    check_cancelled(ctx.cancel)?;

    let mut matched = Vec::new();
    for pr in pulls {
        if !matches(
            &pr.head_ref,
            &pr.labels,
            ctx.filters,
            &ctx.options.combine_branch_name,
        ) {
            stats.skip_criteria(repo);
            continue;
        }

        match meets_requirements(ctx.status, repo, pr.number, ctx.filters, ctx.cancel).await {
            Ok(true) => matched.push(pr),
            Ok(false) => stats.skip_criteria(repo),
            Err(Error::Cancelled) => return Err(Error::Cancelled),
            Err(e) => {
                warn!(
                    %repo,
                    pr = pr.number,
                    error = %e,
                    "failed to check PR requirements, skipping"
                );
            }
        }
    }

    stats.repo_mut(repo).matched = matched.len();

    if matched.len() < ctx.filters.minimum {
        debug!(
            %repo,
            matched = matched.len(),
            required = ctx.filters.minimum,
            "not enough PRs match criteria"
        );
        stats.repo_mut(repo).not_enough_prs = true;
        return Ok(());
    }

    if ctx.options.dry_run {
        let refs: Vec<String> = matched.iter().map(PullRequest::combined_ref).collect();
        info!(%repo, prs = ?refs, "dry run: would combine PRs");
        ctx.progress
            .on_message(&format!("🧪 Dry run: {} PRs would be combined in {repo}", matched.len()))
            .await;
        return Ok(());
    }

    check_cancelled(ctx.cancel)?;
    let outcome = match combine_prs(ctx.rest, repo, &matched, ctx.options, ctx.progress).await {
        Ok(outcome) => outcome,
        Err(e) => {
            // The PR exists even though labels or assignees failed
            if let Error::PullRequestMetadata { number, .. } = &e {
                let link = repo.pull_url(*number);
                stats.repo_mut(repo).combined_pr_link = Some(link.clone());
                stats.combined_pr_links.push(link);
            }
            return Err(e);
        }
    };
    stats.record_outcome(repo, &outcome);
    debug!(
        %repo,
        combined = outcome.combined.len(),
        conflicts = outcome.conflicts.len(),
        "combined PRs"
    );
    check_cancelled(ctx.cancel)?;

    Ok(())
}

/// Process every repository in order and return the run totals
///
/// A repository failure is recorded in its stats and the loop moves on.
/// Cancellation stops the loop and is returned as [`Error::Cancelled`].
pub async fn run(ctx: CombineContext<'_>, repos: &[Repo]) -> Result<RunStats> {
    let mut stats = RunStats::new();

    for repo in repos {
        check_cancelled(ctx.cancel)?;
        ctx.progress.on_message(&format!("Processing {repo}")).await;
        debug!(%repo, "processing repository");
        stats.repo_mut(repo);

        match process_repository(ctx, repo, &mut stats).await {
            Ok(()) => stats.repos_processed += 1,
            Err(Error::Cancelled) => return Err(Error::Cancelled),
            Err(e) => {
                warn!(%repo, error = %e, "failed to process repository");
                stats.repo_mut(repo).error = Some(e.to_string());
            }
        }
    }

    stats.finish();
    Ok(stats)
}

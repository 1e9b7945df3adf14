//! Branch orchestration - effectful operations for one repository
//!
//! Builds the combined branch from a list of already-matched PRs and opens
//! the result PR. The steps run in a fixed order:
//!
//! 1. resolve the base branch and its commit
//! 2. delete any leftover working/combined branches
//! 3. create both branches at the base commit
//! 4. merge every PR head into the working branch, in order
//! 5. force-update the combined branch to the working branch
//! 6. delete the working branch
//! 7. open the combined PR and attach labels/assignees
//!
//! Failures in steps 1, 3, 5 and 7 are fatal for the repository. Everything
//! else only affects logging and the conflict list.

use crate::combine::ProgressCallback;
use crate::config::CombineOptions;
use crate::error::{Error, Result};
use crate::platform::{RestClient, get_as, post_as};
use crate::types::{PullRequest, Repo};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

/// Title of the combined PR
pub const COMBINED_PR_TITLE: &str = "Combined PRs";

/// Result of combining one repository's PRs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CombineOutcome {
    /// Merged PRs, as `#N - title`
    pub combined: Vec<String>,
    /// PRs that could not be merged, as `#N`
    pub conflicts: Vec<String>,
    /// Number of the combined PR, once created
    pub pr_number: Option<u64>,
    /// Web link to the combined PR
    pub pr_link: Option<String>,
}

#[derive(Deserialize)]
struct RepositoryInfo {
    default_branch: String,
}

#[derive(Deserialize)]
struct GitRef {
    object: GitObject,
}

#[derive(Deserialize)]
struct GitObject {
    sha: String,
}

#[derive(Deserialize)]
struct CreatedPull {
    number: u64,
}

/// Combine `pulls` into the combined branch and open the combined PR
///
/// Once started, all steps run to completion; cancellation is observed by
/// the caller between repositories.
pub async fn combine_prs(
    rest: &dyn RestClient,
    repo: &Repo,
    pulls: &[PullRequest],
    options: &CombineOptions,
    progress: &dyn ProgressCallback,
) -> Result<CombineOutcome> {
    let combine_branch = options.combine_branch_name.as_str();
    let working_branch = options.working_branch_name();

    // 1. Resolve base
    let base_branch = match &options.base_branch {
        Some(branch) => branch.clone(),
        None => default_branch(rest, repo).await?,
    };
    let base_sha = branch_sha(rest, repo, &base_branch)
        .await
        .map_err(|e| Error::BaseBranch(format!("{base_branch}: {e}")))?;
    debug!(%repo, base_branch, base_sha, "resolved base branch");

    // 2. Clean slate
    if let Err(e) = delete_branch(rest, repo, &working_branch).await {
        debug!(%repo, branch = %working_branch, error = %e, "working branch not deleted");
    }
    if let Err(e) = delete_branch(rest, repo, combine_branch).await {
        debug!(%repo, branch = combine_branch, error = %e, "combined branch not deleted");
    }

    // 3. Branch creation
    progress
        .on_message(&format!("🌿 Creating {combine_branch} from {base_branch}"))
        .await;
    create_branch(rest, repo, combine_branch, &base_sha)
        .await
        .map_err(|e| Error::BranchCreation(format!("{combine_branch}: {e}")))?;
    if let Err(e) = create_branch(rest, repo, &working_branch, &base_sha).await {
        // Only the old branches may be gone after a failed creation
        if let Err(cleanup) = delete_branch(rest, repo, combine_branch).await {
            warn!(
                %repo,
                branch = combine_branch,
                error = %cleanup,
                "failed to remove combined branch"
            );
        }
        return Err(Error::BranchCreation(format!("{working_branch}: {e}")));
    }

    // 4. Sequential merge
    let mut outcome = CombineOutcome::default();
    for pr in pulls {
        progress
            .on_message(&format!("🔀 Merging PR #{}: {}", pr.number, pr.title))
            .await;

        match merge_branch(rest, repo, &working_branch, &pr.head_ref).await {
            Ok(()) => {
                debug!(%repo, branch = %pr.head_ref, "merged branch");
                outcome.combined.push(pr.combined_ref());
            }
            Err(e) if e.is_merge_conflict() => {
                debug!(%repo, branch = %pr.head_ref, error = %e, "merge conflict");
                outcome.conflicts.push(pr.short_ref());
            }
            Err(e) => {
                warn!(%repo, branch = %pr.head_ref, error = %e, "failed to merge branch");
                outcome.conflicts.push(pr.short_ref());
            }
        }
    }

    // 5. Promote working to combined
    promote_branch(rest, repo, combine_branch, &working_branch)
        .await
        .map_err(|e| Error::BranchPromotion(format!("{combine_branch}: {e}")))?;

    // 6. Working branch teardown
    if let Err(e) = delete_branch(rest, repo, &working_branch).await {
        warn!(%repo, branch = %working_branch, error = %e, "failed to delete working branch");
    }

    // 7. Result PR
    progress.on_message("📝 Opening combined PR").await;
    let body = generate_pr_body(
        &outcome.combined,
        &outcome.conflicts,
        &options.command,
        options.autoclose,
    );
    let number =
        create_pull_request(rest, repo, combine_branch, &base_branch, &body, options).await?;
    outcome.pr_number = Some(number);
    outcome.pr_link = Some(repo.pull_url(number));

    Ok(outcome)
}

/// Render the combined PR body
pub fn generate_pr_body(
    combined: &[String],
    conflicts: &[String],
    command: &str,
    autoclose: bool,
) -> String {
    let mut body = String::from("✅ The following pull requests have been successfully combined:\n");
    for pr in combined {
        if autoclose {
            body.push_str(&format!("- Closes {pr}\n"));
        } else {
            body.push_str(&format!("- {pr}\n"));
        }
    }

    if !conflicts.is_empty() {
        body.push_str("\n⚠️ The following pull requests could not be merged due to conflicts:\n");
        for pr in conflicts {
            body.push_str(&format!("- {pr}\n"));
        }
    }

    body.push_str("\n> Generated with pr-combine\n");
    body.push_str(&format!("\nCommand used: `{command}`"));
    body
}

async fn default_branch(rest: &dyn RestClient, repo: &Repo) -> Result<String> {
    let info: RepositoryInfo = get_as(rest, &repo.api_path())
        .await
        .map_err(|e| Error::BaseBranch(format!("default branch of {repo}: {e}")))?;
    Ok(info.default_branch)
}

/// Branch name as a URL path, keeping `/` as the separator
///
/// `#`, `?` and `%` are valid in branch names but not in a raw path.
fn branch_path(branch: &str) -> String {
    branch
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

async fn branch_sha(rest: &dyn RestClient, repo: &Repo, branch: &str) -> Result<String> {
    let endpoint = format!("{}/git/ref/heads/{}", repo.api_path(), branch_path(branch));
    let git_ref: GitRef = get_as(rest, &endpoint).await?;
    Ok(git_ref.object.sha)
}

async fn delete_branch(rest: &dyn RestClient, repo: &Repo, branch: &str) -> Result<()> {
    let endpoint = format!("{}/git/refs/heads/{}", repo.api_path(), branch_path(branch));
    rest.delete(&endpoint).await?;
    Ok(())
}

async fn create_branch(rest: &dyn RestClient, repo: &Repo, branch: &str, sha: &str) -> Result<()> {
    let endpoint = format!("{}/git/refs", repo.api_path());
    rest.post(
        &endpoint,
        &json!({ "ref": format!("refs/heads/{branch}"), "sha": sha }),
    )
    .await?;
    Ok(())
}

async fn merge_branch(rest: &dyn RestClient, repo: &Repo, base: &str, head: &str) -> Result<()> {
    let endpoint = format!("{}/merges", repo.api_path());
    rest.post(&endpoint, &json!({ "base": base, "head": head }))
        .await?;
    Ok(())
}

/// Point `target` at the current commit of `source`
async fn promote_branch(
    rest: &dyn RestClient,
    repo: &Repo,
    target: &str,
    source: &str,
) -> Result<()> {
    let sha = branch_sha(rest, repo, source).await?;
    let endpoint = format!("{}/git/refs/heads/{}", repo.api_path(), branch_path(target));
    rest.patch(&endpoint, &json!({ "sha": sha, "force": true }))
        .await?;
    debug!(%repo, target, source, sha, "promoted branch");
    Ok(())
}

async fn create_pull_request(
    rest: &dyn RestClient,
    repo: &Repo,
    head: &str,
    base: &str,
    body: &str,
    options: &CombineOptions,
) -> Result<u64> {
    let endpoint = format!("{}/pulls", repo.api_path());
    let created: CreatedPull = post_as(
        rest,
        &endpoint,
        &json!({
            "title": COMBINED_PR_TITLE,
            "head": head,
            "base": base,
            "body": body,
        }),
    )
    .await
    .map_err(|e| Error::PullRequestCreation(e.to_string()))?;
    let number = created.number;
    debug!(%repo, number, "created combined PR");

    if !options.add_labels.is_empty() {
        let endpoint = format!("{}/issues/{number}/labels", repo.api_path());
        rest.post(&endpoint, &json!({ "labels": options.add_labels }))
            .await
            .map_err(|e| Error::PullRequestMetadata {
                number,
                message: format!("failed to add labels: {e}"),
            })?;
    }

    if !options.add_assignees.is_empty() {
        let endpoint = format!("{}/issues/{number}/assignees", repo.api_path());
        rest.post(&endpoint, &json!({ "assignees": options.add_assignees }))
            .await
            .map_err(|e| Error::PullRequestMetadata {
                number,
                message: format!("failed to add assignees: {e}"),
            })?;
    }

    Ok(number)
}

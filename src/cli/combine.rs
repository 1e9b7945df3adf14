//! Combine command - the single command of the binary

use crate::cli::output::display_stats;
use crate::cli::style::Stylize;
use crate::cli::{Args, CliProgress, OutputFormat};
use anstream::eprintln;
use pr_combine::auth::get_github_auth;
use pr_combine::combine::{CombineContext, run};
use pr_combine::config::{CombineOptions, FileConfig, FilterConfig, load_config};
use pr_combine::error::Result;
use pr_combine::platform::GitHubService;
use pr_combine::repos::parse_repositories;
use pr_combine::stats::RunStats;
use pr_combine::types::Repo;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Everything resolved from flags and the config file before any network call
#[derive(Debug)]
pub struct Inputs {
    /// Repositories to process, in order
    pub repos: Vec<Repo>,
    /// PR filters
    pub filters: FilterConfig,
    /// Combined branch/PR options
    pub options: CombineOptions,
}

/// Run the combine command
///
/// Returns the run statistics; validation, auth and cancellation errors are
/// returned as `Err`.
pub async fn run_combine(args: Args, command: String) -> Result<RunStats> {
    let file_config = load_config(args.config.as_deref())?;
    let inputs = resolve_inputs(&args, file_config, command)?;

    if inputs.filters.is_unfiltered() {
        eprintln!(
            "{}",
            "⚠️  No filters specified: every open PR will be combined.".warn()
        );
        eprintln!(
            "{}",
            "   Use --labels, --branch-prefix, --dependabot or similar to narrow the selection."
                .muted()
        );
    }

    let auth = get_github_auth(args.host.as_deref()).await?;
    debug!(source = ?auth.source, "resolved GitHub token");
    let service = GitHubService::new(&auth.token, auth.host.as_deref())?;

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, stopping after the current step");
            interrupt.cancel();
        }
    });

    let progress = if args.output == OutputFormat::Json {
        CliProgress::hidden()
    } else {
        CliProgress::compact()
    };

    let ctx = CombineContext {
        rest: &service,
        status: &service,
        filters: &inputs.filters,
        options: &inputs.options,
        progress: &progress,
        cancel: &cancel,
    };
    let result = run(ctx, &inputs.repos).await;
    progress.finish();
    let stats = result?;

    if !args.no_stats {
        display_stats(&stats, args.output, inputs.options.dry_run)?;
    }

    Ok(stats)
}

/// Layer command-line flags over the config file
///
/// Flags win. List flags replace the file's list when given. Boolean flags
/// can only switch a setting on.
pub fn resolve_inputs(args: &Args, file: FileConfig, command: String) -> Result<Inputs> {
    let FileConfig {
        owner,
        repos: file_repos,
        mut filters,
        combine: mut options,
    } = file;
    let owner = args.owner.clone().or(owner);

    if args.branch_prefix.is_some() {
        filters.branch_prefix.clone_from(&args.branch_prefix);
    }
    if args.branch_suffix.is_some() {
        filters.branch_suffix.clone_from(&args.branch_suffix);
    }
    if args.branch_regex.is_some() {
        filters.branch_regex.clone_from(&args.branch_regex);
    }
    if !args.labels.is_empty() {
        filters.select_labels.clone_from(&args.labels);
    }
    if !args.ignore_labels.is_empty() {
        filters.ignore_labels.clone_from(&args.ignore_labels);
    }
    filters.case_sensitive_labels |= args.case_sensitive_labels;
    filters.require_ci |= args.require_ci;
    filters.require_approved |= args.require_approved;
    if let Some(minimum) = args.minimum {
        filters.minimum = minimum;
    }
    if args.dependabot {
        filters = filters.with_dependabot();
    }

    if !args.add_labels.is_empty() {
        options.add_labels.clone_from(&args.add_labels);
    }
    if !args.add_assignees.is_empty() {
        options.add_assignees.clone_from(&args.add_assignees);
    }
    options.autoclose |= args.autoclose;
    if args.base_branch.is_some() {
        options.base_branch.clone_from(&args.base_branch);
    }
    if let Some(name) = &args.combine_branch_name {
        options.combine_branch_name.clone_from(name);
    }
    if let Some(suffix) = &args.working_branch_suffix {
        options.working_branch_suffix.clone_from(suffix);
    }
    options.dry_run = args.dry_run;
    options.command = command;

    filters.validate()?;
    options.validate()?;

    // Config-file repositories only apply when none are given explicitly
    let repo_args = if args.repos.is_empty() && args.file.is_none() {
        file_repos
    } else {
        args.repos.clone()
    };
    let repos = parse_repositories(&repo_args, args.file.as_deref(), owner.as_deref())?;

    Ok(Inputs {
        repos,
        filters,
        options,
    })
}

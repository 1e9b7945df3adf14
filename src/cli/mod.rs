//! Command-line interface

mod combine;
pub mod output;
pub mod style;

pub use combine::run_combine;

use async_trait::async_trait;
use clap::{Parser, ValueEnum};
use indicatif::ProgressBar;
use pr_combine::combine::ProgressCallback;
use std::path::PathBuf;
use std::time::Duration;
use style::spinner_style;

/// Combine multiple pull requests into a single PR
///
/// You should use some form of filtering to avoid combining every open PR
/// in a repository: --labels, --ignore-labels, --branch-prefix,
/// --branch-suffix, --branch-regex, --dependabot, --require-ci or
/// --require-approved.
#[derive(Debug, Parser)]
#[command(name = "combine", version, about, long_about)]
#[allow(clippy::struct_excessive_bools)]
pub struct Args {
    /// Repositories (`owner/repo`), space or comma separated
    #[arg(value_name = "REPO")]
    pub repos: Vec<String>,

    /// Read repositories from a file (one per line, `#` comments allowed)
    #[arg(long, value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Default owner for repositories given without one
    #[arg(long)]
    pub owner: Option<String>,

    /// Only combine PRs whose head branch starts with this
    #[arg(long)]
    pub branch_prefix: Option<String>,

    /// Only combine PRs whose head branch ends with this
    #[arg(long)]
    pub branch_suffix: Option<String>,

    /// Only combine PRs whose head branch matches this regex
    #[arg(long)]
    pub branch_regex: Option<String>,

    /// Only combine dependabot PRs (branch prefix `dependabot/`)
    #[arg(long)]
    pub dependabot: bool,

    /// Only combine PRs carrying all of these labels
    #[arg(long, value_delimiter = ',')]
    pub labels: Vec<String>,

    /// Never combine PRs carrying any of these labels
    #[arg(long, value_delimiter = ',')]
    pub ignore_labels: Vec<String>,

    /// Compare labels case-sensitively
    #[arg(long)]
    pub case_sensitive_labels: bool,

    /// Only combine PRs whose latest commit passes CI
    #[arg(long)]
    pub require_ci: bool,

    /// Only combine approved PRs
    #[arg(long)]
    pub require_approved: bool,

    /// Minimum number of matching PRs needed to combine [default: 2]
    #[arg(long)]
    pub minimum: Option<usize>,

    /// Labels to add to the combined PR
    #[arg(long, value_delimiter = ',')]
    pub add_labels: Vec<String>,

    /// Users to assign to the combined PR
    #[arg(long, value_delimiter = ',')]
    pub add_assignees: Vec<String>,

    /// Close the combined PRs when the combined PR merges
    #[arg(long)]
    pub autoclose: bool,

    /// Base branch for the combined PR [default: repository default branch]
    #[arg(long)]
    pub base_branch: Option<String>,

    /// Name of the combined branch [default: combined-prs]
    #[arg(long)]
    pub combine_branch_name: Option<String>,

    /// Suffix for the temporary working branch [default: -working]
    #[arg(long)]
    pub working_branch_suffix: Option<String>,

    /// Show which PRs would be combined without changing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Do not print the run summary
    #[arg(long)]
    pub no_stats: bool,

    /// Summary format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub output: OutputFormat,

    /// GitHub Enterprise host (e.g. `github.example.com`)
    #[arg(long)]
    pub host: Option<String>,

    /// Config file [default: <config dir>/pr-combine/config.toml]
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Run summary format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Boxed table
    Table,
    /// Plain text lines
    Plain,
    /// Pretty-printed JSON
    Json,
}

/// Spinner-backed progress reporting
pub struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    /// Single-line spinner that rewrites itself on every message
    pub fn compact() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(spinner_style());
        spinner.enable_steady_tick(Duration::from_millis(80));
        Self { spinner }
    }

    /// Progress that prints nothing (used when output is machine-readable)
    pub fn hidden() -> Self {
        Self {
            spinner: ProgressBar::hidden(),
        }
    }

    /// Stop and erase the spinner
    pub fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

#[async_trait]
impl ProgressCallback for CliProgress {
    async fn on_message(&self, message: &str) {
        self.spinner.set_message(message.to_string());
    }
}

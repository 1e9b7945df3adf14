//! Run statistics
//!
//! Plain accumulators filled in by the coordinator and read by the output
//! layer. There is a single writer, so no synchronization is needed.

use crate::combine::CombineOutcome;
use crate::types::Repo;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// Per-repository breakdown
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoStats {
    /// `owner/repo`
    pub repo_name: String,
    /// PRs merged into the combined branch
    pub combined_count: usize,
    /// PRs that could not be merged
    pub skipped_merge_conflict: usize,
    /// PRs that failed the criteria or requirement gates
    pub skipped_criteria: usize,
    /// PRs that passed every gate
    pub matched: usize,
    /// Link to the combined PR, if one was opened
    #[serde(rename = "combinedPRLink", skip_serializing_if = "Option::is_none")]
    pub combined_pr_link: Option<String>,
    /// Fewer PRs than the configured minimum passed the gates
    #[serde(rename = "notEnoughPRs")]
    pub not_enough_prs: bool,
    /// Open PRs fetched
    #[serde(rename = "totalPRs")]
    pub total_prs: usize,
    /// Error that stopped this repository, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Summary status of one repository
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepoStatus {
    /// Combined (or, in a dry run, matched) successfully
    Ok,
    /// The repository had no open PRs
    NoOpenPrs,
    /// Fewer matching PRs than the minimum
    NotEnough,
    /// Processing failed
    Failed,
}

impl RepoStatus {
    /// Label used in the summary table
    pub const fn label(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::NoOpenPrs => "NO OPEN PRs",
            Self::NotEnough => "NOT ENOUGH",
            Self::Failed => "FAILED",
        }
    }
}

impl RepoStats {
    /// Empty stats for a repository
    pub fn new(repo: &Repo) -> Self {
        Self {
            repo_name: repo.to_string(),
            ..Self::default()
        }
    }

    /// Summary status
    pub const fn status(&self) -> RepoStatus {
        if self.error.is_some() {
            RepoStatus::Failed
        } else if self.total_prs == 0 {
            RepoStatus::NoOpenPrs
        } else if self.not_enough_prs {
            RepoStatus::NotEnough
        } else {
            RepoStatus::Ok
        }
    }
}

/// Totals for a whole run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStats {
    /// Repositories processed without error
    pub repos_processed: usize,
    /// PRs combined across all repositories
    pub prs_combined: usize,
    /// PRs skipped for merge conflicts across all repositories
    pub prs_skipped_merge_conflict: usize,
    /// PRs skipped by criteria or requirements across all repositories
    pub prs_skipped_criteria: usize,
    /// Per-repository breakdown, keyed by `owner/repo`
    #[serde(rename = "perRepoStats")]
    pub per_repo: BTreeMap<String, RepoStats>,
    /// Links to every combined PR opened
    #[serde(rename = "combinedPRLinks")]
    pub combined_pr_links: Vec<String>,
    /// When the run started
    pub start_time: DateTime<Utc>,
    /// When the run finished
    pub end_time: Option<DateTime<Utc>>,
}

impl Default for RunStats {
    fn default() -> Self {
        Self::new()
    }
}

impl RunStats {
    /// Start a run now
    pub fn new() -> Self {
        Self {
            repos_processed: 0,
            prs_combined: 0,
            prs_skipped_merge_conflict: 0,
            prs_skipped_criteria: 0,
            per_repo: BTreeMap::new(),
            combined_pr_links: Vec::new(),
            start_time: Utc::now(),
            end_time: None,
        }
    }

    /// Stats entry for `repo`, created on first use
    pub fn repo_mut(&mut self, repo: &Repo) -> &mut RepoStats {
        self.per_repo
            .entry(repo.to_string())
            .or_insert_with(|| RepoStats::new(repo))
    }

    /// Count one PR skipped by criteria or requirements
    pub fn skip_criteria(&mut self, repo: &Repo) {
        self.repo_mut(repo).skipped_criteria += 1;
        self.prs_skipped_criteria += 1;
    }

    /// Fold a combine outcome into the repository and run totals
    pub fn record_outcome(&mut self, repo: &Repo, outcome: &CombineOutcome) {
        let repo_stats = self.repo_mut(repo);
        repo_stats.combined_count += outcome.combined.len();
        repo_stats.skipped_merge_conflict += outcome.conflicts.len();
        repo_stats.combined_pr_link.clone_from(&outcome.pr_link);

        self.prs_combined += outcome.combined.len();
        self.prs_skipped_merge_conflict += outcome.conflicts.len();
        if let Some(link) = &outcome.pr_link {
            self.combined_pr_links.push(link.clone());
        }
    }

    /// Mark the run as finished now
    pub fn finish(&mut self) {
        self.end_time = Some(Utc::now());
    }

    /// Run duration, measured to now if the run is still going
    pub fn elapsed(&self) -> Duration {
        let end = self.end_time.unwrap_or_else(Utc::now);
        (end - self.start_time).to_std().unwrap_or_default()
    }

    /// Whether any repository failed
    pub fn has_failures(&self) -> bool {
        self.per_repo.values().any(|r| r.error.is_some())
    }
}

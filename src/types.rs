//! Core types for pr-combine

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A GitHub repository identifier (`owner/repo`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Repo {
    /// Repository owner (user or organization)
    pub owner: String,
    /// Repository name
    pub name: String,
}

impl Repo {
    /// Parse an `owner/repo` string
    ///
    /// Both parts must be non-empty and there must be exactly one `/`.
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        let mut parts = s.split('/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(owner), Some(name), None) if !owner.is_empty() && !name.is_empty() => Ok(Self {
                owner: owner.to_string(),
                name: name.to_string(),
            }),
            _ => Err(Error::InvalidRepository(s.to_string())),
        }
    }

    /// Parse a repository, filling in `default_owner` for bare `repo` names
    pub fn parse_with_owner(s: &str, default_owner: Option<&str>) -> Result<Self> {
        let s = s.trim();
        match default_owner {
            Some(owner) if !owner.is_empty() && !s.is_empty() && !s.contains('/') => {
                Self::parse(&format!("{owner}/{s}"))
            }
            _ => Self::parse(s),
        }
    }

    /// REST path prefix for this repository (`repos/{owner}/{name}`)
    pub fn api_path(&self) -> String {
        format!("repos/{}/{}", self.owner, self.name)
    }

    /// Web URL of a pull request in this repository
    pub fn pull_url(&self, number: u64) -> String {
        format!("https://github.com/{}/{}/pull/{number}", self.owner, self.name)
    }
}

impl FromStr for Repo {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl std::fmt::Display for Repo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// An open pull request, as listed by the REST API
///
/// Snapshot taken once per run; never mutated locally.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawPullRequest")]
pub struct PullRequest {
    /// PR number (unique within the repository)
    pub number: u64,
    /// PR title
    pub title: String,
    /// Head branch name
    pub head_ref: String,
    /// Base branch name
    pub base_ref: String,
    /// Base commit SHA at fetch time
    pub base_sha: String,
    /// Label names, in API order
    pub labels: Vec<String>,
}

impl PullRequest {
    /// Reference used in the combined list and PR body (`#N - title`)
    pub fn combined_ref(&self) -> String {
        format!("#{} - {}", self.number, self.title)
    }

    /// Reference used in the conflict list (`#N`)
    pub fn short_ref(&self) -> String {
        format!("#{}", self.number)
    }
}

// Wire shape of `GET repos/{o}/{r}/pulls`

#[derive(Deserialize)]
struct RawPullRequest {
    number: u64,
    #[serde(default)]
    title: Option<String>,
    head: RawBranch,
    base: RawBranch,
    #[serde(default)]
    labels: Vec<RawLabel>,
}

#[derive(Deserialize)]
struct RawBranch {
    #[serde(rename = "ref")]
    ref_field: String,
    #[serde(default)]
    sha: String,
}

#[derive(Deserialize)]
struct RawLabel {
    name: String,
}

impl From<RawPullRequest> for PullRequest {
    fn from(pr: RawPullRequest) -> Self {
        Self {
            number: pr.number,
            title: pr.title.unwrap_or_default(),
            head_ref: pr.head.ref_field,
            base_ref: pr.base.ref_field,
            base_sha: pr.base.sha,
            labels: pr.labels.into_iter().map(|l| l.name).collect(),
        }
    }
}

/// Status of the most recent commit of a PR
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitStatus {
    /// Aggregate check-rollup state (`SUCCESS`, `FAILURE`, `PENDING`, ...)
    ///
    /// `None` when the commit has no checks or statuses at all.
    pub rollup_state: Option<String>,
}

/// Combined CI and review status of a PR
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrStatus {
    /// Review decision (`APPROVED`, `CHANGES_REQUESTED`, `REVIEW_REQUIRED`)
    ///
    /// Empty when the repository requires no reviews.
    pub review_decision: String,
    /// Most recent commit(s); at most one with the default query
    pub commits: Vec<CommitStatus>,
}

//! Shared test fixtures

#![allow(dead_code)]

mod mock_github;

pub use mock_github::{MockGitHub, RestCall};

use pr_combine::combine::{CombineContext, NoopProgress};
use pr_combine::config::{CombineOptions, FilterConfig};
use pr_combine::types::{CommitStatus, PrStatus, PullRequest, Repo};
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

/// Parse a repository identifier
pub fn repo(s: &str) -> Repo {
    Repo::parse(s).unwrap()
}

/// Open PR as returned by `GET repos/{o}/{r}/pulls`
pub fn make_pr_json(number: u64, head: &str, title: &str, labels: &[&str]) -> Value {
    json!({
        "number": number,
        "title": title,
        "head": { "ref": head, "sha": format!("head-{number}") },
        "base": { "ref": "main", "sha": "abc123" },
        "labels": labels.iter().map(|l| json!({ "name": l })).collect::<Vec<_>>(),
    })
}

/// Open PR value
pub fn make_pr(number: u64, head: &str, title: &str) -> PullRequest {
    serde_json::from_value(make_pr_json(number, head, title, &[])).unwrap()
}

/// Status with the given review decision and a single commit rollup
pub fn status(review_decision: &str, rollup: Option<&str>) -> PrStatus {
    PrStatus {
        review_decision: review_decision.to_string(),
        commits: vec![CommitStatus {
            rollup_state: rollup.map(ToString::to_string),
        }],
    }
}

/// Status that passes both CI and approval checks
pub fn passing_status() -> PrStatus {
    status("APPROVED", Some("SUCCESS"))
}

/// Label list
pub fn labels(v: &[&str]) -> Vec<String> {
    v.iter().map(ToString::to_string).collect()
}

/// `octo/demo` with default branch `main` at `abc123` and PRs #1..#3 on `dep/a..c`
pub fn demo_github() -> MockGitHub {
    let github = MockGitHub::new();
    github.setup_repo("octo/demo", "main", "abc123");
    github.add_pull("octo/demo", make_pr_json(1, "dep/a", "Bump a", &[]));
    github.add_pull("octo/demo", make_pr_json(2, "dep/b", "Bump b", &[]));
    github.add_pull("octo/demo", make_pr_json(3, "dep/c", "Bump c", &[]));
    github
}

/// Context over `github` with a shared no-op progress sink
pub fn context<'a>(
    github: &'a MockGitHub,
    filters: &'a FilterConfig,
    options: &'a CombineOptions,
    cancel: &'a CancellationToken,
) -> CombineContext<'a> {
    CombineContext {
        rest: github,
        status: github,
        filters,
        options,
        progress: &NoopProgress,
        cancel,
    }
}

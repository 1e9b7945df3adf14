//! In-memory GitHub backing the engine tests
//!
//! Holds branch refs and open PRs per repository and records every call.

#![allow(dead_code)]

use async_trait::async_trait;
use pr_combine::error::{Error, Result};
use pr_combine::platform::{RestClient, StatusSource};
use pr_combine::types::{PrStatus, Repo};
use serde_json::{Value, json};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio_util::sync::CancellationToken;

/// One recorded REST call
#[derive(Debug, Clone, PartialEq)]
pub struct RestCall {
    pub method: &'static str,
    pub endpoint: String,
    pub body: Option<Value>,
}

impl RestCall {
    /// Whether this call changes repository state
    pub fn is_mutation(&self) -> bool {
        self.method != "GET"
    }
}

/// Repository state held by the mock
#[derive(Debug, Clone, Default)]
struct MockRepo {
    default_branch: String,
    /// branch name -> commit sha
    branches: HashMap<String, String>,
    /// Open PRs as returned by the pulls listing
    pulls: Vec<Value>,
}

/// Mock GitHub implementing both `RestClient` and `StatusSource`
///
/// Features:
/// - Branch refs that are created, moved and deleted by the REST calls
/// - Paged PR listing honoring `page` and `per_page`
/// - Per-head merge conflicts and merge failures
/// - Call tracking for verification
/// - Error injection for failure path testing
pub struct MockGitHub {
    repos: Mutex<HashMap<String, MockRepo>>,
    next_pr_number: AtomicU64,
    merge_counter: AtomicU64,
    // Merge behaviour per PR head
    conflict_heads: Mutex<HashSet<String>>,
    failing_heads: Mutex<HashSet<String>>,
    // Status query responses
    statuses: Mutex<HashMap<u64, PrStatus>>,
    status_errors: Mutex<HashSet<u64>>,
    cancel_on_status: Mutex<Option<CancellationToken>>,
    // Call tracking
    calls: Mutex<Vec<RestCall>>,
    status_calls: Mutex<Vec<u64>>,
    // Error injection
    error_on_get_repo: Mutex<Option<String>>,
    error_on_create_ref: Mutex<Option<String>>,
    error_on_update_ref: Mutex<Option<String>>,
    error_on_delete_ref: Mutex<Option<String>>,
    error_on_create_pr: Mutex<Option<String>>,
    error_on_add_labels: Mutex<Option<String>>,
    error_on_add_assignees: Mutex<Option<String>>,
}

impl Default for MockGitHub {
    fn default() -> Self {
        Self::new()
    }
}

impl MockGitHub {
    /// Empty mock; PR numbers for created PRs start at 100
    pub fn new() -> Self {
        Self {
            repos: Mutex::new(HashMap::new()),
            next_pr_number: AtomicU64::new(100),
            merge_counter: AtomicU64::new(1),
            conflict_heads: Mutex::new(HashSet::new()),
            failing_heads: Mutex::new(HashSet::new()),
            statuses: Mutex::new(HashMap::new()),
            status_errors: Mutex::new(HashSet::new()),
            cancel_on_status: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
            status_calls: Mutex::new(Vec::new()),
            error_on_get_repo: Mutex::new(None),
            error_on_create_ref: Mutex::new(None),
            error_on_update_ref: Mutex::new(None),
            error_on_delete_ref: Mutex::new(None),
            error_on_create_pr: Mutex::new(None),
            error_on_add_labels: Mutex::new(None),
            error_on_add_assignees: Mutex::new(None),
        }
    }

    // === Setup methods ===

    /// Add a repository whose default branch points at `sha`
    pub fn setup_repo(&self, repo: &str, default_branch: &str, sha: &str) {
        let mut state = MockRepo {
            default_branch: default_branch.to_string(),
            ..MockRepo::default()
        };
        state
            .branches
            .insert(default_branch.to_string(), sha.to_string());
        self.repos.lock().unwrap().insert(repo.to_string(), state);
    }

    /// Add an open PR (JSON as returned by the REST listing)
    pub fn add_pull(&self, repo: &str, pull: Value) {
        self.repos
            .lock()
            .unwrap()
            .get_mut(repo)
            .expect("setup_repo first")
            .pulls
            .push(pull);
    }

    /// Create a branch directly
    pub fn add_branch(&self, repo: &str, branch: &str, sha: &str) {
        self.repos
            .lock()
            .unwrap()
            .get_mut(repo)
            .expect("setup_repo first")
            .branches
            .insert(branch.to_string(), sha.to_string());
    }

    /// Merging this head branch answers with a 409 conflict
    pub fn conflict_on(&self, head: &str) {
        self.conflict_heads.lock().unwrap().insert(head.to_string());
    }

    /// Merging this head branch fails with a non-conflict error
    pub fn fail_merge_of(&self, head: &str) {
        self.failing_heads.lock().unwrap().insert(head.to_string());
    }

    /// Status returned for a PR (default: empty decision, one SUCCESS commit)
    pub fn set_status(&self, pr_number: u64, status: PrStatus) {
        self.statuses.lock().unwrap().insert(pr_number, status);
    }

    /// Status query for this PR fails
    pub fn fail_status(&self, pr_number: u64) {
        self.status_errors.lock().unwrap().insert(pr_number);
    }

    /// Cancel `token` during the first status query
    pub fn cancel_on_status(&self, token: CancellationToken) {
        *self.cancel_on_status.lock().unwrap() = Some(token);
    }

    // === Error injection methods ===

    /// Make `GET repos/{o}/{r}` fail
    pub fn fail_get_repo(&self, msg: &str) {
        *self.error_on_get_repo.lock().unwrap() = Some(msg.to_string());
    }

    /// Make creating the named ref fail
    pub fn fail_create_ref(&self, branch: &str) {
        *self.error_on_create_ref.lock().unwrap() = Some(branch.to_string());
    }

    /// Make every force-update of a ref fail
    pub fn fail_update_ref(&self, msg: &str) {
        *self.error_on_update_ref.lock().unwrap() = Some(msg.to_string());
    }

    /// Make deleting the named ref fail (even if it exists)
    pub fn fail_delete_ref(&self, branch: &str) {
        *self.error_on_delete_ref.lock().unwrap() = Some(branch.to_string());
    }

    /// Make PR creation fail
    pub fn fail_create_pr(&self, msg: &str) {
        *self.error_on_create_pr.lock().unwrap() = Some(msg.to_string());
    }

    /// Make adding labels fail
    pub fn fail_add_labels(&self, msg: &str) {
        *self.error_on_add_labels.lock().unwrap() = Some(msg.to_string());
    }

    /// Make adding assignees fail
    pub fn fail_add_assignees(&self, msg: &str) {
        *self.error_on_add_assignees.lock().unwrap() = Some(msg.to_string());
    }

    // === Inspection methods ===

    /// Every REST call so far, in order
    pub fn calls(&self) -> Vec<RestCall> {
        self.calls.lock().unwrap().clone()
    }

    /// REST calls other than GET
    pub fn mutations(&self) -> Vec<RestCall> {
        self.calls()
            .into_iter()
            .filter(RestCall::is_mutation)
            .collect()
    }

    /// Calls whose endpoint ends with `suffix`
    pub fn calls_to(&self, method: &str, suffix: &str) -> Vec<RestCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.method == method && c.endpoint.ends_with(suffix))
            .collect()
    }

    /// Head branches passed to the merges endpoint, in order
    pub fn merged_heads(&self) -> Vec<String> {
        self.calls_to("POST", "/merges")
            .iter()
            .filter_map(|c| c.body.as_ref()?["head"].as_str().map(String::from))
            .collect()
    }

    /// PR numbers the status source was asked about
    pub fn status_calls(&self) -> Vec<u64> {
        self.status_calls.lock().unwrap().clone()
    }

    /// Current sha of a branch
    pub fn branch_sha(&self, repo: &str, branch: &str) -> Option<String> {
        self.repos
            .lock()
            .unwrap()
            .get(repo)?
            .branches
            .get(branch)
            .cloned()
    }

    // === Assertion helpers ===

    /// Assert that nothing but GET requests were made
    pub fn assert_no_mutations(&self) {
        let mutations = self.mutations();
        assert!(mutations.is_empty(), "expected no mutations, got {mutations:?}");
    }

    /// Assert the combined PR was opened with this head and base
    pub fn assert_pr_created(&self, head: &str, base: &str) {
        let calls = self.calls_to("POST", "/pulls");
        assert!(
            calls.iter().any(|c| {
                let body = c.body.as_ref().unwrap();
                body["head"] == head && body["base"] == base
            }),
            "expected PR {head} -> {base}, got {calls:?}"
        );
    }

    /// Body of the last created PR
    pub fn last_pr_body(&self) -> Option<String> {
        self.calls_to("POST", "/pulls")
            .last()
            .and_then(|c| c.body.as_ref()?["body"].as_str().map(String::from))
    }

    // === Request routing ===

    fn record(&self, method: &'static str, endpoint: &str, body: Option<&Value>) {
        self.calls.lock().unwrap().push(RestCall {
            method,
            endpoint: endpoint.to_string(),
            body: body.cloned(),
        });
    }

    /// Split `repos/{o}/{r}/rest?query` into (`o/r`, `rest`, `query`)
    fn route(endpoint: &str) -> Result<(String, String, String)> {
        let (path, query) = endpoint.split_once('?').unwrap_or((endpoint, ""));
        let parts: Vec<&str> = path.splitn(4, '/').collect();
        match parts.as_slice() {
            ["repos", owner, name] => Ok((format!("{owner}/{name}"), String::new(), query.into())),
            ["repos", owner, name, rest] => {
                Ok((format!("{owner}/{name}"), (*rest).to_string(), query.into()))
            }
            _ => Err(Error::NotFound(format!("HTTP 404: Not Found ({endpoint})"))),
        }
    }

    fn query_param(query: &str, key: &str) -> Option<usize> {
        query
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .find(|(k, _)| *k == key)
            .and_then(|(_, v)| v.parse().ok())
    }

    fn with_repo<T>(&self, repo: &str, f: impl FnOnce(&mut MockRepo) -> Result<T>) -> Result<T> {
        let mut repos = self.repos.lock().unwrap();
        let state = repos
            .get_mut(repo)
            .ok_or_else(|| Error::NotFound(format!("HTTP 404: Not Found (repos/{repo})")))?;
        f(state)
    }

    fn injected(slot: &Mutex<Option<String>>) -> Option<String> {
        slot.lock().unwrap().clone()
    }
}

/// Branch name from an escaped path suffix
fn decode_branch(path: &str) -> String {
    urlencoding::decode(path).map_or_else(|_| path.to_string(), |b| b.into_owned())
}

fn not_found(what: &str) -> Error {
    Error::NotFound(format!("HTTP 404: Not Found ({what})"))
}

#[async_trait]
impl RestClient for MockGitHub {
    async fn get(&self, endpoint: &str) -> Result<Value> {
        self.record("GET", endpoint, None);
        let (repo, rest, query) = Self::route(endpoint)?;

        if rest.is_empty() {
            if let Some(msg) = Self::injected(&self.error_on_get_repo) {
                return Err(Error::GitHubApi(msg));
            }
            return self.with_repo(&repo, |r| Ok(json!({ "default_branch": r.default_branch })));
        }

        if rest == "pulls" {
            let page = Self::query_param(&query, "page").unwrap_or(1);
            let per_page = Self::query_param(&query, "per_page").unwrap_or(30);
            return self.with_repo(&repo, |r| {
                let items: Vec<Value> = r
                    .pulls
                    .iter()
                    .skip((page - 1) * per_page)
                    .take(per_page)
                    .cloned()
                    .collect();
                Ok(Value::Array(items))
            });
        }

        if let Some(branch) = rest.strip_prefix("git/ref/heads/") {
            let branch = decode_branch(branch);
            let branch = branch.as_str();
            return self.with_repo(&repo, |r| {
                r.branches
                    .get(branch)
                    .map(|sha| {
                        json!({ "ref": format!("refs/heads/{branch}"), "object": { "sha": sha } })
                    })
                    .ok_or_else(|| not_found(endpoint))
            });
        }

        Err(not_found(endpoint))
    }

    async fn post(&self, endpoint: &str, body: &Value) -> Result<Value> {
        self.record("POST", endpoint, Some(body));
        let (repo, rest, _) = Self::route(endpoint)?;

        if rest == "git/refs" {
            let full_ref = body["ref"].as_str().unwrap_or_default();
            let branch = full_ref.trim_start_matches("refs/heads/").to_string();
            let sha = body["sha"].as_str().unwrap_or_default().to_string();
            if Self::injected(&self.error_on_create_ref).as_deref() == Some(branch.as_str()) {
                return Err(Error::GitHubApi(format!("HTTP 500: cannot create {branch}")));
            }
            return self.with_repo(&repo, |r| {
                if r.branches.contains_key(&branch) {
                    return Err(Error::GitHubApi(
                        "HTTP 422: Reference already exists".to_string(),
                    ));
                }
                r.branches.insert(branch, sha.clone());
                Ok(json!({ "ref": full_ref, "object": { "sha": sha } }))
            });
        }

        if rest == "merges" {
            let base = body["base"].as_str().unwrap_or_default().to_string();
            let head = body["head"].as_str().unwrap_or_default().to_string();
            if self.conflict_heads.lock().unwrap().contains(&head) {
                return Err(Error::MergeConflict(format!(
                    "HTTP 409: Merge conflict ({endpoint})"
                )));
            }
            if self.failing_heads.lock().unwrap().contains(&head) {
                return Err(Error::GitHubApi(format!(
                    "HTTP 500: Server Error ({endpoint})"
                )));
            }
            let sha = format!("merge-{}", self.merge_counter.fetch_add(1, Ordering::SeqCst));
            return self.with_repo(&repo, |r| {
                let slot = r.branches.get_mut(&base).ok_or_else(|| not_found(&base))?;
                slot.clone_from(&sha);
                Ok(json!({ "sha": sha }))
            });
        }

        if rest == "pulls" {
            if let Some(msg) = Self::injected(&self.error_on_create_pr) {
                return Err(Error::GitHubApi(msg));
            }
            let number = self.next_pr_number.fetch_add(1, Ordering::SeqCst);
            return Ok(json!({ "number": number }));
        }

        if rest.starts_with("issues/") && rest.ends_with("/labels") {
            if let Some(msg) = Self::injected(&self.error_on_add_labels) {
                return Err(Error::GitHubApi(msg));
            }
            return Ok(json!([]));
        }

        if rest.starts_with("issues/") && rest.ends_with("/assignees") {
            if let Some(msg) = Self::injected(&self.error_on_add_assignees) {
                return Err(Error::GitHubApi(msg));
            }
            return Ok(json!({}));
        }

        Err(not_found(endpoint))
    }

    async fn patch(&self, endpoint: &str, body: &Value) -> Result<Value> {
        self.record("PATCH", endpoint, Some(body));
        let (repo, rest, _) = Self::route(endpoint)?;

        if let Some(branch) = rest.strip_prefix("git/refs/heads/") {
            let branch = decode_branch(branch);
            let branch = branch.as_str();
            if let Some(msg) = Self::injected(&self.error_on_update_ref) {
                return Err(Error::GitHubApi(msg));
            }
            let sha = body["sha"].as_str().unwrap_or_default().to_string();
            return self.with_repo(&repo, |r| {
                let slot = r.branches.get_mut(branch).ok_or_else(|| not_found(endpoint))?;
                slot.clone_from(&sha);
                Ok(json!({ "object": { "sha": sha } }))
            });
        }

        Err(not_found(endpoint))
    }

    async fn delete(&self, endpoint: &str) -> Result<Value> {
        self.record("DELETE", endpoint, None);
        let (repo, rest, _) = Self::route(endpoint)?;

        if let Some(branch) = rest.strip_prefix("git/refs/heads/") {
            let branch = decode_branch(branch);
            let branch = branch.as_str();
            if Self::injected(&self.error_on_delete_ref).as_deref() == Some(branch) {
                return Err(Error::GitHubApi(format!("HTTP 500: cannot delete {branch}")));
            }
            return self.with_repo(&repo, |r| {
                r.branches
                    .remove(branch)
                    .map(|_| Value::Null)
                    .ok_or_else(|| not_found(endpoint))
            });
        }

        Err(not_found(endpoint))
    }
}

#[async_trait]
impl StatusSource for MockGitHub {
    async fn pr_status(&self, _repo: &Repo, pr_number: u64) -> Result<PrStatus> {
        self.status_calls.lock().unwrap().push(pr_number);

        if let Some(token) = self.cancel_on_status.lock().unwrap().take() {
            token.cancel();
        }

        if self.status_errors.lock().unwrap().contains(&pr_number) {
            return Err(Error::GitHubApi("GraphQL query failed".to_string()));
        }

        Ok(self
            .statuses
            .lock()
            .unwrap()
            .get(&pr_number)
            .cloned()
            .unwrap_or_else(super::passing_status))
    }
}

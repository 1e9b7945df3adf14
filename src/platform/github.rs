//! GitHub platform service implementation

use crate::error::{Error, Result};
use crate::platform::{RestClient, StatusSource};
use crate::types::{CommitStatus, PrStatus, Repo};
use async_trait::async_trait;
use octocrab::Octocrab;
use reqwest::{Client, Method, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;
use url::Url;

/// Default request timeout in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Public GitHub API root
const GITHUB_API: &str = "https://api.github.com/";

const PR_STATUS_QUERY: &str = r"
    query PullRequestStatus($owner: String!, $repo: String!, $number: Int!) {
        repository(owner: $owner, name: $repo) {
            pullRequest(number: $number) {
                reviewDecision
                commits(last: 1) {
                    nodes {
                        commit {
                            statusCheckRollup {
                                state
                            }
                        }
                    }
                }
            }
        }
    }
";

// GraphQL response types for the PR status query

#[derive(Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Deserialize)]
struct StatusData {
    repository: Option<StatusRepository>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatusRepository {
    pull_request: Option<StatusPullRequest>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatusPullRequest {
    review_decision: Option<String>,
    commits: StatusCommits,
}

#[derive(Deserialize)]
struct StatusCommits {
    nodes: Vec<StatusCommitNode>,
}

#[derive(Deserialize)]
struct StatusCommitNode {
    commit: StatusCommit,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatusCommit {
    status_check_rollup: Option<StatusRollup>,
}

#[derive(Deserialize)]
struct StatusRollup {
    state: String,
}

impl From<StatusPullRequest> for PrStatus {
    fn from(pr: StatusPullRequest) -> Self {
        Self {
            review_decision: pr.review_decision.unwrap_or_default(),
            commits: pr
                .commits
                .nodes
                .into_iter()
                .map(|node| CommitStatus {
                    rollup_state: node.commit.status_check_rollup.map(|r| r.state),
                })
                .collect(),
        }
    }
}

/// GitHub service: raw REST over reqwest, GraphQL over octocrab
pub struct GitHubService {
    /// HTTP client for REST requests
    http_client: Client,
    /// octocrab client for GraphQL queries
    client: Octocrab,
    /// API root, always ending in `/`
    api_base: Url,
    /// Token for REST requests
    token: String,
}

impl GitHubService {
    /// Create a service for github.com, or a GitHub Enterprise `host`
    pub fn new(token: &str, host: Option<&str>) -> Result<Self> {
        match host {
            // Enterprise serves REST under /api/v3 but GraphQL under /api/graphql
            Some(h) => Self::build(
                token,
                &format!("https://{h}/api/v3/"),
                &format!("https://{h}/api"),
            ),
            None => Self::build(token, GITHUB_API, GITHUB_API),
        }
    }

    /// Create a service against an explicit API root URL
    ///
    /// GraphQL requests go to `<base_url>/graphql`.
    pub fn with_base_url(token: &str, base_url: &str) -> Result<Self> {
        Self::build(token, base_url, base_url)
    }

    fn build(token: &str, rest_base: &str, graphql_base: &str) -> Result<Self> {
        let mut base = rest_base.to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let api_base = Url::parse(&base)
            .map_err(|e| Error::Config(format!("invalid API URL {base}: {e}")))?;

        let client = Octocrab::builder()
            .personal_token(token.to_string())
            .base_uri(graphql_base.trim_end_matches('/'))
            .map_err(|e| Error::GitHubApi(e.to_string()))?
            .build()
            .map_err(|e| Error::GitHubApi(e.to_string()))?;

        let http_client = Client::builder()
            .user_agent(concat!("pr-combine/", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| Error::GitHubApi(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            client,
            api_base,
            token: token.to_string(),
        })
    }

    fn url(&self, endpoint: &str) -> Result<Url> {
        self.api_base
            .join(endpoint.trim_start_matches('/'))
            .map_err(|e| Error::Internal(format!("invalid endpoint {endpoint}: {e}")))
    }

    async fn send(&self, method: Method, endpoint: &str, body: Option<&Value>) -> Result<Value> {
        let url = self.url(endpoint)?;
        debug!(%method, endpoint, "GitHub REST request");

        let mut request = self
            .http_client
            .request(method.clone(), url)
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28");
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            debug!(%method, endpoint, %status, "GitHub REST request failed");
            return Err(classify_failure(status, endpoint, &text));
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }
}

/// Map a non-success HTTP status to a typed error
fn classify_failure(status: StatusCode, endpoint: &str, body: &str) -> Error {
    #[derive(Deserialize)]
    struct ApiMessage {
        message: String,
    }

    let detail = serde_json::from_str::<ApiMessage>(body)
        .map(|m| m.message)
        .unwrap_or_else(|_| body.trim().to_string());
    let message = format!("HTTP {}: {detail} ({endpoint})", status.as_u16());

    match status {
        StatusCode::NOT_FOUND => Error::NotFound(message),
        StatusCode::CONFLICT => Error::MergeConflict(message),
        _ => Error::GitHubApi(message),
    }
}

#[async_trait]
impl RestClient for GitHubService {
    async fn get(&self, endpoint: &str) -> Result<Value> {
        self.send(Method::GET, endpoint, None).await
    }

    async fn post(&self, endpoint: &str, body: &Value) -> Result<Value> {
        self.send(Method::POST, endpoint, Some(body)).await
    }

    async fn patch(&self, endpoint: &str, body: &Value) -> Result<Value> {
        self.send(Method::PATCH, endpoint, Some(body)).await
    }

    async fn delete(&self, endpoint: &str) -> Result<Value> {
        self.send(Method::DELETE, endpoint, None).await
    }
}

#[async_trait]
impl StatusSource for GitHubService {
    async fn pr_status(&self, repo: &Repo, pr_number: u64) -> Result<PrStatus> {
        debug!(%repo, pr_number, "querying PR status");

        let response: GraphQlResponse<StatusData> = self
            .client
            .graphql(&serde_json::json!({
                "query": PR_STATUS_QUERY,
                "variables": {
                    "owner": repo.owner,
                    "repo": repo.name,
                    "number": pr_number,
                }
            }))
            .await
            .map_err(|e| Error::GitHubApi(format!("GraphQL query failed: {e}")))?;

        if let Some(errors) = response.errors
            && !errors.is_empty()
        {
            let messages: Vec<_> = errors.into_iter().map(|e| e.message).collect();
            return Err(Error::GitHubApi(format!(
                "GraphQL error: {}",
                messages.join(", ")
            )));
        }

        let pull_request = response
            .data
            .and_then(|d| d.repository)
            .and_then(|r| r.pull_request)
            .ok_or_else(|| Error::NotFound(format!("PR #{pr_number} in {repo}")))?;

        let status = PrStatus::from(pull_request);
        debug!(
            pr_number,
            review_decision = %status.review_decision,
            commits = status.commits.len(),
            "got PR status"
        );
        Ok(status)
    }
}

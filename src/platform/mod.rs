//! Platform services for GitHub
//!
//! The combine engine only talks to GitHub through the two narrow
//! capability traits defined here. `GitHubService` is the network
//! implementation; tests inject an in-memory fake.

mod github;

pub use github::GitHubService;

use crate::error::Result;
use crate::types::{PrStatus, Repo};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// REST-style operations against the GitHub API
///
/// Endpoints are relative to the API root (e.g. `repos/octo/demo/pulls`)
/// and may carry a query string. Empty response bodies come back as
/// `Value::Null`.
///
/// Implementations must classify HTTP failures at this boundary:
/// - 404 -> [`Error::NotFound`](crate::error::Error::NotFound)
/// - 409 -> [`Error::MergeConflict`](crate::error::Error::MergeConflict)
/// - any other non-2xx -> [`Error::GitHubApi`](crate::error::Error::GitHubApi)
#[async_trait]
pub trait RestClient: Send + Sync {
    /// `GET endpoint`
    async fn get(&self, endpoint: &str) -> Result<Value>;

    /// `POST endpoint` with a JSON body
    async fn post(&self, endpoint: &str, body: &Value) -> Result<Value>;

    /// `PATCH endpoint` with a JSON body
    async fn patch(&self, endpoint: &str, body: &Value) -> Result<Value>;

    /// `DELETE endpoint`
    async fn delete(&self, endpoint: &str) -> Result<Value>;
}

/// Combined CI-status and review-decision lookup for a PR
#[async_trait]
pub trait StatusSource: Send + Sync {
    /// Fetch the latest commit's check rollup and the PR's review decision
    async fn pr_status(&self, repo: &Repo, pr_number: u64) -> Result<PrStatus>;
}

/// `GET` an endpoint and deserialize the response
pub async fn get_as<T: DeserializeOwned>(client: &dyn RestClient, endpoint: &str) -> Result<T> {
    let value = client.get(endpoint).await?;
    Ok(serde_json::from_value(value)?)
}

/// `POST` to an endpoint and deserialize the response
pub async fn post_as<T: DeserializeOwned>(
    client: &dyn RestClient,
    endpoint: &str,
    body: &Value,
) -> Result<T> {
    let value = client.post(endpoint, body).await?;
    Ok(serde_json::from_value(value)?)
}

//! GitHub token resolution

use crate::auth::AuthSource;
use crate::error::{Error, Result};
use tokio::process::Command;
use tracing::debug;

/// Environment variables checked for a token, in order
const TOKEN_ENV_VARS: [&str; 2] = ["GH_TOKEN", "GITHUB_TOKEN"];

/// Resolved GitHub credentials
#[derive(Debug, Clone)]
pub struct GitHubAuthConfig {
    /// Personal access or OAuth token
    pub token: String,
    /// Where the token came from
    pub source: AuthSource,
    /// Enterprise host the token is for (`None` for github.com)
    pub host: Option<String>,
}

/// Resolve a GitHub token
///
/// `GH_TOKEN` and `GITHUB_TOKEN` win over the gh CLI. Otherwise
/// `gh auth token` is asked, with `--hostname` for Enterprise hosts.
pub async fn get_github_auth(host: Option<&str>) -> Result<GitHubAuthConfig> {
    let host = host.map(ToString::to_string);

    if let Some(token) = token_from_env(|key| std::env::var(key).ok()) {
        debug!("using GitHub token from environment");
        return Ok(GitHubAuthConfig {
            token,
            source: AuthSource::EnvVar,
            host,
        });
    }

    let token = token_from_gh_cli(host.as_deref()).await?;
    debug!(host = host.as_deref().unwrap_or("github.com"), "using GitHub token from gh CLI");
    Ok(GitHubAuthConfig {
        token,
        source: AuthSource::Cli,
        host,
    })
}

/// First non-empty token among [`TOKEN_ENV_VARS`], using `lookup` to read variables
pub fn token_from_env(lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
    TOKEN_ENV_VARS
        .iter()
        .filter_map(|key| lookup(key))
        .map(|token| token.trim().to_string())
        .find(|token| !token.is_empty())
}

async fn token_from_gh_cli(host: Option<&str>) -> Result<String> {
    let mut command = Command::new("gh");
    command.args(["auth", "token"]);
    if let Some(host) = host {
        command.args(["--hostname", host]);
    }

    let output = command.output().await.map_err(|e| {
        Error::Auth(format!(
            "no token in GH_TOKEN/GITHUB_TOKEN and failed to run 'gh auth token': {e}"
        ))
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::Auth(format!(
            "'gh auth token' failed: {}. Run 'gh auth login' or set GH_TOKEN",
            stderr.trim()
        )));
    }

    let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if token.is_empty() {
        return Err(Error::Auth(
            "'gh auth token' returned no token. Run 'gh auth login' or set GH_TOKEN".to_string(),
        ));
    }
    Ok(token)
}

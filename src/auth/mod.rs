//! Authentication for GitHub
//!
//! Supports environment variables and the `gh` CLI.

mod github;

pub use github::{GitHubAuthConfig, get_github_auth, token_from_env};

/// Source of authentication token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthSource {
    /// Token from the gh CLI
    Cli,
    /// Token from environment variable
    EnvVar,
}

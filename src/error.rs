//! Error types for pr-combine

use thiserror::Error;

/// Result type alias using the crate error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while combining pull requests
#[derive(Debug, Error)]
pub enum Error {
    // ---- validation (abort the whole run) ----
    /// Repository identifier is not of the form `owner/repo`
    #[error("invalid repository: {0}")]
    InvalidRepository(String),

    /// A label appears in both the select and ignore sets
    #[error("label '{0}' cannot be both selected and ignored")]
    LabelConflict(String),

    /// No repositories given on the command line, in a file, or in config
    #[error("no repositories specified: pass owner/repo arguments or use --file")]
    NoRepositories,

    /// Invalid configuration file or option combination
    #[error("configuration error: {0}")]
    Config(String),

    // ---- transport ----
    /// The requested resource does not exist (HTTP 404)
    #[error("not found: {0}")]
    NotFound(String),

    /// The merge could not be performed automatically (HTTP 409)
    #[error("merge conflict: {0}")]
    MergeConflict(String),

    /// Any other GitHub API failure
    #[error("GitHub API error: {0}")]
    GitHubApi(String),

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ---- fatal to a single repository ----
    /// Default branch or its commit could not be resolved
    #[error("failed to resolve base branch: {0}")]
    BaseBranch(String),

    /// Combined or working branch could not be created
    #[error("failed to create branch: {0}")]
    BranchCreation(String),

    /// Combined branch could not be force-updated to the working branch
    #[error("failed to update combined branch: {0}")]
    BranchPromotion(String),

    /// The combined pull request could not be opened
    #[error("failed to create combined PR: {0}")]
    PullRequestCreation(String),

    /// The combined pull request exists but labels/assignees failed
    #[error("combined PR #{number} created, but {message}")]
    PullRequestMetadata {
        /// Number of the PR that was created
        number: u64,
        /// What went wrong
        message: String,
    },

    // ---- control flow ----
    /// The run was interrupted
    #[error("operation cancelled")]
    Cancelled,

    // ---- environment ----
    /// No usable GitHub token
    #[error("authentication error: {0}")]
    Auth(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether this error is the cancellation signal rather than a failure
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Whether this error came from a merge that could not be applied cleanly
    pub const fn is_merge_conflict(&self) -> bool {
        matches!(self, Self::MergeConflict(_))
    }
}

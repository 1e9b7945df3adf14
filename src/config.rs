//! Filter and combine configuration
//!
//! Both structs are plain values built once per run (from CLI flags layered
//! over an optional TOML file) and passed by reference to the matcher,
//! the requirement checker and the branch orchestrator.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default name of the combined branch
pub const DEFAULT_COMBINE_BRANCH: &str = "combined-prs";

/// Default suffix appended to the combined branch name for the working branch
pub const DEFAULT_WORKING_SUFFIX: &str = "-working";

/// Default minimum number of matching PRs required to combine
pub const DEFAULT_MINIMUM: usize = 2;

/// Branch prefix used by `--dependabot`
pub const DEPENDABOT_PREFIX: &str = "dependabot/";

/// Directory name under the user config dir
const CONFIG_DIR: &str = "pr-combine";

/// Config file name
const CONFIG_FILE: &str = "config.toml";

/// Criteria a pull request must satisfy to be combined
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[allow(clippy::struct_excessive_bools)]
pub struct FilterConfig {
    /// Head branch must start with this
    pub branch_prefix: Option<String>,
    /// Head branch must end with this
    pub branch_suffix: Option<String>,
    /// Head branch must match this regex
    pub branch_regex: Option<String>,
    /// PR must carry every one of these labels
    pub select_labels: Vec<String>,
    /// PR must carry none of these labels
    pub ignore_labels: Vec<String>,
    /// Compare labels case-sensitively
    pub case_sensitive_labels: bool,
    /// Only include PRs whose latest commit passes CI
    pub require_ci: bool,
    /// Only include approved PRs
    pub require_approved: bool,
    /// Minimum number of matching PRs needed to combine
    pub minimum: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            branch_prefix: None,
            branch_suffix: None,
            branch_regex: None,
            select_labels: Vec::new(),
            ignore_labels: Vec::new(),
            case_sensitive_labels: false,
            require_ci: false,
            require_approved: false,
            minimum: DEFAULT_MINIMUM,
        }
    }
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|s| !s.is_empty())
}

impl FilterConfig {
    /// Configured branch prefix, ignoring empty strings
    pub fn prefix(&self) -> Option<&str> {
        non_empty(self.branch_prefix.as_ref())
    }

    /// Configured branch suffix, ignoring empty strings
    pub fn suffix(&self) -> Option<&str> {
        non_empty(self.branch_suffix.as_ref())
    }

    /// Configured branch regex, ignoring empty strings
    pub fn regex(&self) -> Option<&str> {
        non_empty(self.branch_regex.as_ref())
    }

    /// Whether any branch-name filter is configured
    pub fn has_branch_filters(&self) -> bool {
        self.prefix().is_some() || self.suffix().is_some() || self.regex().is_some()
    }

    /// Whether any label filter is configured
    pub fn has_label_filters(&self) -> bool {
        !self.select_labels.is_empty() || !self.ignore_labels.is_empty()
    }

    /// Whether a status query is needed per PR
    pub const fn has_requirements(&self) -> bool {
        self.require_ci || self.require_approved
    }

    /// Whether no filter of any kind is configured (every open PR matches)
    pub fn is_unfiltered(&self) -> bool {
        !self.has_branch_filters() && !self.has_label_filters() && !self.has_requirements()
    }

    /// Apply `--dependabot`: use the dependabot prefix unless one is already set
    #[must_use]
    pub fn with_dependabot(mut self) -> Self {
        if self.prefix().is_none() {
            self.branch_prefix = Some(DEPENDABOT_PREFIX.to_string());
        }
        self
    }

    /// Validate the configuration before any network activity
    pub fn validate(&self) -> Result<()> {
        if self.minimum == 0 {
            return Err(Error::Config("minimum must be at least 1".to_string()));
        }
        validate_labels(
            &self.select_labels,
            &self.ignore_labels,
            self.case_sensitive_labels,
        )
    }
}

/// Check that no label is both selected and ignored
///
/// Comparison follows the configured case sensitivity.
pub fn validate_labels(select: &[String], ignore: &[String], case_sensitive: bool) -> Result<()> {
    let normalize = |s: &str| {
        if case_sensitive {
            s.to_string()
        } else {
            s.to_lowercase()
        }
    };
    let ignored: Vec<String> = ignore.iter().map(|l| normalize(l)).collect();
    match select.iter().find(|l| ignored.contains(&normalize(l))) {
        Some(label) => Err(Error::LabelConflict(label.clone())),
        None => Ok(()),
    }
}

/// How the combined branch and PR are produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombineOptions {
    /// Name of the combined branch (never itself a combine candidate)
    pub combine_branch_name: String,
    /// Suffix for the ephemeral working branch
    pub working_branch_suffix: String,
    /// Base branch override (repository default branch when unset)
    pub base_branch: Option<String>,
    /// Labels to add to the combined PR
    pub add_labels: Vec<String>,
    /// Users to assign to the combined PR
    pub add_assignees: Vec<String>,
    /// Add `Closes` keywords so source PRs close when the combined PR merges
    pub autoclose: bool,
    /// Command line echoed into the PR body
    #[serde(skip)]
    pub command: String,
    /// Stop after matching; do not touch branches
    #[serde(skip)]
    pub dry_run: bool,
}

impl Default for CombineOptions {
    fn default() -> Self {
        Self {
            combine_branch_name: DEFAULT_COMBINE_BRANCH.to_string(),
            working_branch_suffix: DEFAULT_WORKING_SUFFIX.to_string(),
            base_branch: None,
            add_labels: Vec::new(),
            add_assignees: Vec::new(),
            autoclose: false,
            command: String::new(),
            dry_run: false,
        }
    }
}

impl CombineOptions {
    /// Name of the working branch (`<combined><suffix>`)
    pub fn working_branch_name(&self) -> String {
        format!("{}{}", self.combine_branch_name, self.working_branch_suffix)
    }

    /// Validate branch naming
    pub fn validate(&self) -> Result<()> {
        if self.combine_branch_name.trim().is_empty() {
            return Err(Error::Config("combine branch name cannot be empty".to_string()));
        }
        if self.working_branch_suffix.is_empty() {
            return Err(Error::Config(
                "working branch suffix cannot be empty: it would equal the combined branch"
                    .to_string(),
            ));
        }
        Ok(())
    }
}

/// Contents of the optional TOML config file
///
/// ```toml
/// owner = "octocat"
/// repos = ["octocat/hello-world"]
///
/// [filters]
/// branch_prefix = "dependabot/"
/// ignore_labels = ["wip"]
///
/// [combine]
/// add_labels = ["dependencies"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Default owner for bare repository names
    pub owner: Option<String>,
    /// Repositories to process when none are given on the command line
    pub repos: Vec<String>,
    /// Default filters
    pub filters: FilterConfig,
    /// Default combine options
    pub combine: CombineOptions,
}

/// Default config file location (`<config_dir>/pr-combine/config.toml`)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(CONFIG_DIR).join(CONFIG_FILE))
}

/// Load the config file.
///
/// An explicit path must exist. Without one, the default location is used
/// if present, otherwise an empty config is returned.
pub fn load_config(explicit: Option<&Path>) -> Result<FileConfig> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => match default_config_path() {
            Some(p) if p.exists() => p,
            _ => {
                debug!("no config file found, using defaults");
                return Ok(FileConfig::default());
            }
        },
    };

    debug!(path = %path.display(), "loading config file");
    let content = fs::read_to_string(&path)
        .map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("failed to parse {}: {e}", path.display())))
}

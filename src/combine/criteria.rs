//! Criteria matching - pure functions deciding PR eligibility
//!
//! No I/O happens here. Everything the checks need is passed in, so the
//! same inputs always yield the same answer.

use crate::config::FilterConfig;
use regex::Regex;
use tracing::{debug, warn};

/// Whether a PR qualifies for combination by branch name and labels
///
/// `combine_branch` is the reserved name of the tool's own output branch,
/// which never matches.
pub fn matches(
    branch: &str,
    labels: &[String],
    config: &FilterConfig,
    combine_branch: &str,
) -> bool {
    branch_matches(branch, config, combine_branch)
        && labels_match(
            labels,
            &config.ignore_labels,
            &config.select_labels,
            config.case_sensitive_labels,
        )
}

/// Branch gate: every configured prefix/suffix/regex filter must match
pub fn branch_matches(branch: &str, config: &FilterConfig, combine_branch: &str) -> bool {
    debug!(branch, "checking branch criteria");

    if branch == combine_branch {
        debug!(branch, "branch is the combine branch, skipping");
        return false;
    }

    if !config.has_branch_filters() {
        return true;
    }

    if let Some(prefix) = config.prefix()
        && !branch.starts_with(prefix)
    {
        debug!(branch, prefix, "branch does not match prefix");
        return false;
    }

    if let Some(suffix) = config.suffix()
        && !branch.ends_with(suffix)
    {
        debug!(branch, suffix, "branch does not match suffix");
        return false;
    }

    if let Some(pattern) = config.regex() {
        match Regex::new(pattern) {
            Ok(regex) if regex.is_match(branch) => {}
            Ok(_) => {
                debug!(branch, pattern, "branch does not match regex");
                return false;
            }
            Err(e) => {
                warn!(pattern, error = %e, "invalid branch regex, treating as no match");
                return false;
            }
        }
    }

    debug!(branch, "branch matches all branch criteria");
    true
}

/// Label gate
///
/// - no ignore and no select labels: always passes
/// - any ignore label present: fails
/// - every select label must be present
pub fn labels_match(
    pr_labels: &[String],
    ignore: &[String],
    select: &[String],
    case_sensitive: bool,
) -> bool {
    if ignore.is_empty() && select.is_empty() {
        return true;
    }

    let normalize = |labels: &[String]| -> Vec<String> {
        if case_sensitive {
            labels.to_vec()
        } else {
            labels.iter().map(|l| l.to_lowercase()).collect()
        }
    };
    let pr_labels = normalize(pr_labels);
    let ignore = normalize(ignore);
    let select = normalize(select);

    if let Some(label) = ignore.iter().find(|l| pr_labels.contains(l)) {
        debug!(label = %label, "PR carries an ignored label");
        return false;
    }

    if let Some(label) = select.iter().find(|l| !pr_labels.contains(l)) {
        debug!(label = %label, "PR is missing a required label");
        return false;
    }

    true
}

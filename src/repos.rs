//! Repository list parsing from arguments and files

use crate::error::{Error, Result};
use crate::types::Repo;
use std::fs;
use std::path::Path;

/// Parse repositories from positional arguments and an optional file.
///
/// Arguments may be comma-separated (`a/b,c/d`). Bare names get
/// `default_owner`. Argument repositories come first, then file ones.
/// Duplicates are dropped, keeping the first occurrence.
pub fn parse_repositories(
    args: &[String],
    file: Option<&Path>,
    default_owner: Option<&str>,
) -> Result<Vec<Repo>> {
    let mut repos = parse_repository_args(args, default_owner)?;
    if let Some(path) = file {
        repos.extend(parse_repository_file(path, default_owner)?);
    }

    let mut unique: Vec<Repo> = Vec::with_capacity(repos.len());
    for repo in repos {
        if !unique.contains(&repo) {
            unique.push(repo);
        }
    }

    if unique.is_empty() {
        return Err(Error::NoRepositories);
    }
    Ok(unique)
}

/// Parse positional repository arguments
pub fn parse_repository_args(args: &[String], default_owner: Option<&str>) -> Result<Vec<Repo>> {
    args.iter()
        .flat_map(|arg| arg.split(','))
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .map(|raw| Repo::parse_with_owner(raw, default_owner))
        .collect()
}

/// Parse a repository file: one `owner/repo` per line, `#` starts a comment
pub fn parse_repository_file(path: &Path, default_owner: Option<&str>) -> Result<Vec<Repo>> {
    let content = fs::read_to_string(path).map_err(|e| {
        Error::Config(format!(
            "failed to read repositories file {}: {e}",
            path.display()
        ))
    })?;

    content
        .lines()
        .map(|line| line.split_once('#').map_or(line, |(before, _)| before).trim())
        .filter(|line| !line.is_empty())
        .map(|line| Repo::parse_with_owner(line, default_owner))
        .collect()
}

//! Run summary rendering

use crate::cli::OutputFormat;
use crate::cli::style::Stylize;
use anstream::println;
use pr_combine::error::Result;
use pr_combine::stats::{RepoStats, RepoStatus, RunStats};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// Widest repository name shown in the table before truncating
const MAX_REPO_WIDTH: usize = 40;

/// Fixed widths of the combined, skipped and status columns
const COLUMN_WIDTHS: [usize; 3] = [14, 20, 12];

/// Print the run summary in the requested format
pub fn display_stats(stats: &RunStats, format: OutputFormat, dry_run: bool) -> Result<()> {
    match format {
        OutputFormat::Table => display_table(stats, dry_run),
        OutputFormat::Plain => display_plain(stats),
        OutputFormat::Json => println!("{}", render_json(stats)?),
    }
    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonSummary<'a> {
    repos_processed: usize,
    prs_combined: usize,
    prs_skipped_merge_conflict: usize,
    prs_skipped_criteria: usize,
    execution_time: String,
    #[serde(rename = "combinedPRLinks")]
    combined_pr_links: &'a [String],
    per_repo_stats: &'a BTreeMap<String, RepoStats>,
}

/// Pretty JSON summary
pub fn render_json(stats: &RunStats) -> Result<String> {
    let summary = JsonSummary {
        repos_processed: stats.repos_processed,
        prs_combined: stats.prs_combined,
        prs_skipped_merge_conflict: stats.prs_skipped_merge_conflict,
        prs_skipped_criteria: stats.prs_skipped_criteria,
        execution_time: format_duration(stats.elapsed()),
        combined_pr_links: &stats.combined_pr_links,
        per_repo_stats: &stats.per_repo,
    };
    Ok(serde_json::to_string_pretty(&summary)?)
}

fn format_duration(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    if secs >= 60 {
        format!("{}m{}s", secs / 60, secs % 60)
    } else {
        format!("{secs}s")
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

/// Colour a count: yellow when non-zero
fn count(n: usize) -> String {
    if n > 0 { n.warn() } else { n.success() }
}

/// `X (MC), Y (DNM)` padded to `width`, padding applied before colouring
fn skipped_cell(merge_conflicts: usize, did_not_match: usize, width: usize) -> String {
    let plain = format!("{merge_conflicts} (MC), {did_not_match} (DNM)");
    let padding = " ".repeat(width.saturating_sub(plain.chars().count()));
    format!(
        "{} (MC), {} (DNM){padding}",
        count(merge_conflicts),
        count(did_not_match)
    )
}

fn status_cell(repo: &RepoStats, width: usize) -> String {
    let status = repo.status();
    let label = format!("{:<width$}", status.label());
    match status {
        RepoStatus::Ok | RepoStatus::NoOpenPrs => label.success(),
        RepoStatus::NotEnough => label.warn(),
        RepoStatus::Failed => label.error(),
    }
}

fn border(widths: &[usize], left: &str, join: &str, right: &str) -> String {
    let cells: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
    format!("{left}{}{right}", cells.join(join))
}

fn display_table(stats: &RunStats, dry_run: bool) {
    let repo_width = stats
        .per_repo
        .keys()
        .map(|name| name.chars().count())
        .max()
        .unwrap_or(0)
        .clamp("Repository".len(), MAX_REPO_WIDTH);
    let [combined_width, skipped_width, status_width] = COLUMN_WIDTHS;
    let widths = [repo_width, combined_width, skipped_width, status_width];

    println!("{}", border(&widths, "╭", "┬", "╮"));
    println!(
        "│ {} │ {} │ {} │ {} │",
        format!("{:<repo_width$}", "Repository").emphasis(),
        format!("{:>combined_width$}", "PRs Combined").emphasis(),
        format!("{:<skipped_width$}", "Skipped").emphasis(),
        format!("{:<status_width$}", "Status").emphasis(),
    );
    println!("{}", border(&widths, "├", "┼", "┤"));

    for repo in stats.per_repo.values() {
        println!(
            "│ {:<repo_width$} │ {:>combined_width$} │ {} │ {} │",
            truncate(&repo.repo_name, repo_width),
            repo.combined_count,
            skipped_cell(repo.skipped_merge_conflict, repo.skipped_criteria, skipped_width),
            status_cell(repo, status_width),
        );
    }
    println!("{}", border(&widths, "╰", "┴", "╯"));

    let total_prs = if dry_run && stats.combined_pr_links.is_empty() {
        "DRY RUN".to_string()
    } else {
        stats.combined_pr_links.len().to_string()
    };
    let summary_widths = [13, 13, 21, 13];
    println!();
    println!("{}", border(&summary_widths, "╭", "┬", "╮"));
    println!(
        "│ {} │ {} │ {} │ {} │",
        format!("{:<13}", "Repos").emphasis(),
        format!("{:<13}", "Combined PRs").emphasis(),
        format!("{:<21}", "Skipped").emphasis(),
        format!("{:<13}", "Total PRs").emphasis(),
    );
    println!("{}", border(&summary_widths, "├", "┼", "┤"));
    println!(
        "│ {:<13} │ {:<13} │ {} │ {:<13} │",
        stats.repos_processed,
        stats.prs_combined,
        skipped_cell(stats.prs_skipped_merge_conflict, stats.prs_skipped_criteria, 21),
        total_prs,
    );
    println!("{}", border(&summary_widths, "╰", "┴", "╯"));

    for repo in stats.per_repo.values() {
        if let Some(error) = &repo.error {
            println!("{} {}: {}", "✗".error(), repo.repo_name.emphasis(), error.muted());
        }
    }

    if !stats.combined_pr_links.is_empty() {
        println!();
        println!("{}", "Links to Combined PRs:".emphasis());
        for link in &stats.combined_pr_links {
            println!("- {}", hyperlink(link));
        }
    }
    println!();
}

fn display_plain(stats: &RunStats) {
    println!("Repositories Processed: {}", stats.repos_processed);
    println!("PRs Combined: {}", stats.prs_combined);
    println!("PRs Skipped (Merge Conflicts): {}", stats.prs_skipped_merge_conflict);
    println!("PRs Skipped (Did Not Match): {}", stats.prs_skipped_criteria);
    println!("Execution Time: {}", format_duration(stats.elapsed()));

    println!();
    println!("Links to Combined PRs:");
    for link in &stats.combined_pr_links {
        println!("- {link}");
    }

    println!();
    println!("Per-Repository Details:");
    for repo in stats.per_repo.values() {
        println!("  {}", repo.repo_name);
        if let Some(error) = &repo.error {
            println!("    Failed: {error}");
            continue;
        }
        if repo.not_enough_prs {
            println!("    Not enough PRs to combine.");
            continue;
        }
        println!("    Combined: {}", repo.combined_count);
        println!("    Skipped (Merge Conflicts): {}", repo.skipped_merge_conflict);
        println!("    Skipped (Did Not Match): {}", repo.skipped_criteria);
        if let Some(link) = &repo.combined_pr_link {
            println!("    Combined PR: {link}");
        }
    }
}

/// Clickable link when the terminal supports it
fn hyperlink(url: &str) -> String {
    if supports_hyperlinks::on(supports_hyperlinks::Stream::Stdout) {
        terminal_link::Link::new(url, url).to_string().accent()
    } else {
        url.accent()
    }
}

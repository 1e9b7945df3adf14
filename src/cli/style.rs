//! Terminal styling helpers
//!
//! Output goes through `anstream`, which strips ANSI codes when the stream
//! is not a terminal, `NO_COLOR` is set, or `--no-color` was passed.

use indicatif::ProgressStyle;
use owo_colors::OwoColorize;
use std::fmt::Display;

/// Semantic styles for anything printable
pub trait Stylize: Display {
    /// Bold text for headings and names
    fn emphasis(&self) -> String {
        self.bold().to_string()
    }

    /// Highlighted values (counts, links)
    fn accent(&self) -> String {
        self.cyan().to_string()
    }

    /// De-emphasized detail
    fn muted(&self) -> String {
        self.dimmed().to_string()
    }

    /// Something that went well
    fn success(&self) -> String {
        self.green().to_string()
    }

    /// Something that needs attention
    fn warn(&self) -> String {
        self.yellow().to_string()
    }

    /// Something that failed
    fn error(&self) -> String {
        self.red().to_string()
    }
}

impl<T: Display + ?Sized> Stylize for T {}

/// Spinner style shared by all long-running steps
pub fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "✓"])
}

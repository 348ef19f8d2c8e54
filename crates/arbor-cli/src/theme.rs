//! Terminal styling for `arbor` output.

use arbor_core::Entry;
use chrono::{DateTime, Utc};
use colored::Colorize;

/// Color helpers. Every method returns an owned, styled string.
pub(crate) struct Theme;

impl Theme {
    /// Section title.
    pub(crate) fn header(text: &str) -> String {
        text.bold().cyan().to_string()
    }

    /// Completed mutation.
    pub(crate) fn success(text: &str) -> String {
        format!("{} {text}", "ok".green().bold())
    }

    /// Neutral note.
    pub(crate) fn info(text: &str) -> String {
        format!("{} {text}", "--".blue())
    }

    /// Recoverable problem.
    pub(crate) fn warning(text: &str) -> String {
        format!("{} {}", "warn:".yellow().bold(), text.yellow())
    }

    /// Secondary detail.
    pub(crate) fn dimmed(text: &str) -> String {
        text.dimmed().to_string()
    }

    /// Horizontal rule under headers.
    pub(crate) fn separator() -> String {
        "─".repeat(60).dimmed().to_string()
    }

    /// Entry name, directories in bold blue with a trailing slash.
    pub(crate) fn entry_name(entry: &Entry) -> String {
        if entry.is_dir {
            format!("{}/", entry.name).bold().blue().to_string()
        } else {
            entry.name.clone()
        }
    }

    /// Local timestamp, or a dash.
    pub(crate) fn timestamp(at: Option<&DateTime<Utc>>) -> String {
        at.map_or_else(
            || "-".to_string(),
            |at| at.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M").to_string(),
        )
    }
}

/// Human-readable size, or a dash for directories.
pub(crate) fn human_size(size: Option<u64>) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

    let Some(mut value) = size else {
        return "-".to_string();
    };
    let mut unit = UNITS[0];
    for next in &UNITS[1..] {
        if value < 1024 {
            break;
        }
        value /= 1024;
        unit = next;
    }
    format!("{value} {unit}")
}

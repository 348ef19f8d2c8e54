//! Rendering of listings, trees and config.

use anyhow::Result;
use arbor_core::Entry;
use arbor_listing::{ListingSnapshot, ListingSort, ListingState, sort_entries};
use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;

use crate::theme::{Theme, human_size};

/// Output format selected with `--format`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Colored, human-readable output.
    #[default]
    Pretty,
    /// Machine-readable JSON on stdout.
    Json,
}

/// Sort key selected with `ls --sort`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum SortKey {
    /// By name.
    #[default]
    Name,
    /// By size.
    Size,
    /// By modification time.
    Modified,
}

impl From<SortKey> for ListingSort {
    fn from(key: SortKey) -> Self {
        match key {
            SortKey::Name => Self::Name,
            SortKey::Size => Self::Size,
            SortKey::Modified => Self::Modified,
        }
    }
}

/// One directory or file in a rendered tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct TreeItem {
    pub(crate) name: String,
    pub(crate) path: String,
    pub(crate) is_dir: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) size: Option<u64>,
    /// Present only for expanded, loaded directories.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) children: Option<Vec<TreeItem>>,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print the listing of one directory.
pub(crate) fn print_listing(
    snapshot: &ListingSnapshot,
    sort: ListingSort,
    format: OutputFormat,
) -> Result<()> {
    let entries = match &snapshot.state {
        ListingState::Ready(entries) => {
            let mut entries = entries.to_vec();
            sort_entries(&mut entries, sort);
            entries
        },
        ListingState::Failed(err) => anyhow::bail!("cannot list {}: {err}", snapshot.path),
        ListingState::Idle | ListingState::Loading => {
            anyhow::bail!("listing of {} is not available", snapshot.path)
        },
    };

    if format == OutputFormat::Json {
        return print_json(&entries);
    }

    println!("\n{}", Theme::header(&snapshot.path.to_string()));
    if entries.is_empty() {
        println!("{}", Theme::info("Empty directory"));
        return Ok(());
    }
    println!(
        "{:>10} {:>16} {}",
        "SIZE".dimmed(),
        "MODIFIED".dimmed(),
        "NAME".dimmed()
    );
    println!("{}", Theme::separator());
    for entry in &entries {
        print_entry(entry);
    }
    println!();
    Ok(())
}

fn print_entry(entry: &Entry) {
    println!(
        "{:>10} {:>16} {}",
        human_size(entry.size),
        Theme::timestamp(entry.modified.as_ref()),
        Theme::entry_name(entry)
    );
}

/// Print a tree rooted at `root`.
pub(crate) fn print_tree(root: &TreeItem, format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json(root);
    }
    println!("{}", Theme::header(&root.path));
    if let Some(children) = &root.children {
        print_branch(children, "");
    }
    Ok(())
}

fn print_branch(items: &[TreeItem], prefix: &str) {
    let last = items.len().saturating_sub(1);
    for (index, item) in items.iter().enumerate() {
        let (connector, extension) = if index == last {
            ("└── ", "    ")
        } else {
            ("├── ", "│   ")
        };
        let label = if item.is_dir {
            format!("{}/", item.name).bold().blue().to_string()
        } else {
            format!("{} {}", item.name, Theme::dimmed(&human_size(item.size)))
        };
        println!("{prefix}{connector}{label}");
        if let Some(children) = &item.children {
            print_branch(children, &format!("{prefix}{extension}"));
        }
    }
}

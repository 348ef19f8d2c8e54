//! `ls` and `tree`.

use anyhow::Result;
use arbor_core::{Entry, NsPath};
use arbor_listing::{ListingSort, sort_entries};
use arbor_tree::{ExpansionState, TreeCache, WalkOutcome};
use tracing::debug;

use crate::context::Context;
use crate::formatter::{self, OutputFormat, TreeItem};

/// Flat listing of one directory.
pub(crate) async fn list(
    ctx: &Context,
    path: NsPath,
    sort: ListingSort,
    format: OutputFormat,
) -> Result<()> {
    // Failures are rendered from the snapshot.
    let _ = ctx.listing.navigate(path).await;
    formatter::print_listing(&ctx.listing.snapshot(), sort, format)
}

/// Walk to `target` and print every expanded directory.
pub(crate) async fn tree(ctx: &Context, target: &NsPath, format: OutputFormat) -> Result<()> {
    match ctx.expansion.navigate(target).await? {
        WalkOutcome::Completed { is_dir, .. } => debug!(target = %target, is_dir, "walk complete"),
        WalkOutcome::Superseded { .. } => anyhow::bail!("navigation to {target} was superseded"),
    }

    // The target itself is expanded but not loaded by the walk.
    let report = ctx.expansion.refresh_expanded().await;
    if let Some((path, err)) = report.failed.into_iter().next() {
        anyhow::bail!("cannot list {path}: {err}");
    }

    let root = build_tree(&ctx.cache, &ctx.expansion.expansion());
    formatter::print_tree(&root, format)
}

fn item(path: &NsPath, entry: &Entry) -> TreeItem {
    TreeItem {
        name: entry.name.clone(),
        path: path.to_string(),
        is_dir: entry.is_dir,
        size: entry.size,
        children: None,
    }
}

fn branch(cache: &TreeCache, expansion: &ExpansionState, dir: &NsPath) -> Option<Vec<TreeItem>> {
    if !expansion.is_expanded(dir) {
        return None;
    }
    let mut entries = cache.children(dir)?.to_vec();
    sort_entries(&mut entries, ListingSort::Name);

    let items = entries
        .iter()
        .map(|entry| {
            let path = dir.join(&entry.name);
            let mut node = item(&path, entry);
            if entry.is_dir {
                node.children = branch(cache, expansion, &path);
            }
            node
        })
        .collect();
    Some(items)
}

/// Render the cached, expanded part of the namespace. Never performs I/O.
pub(crate) fn build_tree(cache: &TreeCache, expansion: &ExpansionState) -> TreeItem {
    let root = NsPath::root();
    TreeItem {
        name: "/".to_string(),
        path: root.to_string(),
        is_dir: true,
        size: None,
        children: branch(cache, expansion, &root),
    }
}

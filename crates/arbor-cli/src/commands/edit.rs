//! Mutating commands. Each prints the refreshed listing of the directory it
//! changed.

use std::path::Path;

use anyhow::{Context as _, Result};
use arbor_core::NsPath;
use arbor_listing::ListingSort;

use crate::context::Context;
use crate::formatter::{self, OutputFormat};
use crate::theme::Theme;

fn announce(format: OutputFormat, message: &str) {
    if format == OutputFormat::Pretty {
        println!("{}", Theme::success(message));
    }
}

/// File name and bytes of a local file to upload.
fn read_local(local: &Path) -> Result<(String, Vec<u8>)> {
    let name = local
        .file_name()
        .and_then(|name| name.to_str())
        .with_context(|| format!("{} has no usable file name", local.display()))?;
    let content =
        std::fs::read(local).with_context(|| format!("cannot read {}", local.display()))?;
    Ok((name.to_owned(), content))
}

/// Create a directory or an empty file.
pub(crate) async fn create(
    ctx: &Context,
    parent: &NsPath,
    name: &str,
    is_dir: bool,
    format: OutputFormat,
) -> Result<()> {
    let (path, listing) = ctx
        .mutate_and_show(parent, ctx.mutator.create(parent, name, is_dir))
        .await?;
    let kind = if is_dir { "directory" } else { "file" };
    announce(format, &format!("Created {kind} {path}"));
    formatter::print_listing(&listing, ListingSort::Name, format)
}

/// Move or rename an entry. Shows the destination directory.
pub(crate) async fn rename(
    ctx: &Context,
    from: &NsPath,
    to: &NsPath,
    format: OutputFormat,
) -> Result<()> {
    let shown = to.parent().unwrap_or_default();
    let ((), listing) = ctx
        .mutate_and_show(&shown, ctx.mutator.rename(from, to))
        .await?;
    announce(format, &format!("Moved {from} to {to}"));
    formatter::print_listing(&listing, ListingSort::Name, format)
}

/// Delete an entry and everything below it.
pub(crate) async fn delete(ctx: &Context, path: &NsPath, format: OutputFormat) -> Result<()> {
    let shown = path.parent().unwrap_or_default();
    let ((), listing) = ctx
        .mutate_and_show(&shown, ctx.mutator.delete(path))
        .await?;
    announce(format, &format!("Deleted {path}"));
    formatter::print_listing(&listing, ListingSort::Name, format)
}

/// Upload a local file into `parent`, keeping its file name.
pub(crate) async fn upload(
    ctx: &Context,
    local: &Path,
    parent: &NsPath,
    format: OutputFormat,
) -> Result<()> {
    let (name, content) = read_local(local)?;

    let (path, listing) = ctx
        .mutate_and_show(parent, ctx.mutator.upload(parent, &name, content))
        .await?;
    announce(format, &format!("Uploaded {} to {path}", local.display()));
    formatter::print_listing(&listing, ListingSort::Name, format)
}

//! `get`: download one file.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use arbor_core::{NsPath, Transfer};

use crate::context::Context;
use crate::formatter::OutputFormat;
use crate::theme::{Theme, human_size};

/// Where `get` writes when no output path is given: the remote file name in
/// the current directory.
fn default_output(remote: &NsPath) -> Result<PathBuf> {
    remote
        .name()
        .map(PathBuf::from)
        .with_context(|| format!("{remote} is not a file"))
}

/// Download `remote` to `out`. `-` writes to stdout.
pub(crate) async fn download(
    ctx: &Context,
    remote: &NsPath,
    out: Option<&Path>,
    format: OutputFormat,
) -> Result<()> {
    let out = match out {
        Some(path) => path.to_path_buf(),
        None => default_output(remote)?,
    };
    let data = ctx.client.download(remote).await?;

    if out == Path::new("-") {
        use std::io::Write as _;
        std::io::stdout().write_all(&data)?;
        return Ok(());
    }

    std::fs::write(&out, &data).with_context(|| format!("cannot write {}", out.display()))?;
    let size = u64::try_from(data.len()).unwrap_or(u64::MAX);
    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::json!({ "path": remote.to_string(), "out": out, "bytes": size })
        ),
        OutputFormat::Pretty => println!(
            "{}",
            Theme::success(&format!(
                "Downloaded {remote} to {} ({})",
                out.display(),
                human_size(Some(size))
            ))
        ),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_output_uses_remote_name() {
        let remote = NsPath::parse("docs/report.txt").unwrap();
        assert_eq!(default_output(&remote).unwrap(), PathBuf::from("report.txt"));
        assert!(default_output(&NsPath::root()).is_err());
    }
}

//! Arbor CLI - browse and edit a remote namespace.
//!
//! Every invocation builds one client, one invalidation bus, an attached tree
//! cache and a listing view, runs a single command and exits.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use arbor_core::NsPath;
use arbor_telemetry::LogConfig;
use clap::{Parser, Subcommand};

mod commands;
mod context;
mod formatter;
mod theme;

use commands::{browse, config, edit, transfer};
use context::Context;
use formatter::{OutputFormat, SortKey};
use theme::Theme;

/// Arbor - remote namespace browser
#[derive(Parser)]
#[command(name = "arbor")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Server base URL, overriding the configuration
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Pretty)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List a directory
    Ls {
        /// Directory to list (defaults to the root)
        #[arg(default_value = "/")]
        path: String,
        /// Sort key; directories always come first
        #[arg(short, long, value_enum, default_value_t = SortKey::Name)]
        sort: SortKey,
    },

    /// Expand the tree down to a path
    Tree {
        /// Navigation target (defaults to the root)
        #[arg(default_value = "/")]
        path: String,
    },

    /// Create a directory
    Mkdir {
        /// Parent directory
        parent: String,
        /// New directory name
        name: String,
    },

    /// Create an empty file
    Touch {
        /// Parent directory
        parent: String,
        /// New file name
        name: String,
    },

    /// Move or rename an entry
    Mv {
        /// Current path
        from: String,
        /// New path; must not exist
        to: String,
    },

    /// Delete an entry and everything below it
    Rm {
        /// Path to delete
        path: String,
    },

    /// Upload a local file
    Put {
        /// Local file
        local: PathBuf,
        /// Remote directory (defaults to the root)
        #[arg(default_value = "/")]
        parent: String,
    },

    /// Download a file
    Get {
        /// Remote file
        path: String,
        /// Output file, `-` for stdout (defaults to the remote name)
        out: Option<PathBuf>,
    },

    /// View configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the resolved configuration and its sources
    Show,
}

fn ns(raw: &str) -> Result<NsPath> {
    NsPath::parse(raw).with_context(|| format!("invalid path {raw:?}"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut resolved =
        arbor_config::Config::load(cli.config.as_deref()).context("failed to load configuration")?;
    if let Some(base_url) = &cli.base_url {
        base_url.clone_into(&mut resolved.config.server.base_url);
    }

    // Set up logging from config, with --verbose override.
    let mut log_config = LogConfig::try_from(&resolved.config.logging)
        .unwrap_or_else(|_| LogConfig::new("info"));
    if cli.verbose {
        "debug".clone_into(&mut log_config.level);
    }
    if let Err(e) = arbor_telemetry::setup_logging(&log_config) {
        eprintln!("{}", Theme::warning(&format!("Failed to initialize logging: {e}")));
    }

    let format = cli.format;
    if let Commands::Config {
        command: ConfigCommands::Show,
    } = cli.command
    {
        return config::show_config(&resolved, format);
    }

    let ctx = Context::new(&resolved.config)?;
    match cli.command {
        Commands::Ls { path, sort } => browse::list(&ctx, ns(&path)?, sort.into(), format).await,
        Commands::Tree { path } => browse::tree(&ctx, &ns(&path)?, format).await,
        Commands::Mkdir { parent, name } => {
            edit::create(&ctx, &ns(&parent)?, &name, true, format).await
        },
        Commands::Touch { parent, name } => {
            edit::create(&ctx, &ns(&parent)?, &name, false, format).await
        },
        Commands::Mv { from, to } => edit::rename(&ctx, &ns(&from)?, &ns(&to)?, format).await,
        Commands::Rm { path } => edit::delete(&ctx, &ns(&path)?, format).await,
        Commands::Put { local, parent } => edit::upload(&ctx, &local, &ns(&parent)?, format).await,
        Commands::Get { path, out } => {
            transfer::download(&ctx, &ns(&path)?, out.as_deref(), format).await
        },
        Commands::Config { .. } => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_global_options_after_command() {
        let cli = Cli::try_parse_from([
            "arbor",
            "mv",
            "/docs/a.txt",
            "/docs/b.txt",
            "--format",
            "json",
            "--base-url",
            "http://example.com:4023",
        ])
        .unwrap();
        assert_eq!(cli.format, OutputFormat::Json);
        assert_eq!(cli.base_url.as_deref(), Some("http://example.com:4023"));
        assert!(matches!(cli.command, Commands::Mv { .. }));
    }

    #[test]
    fn test_cli_defaults_to_root() {
        let cli = Cli::try_parse_from(["arbor", "ls"]).unwrap();
        let Commands::Ls { path, sort } = cli.command else {
            panic!("expected ls");
        };
        assert!(ns(&path).unwrap().is_root());
        assert_eq!(sort, SortKey::Name);
    }

    #[test]
    fn test_ns_accepts_encoded_segments() {
        assert_eq!(ns("/my%20docs").unwrap(), ns("my docs/").unwrap());
    }
}

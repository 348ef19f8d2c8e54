//! `config show`.

use anyhow::Result;
use arbor_config::ResolvedConfig;
use colored::Colorize;

use crate::formatter::OutputFormat;
use crate::theme::Theme;

/// Print the resolved configuration and the files it came from.
pub(crate) fn show_config(resolved: &ResolvedConfig, format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        let value = serde_json::json!({
            "config": resolved.config,
            "loaded_files": resolved.loaded_files,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("\n{}", Theme::header("Configuration"));
    if resolved.loaded_files.is_empty() {
        println!("{}", Theme::dimmed("(defaults only, no config files found)"));
    } else {
        for file in &resolved.loaded_files {
            println!("  {} {}", "source:".dimmed(), file);
        }
    }
    println!("{}", Theme::separator());
    print!("{}", toml::to_string_pretty(&resolved.config)?);
    Ok(())
}

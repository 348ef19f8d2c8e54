#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
//! Layered configuration for Arbor.
//!
//! # Usage
//!
//! ```rust,no_run
//! use arbor_config::Config;
//!
//! let resolved = Config::load(None).unwrap();
//! println!("Server: {}", resolved.config.server.base_url);
//! ```
//!
//! # Configuration Precedence
//!
//! From highest to lowest priority:
//!
//! 1. **Explicit file** passed with `--config`
//! 2. **User** (`{config_dir}/arbor/config.toml`)
//! 3. **Environment variables** (`ARBOR_BASE_URL`, `ARBOR_LOG`)
//! 4. **Embedded defaults** (`defaults.toml` compiled into the binary)
//!
//! This crate has no dependencies on other Arbor crates. Conversion into
//! client options and log settings happens where those are built.

/// Configuration error types.
pub mod error;
/// Configuration file discovery and loading.
pub mod loader;
/// Layered configuration merging.
pub mod merge;
/// Configuration struct definitions.
pub mod types;
/// Configuration validation rules.
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigSources, ResolvedConfig, user_config_path};
pub use types::*;

impl Config {
    /// Load configuration for the running process.
    ///
    /// See [`loader::load`] for the full algorithm.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if any config file is malformed or the final
    /// configuration fails validation.
    pub fn load(explicit_file: Option<&std::path::Path>) -> ConfigResult<ResolvedConfig> {
        loader::load(&ConfigSources::discover(
            explicit_file.map(std::path::Path::to_path_buf),
        ))
    }
}

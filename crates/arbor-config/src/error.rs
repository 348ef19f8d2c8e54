use std::io;

use thiserror::Error;

/// Errors raised while loading or checking configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A config file exists but could not be read.
    #[error("cannot read {path}: {source}")]
    ReadError {
        /// File that was being read.
        path: String,
        /// I/O failure.
        #[source]
        source: io::Error,
    },

    /// A config file is not valid TOML for [`crate::Config`].
    #[error("invalid TOML in {path}: {source}")]
    ParseError {
        /// Offending file.
        path: String,
        /// Decoder failure.
        #[source]
        source: toml::de::Error,
    },

    /// A merged value is out of range or malformed.
    #[error("invalid value for `{field}`: {message}")]
    ValidationError {
        /// Dotted key, e.g. `server.base_url`.
        field: String,
        /// What is wrong with it.
        message: String,
    },
}

/// Shorthand for results carrying a [`ConfigError`].
pub type ConfigResult<T> = Result<T, ConfigError>;

//! Checks applied once all layers are merged.

use url::Url;

use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;

/// Validate a fully merged and deserialized configuration.
///
/// # Errors
///
/// Stops at the first bad value.
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_server(config)?;
    validate_bus(config)?;
    validate_logging(config)?;
    Ok(())
}

fn invalid(field: &str, message: String) -> ConfigError {
    ConfigError::ValidationError {
        field: field.to_owned(),
        message,
    }
}

fn validate_server(config: &Config) -> ConfigResult<()> {
    let server = &config.server;

    let url = Url::parse(&server.base_url).map_err(|e| {
        invalid(
            "server.base_url",
            format!("'{}' is not a valid URL: {e}", server.base_url),
        )
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(
            "server.base_url",
            format!("unsupported scheme '{}'; expected http or https", url.scheme()),
        ));
    }

    if server.timeout_secs == 0 {
        return Err(invalid(
            "server.timeout_secs",
            "timeout must be greater than 0".to_owned(),
        ));
    }

    Ok(())
}

fn validate_bus(config: &Config) -> ConfigResult<()> {
    if config.bus.capacity == 0 {
        return Err(invalid(
            "bus.capacity",
            "capacity must be greater than 0".to_owned(),
        ));
    }
    Ok(())
}

fn validate_logging(config: &Config) -> ConfigResult<()> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.logging.level.as_str()) {
        return Err(invalid(
            "logging.level",
            format!(
                "'{}' is not a level ({})",
                config.logging.level,
                valid_levels.join(", ")
            ),
        ));
    }

    let valid_formats = ["pretty", "compact", "json"];
    if !valid_formats.contains(&config.logging.format.as_str()) {
        return Err(invalid(
            "logging.format",
            format!(
                "'{}' is not a format ({})",
                config.logging.format,
                valid_formats.join(", ")
            ),
        ));
    }

    Ok(())
}

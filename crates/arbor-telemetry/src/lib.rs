//! Arbor Telemetry - logging setup.
//!
//! Library crates only emit `tracing` events; binaries call
//! [`setup_logging`] once at startup.
//!
//! # Example
//!
//! ```rust,no_run
//! use arbor_telemetry::{LogConfig, LogFormat, setup_logging};
//!
//! # fn main() -> Result<(), arbor_telemetry::TelemetryError> {
//! let config = LogConfig::new("info")
//!     .with_format(LogFormat::Compact)
//!     .with_directive("arbor_tree=debug");
//! setup_logging(&config)?;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod error;
mod logging;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{LogConfig, LogFormat, LogTarget, setup_default_logging, setup_logging};

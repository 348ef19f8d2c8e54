//! Prelude module - commonly used types for convenient import.
//!
//! ```rust,ignore
//! use arbor_telemetry::prelude::*;
//! ```

pub use crate::{
    LogConfig, LogFormat, LogTarget, TelemetryError, TelemetryResult, setup_default_logging,
    setup_logging,
};

//! Prelude module - commonly used types for convenient import.
//!
//! ```rust,ignore
//! use arbor_client::prelude::*;
//! ```

pub use crate::{HttpClientOptions, HttpNamespaceClient, Mutator};

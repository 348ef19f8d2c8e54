//! Prelude module - commonly used types for convenient import.
//!
//! Use `use arbor_core::prelude::*;` to import all essential types.

pub use crate::{Entry, NamespaceClient, NamespaceError, NamespaceResult, NsPath, Transfer};

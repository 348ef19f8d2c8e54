//! Arbor Core - shared vocabulary for the remote namespace client.
//!
//! This crate provides:
//! - [`NsPath`], the decoded, canonical identity of a namespace entry
//! - [`Entry`], one item of a directory listing
//! - [`NamespaceError`], the error taxonomy shared by every layer
//! - [`NamespaceClient`] and [`Transfer`], the contract the remote store is consumed through
//!
//! # Example
//!
//! ```rust
//! use arbor_core::NsPath;
//!
//! let encoded = NsPath::parse("reports/Q1%20final").unwrap();
//! let decoded = NsPath::parse("reports/Q1 final").unwrap();
//! assert_eq!(encoded, decoded);
//! assert_eq!(decoded.to_encoded(), "reports/Q1%20final");
//! assert_eq!(decoded.to_string(), "/reports/Q1 final");
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod client;
mod entry;
mod error;
mod path;

pub use client::{NamespaceClient, Transfer};
pub use entry::Entry;
pub use error::{NamespaceError, NamespaceResult};
pub use path::{NsPath, validate_name};

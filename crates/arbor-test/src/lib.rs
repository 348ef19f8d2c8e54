//! Arbor Test - Shared test utilities for Arbor.
//!
//! This crate provides an in-memory namespace and test helpers that can be
//! used across Arbor crates as a dev-dependency.
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! arbor-test.workspace = true
//! ```
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use arbor_test::{p, sample_namespace};
//! use arbor_tree::TreeCache;
//!
//! #[tokio::test]
//! async fn test_listing_is_cached() {
//!     let mock = sample_namespace();
//!     let cache = TreeCache::new(Arc::new(mock.clone()));
//!
//!     cache.ensure_loaded(&p("docs")).await.unwrap();
//!     cache.ensure_loaded(&p("docs")).await.unwrap();
//!
//!     assert_eq!(mock.list_calls(&p("docs")), 1);
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod prelude;

pub mod fixtures;
pub mod harness;
pub mod mocks;

pub use fixtures::*;
pub use harness::*;
pub use mocks::*;

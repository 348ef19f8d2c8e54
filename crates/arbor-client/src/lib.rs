//! Arbor Client - HTTP binding and mutation gateway.
//!
//! This crate provides:
//! - [`HttpNamespaceClient`]: [`NamespaceClient`](arbor_core::NamespaceClient)
//!   and [`Transfer`](arbor_core::Transfer) over the upload server's REST routes
//! - [`Mutator`]: runs create, rename, delete and upload, then publishes the
//!   affected parent directories on the invalidation bus
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use arbor_client::{HttpNamespaceClient, Mutator};
//! use arbor_core::NsPath;
//! use arbor_events::InvalidationBus;
//!
//! # async fn example() -> arbor_core::NamespaceResult<()> {
//! let client = Arc::new(HttpNamespaceClient::new("http://localhost:4023")?);
//! let bus = InvalidationBus::new();
//! let mutator = Mutator::new(client.clone(), bus.clone()).with_transfer(client);
//!
//! mutator.create(&NsPath::root(), "docs", true).await?;
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

mod http;
mod mutate;

pub use http::{DEFAULT_TIMEOUT, DEFAULT_USER_AGENT, HttpClientOptions, HttpNamespaceClient};
pub use mutate::Mutator;
